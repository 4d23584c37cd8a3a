//! The Explorer HAT object model.
//!
//! This module provides [`ExplorerHat`], which owns the GPIO backend and the
//! I2C bus and hands out short-lived handles for each named feature:
//!
//! | Collection | Handle | Board |
//! |------------|--------|-------|
//! | `input` | [`Input`] | all |
//! | `output` | [`DigitalOut`] | all |
//! | `light` | [`DigitalOut`] | all |
//! | `touch` | [`TouchPads`] | all |
//! | `analog` | [`Analog`] | Pro |
//! | `motor` | [`Motor`] | Pro |
//!
//! # Example
//!
//! ```rust
//! use explorer_hat::hal::{MockGpio, MockI2c};
//! use explorer_hat::{Board, ExplorerHat, HatConfig, InputId, LightId, MotorId, TouchId};
//!
//! let mut hat = ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat_pro(), HatConfig::default()).unwrap();
//! assert_eq!(hat.board(), Board::Pro);
//!
//! hat.light(LightId::Blue).on().unwrap();
//! hat.motor(MotorId::One).unwrap().forward(100.0).unwrap();
//! assert!(!hat.input(InputId::One).read().unwrap());
//!
//! hat.touch_pad(TouchId::One).pressed(|event| println!("{:?}", event));
//!
//! // Main loop: poll the touch controller every tick
//! let events = hat.poll(0).unwrap();
//! assert!(events.is_empty());
//! ```

use embedded_hal::i2c::{ErrorType, I2c};
use heapless::Vec as HVec;

use crate::config::{HatConfig, Settings};
use crate::drivers::{Ads1015, Cap1208};
use crate::io::{DigitalOut, Input, OutputState};
use crate::motor::{Motor, MotorState};
use crate::pins::{AnalogId, Channel, InputId, LightId, MotorId, OutputId, ParseNameError, PinMap, TouchId};
use crate::touch::{TouchEvent, TouchEventKind, TouchEvents, TouchTracker};
use crate::traits::{Gpio, Level, MotorController, Pull};

/// Errors raised by [`ExplorerHat`].
///
/// `G` and `I` are the GPIO and I2C backend errors, passed through as-is.
#[derive(Debug, thiserror::Error)]
pub enum Error<G, I> {
    /// The GPIO backend failed.
    #[error("gpio error: {0:?}")]
    Gpio(G),
    /// The I2C bus failed.
    #[error("i2c error: {0:?}")]
    I2c(I),
    /// The feature needs hardware this board does not have.
    #[error("{0} is not fitted to this board")]
    NotFitted(&'static str),
    /// The named channel exists but cannot be driven as an output.
    #[error("{0} is not an output or light")]
    NotAnOutput(Channel),
    /// A friendly name did not resolve.
    #[error(transparent)]
    Name(#[from] ParseNameError),
}

/// [`Error`] for a particular pair of backends.
pub type HatError<G, I> = Error<<G as Gpio>::Error, <I as ErrorType>::Error>;

/// Which variant of the board is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Board {
    /// Explorer HAT: inputs, outputs, lights, touch.
    Basic,
    /// Explorer HAT Pro: adds analog inputs and motor drivers.
    Pro,
}

impl Board {
    /// True if the ADS1015 analog inputs are fitted.
    #[inline]
    pub const fn has_analog(self) -> bool {
        matches!(self, Board::Pro)
    }

    /// True if the motor drivers are fitted.
    #[inline]
    pub const fn has_motors(self) -> bool {
        matches!(self, Board::Pro)
    }
}

/// An attached Explorer HAT or Explorer HAT Pro.
///
/// # Type Parameters
///
/// - `G`: the GPIO backend ([`Gpio`] trait)
/// - `I`: the I2C bus shared by the ADC and the touch controller
///
/// # Thread Safety
///
/// The HAT is not internally synchronised. Input callbacks run on the
/// backend's interrupt thread and touch callbacks run inside
/// [`poll`](Self::poll); to drive the HAT from several threads wrap it in
/// `Arc<Mutex<ExplorerHat<_, _>>>`.
pub struct ExplorerHat<G: Gpio, I: I2c> {
    gpio: G,
    i2c: I,
    pins: PinMap,
    settings: Settings,
    board: Board,
    touch_fitted: bool,
    adc: Ads1015,
    cap: Cap1208,
    outputs: [OutputState; 4],
    lights: [OutputState; 4],
    motors: [MotorState; 2],
    touch: TouchTracker,
}

impl<G: Gpio, I: I2c> ExplorerHat<G, I> {
    /// Set up every pin of the board and detect which variant is attached.
    ///
    /// Inputs are pulled down; outputs, lights and (on the Pro) motor pins
    /// start low. The touch controller has hardware repeat disabled since
    /// hold detection is done in [`poll`](Self::poll).
    pub fn new(mut gpio: G, mut i2c: I, config: HatConfig) -> Result<Self, HatError<G, I>> {
        let HatConfig {
            pins,
            adc_address,
            touch_address,
            adc_gain,
            settings,
        } = config;

        let adc = Ads1015::new(adc_address, adc_gain);
        let cap = Cap1208::new(touch_address);

        let board = if adc.probe(&mut i2c) {
            Board::Pro
        } else {
            Board::Basic
        };

        for &pin in &pins.inputs {
            gpio.setup_input(pin, Pull::Down).map_err(Error::Gpio)?;
        }
        for &pin in pins.outputs.iter().chain(pins.lights.iter()) {
            gpio.setup_output(pin, Level::Low).map_err(Error::Gpio)?;
        }
        if board.has_motors() {
            for motor in &pins.motors {
                gpio.setup_output(motor.forward, Level::Low)
                    .map_err(Error::Gpio)?;
                gpio.setup_output(motor.backward, Level::Low)
                    .map_err(Error::Gpio)?;
            }
        }

        let touch_fitted = cap.probe(&mut i2c);
        if touch_fitted {
            cap.set_repeat_enabled(&mut i2c, 0x00).map_err(Error::I2c)?;
            cap.set_multitouch(&mut i2c, settings.multitouch)
                .map_err(Error::I2c)?;
            cap.clear_interrupt(&mut i2c).map_err(Error::I2c)?;
        } else {
            tracing::warn!(address = touch_address, "touch controller not found");
        }

        tracing::info!(?board, touch = touch_fitted, "explorer hat ready");

        Ok(Self {
            gpio,
            i2c,
            pins,
            settings,
            board,
            touch_fitted,
            adc,
            cap,
            outputs: Default::default(),
            lights: Default::default(),
            motors: Default::default(),
            touch: TouchTracker::new(),
        })
    }

    // =========================================================================
    // Board and settings
    // =========================================================================

    /// Detected board variant.
    #[inline]
    pub fn board(&self) -> Board {
        self.board
    }

    /// True if the touch controller answered at startup.
    #[inline]
    pub fn has_touch(&self) -> bool {
        self.touch_fitted
    }

    /// The name to pin mapping in use.
    #[inline]
    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// Current runtime settings.
    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Change runtime settings.
    ///
    /// New PWM and debounce values apply to handles created afterwards. A
    /// multitouch change is written to the touch controller immediately.
    pub fn update_settings<F>(&mut self, f: F) -> Result<(), HatError<G, I>>
    where
        F: FnOnce(&mut Settings),
    {
        let multitouch = self.settings.multitouch;
        f(&mut self.settings);
        if self.touch_fitted && multitouch != self.settings.multitouch {
            self.cap
                .set_multitouch(&mut self.i2c, self.settings.multitouch)
                .map_err(Error::I2c)?;
        }
        Ok(())
    }

    /// Translate a friendly name such as `"output.2"` into BCM pins.
    pub fn resolve(&self, name: &str) -> Result<HVec<u8, 2>, ParseNameError> {
        self.pins.resolve(name)
    }

    /// The GPIO backend.
    #[inline]
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// The GPIO backend, mutably.
    #[inline]
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    /// The I2C bus.
    #[inline]
    pub fn i2c(&self) -> &I {
        &self.i2c
    }

    /// The I2C bus, mutably.
    #[inline]
    pub fn i2c_mut(&mut self) -> &mut I {
        &mut self.i2c
    }

    /// Consume the HAT and return the backends.
    pub fn release(self) -> (G, I) {
        (self.gpio, self.i2c)
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Handle to a digital input.
    pub fn input(&mut self, id: InputId) -> Input<'_, G> {
        let pin = self.pins.input(id);
        Input::new(&mut self.gpio, id, pin, self.settings.bounce_ms)
    }

    /// Read all four inputs, `true` meaning high.
    pub fn read_inputs(&mut self) -> Result<[bool; 4], G::Error> {
        let mut levels = [false; 4];
        for (level, &pin) in levels.iter_mut().zip(self.pins.inputs.iter()) {
            *level = self.gpio.read(pin)?.is_high();
        }
        Ok(levels)
    }

    // =========================================================================
    // Outputs and lights
    // =========================================================================

    /// Handle to a digital output.
    pub fn output(&mut self, id: OutputId) -> DigitalOut<'_, G> {
        let pin = self.pins.output(id);
        DigitalOut::new(
            &mut self.gpio,
            pin,
            &mut self.outputs[id.index()],
            self.settings.pwm_frequency_hz,
        )
    }

    /// Handle to a light.
    pub fn light(&mut self, id: LightId) -> DigitalOut<'_, G> {
        let pin = self.pins.light(id);
        DigitalOut::new(
            &mut self.gpio,
            pin,
            &mut self.lights[id.index()],
            self.settings.pwm_frequency_hz,
        )
    }

    /// Handle to an output or light by friendly name, e.g. `"light.red"`.
    pub fn digital_out(&mut self, name: &str) -> Result<DigitalOut<'_, G>, HatError<G, I>> {
        match name.parse::<Channel>()? {
            Channel::Output(id) => Ok(self.output(id)),
            Channel::Light(id) => Ok(self.light(id)),
            other => Err(Error::NotAnOutput(other)),
        }
    }

    /// Set every output on or off.
    pub fn set_outputs(&mut self, on: bool) -> Result<(), G::Error> {
        for &id in OutputId::ALL {
            self.output(id).write(on)?;
        }
        Ok(())
    }

    /// Toggle every output.
    pub fn toggle_outputs(&mut self) -> Result<(), G::Error> {
        for &id in OutputId::ALL {
            self.output(id).toggle()?;
        }
        Ok(())
    }

    /// Set every light on or off.
    pub fn set_lights(&mut self, on: bool) -> Result<(), G::Error> {
        for &id in LightId::ALL {
            self.light(id).write(on)?;
        }
        Ok(())
    }

    /// Toggle every light.
    pub fn toggle_lights(&mut self) -> Result<(), G::Error> {
        for &id in LightId::ALL {
            self.light(id).toggle()?;
        }
        Ok(())
    }

    // =========================================================================
    // Analog
    // =========================================================================

    /// Handle to an analog input.
    ///
    /// Fails with [`Error::NotFitted`] on a basic Explorer HAT.
    pub fn analog(&mut self, id: AnalogId) -> Result<Analog<'_, I>, HatError<G, I>> {
        if !self.board.has_analog() {
            return Err(Error::NotFitted("analog"));
        }
        Ok(Analog {
            i2c: &mut self.i2c,
            adc: self.adc,
            id,
            channel: self.pins.analog(id),
        })
    }

    /// Read all four analog inputs in millivolts.
    pub fn read_analogs(&mut self) -> Result<[u16; 4], HatError<G, I>> {
        let mut values = [0u16; 4];
        for (value, &id) in values.iter_mut().zip(AnalogId::ALL.iter()) {
            *value = self.analog(id)?.read_mv().map_err(Error::I2c)?;
        }
        Ok(values)
    }

    // =========================================================================
    // Motors
    // =========================================================================

    /// Handle to a motor channel.
    ///
    /// Fails with [`Error::NotFitted`] on a basic Explorer HAT.
    pub fn motor(&mut self, id: MotorId) -> Result<Motor<'_, G>, HatError<G, I>> {
        if !self.board.has_motors() {
            return Err(Error::NotFitted("motor"));
        }
        Ok(Motor::new(
            &mut self.gpio,
            id,
            self.pins.motor(id),
            &mut self.motors[id.index()],
            self.settings.pwm_frequency_hz,
        ))
    }

    /// Stop both motors. Does nothing on a basic board.
    pub fn stop_motors(&mut self) -> Result<(), HatError<G, I>> {
        if !self.board.has_motors() {
            return Ok(());
        }
        for &id in MotorId::ALL {
            self.motor(id)?.stop().map_err(Error::Gpio)?;
        }
        Ok(())
    }

    // =========================================================================
    // Touch
    // =========================================================================

    /// Callback registration for one touch pad.
    pub fn touch_pad(&mut self, pad: TouchId) -> TouchPads<'_> {
        TouchPads {
            tracker: &mut self.touch,
            pad: Some(pad),
        }
    }

    /// Callback registration for every touch pad at once.
    pub fn touch_pads(&mut self) -> TouchPads<'_> {
        TouchPads {
            tracker: &mut self.touch,
            pad: None,
        }
    }

    /// True if `pad` was touched at the last [`poll`](Self::poll).
    pub fn is_touched(&self, pad: TouchId) -> bool {
        self.touch.is_pressed(pad)
    }

    /// Read the touch controller, dispatch callbacks, and return the events.
    ///
    /// `now_ms` is a monotonic timestamp used for hold detection. Call this
    /// regularly (e.g. every 20ms) from the main loop.
    pub fn poll(&mut self, now_ms: u64) -> Result<TouchEvents, HatError<G, I>> {
        if !self.touch_fitted {
            return Err(Error::NotFitted("touch"));
        }

        let mask = self.cap.read_inputs(&mut self.i2c).map_err(Error::I2c)?;
        let events = self.touch.update(
            mask,
            now_ms,
            self.settings.touch_hold_ms,
            self.settings.touch_repeat_ms,
            &self.pins,
        );
        for event in &events {
            tracing::trace!(pad = %event.pad, kind = ?event.kind, now_ms, "touch");
        }
        self.touch.dispatch(&events);
        Ok(events)
    }

    // =========================================================================
    // Cleanup
    // =========================================================================

    /// Return the board to its power-on state.
    ///
    /// Turns off every output and light, stops the motors, removes input
    /// callbacks and forgets touch callbacks.
    pub fn reset(&mut self) -> Result<(), HatError<G, I>> {
        self.set_outputs(false).map_err(Error::Gpio)?;
        self.set_lights(false).map_err(Error::Gpio)?;
        self.stop_motors()?;
        for &id in InputId::ALL {
            self.input(id).clear_events().map_err(Error::Gpio)?;
        }
        self.touch.clear_all();
        tracing::debug!("explorer hat reset");
        Ok(())
    }
}

/// Handle to an analog input.
pub struct Analog<'a, I: I2c> {
    i2c: &'a mut I,
    adc: Ads1015,
    id: AnalogId,
    channel: u8,
}

impl<I: I2c> Analog<'_, I> {
    /// Which input this handle reads.
    #[inline]
    pub fn id(&self) -> AnalogId {
        self.id
    }

    /// ADS1015 input number.
    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Read in millivolts.
    pub fn read_mv(&mut self) -> Result<u16, I::Error> {
        self.adc.read_mv(self.i2c, self.channel)
    }

    /// Read in volts.
    pub fn read(&mut self) -> Result<f32, I::Error> {
        self.read_mv().map(|mv| f32::from(mv) / 1000.0)
    }
}

/// Touch callback registration for one pad or for all pads.
///
/// Callbacks run inside [`ExplorerHat::poll`]. Each selection keeps one
/// callback per event kind; registering again replaces it.
pub struct TouchPads<'a> {
    tracker: &'a mut TouchTracker,
    pad: Option<TouchId>,
}

impl TouchPads<'_> {
    /// Call `f` when the pad is touched.
    pub fn pressed<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(TouchEvent) + Send + 'static,
    {
        self.on(TouchEventKind::Press, f)
    }

    /// Call `f` when the pad is let go.
    pub fn released<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(TouchEvent) + Send + 'static,
    {
        self.on(TouchEventKind::Release, f)
    }

    /// Call `f` while the pad is held, after the hold time and then at the
    /// repeat interval.
    pub fn held<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(TouchEvent) + Send + 'static,
    {
        self.on(TouchEventKind::Held, f)
    }

    /// Forget the callbacks registered through this selection.
    pub fn clear(&mut self) {
        self.tracker.clear(self.pad);
    }

    fn on<F>(&mut self, kind: TouchEventKind, f: F) -> &mut Self
    where
        F: FnMut(TouchEvent) + Send + 'static,
    {
        self.tracker
            .register(self.pad, kind, alloc::boxed::Box::new(f));
        self
    }
}
