//! Digital input and output handles.
//!
//! Handles borrow the GPIO backend from [`ExplorerHat`](crate::ExplorerHat)
//! for the duration of a call chain, so they are cheap to create:
//!
//! ```rust
//! use explorer_hat::hal::{MockGpio, MockI2c};
//! use explorer_hat::{ExplorerHat, HatConfig, LightId, OutputId};
//!
//! let mut hat = ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat(), HatConfig::default()).unwrap();
//!
//! hat.output(OutputId::One).on().unwrap();
//! hat.light(LightId::Green).blink(500, 500).unwrap();
//!
//! assert!(hat.output(OutputId::One).is_on());
//! assert!(hat.light(LightId::Green).is_on());
//! ```

use alloc::boxed::Box;

use crate::pins::InputId;
use crate::traits::{Edge, Gpio, Level};

// ============================================================================
// Outputs and lights
// ============================================================================

/// How an output is currently being driven.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum OutputMode {
    /// Plain high/low level.
    #[default]
    Steady,
    /// Software PWM blinking.
    Blink {
        /// Time on per cycle.
        on_ms: u32,
        /// Time off per cycle.
        off_ms: u32,
    },
    /// Software PWM at a fixed duty.
    Brightness(f64),
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct OutputState {
    on: bool,
    mode: OutputMode,
}

/// Handle to a digital output or a light.
///
/// Outputs and lights are both plain GPIO outputs on the HAT; they differ
/// only in what is wired to them.
pub struct DigitalOut<'a, G: Gpio> {
    gpio: &'a mut G,
    pin: u8,
    state: &'a mut OutputState,
    pwm_frequency_hz: f64,
}

impl<'a, G: Gpio> DigitalOut<'a, G> {
    pub(crate) fn new(
        gpio: &'a mut G,
        pin: u8,
        state: &'a mut OutputState,
        pwm_frequency_hz: f64,
    ) -> Self {
        Self {
            gpio,
            pin,
            state,
            pwm_frequency_hz,
        }
    }

    /// BCM pin driven by this handle.
    #[inline]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// True while on, blinking, or lit at a non-zero brightness.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.state.on
    }

    /// Current drive mode.
    #[inline]
    pub fn mode(&self) -> OutputMode {
        self.state.mode
    }

    /// Drive the output fully on or off, stopping any PWM.
    pub fn write(&mut self, on: bool) -> Result<(), G::Error> {
        self.stop_pwm()?;
        self.gpio.write(self.pin, Level::from(on))?;
        self.state.on = on;
        Ok(())
    }

    /// Turn on.
    pub fn on(&mut self) -> Result<(), G::Error> {
        self.write(true)
    }

    /// Turn off.
    pub fn off(&mut self) -> Result<(), G::Error> {
        self.write(false)
    }

    /// Invert the on/off state. A blinking output turns off.
    pub fn toggle(&mut self) -> Result<(), G::Error> {
        let on = !self.state.on;
        self.write(on)
    }

    /// Blink continuously, `on_ms` on then `off_ms` off.
    ///
    /// Runs as software PWM at `1000 / (on_ms + off_ms)` Hz. A zero
    /// `off_ms` is steady on; a zero `on_ms` is steady off.
    pub fn blink(&mut self, on_ms: u32, off_ms: u32) -> Result<(), G::Error> {
        if on_ms == 0 {
            return self.off();
        }
        if off_ms == 0 {
            return self.on();
        }

        let period_ms = f64::from(on_ms) + f64::from(off_ms);
        let frequency_hz = 1000.0 / period_ms;
        let duty = f64::from(on_ms) / period_ms;
        self.gpio.set_pwm(self.pin, frequency_hz, duty)?;

        self.state.on = true;
        self.state.mode = OutputMode::Blink { on_ms, off_ms };
        tracing::debug!(pin = self.pin, frequency_hz, duty, "blink");
        Ok(())
    }

    /// Drive at a PWM duty of `level` (0.0 to 1.0).
    pub fn brightness(&mut self, level: f64) -> Result<(), G::Error> {
        let level = level.clamp(0.0, 1.0);
        if level <= 0.0 {
            return self.off();
        }
        if level >= 1.0 {
            return self.on();
        }

        self.gpio.set_pwm(self.pin, self.pwm_frequency_hz, level)?;
        self.state.on = true;
        self.state.mode = OutputMode::Brightness(level);
        Ok(())
    }

    /// Stop blinking or dimming and turn off.
    pub fn stop_blink(&mut self) -> Result<(), G::Error> {
        self.off()
    }

    fn stop_pwm(&mut self) -> Result<(), G::Error> {
        if self.state.mode != OutputMode::Steady {
            self.gpio.clear_pwm(self.pin)?;
            self.state.mode = OutputMode::Steady;
        }
        Ok(())
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Handle to a buffered digital input.
///
/// Callbacks are registered directly with the GPIO backend and run on
/// whatever thread the backend delivers interrupts on. A pin carries one
/// callback at a time; registering another replaces it.
pub struct Input<'a, G: Gpio> {
    gpio: &'a mut G,
    id: InputId,
    pin: u8,
    bounce_ms: u32,
}

impl<'a, G: Gpio> Input<'a, G> {
    pub(crate) fn new(gpio: &'a mut G, id: InputId, pin: u8, bounce_ms: u32) -> Self {
        Self {
            gpio,
            id,
            pin,
            bounce_ms,
        }
    }

    /// BCM pin read by this handle.
    #[inline]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Override the debounce used for callbacks registered through this handle.
    pub fn with_bounce(mut self, bounce_ms: u32) -> Self {
        self.bounce_ms = bounce_ms;
        self
    }

    /// Current level.
    pub fn level(&mut self) -> Result<Level, G::Error> {
        self.gpio.read(self.pin)
    }

    /// True when the input is high.
    pub fn read(&mut self) -> Result<bool, G::Error> {
        self.level().map(Level::is_high)
    }

    /// Call `f` on every change of level.
    pub fn on_changed<F>(&mut self, f: F) -> Result<(), G::Error>
    where
        F: FnMut(InputId, Level) + Send + 'static,
    {
        self.subscribe(Edge::Both, f)
    }

    /// Call `f` when the input goes high.
    pub fn on_high<F>(&mut self, f: F) -> Result<(), G::Error>
    where
        F: FnMut(InputId, Level) + Send + 'static,
    {
        self.subscribe(Edge::Rising, f)
    }

    /// Call `f` when the input goes low.
    pub fn on_low<F>(&mut self, f: F) -> Result<(), G::Error>
    where
        F: FnMut(InputId, Level) + Send + 'static,
    {
        self.subscribe(Edge::Falling, f)
    }

    /// Remove any registered callback.
    pub fn clear_events(&mut self) -> Result<(), G::Error> {
        self.gpio.unsubscribe(self.pin)
    }

    fn subscribe<F>(&mut self, edge: Edge, mut f: F) -> Result<(), G::Error>
    where
        F: FnMut(InputId, Level) + Send + 'static,
    {
        let id = self.id;
        tracing::debug!(%id, pin = self.pin, ?edge, bounce_ms = self.bounce_ms, "subscribe");
        self.gpio.subscribe(
            self.pin,
            edge,
            self.bounce_ms,
            Box::new(move |level| f(id, level)),
        )
    }
}
