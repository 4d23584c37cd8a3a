//! Raspberry Pi backend using rppal.
//!
//! GPIO goes through `/dev/gpiomem`; software PWM and edge interrupts are
//! provided by rppal's own threads. The ADC and touch controller sit on I2C
//! bus 1, driven by rppal's `embedded-hal` I2C implementation.
//!
//! # Example
//!
//! ```ignore
//! use explorer_hat::hal::rpi;
//! use explorer_hat::{HatConfig, LightId};
//!
//! let mut hat = rpi::open(HatConfig::default())?;
//! hat.light(LightId::Blue).on()?;
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use rppal::gpio::{self, Event, InputPin, OutputPin, Trigger};
use rppal::i2c::I2c;

use crate::config::HatConfig;
use crate::hat::ExplorerHat;
use crate::traits::{Edge, EdgeCallback, Gpio, Level, Pull};

/// An Explorer HAT driven by rppal.
pub type RpiHat = ExplorerHat<RpiGpio, I2c>;

/// Open the GPIO peripheral and I2C bus 1 and set up the HAT.
pub fn open(config: HatConfig) -> anyhow::Result<RpiHat> {
    let gpio = RpiGpio::new()?;
    let i2c = I2c::new()?;
    Ok(ExplorerHat::new(gpio, i2c, config)?)
}

/// Errors from [`RpiGpio`].
#[derive(Debug, thiserror::Error)]
pub enum RpiGpioError {
    /// rppal reported an error.
    #[error(transparent)]
    Gpio(#[from] gpio::Error),
    /// The pin was used before being set up.
    #[error("pin {0} has not been set up")]
    NotSetUp(u8),
    /// An output-only operation was used on an input.
    #[error("pin {0} is not an output")]
    NotOutput(u8),
    /// An input-only operation was used on an output.
    #[error("pin {0} is not an input")]
    NotInput(u8),
}

enum PinHandle {
    Input(InputPin),
    Output(OutputPin),
}

/// GPIO backend over rppal.
///
/// Pins are reset to inputs when this backend is dropped.
pub struct RpiGpio {
    gpio: gpio::Gpio,
    pins: BTreeMap<u8, PinHandle>,
}

impl RpiGpio {
    /// Open the GPIO peripheral.
    pub fn new() -> Result<Self, RpiGpioError> {
        Ok(Self {
            gpio: gpio::Gpio::new()?,
            pins: BTreeMap::new(),
        })
    }

    fn output(&mut self, pin: u8) -> Result<&mut OutputPin, RpiGpioError> {
        match self.pins.get_mut(&pin) {
            Some(PinHandle::Output(out)) => Ok(out),
            Some(PinHandle::Input(_)) => Err(RpiGpioError::NotOutput(pin)),
            None => Err(RpiGpioError::NotSetUp(pin)),
        }
    }

    fn input(&mut self, pin: u8) -> Result<&mut InputPin, RpiGpioError> {
        match self.pins.get_mut(&pin) {
            Some(PinHandle::Input(input)) => Ok(input),
            Some(PinHandle::Output(_)) => Err(RpiGpioError::NotInput(pin)),
            None => Err(RpiGpioError::NotSetUp(pin)),
        }
    }
}

fn to_level(level: gpio::Level) -> Level {
    match level {
        gpio::Level::High => Level::High,
        gpio::Level::Low => Level::Low,
    }
}

impl Gpio for RpiGpio {
    type Error = RpiGpioError;

    fn setup_input(&mut self, pin: u8, pull: Pull) -> Result<(), Self::Error> {
        // Release any previous handle first; rppal hands out one per pin.
        self.pins.remove(&pin);
        let raw = self.gpio.get(pin)?;
        let input = match pull {
            Pull::Off => raw.into_input(),
            Pull::Up => raw.into_input_pullup(),
            Pull::Down => raw.into_input_pulldown(),
        };
        self.pins.insert(pin, PinHandle::Input(input));
        Ok(())
    }

    fn setup_output(&mut self, pin: u8, initial: Level) -> Result<(), Self::Error> {
        self.pins.remove(&pin);
        let raw = self.gpio.get(pin)?;
        let output = match initial {
            Level::High => raw.into_output_high(),
            Level::Low => raw.into_output_low(),
        };
        self.pins.insert(pin, PinHandle::Output(output));
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, Self::Error> {
        match self.pins.get(&pin) {
            Some(PinHandle::Input(input)) => Ok(to_level(input.read())),
            Some(PinHandle::Output(output)) => Ok(Level::from(output.is_set_high())),
            None => Err(RpiGpioError::NotSetUp(pin)),
        }
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), Self::Error> {
        let output = self.output(pin)?;
        match level {
            Level::High => output.set_high(),
            Level::Low => output.set_low(),
        }
        Ok(())
    }

    fn set_pwm(&mut self, pin: u8, frequency_hz: f64, duty: f64) -> Result<(), Self::Error> {
        self.output(pin)?
            .set_pwm_frequency(frequency_hz, duty.clamp(0.0, 1.0))?;
        Ok(())
    }

    fn clear_pwm(&mut self, pin: u8) -> Result<(), Self::Error> {
        let output = self.output(pin)?;
        output.clear_pwm()?;
        output.set_low();
        Ok(())
    }

    fn subscribe(
        &mut self,
        pin: u8,
        edge: Edge,
        bounce_ms: u32,
        mut callback: EdgeCallback,
    ) -> Result<(), Self::Error> {
        let trigger = match edge {
            Edge::Rising => Trigger::RisingEdge,
            Edge::Falling => Trigger::FallingEdge,
            Edge::Both => Trigger::Both,
        };
        let debounce = (bounce_ms > 0).then(|| Duration::from_millis(u64::from(bounce_ms)));

        self.input(pin)?
            .set_async_interrupt(trigger, debounce, move |event: Event| {
                let level = match event.trigger {
                    Trigger::RisingEdge => Level::High,
                    _ => Level::Low,
                };
                callback(level);
            })?;
        Ok(())
    }

    fn unsubscribe(&mut self, pin: u8) -> Result<(), Self::Error> {
        self.input(pin)?.clear_async_interrupt()?;
        Ok(())
    }
}
