//! H-bridge motor channels (Explorer HAT Pro).
//!
//! Each motor has a forward and a backward pin. Speed is the software PWM
//! duty on the pin selected by the direction; the other pin is held low.
//!
//! ```rust
//! use explorer_hat::hal::{MockGpio, MockI2c};
//! use explorer_hat::{ExplorerHat, HatConfig, MotorId};
//!
//! let mut hat = ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat_pro(), HatConfig::default()).unwrap();
//!
//! let mut motor = hat.motor(MotorId::One).unwrap();
//! motor.forward(50.0).unwrap();
//! assert_eq!(motor.current_speed(), 50.0);
//!
//! motor.speed(-25.0).unwrap();
//! assert_eq!(motor.current_speed(), -25.0);
//! ```

use crate::pins::{MotorId, MotorPins};
use crate::traits::{Direction, Gpio, Level, MotorController};

fn magnitude(value: f32) -> f32 {
    if value < 0.0 {
        -value
    } else {
        value
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MotorState {
    /// 0.0 to 1.0
    speed: f32,
    direction: Direction,
    inverted: bool,
}

/// Handle to one motor channel.
pub struct Motor<'a, G: Gpio> {
    gpio: &'a mut G,
    id: MotorId,
    pins: MotorPins,
    state: &'a mut MotorState,
    pwm_frequency_hz: f64,
}

impl<'a, G: Gpio> Motor<'a, G> {
    pub(crate) fn new(
        gpio: &'a mut G,
        id: MotorId,
        pins: MotorPins,
        state: &'a mut MotorState,
        pwm_frequency_hz: f64,
    ) -> Self {
        Self {
            gpio,
            id,
            pins,
            state,
            pwm_frequency_hz,
        }
    }

    /// Which motor this handle drives.
    #[inline]
    pub fn id(&self) -> MotorId {
        self.id
    }

    /// Forward and backward pins.
    #[inline]
    pub fn pins(&self) -> MotorPins {
        self.pins
    }

    /// Signed speed in percent, -100.0 to 100.0.
    pub fn current_speed(&self) -> f32 {
        let magnitude = self.state.speed * 100.0;
        match self.state.direction {
            Direction::Forward => magnitude,
            Direction::Reverse => -magnitude,
            Direction::Stopped => 0.0,
        }
    }

    /// Current direction, before inversion.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    /// True if forward and backward are swapped.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.state.inverted
    }

    /// Run forward at `percent` (0 to 100).
    pub fn forward(&mut self, percent: f32) -> Result<(), G::Error> {
        self.speed(magnitude(percent))
    }

    /// Run backward at `percent` (0 to 100).
    pub fn backward(&mut self, percent: f32) -> Result<(), G::Error> {
        self.speed(-magnitude(percent))
    }

    /// Run at a signed speed, -100 (full backward) to 100 (full forward).
    pub fn speed(&mut self, percent: f32) -> Result<(), G::Error> {
        let percent = percent.clamp(-100.0, 100.0);
        self.state.speed = magnitude(percent) / 100.0;
        self.state.direction = if percent > 0.0 {
            Direction::Forward
        } else if percent < 0.0 {
            Direction::Reverse
        } else {
            Direction::Stopped
        };
        self.apply()
    }

    /// Swap forward and backward, for motors wired the other way round.
    pub fn invert(&mut self) -> Result<(), G::Error> {
        self.state.inverted = !self.state.inverted;
        self.apply()
    }

    fn apply(&mut self) -> Result<(), G::Error> {
        let direction = if self.state.inverted {
            self.state.direction.reversed()
        } else {
            self.state.direction
        };
        let duty = f64::from(self.state.speed);

        match direction {
            Direction::Forward if duty > 0.0 => {
                self.release(self.pins.backward)?;
                self.gpio
                    .set_pwm(self.pins.forward, self.pwm_frequency_hz, duty)?;
            }
            Direction::Reverse if duty > 0.0 => {
                self.release(self.pins.forward)?;
                self.gpio
                    .set_pwm(self.pins.backward, self.pwm_frequency_hz, duty)?;
            }
            _ => {
                self.release(self.pins.forward)?;
                self.release(self.pins.backward)?;
            }
        }

        tracing::debug!(
            motor = %self.id,
            direction = direction.as_str(),
            duty,
            "motor"
        );
        Ok(())
    }

    fn release(&mut self, pin: u8) -> Result<(), G::Error> {
        self.gpio.clear_pwm(pin)?;
        self.gpio.write(pin, Level::Low)
    }
}

impl<G: Gpio> MotorController for Motor<'_, G> {
    type Error = G::Error;

    fn set_speed(&mut self, speed: f32) -> Result<(), Self::Error> {
        self.state.speed = speed.clamp(0.0, 1.0);
        self.apply()
    }

    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error> {
        self.state.direction = dir;
        self.apply()
    }
}
