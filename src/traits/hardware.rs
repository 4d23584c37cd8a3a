//! Hardware abstraction traits for GPIO pins and motor drivers.
//!
//! This module defines the interfaces that let the Explorer HAT object model
//! run against different backends (Raspberry Pi GPIO, desktop mocks, etc.).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Gpio`] | Pin setup, digital read/write, software PWM, edge callbacks |
//! | [`MotorController`] | Speed and direction of one H-bridge channel |
//!
//! I2C peripherals (the ADC and the touch controller) use
//! [`embedded_hal::i2c::I2c`] directly, so any HAL bus can drive them.
//!
//! # Example
//!
//! ```rust
//! use explorer_hat::traits::{Gpio, Level, Pull};
//! use explorer_hat::hal::MockGpio;
//!
//! let mut gpio = MockGpio::new();
//! gpio.setup_output(6, Level::Low).unwrap();
//! gpio.write(6, Level::High).unwrap();
//! assert_eq!(gpio.read(6).unwrap(), Level::High);
//!
//! gpio.setup_input(23, Pull::Down).unwrap();
//! assert_eq!(gpio.read(23).unwrap(), Level::Low);
//! ```

use alloc::boxed::Box;

/// Logic level of a digital pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// 0V.
    #[default]
    Low,
    /// 3.3V.
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`].
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Returns the opposite level.
    #[inline]
    pub const fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Internal pull resistor configuration for an input pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Pull {
    /// Floating input.
    Off,
    /// Pulled up to 3.3V.
    Up,
    /// Pulled down to ground.
    #[default]
    Down,
}

/// Which signal transitions trigger an edge callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
    /// Either transition.
    Both,
}

impl Edge {
    /// Returns true if a transition to `level` should fire this edge.
    ///
    /// ```
    /// use explorer_hat::traits::{Edge, Level};
    ///
    /// assert!(Edge::Rising.matches(Level::High));
    /// assert!(!Edge::Rising.matches(Level::Low));
    /// assert!(Edge::Both.matches(Level::Low));
    /// ```
    pub const fn matches(self, level: Level) -> bool {
        match self {
            Edge::Rising => level.is_high(),
            Edge::Falling => !level.is_high(),
            Edge::Both => true,
        }
    }
}

/// Callback invoked by a [`Gpio`] backend with the new pin level.
///
/// Backends may call this from their own interrupt thread, hence `Send`.
pub type EdgeCallback = Box<dyn FnMut(Level) + Send + 'static>;

/// GPIO backend trait - abstracts the Raspberry Pi GPIO peripheral.
///
/// Pins are addressed by BCM number. Backends own the per-pin handles and
/// create them lazily in `setup_*`.
///
/// # Implementation Notes
///
/// - A pin must be set up before it is read or written
/// - `set_pwm` starts (or retunes) software PWM; `clear_pwm` stops it and
///   leaves the pin low
/// - Only one edge subscription exists per pin; subscribing again replaces
///   the previous callback
pub trait Gpio {
    /// Error type for GPIO operations.
    type Error: core::fmt::Debug;

    /// Configure `pin` as an input with the given pull resistor.
    fn setup_input(&mut self, pin: u8, pull: Pull) -> Result<(), Self::Error>;

    /// Configure `pin` as an output driven to `initial`.
    fn setup_output(&mut self, pin: u8, initial: Level) -> Result<(), Self::Error>;

    /// Read the current level of an input or output pin.
    fn read(&mut self, pin: u8) -> Result<Level, Self::Error>;

    /// Drive an output pin.
    fn write(&mut self, pin: u8, level: Level) -> Result<(), Self::Error>;

    /// Start software PWM on an output pin.
    ///
    /// `duty` is clamped to 0.0-1.0.
    fn set_pwm(&mut self, pin: u8, frequency_hz: f64, duty: f64) -> Result<(), Self::Error>;

    /// Stop software PWM on an output pin.
    fn clear_pwm(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Register `callback` for `edge` transitions on an input pin.
    ///
    /// `bounce_ms` is handed to the backend's debounce; 0 disables it.
    fn subscribe(
        &mut self,
        pin: u8,
        edge: Edge,
        bounce_ms: u32,
        callback: EdgeCallback,
    ) -> Result<(), Self::Error>;

    /// Remove any edge callback from `pin`.
    fn unsubscribe(&mut self, pin: u8) -> Result<(), Self::Error>;
}

/// Direction of motor rotation.
///
/// Controls which half of the H-bridge is driven.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Driven through the forward pin.
    Forward,
    /// Driven through the backward pin.
    Reverse,
    /// Both pins low.
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use explorer_hat::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Stopped => "stopped",
        }
    }

    /// Returns the opposite direction. `Stopped` stays stopped.
    #[inline]
    pub const fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
            Direction::Stopped => Direction::Stopped,
        }
    }
}

/// Motor controller trait - abstracts PWM-based DC motor control.
///
/// Speed is the PWM duty cycle applied to the pin selected by the direction.
///
/// # Implementation Notes
///
/// - Speed should be clamped to 0.0-1.0 before applying to PWM
/// - `Stopped` drives both bridge inputs low regardless of speed
pub trait MotorController {
    /// Error type for motor operations.
    type Error;

    /// Set speed as 0.0 to 1.0 (fraction of full duty).
    ///
    /// Values outside this range should be clamped.
    fn set_speed(&mut self, speed: f32) -> Result<(), Self::Error>;

    /// Set direction of rotation.
    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error>;

    /// Convenience method to stop the motor.
    ///
    /// Sets speed to 0 and direction to [`Direction::Stopped`].
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.set_speed(0.0)?;
        self.set_direction(Direction::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_from_bool() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert_eq!(Level::High.inverted(), Level::Low);
        assert_eq!(Level::default(), Level::Low);
    }

    #[test]
    fn edge_matching() {
        assert!(Edge::Falling.matches(Level::Low));
        assert!(!Edge::Falling.matches(Level::High));
        assert!(Edge::Both.matches(Level::High));
    }

    // =========================================================================
    // Direction Tests
    // =========================================================================

    #[test]
    fn direction_default() {
        assert_eq!(Direction::default(), Direction::Stopped);
    }

    #[test]
    fn direction_reversed() {
        assert_eq!(Direction::Forward.reversed(), Direction::Reverse);
        assert_eq!(Direction::Reverse.reversed(), Direction::Forward);
        assert_eq!(Direction::Stopped.reversed(), Direction::Stopped);
    }

    // =========================================================================
    // MotorController Default Methods Tests
    // =========================================================================

    struct TestMotor {
        speed: f32,
        direction: Direction,
    }

    impl MotorController for TestMotor {
        type Error = ();

        fn set_speed(&mut self, speed: f32) -> Result<(), ()> {
            self.speed = speed;
            Ok(())
        }

        fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
            self.direction = dir;
            Ok(())
        }
    }

    #[test]
    fn motor_controller_stop_default_impl() {
        let mut motor = TestMotor {
            speed: 0.7,
            direction: Direction::Forward,
        };

        motor.stop().unwrap();

        assert_eq!(motor.speed, 0.0);
        assert_eq!(motor.direction, Direction::Stopped);
    }
}
