//! Trait definitions for hardware abstraction.
//!
//! This module defines the abstractions that allow the Explorer HAT object
//! model to:
//! - Run on different backends (Raspberry Pi via rppal, desktop mock)
//! - Be tested without a board attached
//!
//! # Hardware Abstraction
//!
//! - [`Gpio`]: digital pins, software PWM and edge callbacks
//! - [`MotorController`]: one H-bridge motor channel
//!
//! I2C devices are driven through [`embedded_hal::i2c::I2c`].

pub mod hardware;

pub use hardware::*;
