//! # explorer-hat
//!
//! Driver for the Explorer HAT and Explorer HAT Pro Raspberry Pi add-on
//! boards.
//!
//! ## Features
//!
//! - **Named channels**: inputs, outputs, lights, touch pads, analog inputs
//!   and motors addressed as `input.one`, `light.red`, `motor.2`...
//! - **Board detection**: the Pro's ADC is probed at startup; Pro-only
//!   features report [`Error::NotFitted`] on the basic board
//! - **Blink and brightness**: outputs and lights driven by software PWM
//! - **Event callbacks**: input edges from the GPIO backend, touch
//!   press/release/held from [`ExplorerHat::poll`]
//! - **Hardware abstraction**: runs against mock backends on the desktop
//!
//! ## Architecture
//!
//! - `traits` - GPIO and motor abstractions
//! - `pins` - Channel names and the BCM pin map
//! - `drivers` - ADS1015 ADC and CAP1208 touch controller over `embedded-hal` I2C
//! - `hat` - The [`ExplorerHat`] object model
//! - `hal` - Concrete backends (mock for testing, rppal for the Raspberry Pi)
//!
//! ## Example
//!
//! ```rust
//! use explorer_hat::{
//!     hal::{MockGpio, MockI2c},
//!     ExplorerHat, HatConfig, LightId, OutputId, TouchId,
//! };
//!
//! let mut hat = ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat(), HatConfig::default()).unwrap();
//!
//! // Steady, blinking and dimmed outputs
//! hat.light(LightId::Red).on().unwrap();
//! hat.light(LightId::Green).blink(500, 500).unwrap();
//! hat.output(OutputId::One).brightness(0.25).unwrap();
//!
//! // Touch callbacks run from poll()
//! hat.touch_pad(TouchId::Five).pressed(|event| println!("{} pressed", event.pad));
//!
//! // Update in your main loop
//! hat.poll(20).unwrap(); // 20ms tick
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Board configuration and runtime settings.
pub mod config;
/// Drivers for the I2C chips on the board.
pub mod drivers;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// The Explorer HAT object model.
pub mod hat;
/// Digital input and output handles.
pub mod io;
/// Motor channel handles.
pub mod motor;
/// Channel names and the pin map.
pub mod pins;
/// Touch event tracking.
pub mod touch;
/// Core traits for hardware abstraction.
pub mod traits;

/// Package metadata and version derivation (std only).
#[cfg(feature = "metadata")]
pub mod metadata;

// Re-exports for convenience
pub use config::{Gain, HatConfig, Settings};
pub use hat::{Analog, Board, Error, ExplorerHat, HatError, TouchPads};
pub use io::{DigitalOut, Input, OutputMode};
pub use motor::Motor;
pub use pins::{
    AnalogId, Channel, InputId, LightId, MotorId, MotorPins, OutputId, ParseNameError, PinMap,
    TouchId,
};
pub use touch::{TouchEvent, TouchEventKind, TouchEvents};
pub use traits::{Direction, Edge, Gpio, Level, MotorController, Pull};
