//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the GPIO backend and the I2C bus,
//! enabling development and testing on desktop without a HAT attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockGpio`] | [`Gpio`] | Tracks pin modes, levels, PWM and edge callbacks |
//! | [`MockI2c`] | [`I2c`] | Per-device register file with a write log |
//!
//! # Example
//!
//! ```rust
//! use explorer_hat::hal::{MockGpio, MockI2c};
//! use explorer_hat::{ExplorerHat, HatConfig, LightId};
//!
//! let mut hat = ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat_pro(), HatConfig::default()).unwrap();
//!
//! hat.light(LightId::Red).on().unwrap();
//!
//! // Verify via the mock
//! assert!(hat.gpio().level(27).unwrap().is_high());
//! ```
//!
//! [`Gpio`]: crate::traits::Gpio
//! [`I2c`]: embedded_hal::i2c::I2c

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;

use embedded_hal::i2c::{self, ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

use crate::config::{DEFAULT_ADC_ADDRESS, DEFAULT_TOUCH_ADDRESS};
use crate::traits::{Edge, EdgeCallback, Gpio, Level, Pull};

// ============================================================================
// GPIO Mock
// ============================================================================

/// Configured mode of a mock pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// Input with the given pull resistor.
    Input(Pull),
    /// Output.
    Output,
}

/// Software PWM running on a mock pin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pwm {
    /// Frequency in Hz.
    pub frequency_hz: f64,
    /// Duty cycle, 0.0 to 1.0.
    pub duty: f64,
}

/// Errors reported by [`MockGpio`].
///
/// They mirror what a real GPIO library raises for misuse of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MockGpioError {
    /// The pin was used before `setup_input`/`setup_output`.
    #[error("pin {0} has not been set up")]
    NotSetUp(u8),
    /// An output-only operation was used on an input.
    #[error("pin {0} is not an output")]
    NotOutput(u8),
    /// An input-only operation was used on an output.
    #[error("pin {0} is not an input")]
    NotInput(u8),
}

struct Subscription {
    edge: Edge,
    bounce_ms: u32,
    callback: EdgeCallback,
}

/// Mock GPIO backend for testing.
///
/// Records every pin operation. Use [`inject`](Self::inject) to drive an
/// input pin and fire its edge callback the way an interrupt would.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use explorer_hat::hal::MockGpio;
/// use explorer_hat::traits::{Edge, Gpio, Level, Pull};
///
/// let mut gpio = MockGpio::new();
/// gpio.setup_input(23, Pull::Down).unwrap();
///
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&fired);
/// gpio.subscribe(23, Edge::Rising, 0, Box::new(move |_| flag.store(true, Ordering::SeqCst)))
///     .unwrap();
///
/// assert!(gpio.inject(23, Level::High).unwrap());
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Default)]
pub struct MockGpio {
    modes: BTreeMap<u8, PinMode>,
    levels: BTreeMap<u8, Level>,
    pwm: BTreeMap<u8, Pwm>,
    subscriptions: BTreeMap<u8, Subscription>,
}

impl MockGpio {
    /// Creates a mock with no pins set up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode of `pin`, if it has been set up.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    /// Last level of `pin`, if it has been set up.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// PWM running on `pin`, if any.
    pub fn pwm(&self, pin: u8) -> Option<Pwm> {
        self.pwm.get(&pin).copied()
    }

    /// Edge and debounce of the callback registered on `pin`, if any.
    pub fn subscription(&self, pin: u8) -> Option<(Edge, u32)> {
        self.subscriptions
            .get(&pin)
            .map(|sub| (sub.edge, sub.bounce_ms))
    }

    /// Drive input `pin` to `level` from outside.
    ///
    /// Fires the registered callback when the level changes in the
    /// subscribed direction, and returns whether it fired.
    pub fn inject(&mut self, pin: u8, level: Level) -> Result<bool, MockGpioError> {
        self.expect_input(pin)?;
        let previous = self.levels.insert(pin, level);
        if previous == Some(level) {
            return Ok(false);
        }
        match self.subscriptions.get_mut(&pin) {
            Some(sub) if sub.edge.matches(level) => {
                (sub.callback)(level);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn expect_output(&self, pin: u8) -> Result<(), MockGpioError> {
        match self.modes.get(&pin) {
            Some(PinMode::Output) => Ok(()),
            Some(PinMode::Input(_)) => Err(MockGpioError::NotOutput(pin)),
            None => Err(MockGpioError::NotSetUp(pin)),
        }
    }

    fn expect_input(&self, pin: u8) -> Result<(), MockGpioError> {
        match self.modes.get(&pin) {
            Some(PinMode::Input(_)) => Ok(()),
            Some(PinMode::Output) => Err(MockGpioError::NotInput(pin)),
            None => Err(MockGpioError::NotSetUp(pin)),
        }
    }
}

impl fmt::Debug for MockGpio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockGpio")
            .field("modes", &self.modes)
            .field("levels", &self.levels)
            .field("pwm", &self.pwm)
            .field("subscribed", &self.subscriptions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Gpio for MockGpio {
    type Error = MockGpioError;

    fn setup_input(&mut self, pin: u8, pull: Pull) -> Result<(), MockGpioError> {
        self.modes.insert(pin, PinMode::Input(pull));
        self.levels.insert(pin, Level::from(pull == Pull::Up));
        self.pwm.remove(&pin);
        Ok(())
    }

    fn setup_output(&mut self, pin: u8, initial: Level) -> Result<(), MockGpioError> {
        self.modes.insert(pin, PinMode::Output);
        self.levels.insert(pin, initial);
        self.subscriptions.remove(&pin);
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, MockGpioError> {
        self.levels
            .get(&pin)
            .copied()
            .ok_or(MockGpioError::NotSetUp(pin))
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), MockGpioError> {
        self.expect_output(pin)?;
        self.levels.insert(pin, level);
        Ok(())
    }

    fn set_pwm(&mut self, pin: u8, frequency_hz: f64, duty: f64) -> Result<(), MockGpioError> {
        self.expect_output(pin)?;
        self.pwm.insert(
            pin,
            Pwm {
                frequency_hz,
                duty: duty.clamp(0.0, 1.0),
            },
        );
        Ok(())
    }

    fn clear_pwm(&mut self, pin: u8) -> Result<(), MockGpioError> {
        self.expect_output(pin)?;
        if self.pwm.remove(&pin).is_some() {
            self.levels.insert(pin, Level::Low);
        }
        Ok(())
    }

    fn subscribe(
        &mut self,
        pin: u8,
        edge: Edge,
        bounce_ms: u32,
        callback: EdgeCallback,
    ) -> Result<(), MockGpioError> {
        self.expect_input(pin)?;
        self.subscriptions.insert(
            pin,
            Subscription {
                edge,
                bounce_ms,
                callback,
            },
        );
        Ok(())
    }

    fn unsubscribe(&mut self, pin: u8) -> Result<(), MockGpioError> {
        self.expect_input(pin)?;
        self.subscriptions.remove(&pin);
        Ok(())
    }
}

// ============================================================================
// I2C Mock
// ============================================================================

/// Error reported by [`MockI2c`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MockI2cError {
    /// Nothing acknowledged the address.
    #[error("no device at address {0:#04x}")]
    NoDevice(u8),
}

impl i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            MockI2cError::NoDevice(_) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
        }
    }
}

/// Mock I2C bus for testing.
///
/// Each attached device is a register file. A write sets the register
/// pointer from its first byte and stores any remaining bytes as that
/// register's value; a read returns the value at the pointer, zero padded.
/// Register widths are whatever was stored, so 8-bit and 16-bit devices
/// both work.
///
/// # Example
///
/// ```rust
/// use embedded_hal::i2c::I2c;
/// use explorer_hat::hal::MockI2c;
///
/// let mut bus = MockI2c::new();
/// bus.add_device(0x28);
/// bus.set_register(0x28, 0x03, &[0b0000_0101]);
///
/// let mut status = [0u8; 1];
/// bus.write_read(0x28, &[0x03], &mut status).unwrap();
/// assert_eq!(status[0], 0b0000_0101);
///
/// assert!(bus.write(0x48, &[0x01, 0x00, 0x00]).is_err()); // nothing at 0x48
/// ```
#[derive(Debug, Default)]
pub struct MockI2c {
    devices: BTreeSet<u8>,
    pointers: BTreeMap<u8, u8>,
    registers: BTreeMap<(u8, u8), Vec<u8>>,
    writes: Vec<(u8, Vec<u8>)>,
}

impl MockI2c {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus with the CAP1208 of an Explorer HAT.
    pub fn explorer_hat() -> Self {
        let mut bus = Self::new();
        bus.add_device(DEFAULT_TOUCH_ADDRESS);
        bus.set_register(
            DEFAULT_TOUCH_ADDRESS,
            0xFD,
            &[crate::drivers::cap1208::PRODUCT_ID],
        );
        bus
    }

    /// A bus with the CAP1208 and ADS1015 of an Explorer HAT Pro.
    pub fn explorer_hat_pro() -> Self {
        let mut bus = Self::explorer_hat();
        bus.add_device(DEFAULT_ADC_ADDRESS);
        bus
    }

    /// Attach a device at `address`.
    pub fn add_device(&mut self, address: u8) {
        self.devices.insert(address);
    }

    /// Detach the device at `address`.
    pub fn remove_device(&mut self, address: u8) {
        self.devices.remove(&address);
    }

    /// Set the value of a register.
    pub fn set_register(&mut self, address: u8, register: u8, value: &[u8]) {
        self.registers.insert((address, register), value.to_vec());
    }

    /// Current value of a register.
    pub fn register(&self, address: u8, register: u8) -> Option<&[u8]> {
        self.registers
            .get(&(address, register))
            .map(Vec::as_slice)
    }

    /// Writes that carried data, as `(address, [register, data...])`.
    pub fn writes(&self) -> &[(u8, Vec<u8>)] {
        &self.writes
    }

    /// Forget all logged writes.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl i2c::I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if !self.devices.contains(&address) {
            return Err(MockI2cError::NoDevice(address));
        }

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((&register, data)) = bytes.split_first() {
                        self.pointers.insert(address, register);
                        if !data.is_empty() {
                            self.registers.insert((address, register), data.to_vec());
                            self.writes.push((address, bytes.to_vec()));
                        }
                    }
                }
                Operation::Read(buf) => {
                    let register = self.pointers.get(&address).copied().unwrap_or(0);
                    let value = self
                        .registers
                        .get(&(address, register))
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    for (i, byte) in buf.iter_mut().enumerate() {
                        *byte = value.get(i).copied().unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}
