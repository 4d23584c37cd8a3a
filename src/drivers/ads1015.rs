//! ADS1015 12-bit ADC, fitted to the Explorer HAT Pro.
//!
//! Conversions are single-shot and single-ended: each read writes the config
//! register to start a conversion, polls the OS bit until the conversion is
//! done, then reads the conversion register.

use embedded_hal::i2c::I2c;

use crate::config::Gain;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

/// Start a conversion (write) / conversion idle (read).
const CONFIG_OS: u16 = 0x8000;
/// MUX base for single-ended AINx vs GND.
const CONFIG_MUX_SINGLE: u16 = 0x4000;
const CONFIG_MODE_SINGLE: u16 = 0x0100;
const CONFIG_RATE_1600SPS: u16 = 0x0080;
const CONFIG_COMP_DISABLE: u16 = 0x0003;

/// Status polls before taking whatever is in the conversion register.
const MAX_READY_POLLS: usize = 64;

/// ADS1015 driver.
///
/// Holds no bus handle; the bus is passed to each call so the ADC and the
/// touch controller can share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ads1015 {
    address: u8,
    gain: Gain,
}

impl Ads1015 {
    /// Creates a driver for the device at `address`.
    pub const fn new(address: u8, gain: Gain) -> Self {
        Self { address, gain }
    }

    /// I2C address of the device.
    #[inline]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Configured full-scale range.
    #[inline]
    pub const fn gain(&self) -> Gain {
        self.gain
    }

    /// Config register value that starts a conversion on `channel` (0-3).
    pub const fn config_for(&self, channel: u8) -> u16 {
        CONFIG_OS
            | (CONFIG_MUX_SINGLE + (((channel & 0x03) as u16) << 12))
            | self.gain.config_bits()
            | CONFIG_MODE_SINGLE
            | CONFIG_RATE_1600SPS
            | CONFIG_COMP_DISABLE
    }

    /// Converts a raw conversion register value to millivolts.
    ///
    /// The 12-bit result sits left-aligned in the register; negative
    /// readings (inputs below ground) are reported as 0.
    pub const fn raw_to_mv(&self, raw: u16) -> u16 {
        let value = (raw as i16) >> 4;
        if value <= 0 {
            return 0;
        }
        ((value as u32 * self.gain.full_scale_mv()) / 2048) as u16
    }

    /// Returns true if a device acknowledges at the configured address.
    pub fn probe<I: I2c>(&self, i2c: &mut I) -> bool {
        let mut buf = [0u8; 2];
        i2c.write_read(self.address, &[REG_CONFIG], &mut buf).is_ok()
    }

    /// Performs one single-shot conversion and returns the raw register.
    pub fn read_raw<I: I2c>(&self, i2c: &mut I, channel: u8) -> Result<u16, I::Error> {
        let config = self.config_for(channel);
        let [hi, lo] = config.to_be_bytes();
        i2c.write(self.address, &[REG_CONFIG, hi, lo])?;

        let mut buf = [0u8; 2];
        for _ in 0..MAX_READY_POLLS {
            i2c.write_read(self.address, &[REG_CONFIG], &mut buf)?;
            if u16::from_be_bytes(buf) & CONFIG_OS != 0 {
                break;
            }
        }

        i2c.write_read(self.address, &[REG_CONVERSION], &mut buf)?;
        let raw = u16::from_be_bytes(buf);
        tracing::trace!(address = self.address, channel, raw, "ads1015 conversion");
        Ok(raw)
    }

    /// Reads `channel` (0-3) in millivolts.
    pub fn read_mv<I: I2c>(&self, i2c: &mut I, channel: u8) -> Result<u16, I::Error> {
        self.read_raw(i2c, channel).map(|raw| self.raw_to_mv(raw))
    }
}
