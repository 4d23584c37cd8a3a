//! CAP1208 eight-channel capacitive touch controller.
//!
//! The sensor input status register holds one bit per input. Bits latch
//! until the interrupt flag in the main control register is cleared, after
//! which inputs that are still touched set their bit again.

use embedded_hal::i2c::I2c;

const REG_MAIN_CONTROL: u8 = 0x00;
const REG_INPUT_STATUS: u8 = 0x03;
const REG_REPEAT_RATE_ENABLE: u8 = 0x28;
const REG_MULTIPLE_TOUCH_CONFIG: u8 = 0x2A;
const REG_PRODUCT_ID: u8 = 0xFD;

/// Product id reported by a CAP1208.
pub const PRODUCT_ID: u8 = 0x6B;

const MAIN_CONTROL_INT: u8 = 0x01;
/// MULT_BLK_EN: limit simultaneous touches to one.
const MULTIPLE_TOUCH_BLOCK: u8 = 0x80;

/// CAP1208 driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cap1208 {
    address: u8,
}

impl Cap1208 {
    /// Creates a driver for the device at `address`.
    pub const fn new(address: u8) -> Self {
        Self { address }
    }

    /// I2C address of the device.
    #[inline]
    pub const fn address(&self) -> u8 {
        self.address
    }

    fn read_register<I: I2c>(&self, i2c: &mut I, register: u8) -> Result<u8, I::Error> {
        let mut buf = [0u8; 1];
        i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    fn write_register<I: I2c>(&self, i2c: &mut I, register: u8, value: u8) -> Result<(), I::Error> {
        i2c.write(self.address, &[register, value])
    }

    /// Reads the product id register.
    pub fn product_id<I: I2c>(&self, i2c: &mut I) -> Result<u8, I::Error> {
        self.read_register(i2c, REG_PRODUCT_ID)
    }

    /// Returns true if a CAP1208 answers at the configured address.
    pub fn probe<I: I2c>(&self, i2c: &mut I) -> bool {
        matches!(self.product_id(i2c), Ok(PRODUCT_ID))
    }

    /// Reads the input status bitmask and re-arms the interrupt latch.
    ///
    /// Bit `n` is set while input `n` is touched.
    pub fn read_inputs<I: I2c>(&self, i2c: &mut I) -> Result<u8, I::Error> {
        let status = self.read_register(i2c, REG_INPUT_STATUS)?;
        self.clear_interrupt(i2c)?;
        Ok(status)
    }

    /// Clears the INT bit of the main control register.
    pub fn clear_interrupt<I: I2c>(&self, i2c: &mut I) -> Result<(), I::Error> {
        let main = self.read_register(i2c, REG_MAIN_CONTROL)?;
        if main & MAIN_CONTROL_INT != 0 {
            self.write_register(i2c, REG_MAIN_CONTROL, main & !MAIN_CONTROL_INT)?;
        }
        Ok(())
    }

    /// Enables hardware repeat for the inputs in `mask`.
    ///
    /// Hold detection is done in software, so the HAT turns this off.
    pub fn set_repeat_enabled<I: I2c>(&self, i2c: &mut I, mask: u8) -> Result<(), I::Error> {
        self.write_register(i2c, REG_REPEAT_RATE_ENABLE, mask)
    }

    /// Allows (or blocks) more than one simultaneous touch.
    pub fn set_multitouch<I: I2c>(&self, i2c: &mut I, enabled: bool) -> Result<(), I::Error> {
        let config = self.read_register(i2c, REG_MULTIPLE_TOUCH_CONFIG)?;
        let config = if enabled {
            config & !MULTIPLE_TOUCH_BLOCK
        } else {
            config | MULTIPLE_TOUCH_BLOCK
        };
        tracing::debug!(address = self.address, enabled, "cap1208 multitouch");
        self.write_register(i2c, REG_MULTIPLE_TOUCH_CONFIG, config)
    }
}
