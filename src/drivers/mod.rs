//! Drivers for the I2C chips on the board.
//!
//! Both drivers are generic over [`embedded_hal::i2c::I2c`] and take the bus
//! per call, so a single bus handle serves both chips.

pub mod ads1015;
pub mod cap1208;

pub use ads1015::Ads1015;
pub use cap1208::Cap1208;
