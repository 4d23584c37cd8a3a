//! Board configuration and runtime settings.
//!
//! [`HatConfig`] fixes the wiring (pin map, I2C addresses, ADC range) when the
//! HAT is constructed. [`Settings`] holds the knobs that can change while the
//! HAT is running.
//!
//! # Example
//!
//! ```rust
//! use explorer_hat::config::{Gain, HatConfig, Settings};
//!
//! // Use defaults
//! let config = HatConfig::default();
//! assert_eq!(config.adc_address, 0x48);
//!
//! // Or customize
//! let config = HatConfig::default()
//!     .with_adc_gain(Gain::Mv4096)
//!     .with_settings(Settings::default().with_bounce_ms(10));
//! assert_eq!(config.settings.bounce_ms, 10);
//! ```

use crate::pins::PinMap;

/// Default I2C address of the ADS1015 on the Explorer HAT Pro.
pub const DEFAULT_ADC_ADDRESS: u8 = 0x48;

/// Default I2C address of the CAP1208 touch controller.
pub const DEFAULT_TOUCH_ADDRESS: u8 = 0x28;

// ============================================================================
// ADC Gain
// ============================================================================

/// ADS1015 programmable gain, named by full-scale range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gain {
    /// ±6.144V, covers the board's 5V analog inputs.
    #[default]
    Mv6144,
    /// ±4.096V
    Mv4096,
    /// ±2.048V
    Mv2048,
    /// ±1.024V
    Mv1024,
    /// ±0.512V
    Mv512,
    /// ±0.256V
    Mv256,
}

impl Gain {
    /// Full-scale range in millivolts.
    pub const fn full_scale_mv(self) -> u32 {
        match self {
            Gain::Mv6144 => 6144,
            Gain::Mv4096 => 4096,
            Gain::Mv2048 => 2048,
            Gain::Mv1024 => 1024,
            Gain::Mv512 => 512,
            Gain::Mv256 => 256,
        }
    }

    /// PGA field of the ADS1015 config register.
    pub const fn config_bits(self) -> u16 {
        match self {
            Gain::Mv6144 => 0x0000,
            Gain::Mv4096 => 0x0200,
            Gain::Mv2048 => 0x0400,
            Gain::Mv1024 => 0x0600,
            Gain::Mv512 => 0x0800,
            Gain::Mv256 => 0x0A00,
        }
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete board configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HatConfig {
    /// Name to pin mapping
    pub pins: PinMap,
    /// I2C address of the ADS1015 ADC
    pub adc_address: u8,
    /// I2C address of the CAP1208 touch controller
    pub touch_address: u8,
    /// ADC full-scale range
    pub adc_gain: Gain,
    /// Runtime settings applied at startup
    pub settings: Settings,
}

impl Default for HatConfig {
    fn default() -> Self {
        Self {
            pins: PinMap::default(),
            adc_address: DEFAULT_ADC_ADDRESS,
            touch_address: DEFAULT_TOUCH_ADDRESS,
            adc_gain: Gain::default(),
            settings: Settings::default(),
        }
    }
}

impl HatConfig {
    /// Set the pin map
    pub fn with_pins(mut self, pins: PinMap) -> Self {
        self.pins = pins;
        self
    }

    /// Set the runtime settings
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the ADC I2C address
    pub fn with_adc_address(mut self, address: u8) -> Self {
        self.adc_address = address;
        self
    }

    /// Set the touch controller I2C address
    pub fn with_touch_address(mut self, address: u8) -> Self {
        self.touch_address = address;
        self
    }

    /// Set the ADC full-scale range
    pub fn with_adc_gain(mut self, gain: Gain) -> Self {
        self.adc_gain = gain;
        self
    }
}

// ============================================================================
// Runtime Settings
// ============================================================================

/// Settings that may be changed while the HAT is in use.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Debounce handed to the GPIO backend for input callbacks
    pub bounce_ms: u32,
    /// Software PWM frequency for brightness and motor speed
    pub pwm_frequency_hz: f64,
    /// How long a pad must be held before the first `Held` event
    pub touch_hold_ms: u64,
    /// Interval between repeated `Held` events
    pub touch_repeat_ms: u64,
    /// Allow several pads to report touches at once
    pub multitouch: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bounce_ms: 50,
            pwm_frequency_hz: 100.0,
            touch_hold_ms: 500,
            touch_repeat_ms: 200,
            multitouch: true,
        }
    }
}

impl Settings {
    /// Set the input debounce
    pub fn with_bounce_ms(mut self, ms: u32) -> Self {
        self.bounce_ms = ms;
        self
    }

    /// Set the PWM frequency
    pub fn with_pwm_frequency(mut self, hz: f64) -> Self {
        self.pwm_frequency_hz = hz;
        self
    }

    /// Set touch hold timing
    pub fn with_touch_hold(mut self, hold_ms: u64, repeat_ms: u64) -> Self {
        self.touch_hold_ms = hold_ms;
        self.touch_repeat_ms = repeat_ms;
        self
    }

    /// Enable or disable multitouch
    pub fn with_multitouch(mut self, enabled: bool) -> Self {
        self.multitouch = enabled;
        self
    }
}
