//! Static name to pin mapping for the Explorer HAT.
//!
//! Every feature on the board is addressed by a small id type ([`InputId`],
//! [`LightId`], [`TouchId`], ...). Ids parse from friendly text (`"one"`,
//! `"1"`, `"blue"`), and a [`Channel`] parses a dotted name such as
//! `"input.1"` or `"motor.one"`. [`PinMap`] translates a channel into BCM
//! GPIO numbers (or ADC / touch controller inputs).
//!
//! # Example
//!
//! ```rust
//! use explorer_hat::pins::{Channel, InputId, LightId, PinMap};
//!
//! let map = PinMap::default();
//!
//! let ch: Channel = "input.1".parse().unwrap();
//! assert_eq!(ch, Channel::Input(InputId::One));
//! assert_eq!(map.gpio_pins(ch).as_slice(), &[23]);
//!
//! assert_eq!(map.light("blue".parse::<LightId>().unwrap()), 4);
//! assert_eq!(map.resolve("motor.two").unwrap().as_slice(), &[26, 21]);
//! ```

use core::fmt;
use core::str::FromStr;

use heapless::Vec as HVec;

/// Error returned when a friendly name cannot be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseNameError {
    /// The text was not of the form `<collection>.<member>`.
    #[error("expected a name of the form <collection>.<member>")]
    Malformed,
    /// The collection part did not name a feature of the board.
    #[error("unknown collection")]
    UnknownCollection,
    /// The member part did not name an item of the collection.
    #[error("unknown member of {collection}")]
    UnknownMember {
        /// Collection that was being searched.
        collection: &'static str,
    },
}

const NUMBER_WORDS: [&str; 8] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight",
];

/// Index (0-based) of a member named `"one"`..`"eight"` or `"1"`..`"8"`.
fn member_index(s: &str, count: usize) -> Option<usize> {
    let s = s.trim();
    let index = NUMBER_WORDS
        .iter()
        .position(|word| s.eq_ignore_ascii_case(word))
        .or_else(|| s.parse::<usize>().ok().and_then(|n| n.checked_sub(1)))?;
    (index < count).then_some(index)
}

macro_rules! numbered_id {
    ($(#[$meta:meta])* $name:ident, $collection:literal, [$($variant:ident),+]) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant,
            )+
        }

        impl $name {
            /// All members in board order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Collection name used in dotted friendly names.
            pub const COLLECTION: &'static str = $collection;

            /// 0-based position in [`Self::ALL`].
            #[inline]
            pub fn index(self) -> usize {
                self as usize
            }

            /// Member at 0-based `index`.
            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }
        }

        impl FromStr for $name {
            type Err = ParseNameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                member_index(s, Self::ALL.len())
                    .and_then(Self::from_index)
                    .ok_or(ParseNameError::UnknownMember {
                        collection: $collection,
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}", $collection, NUMBER_WORDS[self.index()])
            }
        }
    };
}

numbered_id!(
    /// Buffered 5V digital input.
    InputId, "input", [One, Two, Three, Four]
);
numbered_id!(
    /// Darlington-driven digital output.
    OutputId, "output", [One, Two, Three, Four]
);
numbered_id!(
    /// ADS1015 analog input (Explorer HAT Pro only).
    AnalogId, "analog", [One, Two, Three, Four]
);
numbered_id!(
    /// CAP1208 capacitive touch pad. One to four are the numbered pads,
    /// five to eight are the crocodile-clip pads.
    TouchId, "touch", [One, Two, Three, Four, Five, Six, Seven, Eight]
);
numbered_id!(
    /// H-bridge motor channel (Explorer HAT Pro only).
    MotorId, "motor", [One, Two]
);

/// Indicator LED, addressable by colour or by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LightId {
    /// Light one.
    Blue,
    /// Light two.
    Yellow,
    /// Light three.
    Red,
    /// Light four.
    Green,
}

impl LightId {
    /// All lights in board order.
    pub const ALL: &'static [LightId] = &[
        LightId::Blue,
        LightId::Yellow,
        LightId::Red,
        LightId::Green,
    ];

    /// Collection name used in dotted friendly names.
    pub const COLLECTION: &'static str = "light";

    /// 0-based position in [`Self::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Light at 0-based `index`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Colour name.
    pub const fn colour(self) -> &'static str {
        match self {
            LightId::Blue => "blue",
            LightId::Yellow => "yellow",
            LightId::Red => "red",
            LightId::Green => "green",
        }
    }
}

impl FromStr for LightId {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|light| trimmed.eq_ignore_ascii_case(light.colour()))
            .or_else(|| member_index(trimmed, Self::ALL.len()).and_then(Self::from_index))
            .ok_or(ParseNameError::UnknownMember {
                collection: Self::COLLECTION,
            })
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "light.{}", self.colour())
    }
}

/// Any addressable feature of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Digital input.
    Input(InputId),
    /// Digital output.
    Output(OutputId),
    /// Indicator light.
    Light(LightId),
    /// Analog input.
    Analog(AnalogId),
    /// Touch pad.
    Touch(TouchId),
    /// Motor channel.
    Motor(MotorId),
}

impl FromStr for Channel {
    type Err = ParseNameError;

    /// Parse `"<collection>.<member>"`, e.g. `"input.1"` or `"light.red"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (collection, member) = s.trim().split_once('.').ok_or(ParseNameError::Malformed)?;
        let collection = collection.trim();
        let is = |name: &str| collection.eq_ignore_ascii_case(name);

        if is(InputId::COLLECTION) {
            member.parse().map(Channel::Input)
        } else if is(OutputId::COLLECTION) {
            member.parse().map(Channel::Output)
        } else if is(LightId::COLLECTION) {
            member.parse().map(Channel::Light)
        } else if is(AnalogId::COLLECTION) {
            member.parse().map(Channel::Analog)
        } else if is(TouchId::COLLECTION) {
            member.parse().map(Channel::Touch)
        } else if is(MotorId::COLLECTION) {
            member.parse().map(Channel::Motor)
        } else {
            Err(ParseNameError::UnknownCollection)
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Input(id) => fmt::Display::fmt(id, f),
            Channel::Output(id) => fmt::Display::fmt(id, f),
            Channel::Light(id) => fmt::Display::fmt(id, f),
            Channel::Analog(id) => fmt::Display::fmt(id, f),
            Channel::Touch(id) => fmt::Display::fmt(id, f),
            Channel::Motor(id) => fmt::Display::fmt(id, f),
        }
    }
}

/// The two H-bridge inputs of one motor channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorPins {
    /// Driven when turning forward.
    pub forward: u8,
    /// Driven when turning backward.
    pub backward: u8,
}

/// Name to pin mapping, fixed once the HAT is constructed.
///
/// GPIO numbers use BCM numbering. Analog and touch entries are input
/// numbers on the ADS1015 and CAP1208 respectively.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinMap {
    /// Digital inputs one to four.
    pub inputs: [u8; 4],
    /// Digital outputs one to four.
    pub outputs: [u8; 4],
    /// Lights blue, yellow, red, green.
    pub lights: [u8; 4],
    /// Motors one and two.
    pub motors: [MotorPins; 2],
    /// ADS1015 input for analog one to four.
    pub analog_channels: [u8; 4],
    /// CAP1208 input for touch pads one to eight.
    pub touch_channels: [u8; 8],
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            inputs: [23, 22, 24, 25],
            outputs: [6, 12, 13, 16],
            lights: [4, 17, 27, 5],
            motors: [
                MotorPins {
                    forward: 20,
                    backward: 19,
                },
                MotorPins {
                    forward: 26,
                    backward: 21,
                },
            ],
            analog_channels: [3, 2, 1, 0],
            touch_channels: [4, 5, 6, 7, 0, 1, 2, 3],
        }
    }
}

impl PinMap {
    /// BCM pin of a digital input.
    #[inline]
    pub fn input(&self, id: InputId) -> u8 {
        self.inputs[id.index()]
    }

    /// BCM pin of a digital output.
    #[inline]
    pub fn output(&self, id: OutputId) -> u8 {
        self.outputs[id.index()]
    }

    /// BCM pin of a light.
    #[inline]
    pub fn light(&self, id: LightId) -> u8 {
        self.lights[id.index()]
    }

    /// BCM pins of a motor channel.
    #[inline]
    pub fn motor(&self, id: MotorId) -> MotorPins {
        self.motors[id.index()]
    }

    /// ADS1015 input of an analog channel.
    #[inline]
    pub fn analog(&self, id: AnalogId) -> u8 {
        self.analog_channels[id.index()]
    }

    /// CAP1208 input of a touch pad.
    #[inline]
    pub fn touch(&self, id: TouchId) -> u8 {
        self.touch_channels[id.index()]
    }

    /// Touch pad wired to CAP1208 input `cap_input`, if any.
    pub fn touch_pad(&self, cap_input: u8) -> Option<TouchId> {
        self.touch_channels
            .iter()
            .position(|&ch| ch == cap_input)
            .and_then(TouchId::from_index)
    }

    /// BCM pins used by a channel.
    ///
    /// Motors return their forward then backward pin. Analog and touch
    /// channels sit behind I2C and use no GPIO pin.
    pub fn gpio_pins(&self, channel: Channel) -> HVec<u8, 2> {
        let mut pins = HVec::new();
        // Capacity 2 always fits.
        let _ = match channel {
            Channel::Input(id) => pins.extend_from_slice(&[self.input(id)]),
            Channel::Output(id) => pins.extend_from_slice(&[self.output(id)]),
            Channel::Light(id) => pins.extend_from_slice(&[self.light(id)]),
            Channel::Motor(id) => {
                let motor = self.motor(id);
                pins.extend_from_slice(&[motor.forward, motor.backward])
            }
            Channel::Analog(_) | Channel::Touch(_) => Ok(()),
        };
        pins
    }

    /// Parse a friendly name and return its BCM pins.
    pub fn resolve(&self, name: &str) -> Result<HVec<u8, 2>, ParseNameError> {
        name.parse().map(|channel| self.gpio_pins(channel))
    }
}
