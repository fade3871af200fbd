//! GPIO pin vocabulary and platform abstractions
//!
//! Pins are named by [`PinId`] and handed to the platform as opaque
//! [`EncodedPin`] words produced by a [`PinEncoder`]. The platform only
//! ever sees encoded words, so the same table-building code can run against
//! the chip register layer or a host mock.

use core::fmt;

/// Number of pins per GPIO port
pub const PINS_PER_PORT: u8 = 16;

/// GPIO port letter
///
/// Only ports A-H are bonded out on this part family. Ports I/J/K exist on
/// larger packages but are rejected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl Port {
    /// All supported ports, in register order
    pub const ALL: [Port; 8] = [
        Port::A,
        Port::B,
        Port::C,
        Port::D,
        Port::E,
        Port::F,
        Port::G,
        Port::H,
    ];

    /// Look up a port by its upper-case ASCII letter
    pub const fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'A' => Some(Port::A),
            b'B' => Some(Port::B),
            b'C' => Some(Port::C),
            b'D' => Some(Port::D),
            b'E' => Some(Port::E),
            b'F' => Some(Port::F),
            b'G' => Some(Port::G),
            b'H' => Some(Port::H),
            _ => None,
        }
    }

    /// Look up a port by register index (A = 0)
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < Self::ALL.len() {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Register index of this port (A = 0)
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Port letter
    pub const fn letter(self) -> char {
        (b'A' + self as u8) as char
    }
}

/// Physical pin identifier
///
/// Invariant: `number < PINS_PER_PORT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    port: Port,
    number: u8,
}

impl PinId {
    /// Create a pin identifier, returning `None` if `number` is not 0-15
    pub const fn new(port: Port, number: u8) -> Option<Self> {
        if number < PINS_PER_PORT {
            Some(Self { port, number })
        } else {
            None
        }
    }

    /// Port this pin belongs to
    pub const fn port(self) -> Port {
        self.port
    }

    /// Pin number within the port (0-15)
    pub const fn number(self) -> u8 {
        self.number
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.number)
    }
}

/// Logic level on a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Low (logic 0)
    Low,
    /// High (logic 1)
    High,
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

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        matches!(level, Level::High)
    }
}

/// Output driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drive {
    /// Push-pull output
    PushPull,
    /// Open-drain output
    OpenDrain,
}

/// Output slew-rate setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// Low speed (~2 MHz)
    Low,
    /// Medium speed (~25 MHz)
    Medium,
    /// High speed (~50 MHz)
    High,
    /// Very high speed (~100 MHz)
    VeryHigh,
}

/// Input bias resistor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// No pull resistor
    Floating,
    /// Internal pull-up
    Up,
    /// Internal pull-down
    Down,
}

/// Electrical role a pin is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    /// Driven output
    Output {
        /// Driver type
        drive: Drive,
        /// Slew rate
        speed: Speed,
        /// Level driven when the pin is first configured
        initial: Level,
    },
    /// Sampled input
    Input {
        /// Bias resistor
        pull: Pull,
        /// Pin is routed to the external interrupt controller
        interrupt: bool,
    },
}

impl PinRole {
    /// Chip-select line: push-pull, 50 MHz, idles high (deasserted)
    pub const fn chip_select() -> Self {
        PinRole::Output {
            drive: Drive::PushPull,
            speed: Speed::High,
            initial: Level::High,
        }
    }

    /// Button input: floating, interrupt-capable
    pub const fn button() -> Self {
        PinRole::Input {
            pull: Pull::Floating,
            interrupt: true,
        }
    }

    /// Check if this role drives the pin
    pub const fn is_output(&self) -> bool {
        matches!(self, PinRole::Output { .. })
    }
}

/// Opaque platform pin-configuration word
///
/// Produced by a [`PinEncoder`]. Callers may compare encoded pins for
/// equality but must not interpret the bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodedPin(u32);

impl EncodedPin {
    /// Wrap a raw platform word
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw platform word
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Combines a pin identifier with an electrical role
///
/// Implementations must be total and pure for every valid [`PinId`].
pub trait PinEncoder {
    /// Encode `pin` configured for `role`
    fn encode(&self, pin: PinId, role: PinRole) -> EncodedPin;
}

impl<T: PinEncoder + ?Sized> PinEncoder for &T {
    fn encode(&self, pin: PinId, role: PinRole) -> EncodedPin {
        (**self).encode(pin, role)
    }
}

/// Platform GPIO primitives operating on encoded pins
///
/// Implementations handle the actual register manipulation for the
/// specific chip.
pub trait GpioPlatform {
    /// Error type for pin configuration
    type Error;

    /// Apply the full configuration carried by `pin` (mode, pull, speed,
    /// initial level)
    fn configure(&mut self, pin: EncodedPin) -> Result<(), Self::Error>;

    /// Drive an output pin to a level
    fn write(&mut self, pin: EncodedPin, high: bool);

    /// Sample the current level of a pin
    fn read(&self, pin: EncodedPin) -> bool;

    /// Set the pin high (logic 1)
    fn set_high(&mut self, pin: EncodedPin) {
        self.write(pin, true);
    }

    /// Set the pin low (logic 0)
    fn set_low(&mut self, pin: EncodedPin) {
        self.write(pin, false);
    }
}

impl<T: GpioPlatform + ?Sized> GpioPlatform for &mut T {
    type Error = T::Error;

    fn configure(&mut self, pin: EncodedPin) -> Result<(), Self::Error> {
        (**self).configure(pin)
    }

    fn write(&mut self, pin: EncodedPin, high: bool) {
        (**self).write(pin, high);
    }

    fn read(&self, pin: EncodedPin) -> bool {
        (**self).read(pin)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_port_letters() {
        assert_eq!(Port::A.letter(), 'A');
        assert_eq!(Port::H.letter(), 'H');
        assert_eq!(Port::from_letter(b'E'), Some(Port::E));
        assert_eq!(Port::from_letter(b'I'), None);
        assert_eq!(Port::from_letter(b'a'), None);
    }

    #[test]
    fn test_port_index_roundtrip() {
        for port in Port::ALL {
            assert_eq!(Port::from_index(port.index()), Some(port));
        }
        assert_eq!(Port::from_index(8), None);
    }

    #[test]
    fn test_pin_id_range() {
        assert!(PinId::new(Port::A, 0).is_some());
        assert!(PinId::new(Port::A, 15).is_some());
        assert!(PinId::new(Port::A, 16).is_none());
    }

    #[test]
    fn test_pin_id_display() {
        let pin = PinId::new(Port::F, 15).unwrap();
        assert_eq!(pin.to_string(), "PF15");
        let pin = PinId::new(Port::C, 3).unwrap();
        assert_eq!(pin.to_string(), "PC3");
    }

    #[test]
    fn test_roles() {
        assert!(PinRole::chip_select().is_output());
        assert!(!PinRole::button().is_output());
        assert_eq!(
            PinRole::chip_select(),
            PinRole::Output {
                drive: Drive::PushPull,
                speed: Speed::High,
                initial: Level::High,
            }
        );
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert!(!bool::from(Level::Low));
    }
}
