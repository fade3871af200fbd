//! Button set construction
//!
//! Buttons are numbered in a flat list: when the board's built-in button is
//! enabled it takes slot 0 and the external pins follow in list order. Every
//! button pin is a floating, interrupt-capable input.

use heapless::Vec;
use pinroute_hal::{EncodedPin, GpioPlatform, PinEncoder, PinId, PinRole, Port};

use crate::descriptor::PortCase;
use crate::error::{ValidationError, ValidationErrorKind};
use crate::list::{ListValidator, PinEntry};

/// Maximum number of buttons (width of the state bitmask)
pub const MAX_BUTTONS: usize = 32;

/// User button wired on the reference board
pub const BUILTIN_BUTTON_PIN: PinId = match PinId::new(Port::C, 13) {
    Some(pin) => pin,
    None => panic!("PC13 is a valid pin"),
};

/// Button configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonConfig<'a> {
    /// Built-in button occupies slot 0
    pub builtin: bool,
    /// External button pins, e.g. `"PF15,PG14"`
    pub external_pins: &'a str,
    /// Total buttons, built-in included
    pub total_count: usize,
    /// Port letter case policy for `external_pins`
    pub case: PortCase,
}

impl<'a> ButtonConfig<'a> {
    /// Configuration with the strict case policy
    pub const fn new(builtin: bool, external_pins: &'a str, total_count: usize) -> Self {
        Self {
            builtin,
            external_pins,
            total_count,
            case: PortCase::Strict,
        }
    }
}

/// Ordered, validated button pins
#[derive(Debug, Clone, Default)]
pub struct ButtonSet {
    entries: Vec<PinEntry, MAX_BUTTONS>,
    builtin: bool,
}

impl ButtonSet {
    /// Validate a button configuration
    ///
    /// The duplicate check spans every slot, the built-in one included.
    pub fn build<'a, E: PinEncoder>(
        config: &ButtonConfig<'a>,
        encoder: E,
    ) -> Result<Self, ValidationError<'a>> {
        let builtin = usize::from(config.builtin);
        let external = config.total_count.checked_sub(builtin).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::InvalidTotalCount {
                    total: config.total_count,
                    builtin,
                },
                config.external_pins,
            )
        })?;

        let validator = ListValidator::new(encoder, PinRole::button()).with_case(config.case);
        let mut entries = Vec::new();
        if config.builtin {
            // Empty table, cannot be full
            let _ = entries.push(validator.encode(BUILTIN_BUTTON_PIN));
        }
        validator.extend(config.external_pins, external, &mut entries)?;

        Ok(Self {
            entries,
            builtin: config.builtin,
        })
    }

    /// Number of buttons
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no buttons are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if slot 0 is the built-in button
    pub fn has_builtin(&self) -> bool {
        self.builtin
    }

    /// Button by slot
    pub fn get(&self, slot: usize) -> Option<&PinEntry> {
        self.entries.get(slot)
    }

    /// Buttons in slot order
    pub fn iter(&self) -> impl Iterator<Item = &PinEntry> {
        self.entries.iter()
    }

    /// Encoded pin for a slot
    pub fn pin(&self, slot: usize) -> Option<EncodedPin> {
        self.entries.get(slot).map(|e| e.pin)
    }

    /// Sample every button
    ///
    /// Bit `i` is set when button `i` reads high.
    pub fn read_all<P: GpioPlatform>(&self, gpio: &P) -> u32 {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| gpio.read(entry.pin))
            .fold(0u32, |state, (slot, _)| state | 1u32 << slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use pinroute_hal::mock::{MockEncoder, MockGpio};

    fn pin(port: Port, number: u8) -> PinId {
        PinId::new(port, number).unwrap()
    }

    fn ids(set: &ButtonSet) -> Vec<PinId, MAX_BUTTONS> {
        set.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_slot_law_with_builtin() {
        let set = ButtonSet::build(&ButtonConfig::new(true, "PF15,PG14,PG9,PE0", 5), MockEncoder)
            .unwrap();

        assert_eq!(set.len(), 5);
        assert!(set.has_builtin());
        let expected: Vec<PinId, MAX_BUTTONS> = [
            pin(Port::C, 13),
            pin(Port::F, 15),
            pin(Port::G, 14),
            pin(Port::G, 9),
            pin(Port::E, 0),
        ]
        .into_iter()
        .collect();
        assert_eq!(ids(&set), expected);
        assert_eq!(
            set.pin(0),
            Some(MockEncoder.encode(BUILTIN_BUTTON_PIN, PinRole::button()))
        );
    }

    #[test]
    fn test_without_builtin() {
        let set = ButtonSet::build(&ButtonConfig::new(false, "PF15 PG14", 2), MockEncoder).unwrap();
        assert!(!set.has_builtin());
        assert_eq!(set.get(0).unwrap().id, pin(Port::F, 15));
    }

    #[test]
    fn test_builtin_only() {
        let set = ButtonSet::build(&ButtonConfig::new(true, "", 1), MockEncoder).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().id, BUILTIN_BUTTON_PIN);
    }

    #[test]
    fn test_no_buttons() {
        let set = ButtonSet::build(&ButtonConfig::new(false, "", 0), MockEncoder).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.read_all(&MockGpio::new()), 0);
    }

    #[test]
    fn test_invalid_total_count() {
        let err = ButtonSet::build(&ButtonConfig::new(true, "PF15", 0), MockEncoder).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::InvalidTotalCount {
                total: 0,
                builtin: 1
            }
        );
        assert_eq!(err.stage(), Stage::Total);
    }

    #[test]
    fn test_duplicate_of_builtin() {
        let err = ButtonSet::build(&ButtonConfig::new(true, "PF15,PC13", 3), MockEncoder)
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::DuplicatePin);
        assert_eq!(err.position, Some(2));
        assert_eq!(err.token, Some("PC13"));
    }

    #[test]
    fn test_count_excludes_builtin() {
        let err = ButtonSet::build(&ButtonConfig::new(true, "PF15,PG14", 2), MockEncoder)
            .unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::CountMismatch {
                expected: 1,
                provided: 2
            }
        );
    }

    #[test]
    fn test_capacity() {
        let err = ButtonSet::build(&ButtonConfig::new(true, "", 33), MockEncoder).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::TooManyPins {
                requested: 32,
                capacity: 31
            }
        );
    }

    #[test]
    fn test_read_all_bit_per_high_pin() {
        let set = ButtonSet::build(&ButtonConfig::new(true, "PF15,PG14", 3), MockEncoder).unwrap();
        let mut gpio = MockGpio::new();
        assert_eq!(set.read_all(&gpio), 0);

        gpio.set_input(set.pin(0).unwrap(), true);
        gpio.set_input(set.pin(2).unwrap(), true);
        assert_eq!(set.read_all(&gpio), 0b101);

        gpio.set_input(set.pin(0).unwrap(), false);
        assert_eq!(set.read_all(&gpio), 0b100);
    }

    #[test]
    fn test_full_width_mask() {
        use core::fmt::Write;

        let mut list: heapless::String<256> = heapless::String::new();
        for (i, port) in [Port::A, Port::B].into_iter().enumerate() {
            for number in 0..16u8 {
                if i + usize::from(number) > 0 {
                    write!(list, "P{}{} ", port.letter(), number).unwrap();
                }
            }
        }
        // PA0 is skipped to leave room for the built-in PC13
        let set = ButtonSet::build(&ButtonConfig::new(true, &list, 32), MockEncoder).unwrap();
        let mut gpio = MockGpio::new();
        for entry in set.iter() {
            gpio.set_input(entry.pin, true);
        }
        assert_eq!(set.read_all(&gpio), u32::MAX);
    }
}
