//! GPIO abstractions for STM32H7
//!
//! Provides the pin-configuration word layout and pin allocation tracking
//! for STM32H7 series chips.
//!
//! Word layout (bits not listed are zero):
//!
//! ```text
//! 19..18  MODE    00 input, 01 output
//! 17..16  PUPD    00 floating, 01 pull-up, 10 pull-down
//! 11..10  SPEED   00 2 MHz, 01 25 MHz, 10 50 MHz, 11 100 MHz (outputs)
//!      9  OTYPE   open-drain (outputs)
//!      8  SET     initial level high (outputs) / EXTI routed (inputs)
//!  7..4   PORT    A = 0 .. H = 7
//!  3..0   PIN     0..15
//! ```

use pinroute_hal::{Drive, EncodedPin, Level, PinEncoder, PinId, PinRole, Port, Pull, Speed};

const PIN_MASK: u32 = 0xF;
const PORT_SHIFT: u32 = 4;
const PORT_MASK: u32 = 0xF << PORT_SHIFT;
const SET_OR_EXTI: u32 = 1 << 8;
const OPEN_DRAIN: u32 = 1 << 9;
const SPEED_SHIFT: u32 = 10;
const PUPD_SHIFT: u32 = 16;
const MODE_SHIFT: u32 = 18;
const MODE_OUTPUT: u32 = 1 << MODE_SHIFT;
const MODE_MASK: u32 = 0b11 << MODE_SHIFT;
const PORT_COUNT: usize = Port::ALL.len();

/// Pin encoder producing STM32H7 configuration words
#[derive(Debug, Clone, Copy, Default)]
pub struct Stm32h7Encoder;

impl PinEncoder for Stm32h7Encoder {
    fn encode(&self, pin: PinId, role: PinRole) -> EncodedPin {
        let location = u32::from(pin.port().index()) << PORT_SHIFT | u32::from(pin.number());
        let config = match role {
            PinRole::Output {
                drive,
                speed,
                initial,
            } => {
                let speed: u32 = match speed {
                    Speed::Low => 0b00,
                    Speed::Medium => 0b01,
                    Speed::High => 0b10,
                    Speed::VeryHigh => 0b11,
                };
                let mut bits = MODE_OUTPUT | speed << SPEED_SHIFT;
                if drive == Drive::OpenDrain {
                    bits |= OPEN_DRAIN;
                }
                if initial == Level::High {
                    bits |= SET_OR_EXTI;
                }
                bits
            }
            PinRole::Input { pull, interrupt } => {
                let pull: u32 = match pull {
                    Pull::Floating => 0b00,
                    Pull::Up => 0b01,
                    Pull::Down => 0b10,
                };
                let mut bits = pull << PUPD_SHIFT;
                if interrupt {
                    bits |= SET_OR_EXTI;
                }
                bits
            }
        };
        EncodedPin::from_bits(config | location)
    }
}

/// Recover the pin named by a configuration word
///
/// Returns `None` for words whose port field is outside A-H.
pub fn decode_pin(word: EncodedPin) -> Option<PinId> {
    let bits = word.bits();
    let port = Port::from_index(((bits & PORT_MASK) >> PORT_SHIFT) as u8)?;
    PinId::new(port, (bits & PIN_MASK) as u8)
}

/// Recover the electrical role carried by a configuration word
pub fn decode_role(word: EncodedPin) -> Option<PinRole> {
    let bits = word.bits();
    match bits & MODE_MASK {
        MODE_OUTPUT => {
            let speed = match (bits >> SPEED_SHIFT) & 0b11 {
                0b00 => Speed::Low,
                0b01 => Speed::Medium,
                0b10 => Speed::High,
                _ => Speed::VeryHigh,
            };
            let drive = if bits & OPEN_DRAIN != 0 {
                Drive::OpenDrain
            } else {
                Drive::PushPull
            };
            Some(PinRole::Output {
                drive,
                speed,
                initial: Level::from(bits & SET_OR_EXTI != 0),
            })
        }
        0 => {
            let pull = match (bits >> PUPD_SHIFT) & 0b11 {
                0b00 => Pull::Floating,
                0b01 => Pull::Up,
                0b10 => Pull::Down,
                _ => return None,
            };
            Some(PinRole::Input {
                pull,
                interrupt: bits & SET_OR_EXTI != 0,
            })
        }
        _ => None,
    }
}

/// Pin allocation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AllocError {
    /// Pin is already claimed by another user
    AlreadyClaimed(PinId),
}

/// GPIO allocator to track pin usage across subsystems
pub struct GpioAllocator {
    /// One bitmask of claimed pins per port
    claimed: [u16; PORT_COUNT],
}

impl Default for GpioAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioAllocator {
    /// Create a new GPIO allocator
    pub fn new() -> Self {
        Self {
            claimed: [0; PORT_COUNT],
        }
    }

    /// Claim a GPIO pin
    ///
    /// Returns `Err` if the pin is already in use.
    pub fn claim(&mut self, pin: PinId) -> Result<(), AllocError> {
        let mask = 1u16 << pin.number();
        let port = &mut self.claimed[usize::from(pin.port().index())];
        if *port & mask != 0 {
            return Err(AllocError::AlreadyClaimed(pin));
        }
        *port |= mask;
        Ok(())
    }

    /// Release a GPIO pin
    pub fn release(&mut self, pin: PinId) {
        self.claimed[usize::from(pin.port().index())] &= !(1u16 << pin.number());
    }

    /// Check if a pin is claimed
    pub fn is_claimed(&self, pin: PinId) -> bool {
        self.claimed[usize::from(pin.port().index())] & (1u16 << pin.number()) != 0
    }

    /// Get the number of claimed pins
    pub fn claimed_count(&self) -> usize {
        self.claimed.iter().map(|p| p.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(port: Port, number: u8) -> PinId {
        PinId::new(port, number).unwrap()
    }

    #[test]
    fn test_chip_select_word() {
        let word = Stm32h7Encoder.encode(pin(Port::E, 4), PinRole::chip_select());
        // output | 50 MHz | set | port E | pin 4
        assert_eq!(word.bits(), 0x4_0000 | 0x800 | 0x100 | 0x40 | 0x4);
    }

    #[test]
    fn test_button_word() {
        let word = Stm32h7Encoder.encode(pin(Port::C, 13), PinRole::button());
        // input | floating | exti | port C | pin 13
        assert_eq!(word.bits(), 0x100 | 0x20 | 0xD);
    }

    #[test]
    fn test_decode_roundtrip() {
        for port in Port::ALL {
            for number in 0..16 {
                let id = pin(port, number);
                for role in [PinRole::chip_select(), PinRole::button()] {
                    let word = Stm32h7Encoder.encode(id, role);
                    assert_eq!(decode_pin(word), Some(id));
                    assert_eq!(decode_role(word), Some(role));
                }
            }
        }
    }

    #[test]
    fn test_roles_encode_differently() {
        let id = pin(Port::A, 0);
        assert_ne!(
            Stm32h7Encoder.encode(id, PinRole::chip_select()),
            Stm32h7Encoder.encode(id, PinRole::button())
        );
    }

    #[test]
    fn test_decode_rejects_bad_port() {
        assert_eq!(decode_pin(EncodedPin::from_bits(0x90)), None);
    }

    #[test]
    fn test_allocator() {
        let mut alloc = GpioAllocator::new();
        assert!(alloc.claim(pin(Port::C, 13)).is_ok());
        assert!(alloc.is_claimed(pin(Port::C, 13)));
        assert!(!alloc.is_claimed(pin(Port::C, 12)));
        assert_eq!(
            alloc.claim(pin(Port::C, 13)),
            Err(AllocError::AlreadyClaimed(pin(Port::C, 13)))
        );
        assert!(alloc.claim(pin(Port::H, 15)).is_ok());
        assert_eq!(alloc.claimed_count(), 2);

        alloc.release(pin(Port::C, 13));
        assert!(!alloc.is_claimed(pin(Port::C, 13)));
        assert_eq!(alloc.claimed_count(), 1);
    }
}
