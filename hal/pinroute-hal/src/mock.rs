//! Mock implementations for testing
//!
//! Host-side stand-ins for the platform traits. [`MockGpio`] records every
//! configure/write call and keeps a level per pin; [`MockEncoder`] packs a
//! pin and role into a word that tests can decode again.

use heapless::{FnvIndexMap, Vec};

use crate::gpio::{EncodedPin, GpioPlatform, PinEncoder, PinId, PinRole, Port};

/// Maximum number of recorded calls
pub const MAX_CALLS: usize = 256;

/// A recorded platform call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioCall {
    /// `configure(pin)` was called
    Configure(EncodedPin),
    /// `write(pin, high)` was called
    Write(EncodedPin, bool),
}

/// Configuration failure injected by [`MockGpio::failing_after`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MockError {
    /// Zero-based index of the configure call that failed
    pub call: usize,
}

/// Recording GPIO platform
#[derive(Debug, Default)]
pub struct MockGpio {
    calls: Vec<GpioCall, MAX_CALLS>,
    levels: FnvIndexMap<EncodedPin, bool, 128>,
    configure_calls: usize,
    fail_after: Option<usize>,
}

impl MockGpio {
    /// Create a mock where every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose configure calls fail once `ok_calls` have succeeded
    pub fn failing_after(ok_calls: usize) -> Self {
        Self {
            fail_after: Some(ok_calls),
            ..Self::default()
        }
    }

    /// All recorded calls, oldest first
    pub fn calls(&self) -> &[GpioCall] {
        &self.calls
    }

    /// Forget recorded calls (levels are kept)
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded writes
    pub fn write_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, GpioCall::Write(..)))
            .count()
    }

    /// Pins configured so far, in call order
    pub fn configured(&self) -> impl Iterator<Item = EncodedPin> + '_ {
        self.calls.iter().filter_map(|c| match c {
            GpioCall::Configure(pin) => Some(*pin),
            GpioCall::Write(..) => None,
        })
    }

    /// Last level written to (or forced on) a pin
    pub fn level(&self, pin: EncodedPin) -> Option<bool> {
        self.levels.get(&pin).copied()
    }

    /// Force the level seen by `read`, as an external signal would
    pub fn set_input(&mut self, pin: EncodedPin, high: bool) {
        let _ = self.levels.insert(pin, high);
    }
}

impl GpioPlatform for MockGpio {
    type Error = MockError;

    fn configure(&mut self, pin: EncodedPin) -> Result<(), Self::Error> {
        let call = self.configure_calls;
        self.configure_calls += 1;
        if let Some(limit) = self.fail_after {
            if call >= limit {
                return Err(MockError { call });
            }
        }
        let _ = self.calls.push(GpioCall::Configure(pin));
        Ok(())
    }

    fn write(&mut self, pin: EncodedPin, high: bool) {
        let _ = self.calls.push(GpioCall::Write(pin, high));
        let _ = self.levels.insert(pin, high);
    }

    fn read(&self, pin: EncodedPin) -> bool {
        self.level(pin).unwrap_or(false)
    }
}

/// Trivial encoder: `role << 8 | port << 4 | number`
#[derive(Debug, Clone, Copy, Default)]
pub struct MockEncoder;

impl MockEncoder {
    const OUTPUT: u32 = 0x100;
    const INPUT: u32 = 0x200;
    const INTERRUPT: u32 = 0x400;

    /// Recover the pin packed by [`MockEncoder::encode`]
    pub fn decode(pin: EncodedPin) -> Option<PinId> {
        let bits = pin.bits();
        let port = Port::from_index(((bits >> 4) & 0xF) as u8)?;
        PinId::new(port, (bits & 0xF) as u8)
    }
}

impl PinEncoder for MockEncoder {
    fn encode(&self, pin: PinId, role: PinRole) -> EncodedPin {
        let role_bits = match role {
            PinRole::Output { .. } => Self::OUTPUT,
            PinRole::Input { interrupt, .. } => {
                Self::INPUT | if interrupt { Self::INTERRUPT } else { 0 }
            }
        };
        let port = u32::from(pin.port().index());
        EncodedPin::from_bits(role_bits | port << 4 | u32::from(pin.number()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_roundtrip() {
        let pin = PinId::new(Port::G, 14).unwrap();
        let encoded = MockEncoder.encode(pin, PinRole::button());
        assert_eq!(MockEncoder::decode(encoded), Some(pin));
        assert_ne!(encoded, MockEncoder.encode(pin, PinRole::chip_select()));
    }

    #[test]
    fn test_mock_records_calls() {
        let pin = MockEncoder.encode(PinId::new(Port::E, 0).unwrap(), PinRole::chip_select());
        let mut gpio = MockGpio::new();
        gpio.configure(pin).unwrap();
        gpio.set_low(pin);
        assert_eq!(
            gpio.calls(),
            &[GpioCall::Configure(pin), GpioCall::Write(pin, false)]
        );
        assert_eq!(gpio.level(pin), Some(false));
        assert!(!gpio.read(pin));
    }

    #[test]
    fn test_mock_injected_failure() {
        let pin = EncodedPin::from_bits(1);
        let mut gpio = MockGpio::failing_after(2);
        assert!(gpio.configure(pin).is_ok());
        assert!(gpio.configure(pin).is_ok());
        assert_eq!(gpio.configure(pin), Err(MockError { call: 2 }));
        assert_eq!(gpio.configured().count(), 2);
    }
}
