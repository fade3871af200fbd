//! Pin list validation
//!
//! A pin list is a comma and/or whitespace separated sequence of
//! descriptors, e.g. `"PE0, PE1, PE3"`. Validation checks it against a
//! configured count, parses every token, encodes it for a role and rejects
//! pins that were already accepted.

use heapless::Vec;
use pinroute_hal::{EncodedPin, PinEncoder, PinId, PinRole};

use crate::descriptor::{parse_with, PortCase};
use crate::error::{ValidationError, ValidationErrorKind};

/// A validated pin and its encoded configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinEntry {
    /// Pin named by the descriptor
    pub id: PinId,
    /// Configuration word for the validator's role
    pub pin: EncodedPin,
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | ' ' | '\t' | '\n' | '\r')
}

/// Split a pin list into non-empty tokens
pub fn tokens(list: &str) -> impl Iterator<Item = &str> {
    list.split(is_separator).filter(|t| !t.is_empty())
}

/// Validates pin lists for one electrical role
#[derive(Debug, Clone, Copy)]
pub struct ListValidator<E> {
    encoder: E,
    role: PinRole,
    case: PortCase,
}

impl<E: PinEncoder> ListValidator<E> {
    /// Create a validator using the strict case policy
    pub fn new(encoder: E, role: PinRole) -> Self {
        Self {
            encoder,
            role,
            case: PortCase::Strict,
        }
    }

    /// Set the port letter case policy
    pub fn with_case(mut self, case: PortCase) -> Self {
        self.case = case;
        self
    }

    /// Role every accepted pin is encoded for
    pub fn role(&self) -> PinRole {
        self.role
    }

    /// Encode a pin for this validator's role
    pub fn encode(&self, id: PinId) -> PinEntry {
        PinEntry {
            id,
            pin: self.encoder.encode(id, self.role),
        }
    }

    /// Validate `list` against `expected` into a fresh table
    pub fn validate<'a, const N: usize>(
        &self,
        list: &'a str,
        expected: usize,
    ) -> Result<Vec<PinEntry, N>, ValidationError<'a>> {
        let mut out = Vec::new();
        self.extend(list, expected, &mut out)?;
        Ok(out)
    }

    /// Validate `list` against `expected` and append the entries to `out`
    ///
    /// Entries already in `out` take part in the duplicate check. On error
    /// `out` is left as it was.
    pub fn extend<'a, const N: usize>(
        &self,
        list: &'a str,
        expected: usize,
        out: &mut Vec<PinEntry, N>,
    ) -> Result<(), ValidationError<'a>> {
        if expected == 0 {
            return Ok(());
        }

        let capacity = out.capacity() - out.len();
        if expected > capacity {
            return Err(ValidationError::new(
                ValidationErrorKind::TooManyPins {
                    requested: expected,
                    capacity,
                },
                list,
            ));
        }

        if list.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingConfiguration { expected },
                list,
            ));
        }

        // Count everything before parsing anything
        let provided = tokens(list).count();
        if provided != expected {
            return Err(ValidationError::new(
                ValidationErrorKind::CountMismatch { expected, provided },
                list,
            ));
        }

        let seeded = out.len();
        for (index, token) in tokens(list).enumerate() {
            if let Err(e) = self.accept(token, out) {
                out.truncate(seeded);
                return Err(ValidationError::at(e, index + 1, token, list));
            }
        }
        Ok(())
    }

    fn accept<const N: usize>(
        &self,
        token: &str,
        out: &mut Vec<PinEntry, N>,
    ) -> Result<(), ValidationErrorKind> {
        let id = parse_with(token, self.case).map_err(ValidationErrorKind::InvalidToken)?;
        let entry = self.encode(id);
        if out.iter().any(|e| e.pin == entry.pin) {
            return Err(ValidationErrorKind::DuplicatePin);
        }
        // Capacity was checked against the token count
        let _ = out.push(entry);
        Ok(())
    }
}
