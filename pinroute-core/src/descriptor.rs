//! Pin descriptor parsing
//!
//! A descriptor names one physical pin: literal `P`, a port letter `A`-`H`
//! and a pin number `0`-`15`, e.g. `"PA0"` or `"PF15"`. Surrounding spaces
//! and tabs are ignored; anything else around the name is an error.

use core::fmt;

use pinroute_hal::{PinId, Port};

/// Shortest significant descriptor (`PA0`)
const MIN_LEN: usize = 3;

/// Longest significant descriptor (`PA15`)
const MAX_LEN: usize = 4;

/// Port letter case policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PortCase {
    /// Only upper-case port letters are accepted
    #[default]
    Strict,
    /// Lower-case port letters are folded to upper case
    Fold,
}

/// Why a descriptor is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Nothing but whitespace
    Empty,
    /// Fewer than 3 or more than 4 characters after trimming
    Length,
    /// Does not start with `P`
    MissingPrefix,
    /// Port letter outside `A`-`H`
    BadPort,
    /// Pin number is not a plain decimal number
    BadNumber,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FormatError::Empty => "empty descriptor",
            FormatError::Length => "descriptor must be 3 or 4 characters",
            FormatError::MissingPrefix => "descriptor must start with 'P'",
            FormatError::BadPort => "port must be one of A-H",
            FormatError::BadNumber => "pin number must be decimal digits only",
        };
        f.write_str(reason)
    }
}

/// Descriptor parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Descriptor does not follow the `P<port><number>` grammar
    Format(FormatError),
    /// Well-formed, but the pin number is above 15
    Range {
        /// Number that was given
        number: u8,
    },
}

impl From<FormatError> for ParseError {
    fn from(e: FormatError) -> Self {
        ParseError::Format(e)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Format(e) => e.fmt(f),
            ParseError::Range { number } => write!(f, "pin {} out of range 0-15", number),
        }
    }
}

/// Parse a pin descriptor with the strict case policy
///
/// # Example
///
/// ```
/// use pinroute_core::parse;
/// use pinroute_hal::Port;
///
/// let pin = parse(" PF15\t").unwrap();
/// assert_eq!(pin.port(), Port::F);
/// assert_eq!(pin.number(), 15);
/// ```
pub fn parse(text: &str) -> Result<PinId, ParseError> {
    parse_with(text, PortCase::Strict)
}

/// Parse a pin descriptor
pub fn parse_with(text: &str, case: PortCase) -> Result<PinId, ParseError> {
    let bytes = text.trim_matches(|c: char| c == ' ' || c == '\t').as_bytes();

    if bytes.is_empty() {
        return Err(FormatError::Empty.into());
    }
    if bytes.len() < MIN_LEN || bytes.len() > MAX_LEN {
        return Err(FormatError::Length.into());
    }
    if bytes[0] != b'P' {
        return Err(FormatError::MissingPrefix.into());
    }

    let letter = match case {
        PortCase::Strict => bytes[1],
        PortCase::Fold => bytes[1].to_ascii_uppercase(),
    };
    let port = Port::from_letter(letter).ok_or(FormatError::BadPort)?;

    // `str::parse` would accept a leading '+'
    let digits = &bytes[2..];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(FormatError::BadNumber.into());
    }
    let number = digits.iter().fold(0u8, |n, d| n * 10 + (d - b'0'));

    PinId::new(port, number).ok_or(ParseError::Range { number })
}
