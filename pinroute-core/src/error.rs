//! Validation diagnostics
//!
//! Every validation failure carries the stage that rejected it, the 1-based
//! token position and token text when a single token is at fault, and the
//! whole configuration string it came from. `Display` renders an actionable
//! message with a suggested fix.

use core::fmt;

use crate::descriptor::ParseError;

/// Validation stage that rejected a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Descriptor grammar
    Format,
    /// Pin number range
    Range,
    /// Token count vs configured count
    Count,
    /// Same pin listed twice
    Duplicate,
    /// Count configured but no list given
    Missing,
    /// Button total does not cover the built-in button
    Total,
    /// More pins than the destination table holds
    Capacity,
}

/// What went wrong during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationErrorKind {
    /// A non-zero count was configured with an empty pin list
    MissingConfiguration {
        /// Configured count
        expected: usize,
    },
    /// Number of tokens differs from the configured count
    CountMismatch {
        /// Configured count
        expected: usize,
        /// Tokens found in the list
        provided: usize,
    },
    /// A token failed to parse
    InvalidToken(ParseError),
    /// A token names a pin that was already accepted
    DuplicatePin,
    /// Button total is smaller than the number of built-in buttons
    InvalidTotalCount {
        /// Configured total
        total: usize,
        /// Built-in buttons enabled
        builtin: usize,
    },
    /// Configured count exceeds the destination table
    TooManyPins {
        /// Configured count
        requested: usize,
        /// Free entries in the table
        capacity: usize,
    },
}

/// Validation failure with diagnostic context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidationError<'a> {
    /// What went wrong
    pub kind: ValidationErrorKind,
    /// 1-based position of the offending token
    pub position: Option<usize>,
    /// Offending token text
    pub token: Option<&'a str>,
    /// Full configuration string being validated
    pub config: &'a str,
}

impl<'a> ValidationError<'a> {
    /// Create an error that is not tied to a single token
    pub const fn new(kind: ValidationErrorKind, config: &'a str) -> Self {
        Self {
            kind,
            position: None,
            token: None,
            config,
        }
    }

    /// Create an error for the token at 1-based `position`
    pub const fn at(
        kind: ValidationErrorKind,
        position: usize,
        token: &'a str,
        config: &'a str,
    ) -> Self {
        Self {
            kind,
            position: Some(position),
            token: Some(token),
            config,
        }
    }

    /// Stage that rejected the configuration
    pub const fn stage(&self) -> Stage {
        match self.kind {
            ValidationErrorKind::MissingConfiguration { .. } => Stage::Missing,
            ValidationErrorKind::CountMismatch { .. } => Stage::Count,
            ValidationErrorKind::InvalidToken(ParseError::Format(_)) => Stage::Format,
            ValidationErrorKind::InvalidToken(ParseError::Range { .. }) => Stage::Range,
            ValidationErrorKind::DuplicatePin => Stage::Duplicate,
            ValidationErrorKind::InvalidTotalCount { .. } => Stage::Total,
            ValidationErrorKind::TooManyPins { .. } => Stage::Capacity,
        }
    }
}

impl fmt::Display for ValidationError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = self.position.unwrap_or(0);
        let token = self.token.unwrap_or("");

        match self.kind {
            ValidationErrorKind::MissingConfiguration { expected } => write!(
                f,
                "{} pins configured but the pin list is empty; list {} pins such as \"PA0,PA1\" or set the count to 0",
                expected, expected
            ),
            ValidationErrorKind::CountMismatch { expected, provided } => write!(
                f,
                "expected {} pins but found {} in \"{}\"; make the count match the list",
                expected, provided, self.config
            ),
            ValidationErrorKind::InvalidToken(e) => write!(
                f,
                "pin {} \"{}\" in \"{}\" is invalid: {}; use P<port A-H><pin 0-15>, e.g. PA0 or PF15",
                position, token, self.config, e
            ),
            ValidationErrorKind::DuplicatePin => write!(
                f,
                "pin {} \"{}\" in \"{}\" is already in use; choose a different pin",
                position, token, self.config
            ),
            ValidationErrorKind::InvalidTotalCount { total, builtin } => write!(
                f,
                "button count {} does not cover the {} built-in button(s); raise the count or disable the built-in button",
                total, builtin
            ),
            ValidationErrorKind::TooManyPins {
                requested,
                capacity,
            } => write!(
                f,
                "{} pins requested but only {} fit; reduce the count",
                requested, capacity
            ),
        }
    }
}

/// Keeps the first error out of a run of independent steps
///
/// Later steps still run after a failure; only the first error is kept.
#[derive(Debug)]
pub struct FirstError<E> {
    first: Option<E>,
}

impl<E> Default for FirstError<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> FirstError<E> {
    /// Create an empty accumulator
    pub const fn new() -> Self {
        Self { first: None }
    }

    /// Record the outcome of one step
    pub fn record<T>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Record a failure
    pub fn fail(&mut self, error: E) {
        if self.first.is_none() {
            self.first = Some(error);
        }
    }

    /// Check if nothing has failed yet
    pub fn is_ok(&self) -> bool {
        self.first.is_none()
    }

    /// The first recorded error, if any
    pub fn into_result(self) -> Result<(), E> {
        match self.first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
