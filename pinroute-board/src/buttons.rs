//! User button driver
//!
//! Validates the button configuration, configures every button pin as an
//! interrupt-capable input and samples them as a bitmask.

use core::fmt;

use pinroute_core::{ButtonConfig, ButtonSet, PinEntry, ValidationError};
use pinroute_hal::{EncodedPin, GpioPlatform, PinEncoder, PinId};

/// Button bringup failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonError<'a, E> {
    /// Button configuration was rejected
    Config(ValidationError<'a>),
    /// Platform refused to configure a button pin
    Platform {
        /// Slot that failed
        slot: usize,
        /// Pin that failed
        pin: PinId,
        /// Platform error, unchanged
        error: E,
    },
}

impl<'a, E> From<ValidationError<'a>> for ButtonError<'a, E> {
    fn from(e: ValidationError<'a>) -> Self {
        ButtonError::Config(e)
    }
}

impl<E: fmt::Debug> fmt::Display for ButtonError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonError::Config(e) => write!(f, "button configuration: {}", e),
            ButtonError::Platform { slot, pin, error } => write!(
                f,
                "button {} ({}) could not be configured: {:?}",
                slot, pin, error
            ),
        }
    }
}

/// Button id outside the configured range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonIdError {
    /// Requested id
    pub id: usize,
    /// Number of configured buttons
    pub count: usize,
}

impl fmt::Display for ButtonIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "button {} not configured ({} buttons)", self.id, self.count)
    }
}

/// Configured user buttons
#[derive(Debug, Clone, Default)]
pub struct ButtonDriver {
    buttons: ButtonSet,
}

impl ButtonDriver {
    /// Validate the configuration and configure every button pin
    ///
    /// The first pin the platform refuses aborts initialization.
    pub fn initialize<'a, E, P>(
        config: &ButtonConfig<'a>,
        encoder: E,
        gpio: &mut P,
    ) -> Result<Self, ButtonError<'a, P::Error>>
    where
        E: PinEncoder,
        P: GpioPlatform,
    {
        let buttons = ButtonSet::build(config, encoder).inspect_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!("Button configuration rejected: {}", _e);
        })?;

        for (slot, entry) in buttons.iter().enumerate() {
            gpio.configure(entry.pin).map_err(|error| {
                #[cfg(feature = "defmt")]
                defmt::error!("Failed to configure button {}", slot);
                ButtonError::Platform {
                    slot,
                    pin: entry.id,
                    error,
                }
            })?;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Buttons initialized: {}", buttons.len());

        Ok(Self { buttons })
    }

    /// Number of configured buttons
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    /// Check if no buttons are configured
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Validated button set
    pub fn buttons(&self) -> &ButtonSet {
        &self.buttons
    }

    /// Sample every button; bit `i` is set when button `i` reads high
    pub fn read_all<P: GpioPlatform>(&self, gpio: &P) -> u32 {
        self.buttons.read_all(gpio)
    }

    /// Button pin for interrupt registration
    pub fn pin(&self, id: usize) -> Result<EncodedPin, ButtonIdError> {
        self.entry(id).map(|e| e.pin)
    }

    /// Validated entry for a button
    pub fn entry(&self, id: usize) -> Result<&PinEntry, ButtonIdError> {
        self.buttons.get(id).ok_or(ButtonIdError {
            id,
            count: self.buttons.len(),
        })
    }
}
