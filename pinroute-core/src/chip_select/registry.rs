//! Chip-select table construction

use core::fmt;

use heapless::Vec;
use pinroute_hal::{EncodedPin, GpioPlatform, PinEncoder, PinId, PinRole};

use crate::descriptor::PortCase;
use crate::error::{FirstError, ValidationError};
use crate::list::{ListValidator, PinEntry};

/// Chip-select slots per bus instance
pub const SLOTS_PER_BUS: usize = 8;

/// Bus instance number (SPI1 = 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusId(u8);

impl BusId {
    /// Create a bus id, returning `None` for 0
    pub const fn new(number: u8) -> Option<Self> {
        if number == 0 {
            None
        } else {
            Some(Self(number))
        }
    }

    /// Bus for a 0-based table index
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < u8::MAX as usize {
            Some(Self(index as u8 + 1))
        } else {
            None
        }
    }

    /// Bus instance number
    pub const fn number(self) -> u8 {
        self.0
    }

    /// 0-based table index
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SPI{}", self.0)
    }
}

/// One chip-select line on a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CsSlot {
    /// Position in the bus table (0-7)
    pub index: u8,
    /// Physical pin
    pub id: PinId,
    /// Configuration word the pin was set up with
    pub pin: EncodedPin,
}

/// Ordered chip-select table for one bus
///
/// Read-only once the registry has been built.
#[derive(Debug, Clone, Default)]
pub struct BusCsTable {
    slots: Vec<CsSlot, SLOTS_PER_BUS>,
}

impl BusCsTable {
    /// Create an empty table
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no chip selects are configured
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot by index
    pub fn get(&self, slot: usize) -> Option<&CsSlot> {
        self.slots.get(slot)
    }

    /// Slots in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &CsSlot> {
        self.slots.iter()
    }

    /// Slots as a slice
    pub fn as_slice(&self) -> &[CsSlot] {
        &self.slots
    }
}

/// Chip-select configuration for one bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusCsConfig<'a> {
    /// Bus is in use
    pub enabled: bool,
    /// Number of chip selects listed in `cs_pins`
    pub cs_count: usize,
    /// Pin list, e.g. `"PE0, PE1"`
    pub cs_pins: &'a str,
    /// Port letter case policy for `cs_pins`
    pub case: PortCase,
}

impl<'a> BusCsConfig<'a> {
    /// Bus not in use
    pub const DISABLED: Self = Self {
        enabled: false,
        cs_count: 0,
        cs_pins: "",
        case: PortCase::Strict,
    };

    /// Enabled bus with `cs_count` pins listed in `cs_pins`
    pub const fn new(cs_count: usize, cs_pins: &'a str) -> Self {
        Self {
            enabled: true,
            cs_count,
            cs_pins,
            case: PortCase::Strict,
        }
    }

    /// Number of pins to validate (0 when disabled)
    pub const fn expected(&self) -> usize {
        if self.enabled {
            self.cs_count
        } else {
            0
        }
    }
}

impl Default for BusCsConfig<'_> {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Chip-select table construction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuildError<'a, E> {
    /// Pin list was rejected; nothing was configured on this bus
    Validation {
        /// Bus whose list was rejected
        bus: BusId,
        /// Why it was rejected
        error: ValidationError<'a>,
    },
    /// Platform refused to configure a pin; earlier slots stay configured
    Platform {
        /// Bus being configured
        bus: BusId,
        /// Slot that failed
        slot: u8,
        /// Pin that failed
        pin: PinId,
        /// Platform error, unchanged
        error: E,
    },
}

impl<E> BuildError<'_, E> {
    /// Bus the failure belongs to
    pub fn bus(&self) -> BusId {
        match self {
            BuildError::Validation { bus, .. } | BuildError::Platform { bus, .. } => *bus,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for BuildError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Validation { bus, error } => {
                write!(f, "{} chip-select list: {}", bus, error)
            }
            BuildError::Platform {
                bus,
                slot,
                pin,
                error,
            } => write!(
                f,
                "{} chip select {} ({}) could not be configured: {:?}",
                bus, slot, pin, error
            ),
        }
    }
}

/// Chip-select tables for `BUSES` bus instances
#[derive(Debug, Clone)]
pub struct ChipSelectRegistry<const BUSES: usize> {
    tables: [BusCsTable; BUSES],
}

impl<const BUSES: usize> Default for ChipSelectRegistry<BUSES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BUSES: usize> ChipSelectRegistry<BUSES> {
    /// Every bus index must map to a `BusId`
    const BUS_LIMIT: () = assert!(
        BUSES < u8::MAX as usize,
        "ChipSelectRegistry supports at most 254 buses"
    );

    /// Create a registry with every table empty
    pub fn new() -> Self {
        let () = Self::BUS_LIMIT;
        Self {
            tables: core::array::from_fn(|_| BusCsTable::new()),
        }
    }

    /// Build every bus table
    ///
    /// Buses are built independently, in order: each list is validated,
    /// then every pin is configured and driven high (deasserted) once. A
    /// failure on one bus does not stop the others; the first failure is
    /// returned alongside the registry. A platform failure keeps the slots
    /// configured before it.
    pub fn build<'a, E, P>(
        configs: &[BusCsConfig<'a>; BUSES],
        encoder: E,
        gpio: &mut P,
    ) -> (Self, Result<(), BuildError<'a, P::Error>>)
    where
        E: PinEncoder,
        P: GpioPlatform,
    {
        let mut registry = Self::new();
        let mut first = FirstError::new();

        for (index, config) in configs.iter().enumerate() {
            let Some(bus) = BusId::from_index(index) else {
                break;
            };
            first.record(registry.build_bus(bus, config, &encoder, gpio));
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Chip-select registry: {} pins on {} buses",
            registry.total_pins(),
            BUSES
        );

        (registry, first.into_result())
    }

    fn build_bus<'a, E, P>(
        &mut self,
        bus: BusId,
        config: &BusCsConfig<'a>,
        encoder: &E,
        gpio: &mut P,
    ) -> Result<(), BuildError<'a, P::Error>>
    where
        E: PinEncoder,
        P: GpioPlatform,
    {
        let validator = ListValidator::new(encoder, PinRole::chip_select()).with_case(config.case);
        let pins: Vec<PinEntry, SLOTS_PER_BUS> = validator
            .validate(config.cs_pins, config.expected())
            .map_err(|error| {
                #[cfg(feature = "defmt")]
                defmt::error!("SPI{} chip-select list rejected: {}", bus.number(), error);
                BuildError::Validation { bus, error }
            })?;

        let table = &mut self.tables[bus.index()];
        for (slot, entry) in pins.iter().enumerate() {
            let slot = slot as u8;
            gpio.configure(entry.pin).map_err(|error| BuildError::Platform {
                bus,
                slot,
                pin: entry.id,
                error,
            })?;
            gpio.set_high(entry.pin);
            let _ = table.slots.push(CsSlot {
                index: slot,
                id: entry.id,
                pin: entry.pin,
            });
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("SPI{}: {} chip selects", bus.number(), table.len());
        Ok(())
    }

    /// Table for a bus, `None` if the bus does not exist
    pub fn bus(&self, bus: BusId) -> Option<&BusCsTable> {
        self.tables.get(bus.index())
    }

    /// All tables, SPI1 first
    pub fn tables(&self) -> &[BusCsTable; BUSES] {
        &self.tables
    }

    /// Total configured chip selects across all buses
    pub fn total_pins(&self) -> usize {
        self.tables.iter().map(BusCsTable::len).sum()
    }
}
