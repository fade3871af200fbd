//! Device id to chip-select routing

use core::fmt;

use pinroute_hal::GpioPlatform;

use super::registry::{BusId, ChipSelectRegistry, CsSlot, SLOTS_PER_BUS};

/// Global SPI device identifier
///
/// Ids are partitioned into blocks of [`SLOTS_PER_BUS`]: ids 0-7 address
/// the chip selects of SPI1, 8-15 those of SPI2, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wrap a raw device id
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Device id for `slot` on `bus`, `None` if the slot is out of range
    pub const fn from_parts(bus: BusId, slot: u8) -> Option<Self> {
        if (slot as usize) < SLOTS_PER_BUS {
            Some(Self(bus.index() as u32 * SLOTS_PER_BUS as u32 + slot as u32))
        } else {
            None
        }
    }

    /// Raw device id
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// 0-based bus table index
    pub const fn bus_index(self) -> usize {
        (self.0 / SLOTS_PER_BUS as u32) as usize
    }

    /// Slot within the bus table
    pub const fn slot(self) -> usize {
        (self.0 % SLOTS_PER_BUS as u32) as usize
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Device presence as reported to bus drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceStatus {
    /// A chip select is configured for the device
    Present,
    /// No chip select is configured for the device
    Absent,
}

/// Why a device id could not be routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouteError {
    /// Id addresses a bus beyond the registry
    UnknownBus {
        /// Device that was addressed
        device: DeviceId,
    },
    /// Bus exists but the slot is not populated
    NoSuchSlot {
        /// Device that was addressed
        device: DeviceId,
        /// Bus addressed
        bus: BusId,
        /// Chip selects configured on that bus
        populated: usize,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::UnknownBus { device } => write!(
                f,
                "device {}: no bus instance {}",
                device.raw(),
                device.bus_index() + 1
            ),
            RouteError::NoSuchSlot {
                device,
                bus,
                populated,
            } => write!(
                f,
                "device {}: {} has {} chip selects, slot {} not configured",
                device.raw(),
                bus,
                populated,
                device.slot()
            ),
        }
    }
}

impl<const BUSES: usize> ChipSelectRegistry<BUSES> {
    /// Look up the chip select for a device
    pub fn resolve(&self, device: DeviceId) -> Result<CsSlot, RouteError> {
        let index = device.bus_index();
        let (bus, table) = BusId::from_index(index)
            .zip(self.tables().get(index))
            .ok_or(RouteError::UnknownBus { device })?;

        table
            .get(device.slot())
            .copied()
            .ok_or(RouteError::NoSuchSlot {
                device,
                bus,
                populated: table.len(),
            })
    }

    /// Assert (`true`) or deassert (`false`) a device's chip select
    ///
    /// Chip selects are active-low, so asserting drives the pin low.
    /// Unroutable ids are logged and otherwise ignored.
    pub fn select<P: GpioPlatform>(&self, gpio: &mut P, device: DeviceId, assert: bool) {
        match self.resolve(device) {
            Ok(slot) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("CS {} -> {}", device.raw(), assert);
                gpio.write(slot.pin, !assert);
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("select ignored: {}", _e);
            }
        }
    }

    /// Presence of a device
    pub fn status(&self, device: DeviceId) -> DeviceStatus {
        match self.resolve(device) {
            Ok(_) => DeviceStatus::Present,
            Err(_) => DeviceStatus::Absent,
        }
    }
}
