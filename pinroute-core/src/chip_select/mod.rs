//! SPI chip-select registry and routing
//!
//! Each bus instance owns an ordered table of up to [`SLOTS_PER_BUS`]
//! chip-select pins, built once during bringup. A global [`DeviceId`] is
//! split into a bus index (`id / 8`) and a slot (`id % 8`) and routed to
//! the matching pin. Chip selects are active-low.

mod registry;
mod router;

pub use registry::{
    BuildError, BusCsConfig, BusCsTable, BusId, ChipSelectRegistry, CsSlot, SLOTS_PER_BUS,
};
pub use router::{DeviceId, DeviceStatus, RouteError};
