//! Board-agnostic pin routing logic
//!
//! This crate turns human-authored pin descriptors into validated, encoded
//! pin configurations and routes device identifiers to chip-select lines:
//!
//! - Descriptor parsing (`"PA0"` to [`PinId`](pinroute_hal::PinId))
//! - List validation (count, format, range and duplicate rules)
//! - Chip-select registry construction and routing
//! - Button set construction (built-in slot + external list)
//! - Diagnostic error types
//!
//! Nothing here touches a register; all hardware access goes through the
//! [`pinroute_hal`] traits.

#![no_std]
#![deny(unsafe_code)]

pub mod buttons;
pub mod chip_select;
pub mod descriptor;
pub mod error;
pub mod list;

pub use buttons::{ButtonConfig, ButtonSet, BUILTIN_BUTTON_PIN, MAX_BUTTONS};
pub use chip_select::{
    BuildError, BusCsConfig, BusCsTable, BusId, ChipSelectRegistry, CsSlot, DeviceId,
    DeviceStatus, RouteError, SLOTS_PER_BUS,
};
pub use descriptor::{parse, parse_with, FormatError, ParseError, PortCase};
pub use error::{FirstError, Stage, ValidationError, ValidationErrorKind};
pub use list::{tokens, ListValidator, PinEntry};
