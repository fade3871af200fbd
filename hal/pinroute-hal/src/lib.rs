//! pinroute Hardware Abstraction Layer
//!
//! This crate defines the pin vocabulary ([`PinId`], [`PinRole`],
//! [`EncodedPin`]) and the platform traits that the board-agnostic core
//! consumes. Chip-specific crates implement the traits; the core never
//! touches a register.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pinroute-board (bringup, drivers)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinroute-core (parse, validate, route) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinroute-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ pinroute-hal- │       │  mock (host)  │
//! │    stm32h7    │       │               │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::PinEncoder`] - PinId + role to platform pin word
//! - [`gpio::GpioPlatform`] - configure / write / read an encoded pin

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key types at crate root for convenience
pub use gpio::{
    Drive, EncodedPin, GpioPlatform, Level, PinEncoder, PinId, PinRole, Port, Pull, Speed,
    PINS_PER_PORT,
};
