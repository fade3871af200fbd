//! Reference-board bringup
//!
//! Glue between the board configuration document and the pin routing core:
//!
//! - Configuration loading (TOML, postcard fallback, embedded default)
//! - SPI bringup: chip-select registry, bus acquisition, per-bus handles
//! - User button driver
//! - Whole-board bringup with first-error reporting
//!
//! # Example
//!
//! ```
//! use pinroute_board::{Board, BoardConfig, SpiBusProvider};
//! use pinroute_core::{BusId, DeviceId, DeviceStatus};
//! use pinroute_hal::mock::MockGpio;
//!
//! struct Buses;
//!
//! impl SpiBusProvider for Buses {
//!     type Error = ();
//!
//!     fn acquire(&mut self, _bus: BusId) -> Result<(), ()> {
//!         Ok(())
//!     }
//! }
//!
//! let config = BoardConfig::embedded().unwrap();
//! let mut gpio = MockGpio::new();
//! let (board, result) = Board::bringup(&config, &mut gpio, &mut Buses);
//! assert!(result.is_ok());
//! assert_eq!(board.status(DeviceId::new(0)), DeviceStatus::Present);
//! ```

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod bringup;
pub mod buttons;
pub mod config;
pub mod spi;

pub use bringup::{Board, BringupError};
pub use buttons::{ButtonDriver, ButtonError, ButtonIdError};
pub use config::{
    BoardConfig, ButtonsConfig, ConfigError, SpiBusConfig, CONFIG_VERSION, SPI_BUSES,
};
pub use spi::{BusChipSelect, CsLine, SpiBusProvider, SpiError, SpiRegistry};
