//! STM32H7-specific HAL for pinroute
//!
//! This crate provides the STM32H7 pin-configuration word layout and pin
//! bookkeeping for use with `pinroute-hal` traits. It targets the
//! 144-pin packages where ports A-H are bonded out:
//!
//! - STM32H753ZI (Nucleo-H753ZI)
//! - STM32H743ZI
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! [`Stm32h7Encoder`] is the [`PinEncoder`](pinroute_hal::PinEncoder) the
//! board crate hands to the core; the register layer consuming the
//! encoded words lives with the board's platform implementation.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

pub use gpio::{decode_pin, decode_role, AllocError, GpioAllocator, Stm32h7Encoder};
