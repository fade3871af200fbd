//! Board bringup
//!
//! Brings up the SPI chip selects, then the user buttons. Each subsystem is
//! attempted even if an earlier one failed; the first failure is reported
//! with the board that was built.

use core::fmt;

use pinroute_core::{BusId, DeviceId, DeviceStatus, FirstError};
use pinroute_hal::{GpioPlatform, PinEncoder, PinId};
use pinroute_hal_stm32h7::{GpioAllocator, Stm32h7Encoder};

use crate::buttons::{ButtonDriver, ButtonError};
use crate::config::{BoardConfig, SPI_BUSES};
use crate::spi::{self, BusChipSelect, SpiBusProvider, SpiError, SpiRegistry};

/// Bringup failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupError<'a, G, B> {
    /// SPI chip selects or bus instances
    Spi(SpiError<'a, G, B>),
    /// User buttons
    Buttons(ButtonError<'a, G>),
    /// A button uses a pin already claimed as a chip select
    PinConflict {
        /// Pin claimed twice
        pin: PinId,
        /// Button slot that claimed it second
        button: usize,
    },
}

impl<'a, G, B> From<SpiError<'a, G, B>> for BringupError<'a, G, B> {
    fn from(e: SpiError<'a, G, B>) -> Self {
        BringupError::Spi(e)
    }
}

impl<'a, G, B> From<ButtonError<'a, G>> for BringupError<'a, G, B> {
    fn from(e: ButtonError<'a, G>) -> Self {
        BringupError::Buttons(e)
    }
}

impl<G: fmt::Debug, B: fmt::Debug> fmt::Display for BringupError<'_, G, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BringupError::Spi(e) => e.fmt(f),
            BringupError::Buttons(e) => e.fmt(f),
            BringupError::PinConflict { pin, button } => write!(
                f,
                "button {} uses {}, which is already an SPI chip select; choose a different pin",
                button, pin
            ),
        }
    }
}

/// Brought-up board peripherals
#[derive(Debug, Clone, Default)]
pub struct Board {
    spi: SpiRegistry,
    buttons: ButtonDriver,
}

impl Board {
    /// Bring up the reference board
    pub fn bringup<'a, P, S>(
        config: &'a BoardConfig,
        gpio: &mut P,
        buses: &mut S,
    ) -> (Self, Result<(), BringupError<'a, P::Error, S::Error>>)
    where
        P: GpioPlatform,
        S: SpiBusProvider,
    {
        Self::bringup_with(config, Stm32h7Encoder, gpio, buses)
    }

    /// Bring up the board with an explicit pin encoder
    pub fn bringup_with<'a, E, P, S>(
        config: &'a BoardConfig,
        encoder: E,
        gpio: &mut P,
        buses: &mut S,
    ) -> (Self, Result<(), BringupError<'a, P::Error, S::Error>>)
    where
        E: PinEncoder,
        P: GpioPlatform,
        S: SpiBusProvider,
    {
        let mut first: FirstError<BringupError<'a, P::Error, S::Error>> = FirstError::new();

        let (spi, result) = spi::initialize(&config.bus_configs(), &encoder, gpio, buses);
        first.record(result.map_err(BringupError::from));

        let buttons = match config.buttons.as_button_config() {
            Some(buttons) => first
                .record(
                    ButtonDriver::initialize(&buttons, &encoder, gpio).map_err(BringupError::from),
                )
                .unwrap_or_default(),
            None => ButtonDriver::default(),
        };

        let board = Self { spi, buttons };
        if let Err(e) = board.check_conflicts() {
            first.fail(e);
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Board up: {} chip selects, {} buttons",
            board.spi.total_pins(),
            board.buttons.len()
        );

        (board, first.into_result())
    }

    /// Report the first button whose pin is also a chip select
    fn check_conflicts<'a, G, B>(&self) -> Result<(), BringupError<'a, G, B>> {
        let mut claims = GpioAllocator::new();
        for slot in self.spi.tables().iter().flat_map(|table| table.iter()) {
            // Chip selects shared between buses are the bus drivers' concern
            let _ = claims.claim(slot.id);
        }
        for (button, entry) in self.buttons.buttons().iter().enumerate() {
            if claims.claim(entry.id).is_err() {
                #[cfg(feature = "defmt")]
                defmt::error!("Button {} pin {} is also a chip select", button, entry.id);
                return Err(BringupError::PinConflict {
                    pin: entry.id,
                    button,
                });
            }
        }
        Ok(())
    }

    /// Chip-select registry
    pub fn spi(&self) -> &SpiRegistry {
        &self.spi
    }

    /// Chip-select handle for one bus
    pub fn chip_select(&self, bus: BusId) -> Option<BusChipSelect<'_, SPI_BUSES>> {
        BusChipSelect::new(&self.spi, bus)
    }

    /// Assert or deassert a device's chip select
    pub fn select<P: GpioPlatform>(&self, gpio: &mut P, device: DeviceId, assert: bool) {
        self.spi.select(gpio, device, assert);
    }

    /// Presence of an SPI device
    pub fn status(&self, device: DeviceId) -> DeviceStatus {
        self.spi.status(device)
    }

    /// User buttons
    pub fn buttons(&self) -> &ButtonDriver {
        &self.buttons
    }
}
