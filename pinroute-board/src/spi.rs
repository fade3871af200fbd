//! SPI chip-select bringup
//!
//! Builds the chip-select registry for all six SPI instances, acquires the
//! enabled buses and hands out per-bus select handles to bus drivers.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::{ErrorType, OutputPin};
use pinroute_core::{
    BuildError, BusCsConfig, BusId, ChipSelectRegistry, CsSlot, DeviceId, DeviceStatus,
    FirstError, RouteError,
};
use pinroute_hal::{EncodedPin, GpioPlatform, PinEncoder};

use crate::config::SPI_BUSES;

/// Chip-select registry of the reference board
pub type SpiRegistry = ChipSelectRegistry<SPI_BUSES>;

/// Acquires SPI bus instances from the platform
pub trait SpiBusProvider {
    /// Error type for bus acquisition
    type Error;

    /// Bring up one bus instance
    fn acquire(&mut self, bus: BusId) -> Result<(), Self::Error>;
}

impl<T: SpiBusProvider + ?Sized> SpiBusProvider for &mut T {
    type Error = T::Error;

    fn acquire(&mut self, bus: BusId) -> Result<(), Self::Error> {
        (**self).acquire(bus)
    }
}

/// SPI bringup failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError<'a, G, B> {
    /// Chip-select table could not be built
    ChipSelect(BuildError<'a, G>),
    /// Bus instance could not be acquired
    Bus {
        /// Bus that failed
        bus: BusId,
        /// Platform error, unchanged
        error: B,
    },
}

impl<'a, G, B> From<BuildError<'a, G>> for SpiError<'a, G, B> {
    fn from(e: BuildError<'a, G>) -> Self {
        SpiError::ChipSelect(e)
    }
}

impl<G: fmt::Debug, B: fmt::Debug> fmt::Display for SpiError<'_, G, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiError::ChipSelect(e) => e.fmt(f),
            SpiError::Bus { bus, error } => {
                write!(f, "{} could not be acquired: {:?}", bus, error)
            }
        }
    }
}

/// Build the chip-select registry and acquire every enabled bus
///
/// Every step runs even after a failure; the first failure is returned
/// alongside the registry.
pub fn initialize<'a, E, P, S>(
    configs: &[BusCsConfig<'a>; SPI_BUSES],
    encoder: E,
    gpio: &mut P,
    buses: &mut S,
) -> (SpiRegistry, Result<(), SpiError<'a, P::Error, S::Error>>)
where
    E: PinEncoder,
    P: GpioPlatform,
    S: SpiBusProvider,
{
    let (registry, result) = SpiRegistry::build(configs, encoder, gpio);
    let mut first: FirstError<SpiError<'a, P::Error, S::Error>> = FirstError::new();
    first.record(result.map_err(SpiError::from));

    for (index, config) in configs.iter().enumerate() {
        if !config.enabled {
            continue;
        }
        let Some(bus) = BusId::from_index(index) else {
            break;
        };
        if let Err(error) = buses.acquire(bus) {
            #[cfg(feature = "defmt")]
            defmt::error!("Failed to initialize SPI{} bus", bus.number());
            first.fail(SpiError::Bus { bus, error });
        }
    }

    #[cfg(feature = "defmt")]
    defmt::info!(
        "SPI initialized: {} chip-select pins configured",
        registry.total_pins()
    );

    (registry, first.into_result())
}

/// Chip-select handle for one bus
///
/// Bus drivers only see the device ids of their own bus; ids belonging to
/// another bus are ignored.
#[derive(Debug, Clone, Copy)]
pub struct BusChipSelect<'r, const BUSES: usize> {
    registry: &'r ChipSelectRegistry<BUSES>,
    bus: BusId,
}

impl<'r, const BUSES: usize> BusChipSelect<'r, BUSES> {
    /// Handle for `bus`, `None` if the registry has no such bus
    pub fn new(registry: &'r ChipSelectRegistry<BUSES>, bus: BusId) -> Option<Self> {
        registry.bus(bus).map(|_| Self { registry, bus })
    }

    /// Bus this handle serves
    pub fn bus(&self) -> BusId {
        self.bus
    }

    /// Check if `device` belongs to this bus
    pub fn owns(&self, device: DeviceId) -> bool {
        device.bus_index() == self.bus.index()
    }

    /// Look up a device on this bus
    pub fn resolve(&self, device: DeviceId) -> Result<CsSlot, RouteError> {
        if !self.owns(device) {
            return Err(RouteError::UnknownBus { device });
        }
        self.registry.resolve(device)
    }

    /// Assert or deassert a device's chip select
    pub fn select<P: GpioPlatform>(&self, gpio: &mut P, device: DeviceId, assert: bool) {
        if self.owns(device) {
            self.registry.select(gpio, device, assert);
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "SPI{}: device {} belongs to another bus",
                self.bus.number(),
                device.raw()
            );
        }
    }

    /// Presence of a device on this bus
    pub fn status(&self, device: DeviceId) -> DeviceStatus {
        if self.owns(device) {
            self.registry.status(device)
        } else {
            DeviceStatus::Absent
        }
    }

    /// Chip-select line for one device
    pub fn line<'g, P: GpioPlatform>(
        &self,
        device: DeviceId,
        gpio: &'g mut P,
    ) -> Result<CsLine<'g, P>, RouteError> {
        self.resolve(device).map(|slot| CsLine::new(slot.pin, gpio))
    }
}

/// One resolved chip select as an [`OutputPin`]
///
/// Driving the line low selects the device.
pub struct CsLine<'g, P> {
    gpio: &'g mut P,
    pin: EncodedPin,
}

impl<'g, P: GpioPlatform> CsLine<'g, P> {
    /// Wrap an encoded chip-select pin
    pub fn new(pin: EncodedPin, gpio: &'g mut P) -> Self {
        Self { gpio, pin }
    }

    /// Select the device (drive low)
    pub fn select(&mut self) {
        self.gpio.set_low(self.pin);
    }

    /// Deselect the device (drive high)
    pub fn deselect(&mut self) {
        self.gpio.set_high(self.pin);
    }
}

impl<P> ErrorType for CsLine<'_, P> {
    type Error = Infallible;
}

impl<P: GpioPlatform> OutputPin for CsLine<'_, P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.select();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.deselect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use pinroute_hal::mock::{GpioCall, MockEncoder, MockGpio};
    use pinroute_hal::{PinId, PinRole, Port};

    /// Bus provider that fails for one bus and records the rest
    #[derive(Default)]
    struct Buses {
        acquired: Vec<u8>,
        fail: Option<u8>,
    }

    impl SpiBusProvider for Buses {
        type Error = u8;

        fn acquire(&mut self, bus: BusId) -> Result<(), u8> {
            if self.fail == Some(bus.number()) {
                return Err(bus.number());
            }
            self.acquired.push(bus.number());
            Ok(())
        }
    }

    fn configs() -> [BusCsConfig<'static>; SPI_BUSES] {
        let mut configs = [BusCsConfig::DISABLED; SPI_BUSES];
        configs[0] = BusCsConfig::new(2, "PE0,PE1");
        configs[2] = BusCsConfig::new(1, "PD14");
        configs
    }

    fn encoded(port: Port, number: u8) -> EncodedPin {
        MockEncoder.encode(PinId::new(port, number).unwrap(), PinRole::chip_select())
    }

    #[test]
    fn test_initialize_acquires_enabled_buses() {
        let mut gpio = MockGpio::new();
        let mut buses = Buses::default();
        let (registry, result) = initialize(&configs(), MockEncoder, &mut gpio, &mut buses);

        assert_eq!(result, Ok(()));
        assert_eq!(registry.total_pins(), 3);
        assert_eq!(buses.acquired, &[1, 3]);
    }

    #[test]
    fn test_bus_failure_reported_after_cs_failure() {
        let mut gpio = MockGpio::new();
        let mut buses = Buses {
            fail: Some(3),
            ..Buses::default()
        };
        let mut configs = configs();
        configs[1] = BusCsConfig::new(2, "PA0");
        let (registry, result) = initialize(&configs, MockEncoder, &mut gpio, &mut buses);

        // Chip-select failure on SPI2 comes first; SPI3 acquisition still ran
        match result {
            Err(SpiError::ChipSelect(e)) => assert_eq!(e.bus(), BusId::new(2).unwrap()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(buses.acquired, &[1, 2]);
        assert_eq!(registry.total_pins(), 3);
    }

    #[test]
    fn test_bus_failure_only() {
        let mut gpio = MockGpio::new();
        let mut buses = Buses {
            fail: Some(1),
            ..Buses::default()
        };
        let (_, result) = initialize(&configs(), MockEncoder, &mut gpio, &mut buses);
        assert_eq!(
            result,
            Err(SpiError::Bus {
                bus: BusId::new(1).unwrap(),
                error: 1
            })
        );
    }

    #[test]
    fn test_bus_handle_rejects_foreign_ids() {
        let mut gpio = MockGpio::new();
        let (registry, _) = initialize(&configs(), MockEncoder, &mut gpio, &mut Buses::default());
        gpio.clear_calls();

        let spi3 = BusChipSelect::new(&registry, BusId::new(3).unwrap()).unwrap();
        assert_eq!(spi3.status(DeviceId::new(16)), DeviceStatus::Present);
        assert_eq!(spi3.status(DeviceId::new(0)), DeviceStatus::Absent);

        spi3.select(&mut gpio, DeviceId::new(0), true);
        assert_eq!(gpio.write_count(), 0);

        spi3.select(&mut gpio, DeviceId::new(16), true);
        assert_eq!(gpio.calls(), &[GpioCall::Write(encoded(Port::D, 14), false)]);

        assert!(BusChipSelect::new(&registry, BusId::new(7).unwrap()).is_none());
    }

    #[test]
    fn test_cs_line_output_pin() {
        let mut gpio = MockGpio::new();
        let (registry, _) = initialize(&configs(), MockEncoder, &mut gpio, &mut Buses::default());
        gpio.clear_calls();

        let spi1 = BusChipSelect::new(&registry, BusId::new(1).unwrap()).unwrap();
        let pe1 = encoded(Port::E, 1);
        {
            let mut line = spi1.line(DeviceId::new(1), &mut gpio).unwrap();
            line.set_low().unwrap();
            line.set_high().unwrap();
        }
        assert_eq!(
            gpio.calls(),
            &[GpioCall::Write(pe1, false), GpioCall::Write(pe1, true)]
        );

        assert!(spi1.line(DeviceId::new(5), &mut gpio).is_err());
        assert!(spi1.line(DeviceId::new(8), &mut gpio).is_err());
    }
}
