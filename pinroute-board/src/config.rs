//! Board configuration
//!
//! The configuration is normally a TOML document:
//!
//! ```toml
//! [spi.1]
//! enabled = true
//! cs_count = 3
//! cs_pins = "PE0, PE1, PE3"
//!
//! [buttons]
//! enabled = true
//! builtin = true
//! count = 5
//! pins = "PF15,PG14,PG9,PE0"
//! port_case = "strict"
//! ```
//!
//! Stored configuration may also be a postcard blob of [`BoardConfig`];
//! [`BoardConfig::load`] tries TOML first and falls back to binary.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::{fmt, str};

use pinroute_core::{BusCsConfig, BusId, ButtonConfig, PortCase};
use serde::{Deserialize, Serialize};

/// Binary configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// SPI bus instances on the reference board
pub const SPI_BUSES: usize = 6;

/// Configuration compiled into the firmware
pub const DEFAULT_TOML: &str = include_str!("board.toml");

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML parsing failed
    TomlParse,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Binary deserialization failed
    Deserialize,
    /// Binary serialization failed
    Serialize,
    /// Binary config version mismatch
    VersionMismatch {
        /// Version found in the blob
        found: u8,
    },
    /// `[spi.N]` section with N outside 1-6
    InvalidBus,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TomlParse => f.write_str("configuration is not valid TOML"),
            ConfigError::InvalidUtf8 => f.write_str("configuration is not valid UTF-8"),
            ConfigError::Deserialize => f.write_str("binary configuration is corrupt"),
            ConfigError::Serialize => f.write_str("configuration could not be serialized"),
            ConfigError::VersionMismatch { found } => write!(
                f,
                "binary configuration version {} (expected {})",
                found, CONFIG_VERSION
            ),
            ConfigError::InvalidBus => write!(
                f,
                "SPI section must be [spi.1] to [spi.{}]",
                SPI_BUSES
            ),
        }
    }
}

/// Chip-select configuration for one SPI bus
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiBusConfig {
    /// Bus is in use
    pub enabled: bool,
    /// Number of chip selects in `cs_pins`
    pub cs_count: usize,
    /// Chip-select pins in slot order
    pub cs_pins: String,
    /// Port letter case policy for `cs_pins`
    pub port_case: PortCase,
}

impl SpiBusConfig {
    /// Borrowed view for the chip-select registry
    pub fn as_cs_config(&self) -> BusCsConfig<'_> {
        BusCsConfig {
            enabled: self.enabled,
            cs_count: self.cs_count,
            cs_pins: &self.cs_pins,
            case: self.port_case,
        }
    }
}

/// User button configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonsConfig {
    /// Button subsystem is in use
    pub enabled: bool,
    /// On-board button occupies slot 0
    pub builtin: bool,
    /// Total buttons, built-in included
    pub count: usize,
    /// External button pins in slot order
    pub pins: String,
    /// Port letter case policy for `pins`
    pub port_case: PortCase,
}

impl ButtonsConfig {
    /// Borrowed view for the button validator, `None` when disabled
    pub fn as_button_config(&self) -> Option<ButtonConfig<'_>> {
        self.enabled.then(|| ButtonConfig {
            builtin: self.builtin,
            external_pins: &self.pins,
            total_count: self.count,
            case: self.port_case,
        })
    }
}

/// Complete board configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Binary format version
    pub version: u8,
    /// SPI buses, SPI1 first
    pub spi: [SpiBusConfig; SPI_BUSES],
    /// User buttons
    pub buttons: ButtonsConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            spi: Default::default(),
            buttons: ButtonsConfig::default(),
        }
    }
}

/// TOML document layout; bus sections are keyed by number
#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    spi: BTreeMap<String, SpiBusConfig>,
    #[serde(default)]
    buttons: ButtonsConfig,
}

impl BoardConfig {
    /// Parse the configuration compiled into the firmware
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(DEFAULT_TOML)
    }

    /// Parse a TOML document
    ///
    /// Missing sections leave the bus or button subsystem disabled.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let doc: Document = toml::from_str(text).map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("TOML parse error: {}", defmt::Display2Format(&_e));
            ConfigError::TomlParse
        })?;

        let mut config = Self::default();
        for (key, bus) in doc.spi {
            let index = key
                .parse::<u8>()
                .ok()
                .and_then(BusId::new)
                .map(BusId::index)
                .filter(|&index| index < SPI_BUSES)
                .ok_or_else(|| {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Unknown SPI bus [spi.{}]", key.as_str());
                    ConfigError::InvalidBus
                })?;
            config.spi[index] = bus;
        }
        config.buttons = doc.buttons;

        Ok(config)
    }

    /// Decode a postcard blob
    pub fn from_postcard(data: &[u8]) -> Result<Self, ConfigError> {
        let config: BoardConfig =
            postcard::from_bytes(data).map_err(|_| ConfigError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Config version mismatch: found {}, expected {}",
                config.version,
                CONFIG_VERSION
            );
            return Err(ConfigError::VersionMismatch {
                found: config.version,
            });
        }
        Ok(config)
    }

    /// Encode as a postcard blob
    pub fn to_postcard(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Serialize)
    }

    /// Load stored configuration
    ///
    /// Tries TOML first and falls back to the binary format. A TOML document
    /// that parses but names an unknown bus is reported as such.
    pub fn load(data: &[u8]) -> Result<Self, ConfigError> {
        let toml = str::from_utf8(data)
            .map_err(|_| ConfigError::InvalidUtf8)
            .and_then(Self::from_toml);

        match toml {
            Ok(config) => {
                #[cfg(feature = "defmt")]
                defmt::info!("Loaded configuration from TOML");
                Ok(config)
            }
            Err(ConfigError::InvalidBus) => Err(ConfigError::InvalidBus),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Not a TOML configuration ({}), trying binary", _e);
                Self::from_postcard(data)
            }
        }
    }

    /// Chip-select configuration of every bus, SPI1 first
    pub fn bus_configs(&self) -> [BusCsConfig<'_>; SPI_BUSES] {
        core::array::from_fn(|index| self.spi[index].as_cs_config())
    }

    /// Configuration of one bus
    pub fn spi_bus(&self, bus: BusId) -> Option<&SpiBusConfig> {
        self.spi.get(bus.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[spi.1]
enabled = true
cs_count = 3
cs_pins = "PE0, PE1, PE3"

[spi.4]
enabled = true
cs_count = 1
cs_pins = "pb2"
port_case = "fold"

[buttons]
enabled = true
builtin = true
count = 5
pins = "PF15,PG14,PG9,PE0"
"#;

    #[test]
    fn test_parse_full_document() {
        let config = BoardConfig::from_toml(FULL).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);

        let spi1 = &config.spi[0];
        assert!(spi1.enabled);
        assert_eq!(spi1.cs_count, 3);
        assert_eq!(spi1.cs_pins, "PE0, PE1, PE3");
        assert_eq!(spi1.port_case, PortCase::Strict);

        let spi4 = config.spi_bus(BusId::new(4).unwrap()).unwrap();
        assert_eq!(spi4.port_case, PortCase::Fold);

        let buttons = config.buttons.as_button_config().unwrap();
        assert!(buttons.builtin);
        assert_eq!(buttons.total_count, 5);
        assert_eq!(buttons.external_pins, "PF15,PG14,PG9,PE0");
    }

    #[test]
    fn test_missing_sections_are_disabled() {
        let config = BoardConfig::from_toml("").unwrap();
        assert!(config.spi.iter().all(|bus| !bus.enabled));
        assert!(config.buttons.as_button_config().is_none());

        let configs = config.bus_configs();
        assert!(configs.iter().all(|c| c.expected() == 0));
    }

    #[test]
    fn test_bus_configs_borrow_lists() {
        let config = BoardConfig::from_toml(FULL).unwrap();
        let configs = config.bus_configs();
        assert_eq!(configs[0].expected(), 3);
        assert_eq!(configs[0].cs_pins, "PE0, PE1, PE3");
        assert_eq!(configs[3].case, PortCase::Fold);
        assert_eq!(configs[1], BusCsConfig::DISABLED);
    }

    #[test]
    fn test_invalid_bus_rejected() {
        for key in ["0", "7", "x", "-1"] {
            let text = alloc::format!("[spi.{}]\nenabled = true\n", key);
            assert_eq!(BoardConfig::from_toml(&text), Err(ConfigError::InvalidBus));
            assert_eq!(
                BoardConfig::load(text.as_bytes()),
                Err(ConfigError::InvalidBus)
            );
        }
        assert!(BoardConfig::from_toml("[spi.6]\nenabled = true\n").is_ok());
    }

    #[test]
    fn test_bad_toml() {
        assert_eq!(
            BoardConfig::from_toml("[spi.1\nenabled = yes"),
            Err(ConfigError::TomlParse)
        );
        assert_eq!(
            BoardConfig::from_toml("[buttons]\ncount = -1\n"),
            Err(ConfigError::TomlParse)
        );
    }

    #[test]
    fn test_postcard_roundtrip() {
        let config = BoardConfig::from_toml(FULL).unwrap();
        let blob = config.to_postcard().unwrap();
        assert_eq!(BoardConfig::from_postcard(&blob), Ok(config));
    }

    #[test]
    fn test_postcard_version_check() {
        let config = BoardConfig {
            version: 2,
            ..BoardConfig::default()
        };
        let blob = config.to_postcard().unwrap();
        assert_eq!(
            BoardConfig::from_postcard(&blob),
            Err(ConfigError::VersionMismatch { found: 2 })
        );
        assert_eq!(
            BoardConfig::from_postcard(&[0xFF]),
            Err(ConfigError::Deserialize)
        );
    }

    #[test]
    fn test_load_prefers_toml_then_binary() {
        let config = BoardConfig::load(FULL.as_bytes()).unwrap();
        assert_eq!(config.spi[0].cs_count, 3);

        let blob = config.to_postcard().unwrap();
        assert_eq!(BoardConfig::load(&blob), Ok(config));

        assert_eq!(
            BoardConfig::load(&[0xFF, 0xFE]),
            Err(ConfigError::Deserialize)
        );
    }

    #[test]
    fn test_embedded_default() {
        let config = BoardConfig::embedded().unwrap();
        assert!(config.spi[0].enabled);
        assert_eq!(config.spi[0].cs_count, 1);
        assert!(!config.spi[1].enabled);

        let buttons = config.buttons.as_button_config().unwrap();
        assert!(buttons.builtin);
        assert_eq!(buttons.total_count, 1);
    }
}
