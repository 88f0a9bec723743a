//! Tool configuration loaded from TOML

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::memory::layout::heap;
use crate::setting::OriginTag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub heap: HeapConfig,
    pub dump: DumpConfig,
    /// Setting classes scanned for instances, in scan order
    pub classes: Vec<KnownClass>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            heap: HeapConfig::default(),
            dump: DumpConfig::default(),
            classes: default_classes(),
        }
    }
}

/// How the target process is located
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub exe_name: String,
    pub window_title: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            exe_name: "Starfield.exe".to_string(),
            window_title: "Starfield".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Regions smaller than this are not searched
    pub min_region_size: u64,
    pub chunk_size: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            min_region_size: heap::MIN_REGION_SIZE,
            chunk_size: heap::SCAN_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub path: String,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            path: "search_results.txt".to_string(),
        }
    }
}

/// A decorated class name whose instances are settings, and the origin those
/// settings are tagged with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownClass {
    pub name: String,
    pub origin: OriginTag,
}

impl KnownClass {
    pub fn new(name: &str, origin: OriginTag) -> Self {
        Self {
            name: name.to_string(),
            origin,
        }
    }
}

fn default_classes() -> Vec<KnownClass> {
    vec![
        KnownClass::new(".?AV?$SettingT@VINISettingCollection@@@@", OriginTag::Ini),
        KnownClass::new(
            ".?AVRendererQualitySetting@CreationRenderer@@",
            OriginTag::IniPref,
        ),
        KnownClass::new(
            ".?AV?$SettingT@VGameSettingCollection@@@@",
            OriginTag::GameSetting,
        ),
    ]
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the
    /// defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}
