use serde::Serialize;

use crate::address::Address;
use crate::error::Result;
use crate::memory::layout::setting;

use super::filter::SettingProperties;
use super::value::{GameValue, OriginTag, ValueType, parse_value};

/// The four fields of a setting object as they sit in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RawSetting {
    pub vtable: u64,
    pub active: GameValue,
    pub default: GameValue,
    pub name: u64,
}

impl RawSetting {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < setting::SIZE {
            return None;
        }
        let field = |offset: u64| {
            let o = offset as usize;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[o..o + 8]);
            u64::from_le_bytes(raw)
        };

        Some(Self {
            vtable: field(setting::VTABLE),
            active: GameValue(field(setting::ACTIVE)),
            default: GameValue(field(setting::DEFAULT)),
            name: field(setting::NAME),
        })
    }
}

/// One recovered setting object
#[derive(Debug, Clone, Serialize)]
pub struct SettingRecord {
    pub address: Address,
    /// Object fields as captured at scan time
    pub raw: RawSetting,
    pub name: String,
    /// Lower-cased name
    pub search_key: String,
    pub value_type: ValueType,
    pub origin: OriginTag,
    /// Editable value, written on apply
    pub current: GameValue,
    /// Value last written to (or read from) the live object
    pub active: GameValue,
    pub changed: bool,
}

impl SettingRecord {
    pub fn new(address: Address, raw: RawSetting, name: String, origin: OriginTag) -> Self {
        Self {
            address,
            raw,
            search_key: name.to_lowercase(),
            value_type: ValueType::from_name(&name),
            name,
            origin,
            current: raw.active,
            active: raw.active,
            changed: false,
        }
    }

    /// Set the editable value from operator text
    pub fn set_from_text(&mut self, text: &str) -> Result<()> {
        self.current = parse_value(self.value_type, text, self.current)?;
        Ok(())
    }

    /// Edit back to the object's default value
    pub fn revert_to_default(&mut self) {
        self.current = self.raw.default;
    }

    /// Edit back to the value the object held when scanned
    pub fn revert_to_last_ini(&mut self) {
        self.current = self.raw.active;
    }

    pub fn properties(&self) -> SettingProperties {
        let mut props = SettingProperties::from_type(self.value_type)
            | SettingProperties::from_origin(self.origin);
        if self.changed {
            props |= SettingProperties::CHANGED;
        }
        props
    }

    pub fn image_offset(&self, base: Address) -> Option<u32> {
        self.address.to_image_offset(base)
    }
}
