use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::setting::STRING_READ_LEN;

/// One 8-byte value slot of a setting object, read as whichever type the
/// setting holds. Narrow setters keep the untouched upper bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameValue(pub u64);

impl GameValue {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn as_bool(self) -> bool {
        self.0 as u8 != 0
    }

    pub fn as_int(self) -> i32 {
        self.0 as u32 as i32
    }

    pub fn as_unsigned(self) -> u32 {
        self.0 as u32
    }

    pub fn as_float(self) -> f32 {
        f32::from_bits(self.0 as u32)
    }

    pub fn as_ptr(self) -> u64 {
        self.0
    }

    pub fn with_bool(self, value: bool) -> Self {
        Self((self.0 & !0xFF) | value as u64)
    }

    pub fn with_unsigned(self, value: u32) -> Self {
        Self((self.0 & !0xFFFF_FFFF) | value as u64)
    }

    pub fn with_int(self, value: i32) -> Self {
        self.with_unsigned(value as u32)
    }

    pub fn with_float(self, value: f32) -> Self {
        self.with_unsigned(value.to_bits())
    }
}

/// Value type, decided by the first letter of the setting name
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum ValueType {
    Unknown,
    Int,
    Unsigned,
    Bool,
    Float,
    #[strum(serialize = "ColorRGB")]
    Rgb,
    #[strum(serialize = "ColorRGBA")]
    Rgba,
    String,
}

impl ValueType {
    /// Hungarian prefix convention: `fFov`, `bShowHud`, `iSize`, `sName`,
    /// `uMask`/`cChar`/`hHandle`, `rColor`, `aColor`
    pub fn from_name(name: &str) -> Self {
        match name.bytes().next().map(|c| c.to_ascii_lowercase()) {
            Some(b'f') => Self::Float,
            Some(b'b') => Self::Bool,
            Some(b'i') => Self::Int,
            Some(b's') => Self::String,
            Some(b'u' | b'c' | b'h') => Self::Unsigned,
            Some(b'r') => Self::Rgb,
            Some(b'a') => Self::Rgba,
            _ => Self::Unknown,
        }
    }

    /// Types whose value can be set from text
    pub fn is_editable(self) -> bool {
        !matches!(self, Self::String | Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Which setting collection a record was found through
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum OriginTag {
    #[default]
    Unknown,
    #[serde(rename = "INI")]
    #[strum(serialize = "INI")]
    Ini,
    #[serde(rename = "INIPref")]
    #[strum(serialize = "INIPref")]
    IniPref,
    GameSetting,
}

impl OriginTag {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Split a packed `0xRRGGBBAA` word into channels
pub fn unpack_color(word: u32) -> [u8; 4] {
    word.to_be_bytes()
}

/// Pack channels into a `0xRRGGBBAA` word
pub fn pack_color(channels: [u8; 4]) -> u32 {
    u32::from_be_bytes(channels)
}

/// Display text for a value of the given type. String values are read from
/// the live process; a failed read yields `<error>`.
pub fn stringify<R: ReadMemory>(value: GameValue, ty: ValueType, reader: &R) -> String {
    match ty {
        ValueType::Bool => (if value.as_bool() { "True" } else { "False" }).to_string(),
        ValueType::Float => format!("{:.6}", value.as_float()),
        ValueType::Int => value.as_int().to_string(),
        ValueType::Unsigned => value.as_unsigned().to_string(),
        ValueType::Unknown => "<unknown>".to_string(),
        ValueType::String => reader
            .read_cstring(value.as_ptr(), STRING_READ_LEN)
            .unwrap_or_else(|_| "<error>".to_string()),
        ValueType::Rgb | ValueType::Rgba => {
            let [r, g, b, a] = unpack_color(value.as_unsigned());
            format!("\"{},{},{},{}\"", r, g, b, a)
        }
    }
}

/// Parse operator text into a new value of the given type, keeping the bytes
/// of `current` that the type does not cover
pub fn parse_value(ty: ValueType, text: &str, current: GameValue) -> Result<GameValue> {
    let text = text.trim();
    let invalid = || Error::InvalidValue(format!("'{}' is not a valid {} value", text, ty));

    match ty {
        ValueType::Bool => match text.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(current.with_bool(true)),
            "false" | "0" => Ok(current.with_bool(false)),
            _ => Err(invalid()),
        },
        ValueType::Float => text
            .parse::<f32>()
            .map(|v| current.with_float(v))
            .map_err(|_| invalid()),
        ValueType::Int => text
            .parse::<i32>()
            .map(|v| current.with_int(v))
            .map_err(|_| invalid()),
        ValueType::Unsigned => parse_unsigned(text)
            .map(|v| current.with_unsigned(v))
            .ok_or_else(invalid),
        ValueType::Rgb | ValueType::Rgba => {
            let parts: Vec<&str> = text.trim_matches('"').split(',').map(str::trim).collect();
            if parts.len() != 3 && parts.len() != 4 {
                return Err(invalid());
            }
            let mut channels = [0u8, 0, 0, 0xFF];
            if ty == ValueType::Rgb && parts.len() == 3 {
                channels[3] = unpack_color(current.as_unsigned())[3];
            }
            for (slot, part) in channels.iter_mut().zip(&parts) {
                *slot = part.parse::<u8>().map_err(|_| invalid())?;
            }
            Ok(current.with_unsigned(pack_color(channels)))
        }
        ValueType::String | ValueType::Unknown => Err(Error::InvalidValue(format!(
            "{} settings are not editable",
            ty
        ))),
    }
}

fn parse_unsigned(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse::<u32>().ok(),
    }
}
