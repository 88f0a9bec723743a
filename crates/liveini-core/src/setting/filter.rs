use bitflags::bitflags;

use crate::query::TextQuery;

use super::record::SettingRecord;
use super::value::{OriginTag, ValueType};

bitflags! {
    /// Properties a search can include or exclude records by
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SettingProperties: u32 {
        const TYPE_UNKNOWN = 1 << 0;
        const TYPE_INT = 1 << 1;
        const TYPE_UNSIGNED = 1 << 2;
        const TYPE_BOOL = 1 << 3;
        const TYPE_FLOAT = 1 << 4;
        const TYPE_RGB = 1 << 5;
        const TYPE_RGBA = 1 << 6;
        const TYPE_STRING = 1 << 7;

        const ORIGIN_UNKNOWN = 1 << 8;
        const ORIGIN_INI = 1 << 9;
        const ORIGIN_INI_PREF = 1 << 10;
        const ORIGIN_GAME_SETTING = 1 << 11;

        /// Written to the live process since the scan
        const CHANGED = 1 << 12;
    }
}

impl SettingProperties {
    pub fn from_type(ty: ValueType) -> Self {
        match ty {
            ValueType::Unknown => Self::TYPE_UNKNOWN,
            ValueType::Int => Self::TYPE_INT,
            ValueType::Unsigned => Self::TYPE_UNSIGNED,
            ValueType::Bool => Self::TYPE_BOOL,
            ValueType::Float => Self::TYPE_FLOAT,
            ValueType::Rgb => Self::TYPE_RGB,
            ValueType::Rgba => Self::TYPE_RGBA,
            ValueType::String => Self::TYPE_STRING,
        }
    }

    pub fn from_origin(origin: OriginTag) -> Self {
        match origin {
            OriginTag::Unknown => Self::ORIGIN_UNKNOWN,
            OriginTag::Ini => Self::ORIGIN_INI,
            OriginTag::IniPref => Self::ORIGIN_INI_PREF,
            OriginTag::GameSetting => Self::ORIGIN_GAME_SETTING,
        }
    }

    /// Parse a property name as typed by the operator: a value type
    /// (`float`, `colorrgb`), an origin (`ini`, `gamesetting`) or `changed`
    pub fn parse_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("changed") {
            return Some(Self::CHANGED);
        }
        if let Ok(ty) = name.parse::<ValueType>() {
            return Some(Self::from_type(ty));
        }
        name.parse::<OriginTag>().ok().map(Self::from_origin)
    }
}

/// Text query plus property include/exclude sets.
///
/// A record is kept when it has any included property, no excluded property,
/// and its search key matches the query.
#[derive(Debug, Clone)]
pub struct SettingFilter {
    pub query: TextQuery,
    pub include: SettingProperties,
    pub exclude: SettingProperties,
}

impl Default for SettingFilter {
    fn default() -> Self {
        Self {
            query: TextQuery::Any,
            include: SettingProperties::all(),
            exclude: SettingProperties::empty(),
        }
    }
}

impl SettingFilter {
    pub fn new(query: &str) -> Self {
        Self {
            query: TextQuery::new(query),
            ..Default::default()
        }
    }

    pub fn include(mut self, props: SettingProperties) -> Self {
        self.include = props;
        self
    }

    pub fn exclude(mut self, props: SettingProperties) -> Self {
        self.exclude = props;
        self
    }

    pub fn matches(&self, record: &SettingRecord) -> bool {
        let props = record.properties();
        props.intersects(self.include)
            && !props.intersects(self.exclude)
            && self.query.matches(&record.search_key)
    }
}
