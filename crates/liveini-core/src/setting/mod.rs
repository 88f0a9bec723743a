//! Setting objects: decoding, scanning and live editing

mod filter;
mod record;
mod scanner;
mod store;
mod value;

pub use filter::{SettingFilter, SettingProperties};
pub use record::{RawSetting, SettingRecord};
pub use scanner::{scan_instances, scan_settings};
pub use store::{SettingStore, apply_record};
pub use value::{
    GameValue, OriginTag, ValueType, pack_color, parse_value, stringify, unpack_color,
};
