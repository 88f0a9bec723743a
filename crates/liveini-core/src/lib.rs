//! # liveini-core
//!
//! Core library for LiveINI, a live editor for the setting objects of a
//! running 64-bit game executable.
//!
//! This crate provides:
//! - PE64 section map and version lookup over a captured module image
//! - RTTI name harvesting and heuristic vtable reconstruction
//! - Setting instance scanning by vtable pointer
//! - A setting store with stale-checked write-back to the live process
//! - Wildcard byte signatures and reverse pointer search over large heaps

pub mod address;
pub mod config;
pub mod error;
pub mod export;
pub mod heap;
pub mod image;
pub mod memory;
pub mod query;
pub mod rtti;
pub mod session;
pub mod setting;
pub mod signature;

pub use address::Address;
pub use config::{Config, DumpConfig, HeapConfig, KnownClass, TargetConfig};
pub use error::{Error, Result};
pub use export::{write_dump, write_rtti_json};
pub use image::{ImageVersion, MemorySnapshot, Section, SectionTable};
pub use memory::{
    MemoryBlock, MemoryReader, ProcessHandle, QueryRegions, ReadMemory, RegionInfo, WriteMemory,
};
pub use query::TextQuery;
pub use rtti::{MethodHit, RttiEntry, RttiTable};
pub use session::{Analysis, HeapMatches, Session};
pub use setting::{
    GameValue, OriginTag, RawSetting, SettingFilter, SettingProperties, SettingRecord,
    SettingStore, ValueType,
};
pub use signature::{CompiledSignature, NOT_FOUND};
