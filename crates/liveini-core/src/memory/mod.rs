pub mod layout;
mod process;
mod reader;
mod region;

#[cfg(test)]
pub mod mock;

pub use process::*;
pub use reader::{MemoryReader, QueryRegions, ReadMemory, WriteMemory};
pub use region::{MemoryBlock, RegionInfo, protect};

#[cfg(test)]
pub use mock::{MockMemory, MockMemoryBuilder};
