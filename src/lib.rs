pub mod config;
pub mod constants;
pub mod error;
pub mod eviction;
pub mod io;
pub mod memory;
pub mod translation;
pub mod vm_manager;

// Re-export commonly used items for convenience
pub use config::MmuConfig;
pub use constants::Word;
pub use error::{ConfigError, MmuError};
pub use memory::{PhysicalMemory, SimulatedMemory};
pub use translation::VirtualAddress;
pub use vm_manager::VirtualMemory;
