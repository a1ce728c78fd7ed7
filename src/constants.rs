/// A single word of physical memory. Table entries are words too.
pub type Word = i32;

/// The root page table always lives in frame 0.
pub const ROOT_FRAME: u64 = 0;

/// Table entry value meaning "no child".
pub const EMPTY_ENTRY: Word = 0;

pub const DEFAULT_OFFSET_WIDTH: u32 = 4;
pub const DEFAULT_PHYSICAL_ADDRESS_WIDTH: u32 = 10;
pub const DEFAULT_VIRTUAL_ADDRESS_WIDTH: u32 = 20;
pub const DEFAULT_NUM_FRAMES: u64 = 1 << (DEFAULT_PHYSICAL_ADDRESS_WIDTH - DEFAULT_OFFSET_WIDTH);

// addresses are u64, so the address space size 2^width must fit in one
pub const MAX_VIRTUAL_ADDRESS_WIDTH: u32 = 63;

// keeps a frame's words addressable as a Vec on any host
pub const MAX_OFFSET_WIDTH: u32 = 31;
