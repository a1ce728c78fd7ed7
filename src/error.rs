use crate::constants::Word;

/// Rejected layout passed to [`crate::config::MmuConfig::new`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("offset width must be at least 1")]
    ZeroOffsetWidth,
    #[error("offset width {0} exceeds the supported maximum of {max}", max = crate::constants::MAX_OFFSET_WIDTH)]
    OffsetTooWide(u32),
    #[error("virtual address width {virtual_width} is smaller than offset width {offset_width}")]
    VirtualNarrowerThanOffset { virtual_width: u32, offset_width: u32 },
    #[error("virtual address width {0} exceeds the supported maximum of {max}", max = crate::constants::MAX_VIRTUAL_ADDRESS_WIDTH)]
    VirtualTooWide(u32),
    #[error("at least one physical frame is required")]
    NoFrames,
    #[error("{num_frames} frames cannot hold a root-to-leaf path of {required} frames")]
    TooFewFrames { num_frames: u64, required: u64 },
    #[error("{0} frames cannot be indexed by a table entry")]
    TooManyFrames(u64),
    #[error(
        "virtual address width {virtual_width} with offset width {offset_width} leaves low page bits untranslated"
    )]
    UnaddressablePageBits { virtual_width: u32, offset_width: u32 },
}

/// Failure of a virtual memory operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MmuError {
    #[error("virtual address {address:#x} is outside the {size:#x}-word address space")]
    OutOfRange { address: u64, size: u64 },
    #[error("virtual address {address:#x} did not resolve to a mapped frame")]
    TranslationFailure { address: u64 },
    #[error("table entry at physical address {address:#x} holds invalid frame index {value}")]
    CorruptTableEntry { address: u64, value: Word },
}
