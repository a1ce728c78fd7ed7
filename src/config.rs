use crate::constants::*;
use crate::error::ConfigError;

/// Layout of the simulated machine: address widths and physical frame count.
///
/// Built once, validated, and passed by reference to every component that
/// needs to split addresses or size physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuConfig {
    virtual_address_width: u32,
    offset_width: u32,
    num_frames: u64,
    tables_depth: u32,
}

impl MmuConfig {
    pub fn new(
        virtual_address_width: u32,
        offset_width: u32,
        num_frames: u64,
    ) -> Result<Self, ConfigError> {
        if offset_width == 0 {
            return Err(ConfigError::ZeroOffsetWidth);
        }
        if offset_width > MAX_OFFSET_WIDTH {
            return Err(ConfigError::OffsetTooWide(offset_width));
        }
        if virtual_address_width < offset_width {
            return Err(ConfigError::VirtualNarrowerThanOffset {
                virtual_width: virtual_address_width,
                offset_width,
            });
        }
        if virtual_address_width > MAX_VIRTUAL_ADDRESS_WIDTH {
            return Err(ConfigError::VirtualTooWide(virtual_address_width));
        }

        // The level codec places its windows relative to the remainder; past
        // half a window the lowest page bits are never read.
        let remainder = virtual_address_width % offset_width;
        if 2 * remainder > offset_width {
            return Err(ConfigError::UnaddressablePageBits {
                virtual_width: virtual_address_width,
                offset_width,
            });
        }

        let tables_depth = (virtual_address_width - offset_width).div_ceil(offset_width);

        if num_frames == 0 {
            return Err(ConfigError::NoFrames);
        }
        if num_frames <= u64::from(tables_depth) {
            return Err(ConfigError::TooFewFrames {
                num_frames,
                required: u64::from(tables_depth) + 1,
            });
        }
        if num_frames > Word::MAX as u64 {
            return Err(ConfigError::TooManyFrames(num_frames));
        }

        Ok(MmuConfig {
            virtual_address_width,
            offset_width,
            num_frames,
            tables_depth,
        })
    }

    #[inline]
    pub fn virtual_address_width(&self) -> u32 {
        self.virtual_address_width
    }

    #[inline]
    pub fn offset_width(&self) -> u32 {
        self.offset_width
    }

    #[inline]
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    /// Number of table levels between the root and a leaf frame.
    #[inline]
    pub fn tables_depth(&self) -> u32 {
        self.tables_depth
    }

    /// Words per page, which is also the number of entries per table.
    #[inline]
    pub fn page_size(&self) -> u64 {
        1 << self.offset_width
    }

    #[inline]
    pub fn offset_mask(&self) -> u64 {
        self.page_size() - 1
    }

    #[inline]
    pub fn num_pages(&self) -> u64 {
        1 << (self.virtual_address_width - self.offset_width)
    }

    #[inline]
    pub fn virtual_memory_size(&self) -> u64 {
        1 << self.virtual_address_width
    }

    /// Total words of physical memory.
    #[inline]
    pub fn ram_size(&self) -> u64 {
        self.num_frames << self.offset_width
    }
}

impl Default for MmuConfig {
    fn default() -> Self {
        MmuConfig {
            virtual_address_width: DEFAULT_VIRTUAL_ADDRESS_WIDTH,
            offset_width: DEFAULT_OFFSET_WIDTH,
            num_frames: DEFAULT_NUM_FRAMES,
            tables_depth: (DEFAULT_VIRTUAL_ADDRESS_WIDTH - DEFAULT_OFFSET_WIDTH)
                .div_ceil(DEFAULT_OFFSET_WIDTH),
        }
    }
}

impl std::fmt::Display for MmuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "VA width {}, offset width {}, {} frames ({} levels, {} pages)",
            self.virtual_address_width,
            self.offset_width,
            self.num_frames,
            self.tables_depth,
            self.num_pages()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = MmuConfig::default();

        assert_eq!(config.page_size(), 16);
        assert_eq!(config.num_frames(), 64);
        assert_eq!(config.tables_depth(), 4); // 16 page bits / 4 per level
        assert_eq!(config.num_pages(), 1 << 16);
        assert_eq!(config.virtual_memory_size(), 1 << 20);
        assert_eq!(config.ram_size(), 64 * 16);

        // Default must agree with the validating constructor
        assert_eq!(MmuConfig::new(20, 4, 64), Ok(config));
    }

    #[test]
    fn test_depth_rounds_up() {
        // 10 - 4 = 6 page bits over 4-bit tables -> 2 levels, top one has 2 bits
        let config = MmuConfig::new(10, 4, 8).unwrap();
        assert_eq!(config.tables_depth(), 2);
        assert_eq!(config.num_pages(), 64);
    }

    #[test]
    fn test_zero_depth() {
        // A single page: the root frame is the page itself
        let config = MmuConfig::new(4, 4, 1).unwrap();
        assert_eq!(config.tables_depth(), 0);
        assert_eq!(config.num_pages(), 1);
    }

    #[test]
    fn test_rejects_bad_widths() {
        assert_eq!(MmuConfig::new(10, 0, 8), Err(ConfigError::ZeroOffsetWidth));
        assert_eq!(MmuConfig::new(40, 32, 8), Err(ConfigError::OffsetTooWide(32)));
        assert_eq!(
            MmuConfig::new(3, 4, 8),
            Err(ConfigError::VirtualNarrowerThanOffset { virtual_width: 3, offset_width: 4 })
        );
        assert_eq!(MmuConfig::new(64, 4, 64), Err(ConfigError::VirtualTooWide(64)));
    }

    #[test]
    fn test_rejects_untranslated_page_bits() {
        // remainder 2 of a 3-bit window: the lowest page bit would be dropped
        assert_eq!(
            MmuConfig::new(11, 3, 16),
            Err(ConfigError::UnaddressablePageBits { virtual_width: 11, offset_width: 3 })
        );
        // remainder 1 of a 3-bit window is fine
        assert!(MmuConfig::new(10, 3, 16).is_ok());
    }

    #[test]
    fn test_rejects_frame_counts() {
        assert_eq!(MmuConfig::new(4, 4, 0), Err(ConfigError::NoFrames));

        // VAW 10, OW 2 -> depth 4, a full path needs 5 frames
        assert_eq!(
            MmuConfig::new(10, 2, 4),
            Err(ConfigError::TooFewFrames { num_frames: 4, required: 5 })
        );
        assert!(MmuConfig::new(10, 2, 5).is_ok());

        let too_many = Word::MAX as u64 + 1;
        assert_eq!(MmuConfig::new(20, 4, too_many), Err(ConfigError::TooManyFrames(too_many)));
    }

    #[test]
    fn test_display() {
        let display = format!("{}", MmuConfig::default());
        assert!(display.contains("VA width 20"));
        assert!(display.contains("64 frames"));
    }
}
