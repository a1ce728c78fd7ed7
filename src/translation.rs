use crate::config::MmuConfig;

/// Represents the decomposed components of a Virtual Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u64,
    pub page: u64,
    pub offset: u64,
}

impl VirtualAddress {
    /// Split a raw VA into page number and intra-page offset
    pub fn from_raw(va: u64, config: &MmuConfig) -> Self {
        VirtualAddress {
            va,
            page: va >> config.offset_width(),
            offset: va & config.offset_mask(),
        }
    }

    /// Table index used to descend from `level` to `level + 1`
    #[inline]
    pub fn level_index(&self, level: u32, config: &MmuConfig) -> u64 {
        level_offset(self.page, level, config)
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({}) = (page={}, offset={})", self.va, self.page, self.offset)
    }
}

/// Signed right-shift that brings the `level` window of a page number down
/// to bit 0.
///
/// The window ends at bit `(level + 2) * OW - (VAW mod OW)` counted from the
/// low end of the full address. When VAW is not a multiple of OW the top
/// level gets fewer bits than the others, and the last window can reach past
/// bit 0 of the page; a negative result means shift left instead.
fn level_shift(level: u32, config: &MmuConfig) -> i64 {
    let ow = i64::from(config.offset_width());
    let vaw = i64::from(config.virtual_address_width());
    let bit_index = (i64::from(level) + 2) * ow - vaw % ow;
    vaw - bit_index
}

/// Extract the table index for tree depth `level` (0 = first level below root)
pub fn level_offset(page: u64, level: u32, config: &MmuConfig) -> u64 {
    let shift = level_shift(level, config);
    let window = if shift >= 0 {
        page >> shift
    } else {
        page << -shift
    };
    window & config.offset_mask()
}

/// Inverse of [`level_offset`]: merge the index taken at `level` back into a
/// partially rebuilt page number.
pub fn place_level_index(prefix: u64, index: u64, level: u32, config: &MmuConfig) -> u64 {
    let shift = level_shift(level, config);
    let bits = if shift >= 0 {
        index << shift
    } else {
        index >> -shift
    };
    prefix | bits
}

/// Physical address of word `offset` inside frame `frame`
#[inline]
pub fn physical_address(frame: u64, offset: u64, config: &MmuConfig) -> u64 {
    (frame << config.offset_width()) + offset
}

/// Wrap-around distance between two pages in a space of `num_pages`
pub fn cyclic_distance(page: u64, other: u64, num_pages: u64) -> u64 {
    let dist = page.abs_diff(other);
    dist.min(num_pages - dist)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vaw: u32, ow: u32) -> MmuConfig {
        MmuConfig::new(vaw, ow, 64).unwrap()
    }

    #[test]
    fn test_va_decomposition() {
        // VA = 0xABCDE with 4-bit offsets: page 0xABCD, offset 0xE
        let cfg = MmuConfig::default();
        let va = VirtualAddress::from_raw(0xABCDE, &cfg);

        assert_eq!(va.page, 0xABCD);
        assert_eq!(va.offset, 0xE);
    }

    #[test]
    fn test_va_decomposition_edge_cases() {
        let cfg = MmuConfig::default();

        let va = VirtualAddress::from_raw(0, &cfg);
        assert_eq!(va.page, 0);
        assert_eq!(va.offset, 0);

        let max = cfg.virtual_memory_size() - 1;
        let va = VirtualAddress::from_raw(max, &cfg);
        assert_eq!(va.page, cfg.num_pages() - 1);
        assert_eq!(va.offset, cfg.page_size() - 1);
    }

    #[test]
    fn test_level_offsets_even_split() {
        // 20-bit VA, 4-bit windows: page 0xABCD descends A, B, C, D
        let cfg = MmuConfig::default();
        let va = VirtualAddress::from_raw(0xABCDE, &cfg);

        assert_eq!(va.level_index(0, &cfg), 0xA);
        assert_eq!(va.level_index(1, &cfg), 0xB);
        assert_eq!(va.level_index(2, &cfg), 0xC);
        assert_eq!(va.level_index(3, &cfg), 0xD);
    }

    #[test]
    fn test_level_offsets_short_top_level() {
        // 10-bit VA, 4-bit windows: 6 page bits split as 2 + 4
        let cfg = config(10, 4);
        let page = 0b11_0101;

        assert_eq!(level_offset(page, 0, &cfg), 0b11);
        assert_eq!(level_offset(page, 1, &cfg), 0b0101);
    }

    #[test]
    fn test_level_offsets_window_past_bit_zero() {
        // 10-bit VA, 3-bit windows: 7 page bits, depth 3.
        // Windows end at bits 5, 8, 11 of the address, so the last level
        // sees the two lowest page bits shifted up by one.
        let cfg = config(10, 3);
        assert_eq!(cfg.tables_depth(), 3);

        let page = 0b11_010_01;
        assert_eq!(level_offset(page, 0, &cfg), 0b011);
        assert_eq!(level_offset(page, 1, &cfg), 0b010);
        assert_eq!(level_offset(page, 2, &cfg), 0b010);
        assert_eq!(level_offset(0b11_010_10, 2, &cfg), 0b100);
    }

    #[test]
    fn test_place_level_index_rebuilds_page() {
        // Rebuilding from the per-level indices gives back every page
        for (vaw, ow) in [(20, 4), (10, 4), (10, 3), (10, 2), (9, 3)] {
            let cfg = config(vaw, ow);
            for page in 0..cfg.num_pages().min(4096) {
                let rebuilt = (0..cfg.tables_depth()).fold(0, |prefix, level| {
                    place_level_index(prefix, level_offset(page, level, &cfg), level, &cfg)
                });
                assert_eq!(rebuilt, page, "Failed for page={} vaw={} ow={}", page, vaw, ow);
            }
        }
    }

    #[test]
    fn test_physical_address() {
        let cfg = MmuConfig::default();
        assert_eq!(physical_address(0, 0, &cfg), 0);
        assert_eq!(physical_address(0, 5, &cfg), 5);
        assert_eq!(physical_address(3, 0, &cfg), 48);
        assert_eq!(physical_address(3, 7, &cfg), 55);
    }

    #[test]
    fn test_cyclic_distance() {
        assert_eq!(cyclic_distance(0, 0, 16), 0);
        assert_eq!(cyclic_distance(0, 3, 16), 3);
        assert_eq!(cyclic_distance(3, 0, 16), 3);
        // Wraps around: 1 and 15 are two apart
        assert_eq!(cyclic_distance(1, 15, 16), 2);
        assert_eq!(cyclic_distance(0, 8, 16), 8);
    }

    #[test]
    fn test_display() {
        let cfg = MmuConfig::default();
        let display = format!("{}", VirtualAddress::from_raw(0x123, &cfg));
        assert!(display.contains("291"));
        assert!(display.contains("page=18"));
        assert!(display.contains("offset=3"));
    }
}
