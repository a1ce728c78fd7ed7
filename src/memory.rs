use std::cell::Cell;
use std::collections::HashMap;

use log::{trace, warn};

use crate::config::MmuConfig;
use crate::constants::*;

/// Backing store the MMU builds its page tables and pages in.
///
/// Word access never fails; addresses are always below `ram_size` of the
/// layout the store was created for.
pub trait PhysicalMemory {
    /// Read a word at a physical address
    fn read(&self, address: u64) -> Word;

    /// Write a word at a physical address
    fn write(&mut self, address: u64, value: Word);

    /// Save the content of `frame` under `page` so it can be restored later
    fn evict(&mut self, frame: u64, page: u64);

    /// Load the content saved for `page` into `frame`, or zeros if the page
    /// was never evicted
    fn restore(&mut self, frame: u64, page: u64);
}

/// Access counters kept by [`SimulatedMemory`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub reads: u64,
    pub writes: u64,
    pub evictions: u64,
    pub restores: u64,
}

/// RAM plus a swap file, sized from an [`MmuConfig`]
pub struct SimulatedMemory {
    ram: Vec<Word>,
    // page number -> saved page content
    swap: HashMap<u64, Vec<Word>>,
    page_size: usize,
    stats: Cell<MemoryStats>,
}

impl SimulatedMemory {
    /// Create RAM of `config.ram_size()` words, all zero, and an empty swap file
    pub fn new(config: &MmuConfig) -> Self {
        SimulatedMemory {
            ram: vec![0; config.ram_size() as usize],
            swap: HashMap::new(),
            page_size: config.page_size() as usize,
            stats: Cell::new(MemoryStats::default()),
        }
    }

    /// Range of RAM indices covered by a frame
    #[inline]
    fn frame_range(&self, frame: u64) -> std::ops::Range<usize> {
        let start = frame as usize * self.page_size;
        start..start + self.page_size
    }

    /// Words of a single frame
    pub fn frame(&self, frame: u64) -> &[Word] {
        &self.ram[self.frame_range(frame)]
    }

    /// Whether a page currently has content in the swap file
    pub fn is_swapped(&self, page: u64) -> bool {
        self.swap.contains_key(&page)
    }

    /// Number of pages held in the swap file
    pub fn swapped_pages(&self) -> usize {
        self.swap.len()
    }

    pub fn stats(&self) -> MemoryStats {
        self.stats.get()
    }

    fn bump(&self, update: impl FnOnce(&mut MemoryStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl PhysicalMemory for SimulatedMemory {
    #[inline]
    fn read(&self, address: u64) -> Word {
        self.bump(|s| s.reads += 1);
        self.ram[address as usize]
    }

    #[inline]
    fn write(&mut self, address: u64, value: Word) {
        self.bump(|s| s.writes += 1);
        self.ram[address as usize] = value;
    }

    fn evict(&mut self, frame: u64, page: u64) {
        self.bump(|s| s.evictions += 1);
        let content = self.ram[self.frame_range(frame)].to_vec();
        if self.swap.insert(page, content).is_some() {
            // A page is swapped out only while it is not resident, so a
            // second copy means the tree mapped it twice.
            warn!("page {} evicted from frame {} while already in swap", page, frame);
        }
        trace!("evicted page {} from frame {}", page, frame);
    }

    fn restore(&mut self, frame: u64, page: u64) {
        self.bump(|s| s.restores += 1);
        let range = self.frame_range(frame);
        match self.swap.remove(&page) {
            Some(content) => self.ram[range].copy_from_slice(&content),
            None => self.ram[range].fill(0),
        }
        trace!("restored page {} into frame {}", page, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_memory() -> SimulatedMemory {
        // 16 frames of 4 words
        SimulatedMemory::new(&MmuConfig::new(8, 2, 16).unwrap())
    }

    #[test]
    fn test_pm_initialization() {
        let pm = small_memory();
        // All memory should be zeroed
        assert_eq!(pm.read(0), 0);
        assert_eq!(pm.read(63), 0);
        assert_eq!(pm.swapped_pages(), 0);
    }

    #[test]
    fn test_pm_read_write() {
        let mut pm = small_memory();
        pm.write(10, 42);
        assert_eq!(pm.read(10), 42);

        pm.write(10, -7);
        assert_eq!(pm.read(10), -7);
    }

    #[test]
    fn test_frame_view() {
        let mut pm = small_memory();
        // Frame 2 covers words 8..12
        pm.write(8, 1);
        pm.write(11, 4);
        assert_eq!(pm.frame(2), &[1, 0, 0, 4]);
    }

    #[test]
    fn test_evict_restore_round_trip() {
        let mut pm = small_memory();
        for (i, value) in [13, -25, 7, 99].into_iter().enumerate() {
            pm.write(12 + i as u64, value);
        }

        // Evict frame 3 as page 40, scribble over it, then restore elsewhere
        pm.evict(3, 40);
        assert!(pm.is_swapped(40));
        pm.restore(3, 41);
        assert_eq!(pm.frame(3), &[0, 0, 0, 0]); // never-evicted page comes back zeroed

        pm.restore(5, 40);
        assert_eq!(pm.frame(5), &[13, -25, 7, 99]);
        assert!(!pm.is_swapped(40)); // restored pages leave the swap file
    }

    #[test]
    fn test_stats() {
        let mut pm = small_memory();
        pm.write(0, 1);
        pm.read(0);
        pm.read(1);
        pm.evict(1, 3);
        pm.restore(1, 3);

        assert_eq!(
            pm.stats(),
            MemoryStats { reads: 2, writes: 1, evictions: 1, restores: 1 }
        );
    }
}
