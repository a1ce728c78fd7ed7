use log::{debug, trace, warn};

use crate::config::MmuConfig;
use crate::constants::*;
use crate::error::MmuError;
use crate::eviction::{find_victim, FrameChoice, FramePtr};
use crate::memory::PhysicalMemory;
use crate::translation::{physical_address, VirtualAddress};

/// Virtual memory on top of a [`PhysicalMemory`] store.
///
/// The page table tree lives entirely in the store, rooted at frame 0. Pages
/// are brought in on demand and evicted when every frame is in use.
pub struct VirtualMemory<M: PhysicalMemory> {
    config: MmuConfig,
    memory: M,
}

impl<M: PhysicalMemory> VirtualMemory<M> {
    /// Take ownership of `memory` and initialize an empty root table
    pub fn new(config: MmuConfig, memory: M) -> Self {
        let mut vm = VirtualMemory { config, memory };
        vm.initialize();
        vm
    }

    /// Clear the root table, unmapping every page
    pub fn initialize(&mut self) {
        self.clear_frame(ROOT_FRAME);
    }

    /// Read the word at a virtual address
    pub fn read(&mut self, address: u64) -> Result<Word, MmuError> {
        let physical = self.translate(address).inspect_err(|e| warn!("read failed: {}", e))?;
        Ok(self.memory.read(physical))
    }

    /// Write a word to a virtual address
    pub fn write(&mut self, address: u64, value: Word) -> Result<(), MmuError> {
        let physical = self.translate(address).inspect_err(|e| warn!("write failed: {}", e))?;
        self.memory.write(physical, value);
        Ok(())
    }

    /// Physical address currently backing `address`, faulting pages in as
    /// needed
    pub fn translate(&mut self, address: u64) -> Result<u64, MmuError> {
        let size = self.config.virtual_memory_size();
        if address >= size {
            return Err(MmuError::OutOfRange { address, size });
        }

        let va = VirtualAddress::from_raw(address, &self.config);
        let frame = self.find_frame(&va)?;

        // Frame 0 is the root table; no page can live there unless the tree
        // has no table levels at all.
        if frame == ROOT_FRAME && self.config.tables_depth() > 0 {
            return Err(MmuError::TranslationFailure { address });
        }

        let physical = physical_address(frame, va.offset, &self.config);
        trace!("{} -> PA {}", va, physical);
        Ok(physical)
    }

    pub fn config(&self) -> &MmuConfig {
        &self.config
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    /// Walk from the root to the leaf frame of `va.page`, filling in missing
    /// tables and the page itself on the way.
    fn find_frame(&mut self, va: &VirtualAddress) -> Result<u64, MmuError> {
        let depth = self.config.tables_depth();
        let mut node = ROOT_FRAME;

        for level in 0..depth {
            let slot = va.level_index(level, &self.config);
            let child = FramePtr::child_of(&self.memory, &self.config, node, slot)?;

            node = if child.is_present() {
                child.index
            } else {
                self.page_fault(node, slot, va.page, level + 1 == depth)?
            };
            trace!("level {} slot {} -> frame {}", level, slot, node);
        }

        Ok(node)
    }

    /// Materialize a frame for entry `slot` of table `parent` and link it in.
    /// Leaves get the content of `page`, tables start out empty.
    fn page_fault(
        &mut self,
        parent: u64,
        slot: u64,
        page: u64,
        is_leaf: bool,
    ) -> Result<u64, MmuError> {
        let choice = find_victim(&self.memory, &self.config, page, parent)?;

        let frame = match choice {
            FrameChoice::Unused(frame) => {
                debug!("page {}: reusing empty table frame {}", page, frame.index);
                self.memory.write(frame.addr, EMPTY_ENTRY);
                frame.index
            }
            FrameChoice::Fresh(index) => {
                debug!("page {}: using fresh frame {}", page, index);
                index
            }
            FrameChoice::Evict { frame, page: victim, distance } => {
                debug!(
                    "page {}: evicting page {} from frame {} (distance {})",
                    page, victim, frame.index, distance
                );
                self.memory.evict(frame.index, victim);
                self.memory.write(frame.addr, EMPTY_ENTRY);
                frame.index
            }
        };

        if is_leaf {
            self.memory.restore(frame, page);
        } else {
            self.clear_frame(frame);
        }

        // num_frames fits in a Word, so every frame index does too
        self.memory.write(physical_address(parent, slot, &self.config), frame as Word);
        Ok(frame)
    }

    fn clear_frame(&mut self, frame: u64) {
        let base = physical_address(frame, 0, &self.config);
        for i in 0..self.config.page_size() {
            self.memory.write(base + i, EMPTY_ENTRY);
        }
    }
}
