//! Frame selection for page faults.
//!
//! There is no frame-to-page map. Every fault walks the whole table tree from
//! the root and collects, in one pass:
//!
//! 1. an internal table with no children that can be unlinked and reused,
//! 2. the highest frame index in use, so the next one can be handed out,
//! 3. the leaf whose page is cyclically farthest from the faulting page.
//!
//! The walk stops at the first reusable table. Otherwise the fault handler
//! falls back to a fresh frame, and only when RAM is full to eviction.

use crate::config::MmuConfig;
use crate::constants::*;
use crate::error::MmuError;
use crate::memory::PhysicalMemory;
use crate::translation::{cyclic_distance, physical_address, place_level_index};

/// A frame together with the physical address of the table entry pointing at
/// it, so the entry can be cleared when the frame is taken away.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FramePtr {
    pub index: u64,
    pub addr: u64,
}

impl FramePtr {
    /// The root table, referenced from nowhere
    pub const ROOT: FramePtr = FramePtr { index: ROOT_FRAME, addr: 0 };

    /// Read entry `slot` of table `table`
    pub fn child_of<M: PhysicalMemory>(
        memory: &M,
        config: &MmuConfig,
        table: u64,
        slot: u64,
    ) -> Result<Self, MmuError> {
        let addr = physical_address(table, slot, config);
        let value = memory.read(addr);
        match u64::try_from(value) {
            Ok(index) if index < config.num_frames() => Ok(FramePtr { index, addr }),
            _ => Err(MmuError::CorruptTableEntry { address: addr, value }),
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.index != ROOT_FRAME
    }
}

/// Where the frame for a faulting slot comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameChoice {
    /// A childless table, to be unlinked from its current parent
    Unused(FramePtr),
    /// A frame index never used so far
    Fresh(u64),
    /// A leaf whose page must be evicted first
    Evict { frame: FramePtr, page: u64, distance: u64 },
}

/// State threaded through one eviction search
#[derive(Debug, Clone, Copy)]
pub struct DfsContext {
    /// Page being faulted in
    pub page: u64,
    /// Table under construction; never reclaimed
    pub parent: u64,
    pub unused_frame: Option<FramePtr>,
    pub max_index_frame: FramePtr,
    pub max_dist_frame: FramePtr,
    /// Page held by `max_dist_frame`
    pub max_dist_page: u64,
    pub max_dist: u64,
}

impl DfsContext {
    pub fn new(page: u64, parent: u64) -> Self {
        DfsContext {
            page,
            parent,
            unused_frame: None,
            max_index_frame: FramePtr::ROOT,
            max_dist_frame: FramePtr::ROOT,
            max_dist_page: 0,
            max_dist: 0,
        }
    }

    /// Visit one node after its children. Returns true when `node` is a
    /// reusable table, which ends the search.
    pub fn update(
        &mut self,
        node: FramePtr,
        is_leaf: bool,
        is_empty: bool,
        node_page: u64,
        config: &MmuConfig,
    ) -> bool {
        if is_unused_table(is_leaf, is_empty, node.index, self.parent) {
            self.unused_frame = Some(node);
            return true;
        }

        if node.index > self.max_index_frame.index {
            self.max_index_frame = node;
        }

        if is_leaf {
            let dist = cyclic_distance(self.page, node_page, config.num_pages());
            if dist > self.max_dist {
                self.max_dist = dist;
                self.max_dist_frame = node;
                self.max_dist_page = node_page;
            }
        }

        false
    }

    /// Pick a frame by priority: unused table, then a fresh index, then eviction
    pub fn choose(&self, config: &MmuConfig) -> FrameChoice {
        if let Some(frame) = self.unused_frame {
            FrameChoice::Unused(frame)
        } else if self.max_index_frame.index + 1 < config.num_frames() {
            FrameChoice::Fresh(self.max_index_frame.index + 1)
        } else {
            FrameChoice::Evict {
                frame: self.max_dist_frame,
                page: self.max_dist_page,
                distance: self.max_dist,
            }
        }
    }
}

/// A table frame can be reclaimed when it has no children and is neither the
/// root nor the table currently being filled.
#[inline]
pub fn is_unused_table(is_leaf: bool, is_empty: bool, index: u64, parent: u64) -> bool {
    !is_leaf && is_empty && index != ROOT_FRAME && index != parent
}

/// Pre-order walk of the subtree at `node`, children in ascending slot order.
/// `page_prefix` holds the page bits decoded on the way down; at leaf level
/// it is the page stored in the leaf. Returns true once a reusable table has
/// been found.
pub fn dfs<M: PhysicalMemory>(
    context: &mut DfsContext,
    memory: &M,
    config: &MmuConfig,
    node: FramePtr,
    level: u32,
    page_prefix: u64,
) -> Result<bool, MmuError> {
    let is_leaf = level >= config.tables_depth();
    let mut is_empty = true;

    if !is_leaf {
        for slot in 0..config.page_size() {
            let child = FramePtr::child_of(memory, config, node.index, slot)?;
            if !child.is_present() {
                continue;
            }
            is_empty = false;

            let prefix = place_level_index(page_prefix, slot, level, config);
            if dfs(context, memory, config, child, level + 1, prefix)? {
                return Ok(true);
            }
        }
    }

    Ok(context.update(node, is_leaf, is_empty, page_prefix, config))
}

/// Search the whole tree for a frame to hold a new child of `parent` on the
/// way to `page`.
pub fn find_victim<M: PhysicalMemory>(
    memory: &M,
    config: &MmuConfig,
    page: u64,
    parent: u64,
) -> Result<FrameChoice, MmuError> {
    let mut context = DfsContext::new(page, parent);
    dfs(&mut context, memory, config, FramePtr::ROOT, 0, 0)?;
    Ok(context.choose(config))
}
