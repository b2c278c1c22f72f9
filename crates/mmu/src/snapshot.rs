//! Read-only state views for display layers.
//!
//! A [`MemorySnapshot`] is an owned copy of everything a front end may
//! show: frame occupancy, swap contents, page tables, cached translations
//! and the counters. Producing one has no side effects, and nothing in it
//! borrows from the live structures.

use crate::{FrameIndex, ProcessId, Protection, SwapSlot, Tick, VirtualAddress};

/// Hit, miss and fault counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Translations answered from the cache.
    pub tlb_hits: u64,
    /// Translations that had to walk the page table.
    pub tlb_misses: u64,
    /// Translations that found the page non-resident.
    pub page_faults: u64,
}

impl Statistics {
    /// Returns the total number of cache lookups.
    pub fn lookups(&self) -> u64 {
        self.tlb_hits + self.tlb_misses
    }

    /// Returns hits divided by lookups, or 0.0 before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups() == 0 {
            0.0
        } else {
            self.tlb_hits as f64 / self.lookups() as f64
        }
    }
}

/// A resident page as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Owning process.
    pub process: ProcessId,
    /// Virtual address the page backs.
    pub virtual_address: VirtualAddress,
    /// Symbolic payload tag.
    pub payload: String,
    /// Tick of the most recent access.
    pub last_accessed: Tick,
    /// Whether the page has been written.
    pub dirty: bool,
}

/// One frame slot and its occupant, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameView {
    /// The slot index.
    pub frame: FrameIndex,
    /// The resident page, or `None` for an empty frame.
    pub occupant: Option<PageView>,
}

/// A swapped-out page and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapView {
    /// Owning process.
    pub process: ProcessId,
    /// Virtual address the page backs.
    pub virtual_address: VirtualAddress,
    /// Symbolic payload tag.
    pub payload: String,
    /// Assigned swap slot.
    pub slot: SwapSlot,
    /// Tick at which the page was evicted.
    pub evicted_at: Tick,
}

/// One page-table entry as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryView {
    /// The mapped virtual address.
    pub virtual_address: VirtualAddress,
    /// Whether the address maps to a frame right now.
    pub present: bool,
    /// The mapped frame, if present.
    pub frame: Option<FrameIndex>,
    /// Whether the address has been accessed.
    pub accessed: bool,
    /// Whether the address has been written.
    pub dirty: bool,
    /// Recorded protection mode.
    pub protection: Protection,
}

/// One process's page table as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTableView {
    /// Owning process.
    pub process: ProcessId,
    /// All entries ever created, in address order.
    pub entries: Vec<EntryView>,
}

/// One cached translation, decomposed into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbView {
    /// Process half of the key.
    pub process: ProcessId,
    /// Address half of the key.
    pub virtual_address: VirtualAddress,
    /// The cached frame.
    pub frame: FrameIndex,
}

/// Complete state view; the sole read surface for front ends.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySnapshot {
    /// Every frame slot in index order.
    pub frames: Vec<FrameView>,
    /// Every swapped-out page.
    pub swap: Vec<SwapView>,
    /// Every registered process's page table.
    pub page_tables: Vec<PageTableView>,
    /// Every cached translation.
    pub tlb: Vec<TlbView>,
    /// Counters at snapshot time.
    pub stats: Statistics,
}
