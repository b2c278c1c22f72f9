//! Per-process page tables.

use std::collections::BTreeMap;

use crate::{FrameIndex, ProcessId, Protection, VirtualAddress};

/// Residency bookkeeping for one virtual address of one process.
///
/// Presence and the occupied frame are a single field: an entry is present
/// exactly when it has a frame, so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    frame: Option<FrameIndex>,
    accessed: bool,
    dirty: bool,
    protection: Protection,
}

impl PageTableEntry {
    /// Creates an absent entry with default protection.
    fn absent() -> Self {
        Self {
            frame: None,
            accessed: false,
            dirty: false,
            protection: Protection::default(),
        }
    }

    /// Returns whether the address currently maps to a frame.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.frame.is_some()
    }

    /// Returns the mapped frame, if present.
    #[inline]
    pub fn frame(&self) -> Option<FrameIndex> {
        self.frame
    }

    /// Returns whether the address has been accessed since the entry was
    /// created.
    #[inline]
    pub fn accessed(&self) -> bool {
        self.accessed
    }

    /// Returns whether the address has been written.
    #[inline]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the recorded protection mode.
    #[inline]
    pub fn protection(&self) -> Protection {
        self.protection
    }

    pub(crate) fn mark_present(&mut self, frame: FrameIndex) {
        self.frame = Some(frame);
    }

    pub(crate) fn mark_absent(&mut self) {
        self.frame = None;
    }

    pub(crate) fn mark_accessed(&mut self) {
        self.accessed = true;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// One process's mapping from virtual addresses to residency metadata.
///
/// Entries are created lazily on first reference and never removed;
/// iteration order follows the address, which keeps state views stable
/// across runs.
pub struct PageTable {
    process: ProcessId,
    entries: BTreeMap<VirtualAddress, PageTableEntry>,
}

impl PageTable {
    /// Creates an empty table owned by `process`.
    pub fn new(process: ProcessId) -> Self {
        Self {
            process,
            entries: BTreeMap::new(),
        }
    }

    /// Returns the owning process.
    pub fn process(&self) -> ProcessId {
        self.process
    }

    /// Returns the entry for `address`, creating a fresh absent one on
    /// first reference. Idempotent; never fails.
    pub fn entry(&mut self, address: VirtualAddress) -> &mut PageTableEntry {
        self.entries
            .entry(address)
            .or_insert_with(PageTableEntry::absent)
    }

    /// Returns the entry for `address` if one has ever been created.
    pub fn lookup(&self, address: VirtualAddress) -> Option<&PageTableEntry> {
        self.entries.get(&address)
    }

    /// Returns the entry for `address` mutably if one has ever been
    /// created.
    pub fn lookup_mut(&mut self, address: VirtualAddress) -> Option<&mut PageTableEntry> {
        self.entries.get_mut(&address)
    }

    /// Iterates over all entries in address order.
    pub fn iter(&self) -> impl Iterator<Item = (VirtualAddress, &PageTableEntry)> {
        self.entries.iter().map(|(address, entry)| (*address, entry))
    }

    /// Returns the number of addresses ever referenced.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no address has been referenced yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_created_lazily_and_once() {
        let mut table = PageTable::new(ProcessId::new(1));
        let address = VirtualAddress::new(4096);

        assert!(table.lookup(address).is_none());

        table.entry(address);
        assert_eq!(table.len(), 1);
        assert!(!table.lookup(address).unwrap().is_present());

        // A second reference finds the same entry.
        table.entry(address).mark_accessed();
        assert_eq!(table.len(), 1);
        assert!(table.lookup(address).unwrap().accessed());
    }

    #[test]
    fn presence_follows_the_frame_field() {
        let mut table = PageTable::new(ProcessId::new(1));
        let address = VirtualAddress::new(0);

        let entry = table.entry(address);
        entry.mark_present(FrameIndex::new(5));
        assert!(entry.is_present());
        assert_eq!(entry.frame(), Some(FrameIndex::new(5)));

        entry.mark_absent();
        assert!(!entry.is_present());
        assert_eq!(entry.frame(), None);
    }

    #[test]
    fn lookup_does_not_create_entries() {
        let table = PageTable::new(ProcessId::new(1));
        assert!(table.lookup(VirtualAddress::new(123)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn new_entries_default_to_read_write() {
        let mut table = PageTable::new(ProcessId::new(1));
        let entry = table.entry(VirtualAddress::new(0));
        assert_eq!(entry.protection(), Protection::ReadWrite);
        assert!(!entry.dirty());
    }
}
