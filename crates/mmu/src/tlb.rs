//! The translation cache.
//!
//! Maps (process, virtual address) pairs directly to frame indices so a
//! repeat translation can bypass the page-table walk. The key is a
//! structured pair, not a formatted string; identifiers can never collide
//! through a delimiter.

use std::collections::BTreeMap;

use crate::{FrameIndex, ProcessId, VirtualAddress};

/// Cache of recent translations.
///
/// Unbounded and without an eviction policy of its own. Entries that point
/// at a frame are dropped when that frame is evicted, so a hit never lands
/// in a frame now owned by a different page.
pub struct Tlb {
    entries: BTreeMap<(ProcessId, VirtualAddress), FrameIndex>,
}

impl Tlb {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the cached frame for `(process, address)`, if any.
    pub fn lookup(&self, process: ProcessId, address: VirtualAddress) -> Option<FrameIndex> {
        self.entries.get(&(process, address)).copied()
    }

    /// Caches `(process, address) -> frame`, replacing any older mapping.
    pub fn insert(&mut self, process: ProcessId, address: VirtualAddress, frame: FrameIndex) {
        self.entries.insert((process, address), frame);
    }

    /// Drops every mapping that points at `frame`.
    ///
    /// Returns the number of mappings removed.
    pub fn invalidate_frame(&mut self, frame: FrameIndex) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| *cached != frame);
        before - self.entries.len()
    }

    /// Empties the cache.
    pub fn flush(&mut self) {
        self.entries.clear();
    }

    /// Iterates over all mappings, decomposed into their parts.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, VirtualAddress, FrameIndex)> + '_ {
        self.entries
            .iter()
            .map(|((process, address), frame)| (*process, *address, *frame))
    }

    /// Returns the number of cached mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Tlb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(process: u32, address: u64) -> (ProcessId, VirtualAddress) {
        (ProcessId::new(process), VirtualAddress::new(address))
    }

    #[test]
    fn lookup_finds_inserted_mappings() {
        let mut tlb = Tlb::new();
        let (process, address) = key(1, 4096);

        assert_eq!(tlb.lookup(process, address), None);
        tlb.insert(process, address, FrameIndex::new(3));
        assert_eq!(tlb.lookup(process, address), Some(FrameIndex::new(3)));
    }

    #[test]
    fn processes_with_the_same_address_do_not_collide() {
        let mut tlb = Tlb::new();

        tlb.insert(ProcessId::new(1), VirtualAddress::new(4096), FrameIndex::new(0));
        tlb.insert(ProcessId::new(2), VirtualAddress::new(4096), FrameIndex::new(1));

        assert_eq!(
            tlb.lookup(ProcessId::new(1), VirtualAddress::new(4096)),
            Some(FrameIndex::new(0))
        );
        assert_eq!(
            tlb.lookup(ProcessId::new(2), VirtualAddress::new(4096)),
            Some(FrameIndex::new(1))
        );
    }

    #[test]
    fn invalidate_frame_removes_only_matching_mappings() {
        let mut tlb = Tlb::new();
        tlb.insert(ProcessId::new(1), VirtualAddress::new(0), FrameIndex::new(0));
        tlb.insert(ProcessId::new(1), VirtualAddress::new(4096), FrameIndex::new(1));
        tlb.insert(ProcessId::new(2), VirtualAddress::new(0), FrameIndex::new(0));

        let removed = tlb.invalidate_frame(FrameIndex::new(0));

        assert_eq!(removed, 2);
        assert_eq!(tlb.len(), 1);
        assert_eq!(
            tlb.lookup(ProcessId::new(1), VirtualAddress::new(4096)),
            Some(FrameIndex::new(1))
        );
    }

    #[test]
    fn flush_empties_the_cache() {
        let mut tlb = Tlb::new();
        tlb.insert(ProcessId::new(1), VirtualAddress::new(0), FrameIndex::new(0));

        tlb.flush();
        assert!(tlb.is_empty());
    }
}
