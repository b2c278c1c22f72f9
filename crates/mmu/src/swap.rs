//! Secondary storage for evicted pages.

use std::collections::BTreeMap;

use crate::{Page, ProcessId, SwapSlot, Tick, VirtualAddress};

/// A page's saved copy while it is not resident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRecord {
    page: Page,
    slot: SwapSlot,
    evicted_at: Tick,
}

impl SwapRecord {
    /// Returns the stored page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Returns the slot id assigned at store time.
    pub fn slot(&self) -> SwapSlot {
        self.slot
    }

    /// Returns the tick at which the page was evicted.
    pub fn evicted_at(&self) -> Tick {
        self.evicted_at
    }

    /// Consumes the record and yields the page for swap-in.
    pub fn into_page(self) -> Page {
        self.page
    }
}

/// Holds evicted pages, keyed by owner and virtual address.
///
/// Slot ids increase monotonically and are never reused, so they double as
/// an eviction sequence number. Records are keyed by the full
/// (process, address) pair; two processes referencing the same virtual
/// address occupy distinct records.
pub struct SwapStore {
    records: BTreeMap<(ProcessId, VirtualAddress), SwapRecord>,
    next_slot: SwapSlot,
}

impl SwapStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_slot: SwapSlot::new(0),
        }
    }

    /// Stores `page`, clearing its residency, and returns the assigned
    /// slot id.
    pub fn store(&mut self, mut page: Page, now: Tick) -> SwapSlot {
        let slot = self.next_slot;
        self.next_slot = self.next_slot.next();

        page.unbind();
        log::trace!(
            "swap: stored {} in slot {slot}",
            page.payload()
        );
        self.records.insert(
            (page.process(), page.virtual_address()),
            SwapRecord {
                page,
                slot,
                evicted_at: now,
            },
        );
        slot
    }

    /// Looks up the record for `(process, address)` without removing it.
    pub fn retrieve(&self, process: ProcessId, address: VirtualAddress) -> Option<&SwapRecord> {
        self.records.get(&(process, address))
    }

    /// Deletes and returns the record for `(process, address)`.
    ///
    /// Removal is the only way a page leaves the store; there is no
    /// copy-on-swap.
    pub fn remove(&mut self, process: ProcessId, address: VirtualAddress) -> Option<SwapRecord> {
        self.records.remove(&(process, address))
    }

    /// Returns whether a record exists for `(process, address)`.
    pub fn contains(&self, process: ProcessId, address: VirtualAddress) -> bool {
        self.records.contains_key(&(process, address))
    }

    /// Iterates over all records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &SwapRecord> {
        self.records.values()
    }

    /// Returns the number of stored pages.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing is swapped out.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for SwapStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_PAGE_SIZE;

    fn page(process: u32, address: u64) -> Page {
        Page::new(
            ProcessId::new(process),
            VirtualAddress::new(address),
            DEFAULT_PAGE_SIZE,
            Tick::ZERO,
        )
    }

    #[test]
    fn slot_ids_increase_and_are_never_reused() {
        let mut swap = SwapStore::new();

        let first = swap.store(page(1, 0), Tick::new(1));
        let second = swap.store(page(1, 4096), Tick::new(2));
        assert_eq!(first, SwapSlot::new(0));
        assert_eq!(second, SwapSlot::new(1));

        // Removing a record does not recycle its slot id.
        swap.remove(ProcessId::new(1), VirtualAddress::new(0));
        let third = swap.store(page(1, 0), Tick::new(3));
        assert_eq!(third, SwapSlot::new(2));
    }

    #[test]
    fn stored_pages_lose_residency() {
        let mut swap = SwapStore::new();
        let mut resident = page(1, 0);
        resident.bind_to(crate::FrameIndex::new(4));

        swap.store(resident, Tick::new(1));
        let record = swap
            .retrieve(ProcessId::new(1), VirtualAddress::new(0))
            .unwrap();
        assert!(!record.page().is_resident());
    }

    #[test]
    fn removal_is_the_only_exit() {
        let mut swap = SwapStore::new();
        swap.store(page(1, 0), Tick::new(1));

        // Retrieval leaves the record in place.
        assert!(swap.retrieve(ProcessId::new(1), VirtualAddress::new(0)).is_some());
        assert_eq!(swap.len(), 1);

        let record = swap
            .remove(ProcessId::new(1), VirtualAddress::new(0))
            .unwrap();
        assert_eq!(record.page().virtual_address(), VirtualAddress::new(0));
        assert!(swap.is_empty());
    }

    #[test]
    fn swap_keeps_same_address_of_two_processes_apart() {
        let mut swap = SwapStore::new();

        swap.store(page(1, 4096), Tick::new(1));
        swap.store(page(2, 4096), Tick::new(2));

        assert_eq!(swap.len(), 2);
        let first = swap
            .retrieve(ProcessId::new(1), VirtualAddress::new(4096))
            .unwrap();
        let second = swap
            .retrieve(ProcessId::new(2), VirtualAddress::new(4096))
            .unwrap();
        assert_eq!(first.page().process(), ProcessId::new(1));
        assert_eq!(second.page().process(), ProcessId::new(2));
        assert_ne!(first.slot(), second.slot());
    }
}
