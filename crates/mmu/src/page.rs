//! The page value type moved between physical frames and swap storage.

use core::fmt;

use crate::{FrameIndex, ProcessId, Tick, VirtualAddress};

/// Default page size, in addressable units.
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Access rights recorded for a page.
///
/// The simulator stores the mode for display but does not enforce it on
/// access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protection {
    /// Reads only.
    ReadOnly,
    /// Reads and writes.
    #[default]
    ReadWrite,
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protection::ReadOnly => write!(f, "R"),
            Protection::ReadWrite => write!(f, "RW"),
        }
    }
}

/// A simulated page.
///
/// A page is identified by its owning process and virtual address. Once it
/// has been referenced it is owned by exactly one of a frame slot or a swap
/// record at any instant; it is never destroyed. Contents are represented by
/// a symbolic payload tag rather than real bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    process: ProcessId,
    virtual_address: VirtualAddress,
    frame: Option<FrameIndex>,
    dirty: bool,
    last_accessed: Tick,
    payload: String,
    size: u64,
}

impl Page {
    /// Creates a fresh page for `(process, virtual_address)`.
    ///
    /// The page starts non-resident; binding it into a frame is the pool's
    /// job.
    pub fn new(process: ProcessId, virtual_address: VirtualAddress, size: u64, now: Tick) -> Self {
        Self {
            process,
            virtual_address,
            frame: None,
            dirty: false,
            last_accessed: now,
            payload: format!("P{process}_page_{virtual_address}"),
            size,
        }
    }

    /// Returns the owning process.
    #[inline]
    pub fn process(&self) -> ProcessId {
        self.process
    }

    /// Returns the virtual address this page backs.
    #[inline]
    pub fn virtual_address(&self) -> VirtualAddress {
        self.virtual_address
    }

    /// Returns the frame this page currently occupies, if resident.
    #[inline]
    pub fn frame(&self) -> Option<FrameIndex> {
        self.frame
    }

    /// Returns whether the page currently occupies a physical frame.
    #[inline]
    pub fn is_resident(&self) -> bool {
        self.frame.is_some()
    }

    /// Returns whether the page has been written since it became resident.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the tick of the most recent access.
    #[inline]
    pub fn last_accessed(&self) -> Tick {
        self.last_accessed
    }

    /// Returns the symbolic payload tag.
    #[inline]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the page size in addressable units.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Records an access at `now`.
    pub(crate) fn touch(&mut self, now: Tick) {
        self.last_accessed = now;
    }

    /// Marks the page as written.
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Marks the page resident in `frame`.
    pub(crate) fn bind_to(&mut self, frame: FrameIndex) {
        self.frame = Some(frame);
    }

    /// Clears residency when the page leaves physical memory.
    ///
    /// The dirty flag survives the trip through swap; it describes the page
    /// contents, not the current frame.
    pub(crate) fn unbind(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_is_not_resident() {
        let page = Page::new(
            ProcessId::new(1),
            VirtualAddress::new(4096),
            DEFAULT_PAGE_SIZE,
            Tick::ZERO,
        );

        assert!(!page.is_resident());
        assert!(!page.is_dirty());
        assert_eq!(page.frame(), None);
        assert_eq!(page.size(), 4096);
    }

    #[test]
    fn payload_tag_names_owner_and_address() {
        let page = Page::new(
            ProcessId::new(2),
            VirtualAddress::new(8192),
            DEFAULT_PAGE_SIZE,
            Tick::ZERO,
        );

        assert_eq!(page.payload(), "P2_page_8192");
    }

    #[test]
    fn binding_and_unbinding_track_residency() {
        let mut page = Page::new(
            ProcessId::new(1),
            VirtualAddress::new(0),
            DEFAULT_PAGE_SIZE,
            Tick::ZERO,
        );

        page.bind_to(FrameIndex::new(3));
        assert!(page.is_resident());
        assert_eq!(page.frame(), Some(FrameIndex::new(3)));

        page.mark_dirty();
        page.unbind();
        assert!(!page.is_resident());
        assert!(page.is_dirty(), "dirty flag survives leaving memory");
    }

    #[test]
    fn touch_updates_access_tick() {
        let mut page = Page::new(
            ProcessId::new(1),
            VirtualAddress::new(0),
            DEFAULT_PAGE_SIZE,
            Tick::ZERO,
        );

        page.touch(Tick::new(5));
        assert_eq!(page.last_accessed(), Tick::new(5));
    }

    #[test]
    fn protection_defaults_to_read_write() {
        assert_eq!(Protection::default(), Protection::ReadWrite);
        assert_eq!(format!("{}", Protection::ReadWrite), "RW");
        assert_eq!(format!("{}", Protection::ReadOnly), "R");
    }
}
