//! The memory management unit orchestrator.
//!
//! Ties the frame pool, page tables, swap store and translation cache
//! together to answer translation requests, handle page faults with
//! least-recently-used eviction, and keep the operation log and counters
//! current.
//!
//! A single caller drives one [`Mmu`] at a time; translation and fault
//! handling form one synchronous call chain with no suspension points. The
//! cross-structure invariants are not safe under concurrent mutation, so a
//! host embedding the unit in a concurrent runtime must serialize all
//! mutating calls (single-owner thread or a mutex around the instance).

use core::fmt;
use std::collections::BTreeMap;

use crate::{
    DEFAULT_FRAME_COUNT, DEFAULT_PAGE_SIZE, EntryView, FrameIndex, FramePool, FrameView,
    MemorySnapshot, OperationKind, OperationLog, OperationRecord, Page, PageTable, PageTableView,
    PageView, ProcessId, Statistics, StepKind, SwapStore, SwapView, Tick, TlbView, Tlb,
    VirtualAddress,
};

/// Errors surfaced by a translation request.
///
/// A failed request leaves the unit usable; only the triggering request is
/// aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateError {
    /// Translation was requested for a process that was never registered.
    UnregisteredProcess(ProcessId),
    /// Eviction failed to free a frame even though capacity is nonzero.
    /// Indicates broken bookkeeping and must never occur.
    MemoryExhausted,
    /// A page's owning page table has vanished from the registry.
    CorruptSwapRecord {
        /// The process whose table is missing.
        process: ProcessId,
        /// The page the unit was working on when the table went missing.
        virtual_address: VirtualAddress,
    },
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::UnregisteredProcess(process) => {
                write!(f, "no page table exists for process {process}")
            }
            TranslateError::MemoryExhausted => {
                write!(f, "no frame could be freed despite nonzero capacity")
            }
            TranslateError::CorruptSwapRecord {
                process,
                virtual_address,
            } => write!(
                f,
                "page table for process {process} vanished while handling its page at address {virtual_address}"
            ),
        }
    }
}

impl std::error::Error for TranslateError {}

/// How a request touches its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessKind {
    /// The page is only read.
    #[default]
    Read,
    /// The page is written; the dirty flags are set.
    Write,
}

/// A single translation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRequest {
    /// The requesting process.
    pub process: ProcessId,
    /// The address to translate.
    pub virtual_address: VirtualAddress,
    /// Whether the access reads or writes the page.
    pub kind: AccessKind,
}

impl MemoryRequest {
    /// A read request.
    pub fn read(process: ProcessId, virtual_address: VirtualAddress) -> Self {
        Self {
            process,
            virtual_address,
            kind: AccessKind::Read,
        }
    }

    /// A write request.
    pub fn write(process: ProcessId, virtual_address: VirtualAddress) -> Self {
        Self {
            process,
            virtual_address,
            kind: AccessKind::Write,
        }
    }
}

/// Tunables for a simulated memory unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuConfig {
    /// Number of physical frames.
    pub frame_count: usize,
    /// Size given to newly created pages, in addressable units.
    pub page_size: u64,
}

impl Default for MmuConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// The memory management unit.
pub struct Mmu {
    config: MmuConfig,
    frames: FramePool,
    swap: SwapStore,
    page_tables: BTreeMap<ProcessId, PageTable>,
    tlb: Tlb,
    stats: Statistics,
    log: OperationLog,
    clock: Tick,
}

impl Mmu {
    /// Creates a unit with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MmuConfig::default())
    }

    /// Creates a unit with `config`.
    pub fn with_config(config: MmuConfig) -> Self {
        Self {
            config,
            frames: FramePool::new(config.frame_count),
            swap: SwapStore::new(),
            page_tables: BTreeMap::new(),
            tlb: Tlb::new(),
            stats: Statistics::default(),
            log: OperationLog::new(),
            clock: Tick::ZERO,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> MmuConfig {
        self.config
    }

    /// Creates an empty page table for `process`.
    ///
    /// Must be called before any translation for the process can succeed.
    /// Registering a process twice leaves its existing table untouched;
    /// returns whether a table was created.
    pub fn register_process(&mut self, process: ProcessId) -> bool {
        if self.page_tables.contains_key(&process) {
            log::debug!("process {process} is already registered");
            return false;
        }
        self.page_tables.insert(process, PageTable::new(process));
        log::debug!("registered process {process}");
        true
    }

    /// Returns whether `process` has a page table.
    pub fn is_registered(&self, process: ProcessId) -> bool {
        self.page_tables.contains_key(&process)
    }

    /// Translates `(process, virtual_address)` as a read access.
    pub fn translate(
        &mut self,
        process: ProcessId,
        virtual_address: VirtualAddress,
    ) -> Result<FrameIndex, TranslateError> {
        self.access(&MemoryRequest::read(process, virtual_address))
    }

    /// Translates a full request, returning the frame the page occupies.
    ///
    /// Consults the translation cache first, then the process's page
    /// table; a non-resident page triggers fault handling, which may evict
    /// the least recently used page to swap. Write accesses set the dirty
    /// flags. Every request appends to the operation log, including failed
    /// ones.
    pub fn access(&mut self, request: &MemoryRequest) -> Result<FrameIndex, TranslateError> {
        let MemoryRequest {
            process,
            virtual_address: address,
            kind,
        } = *request;
        let now = self.tick();

        let mut record =
            OperationRecord::new(OperationKind::AddressTranslation, process, address, now);
        record.push_step(
            StepKind::TlbLookup,
            format!("checking cache for process {process}, virtual address {address}"),
        );

        // Fast path: the cache answers without touching table or pool.
        if let Some(frame) = self.tlb.lookup(process, address) {
            self.stats.tlb_hits += 1;
            record.push_step(StepKind::TlbHit, format!("cache hit, frame {frame}"));
            record.set_outcome(frame);
            self.log.push(record);
            log::trace!("cache hit: process {process}, address {address} -> frame {frame}");
            return Ok(frame);
        }

        self.stats.tlb_misses += 1;
        record.push_step(StepKind::TlbMiss, "cache miss, walking the page table");

        let Some(table) = self.page_tables.get_mut(&process) else {
            record.push_step(
                StepKind::Failure,
                format!("no page table for process {process}"),
            );
            self.log.push(record);
            log::warn!("translation requested for unregistered process {process}");
            return Err(TranslateError::UnregisteredProcess(process));
        };

        let entry = table.entry(address);
        let resident_frame = entry.frame();
        record.push_step(
            StepKind::PageTableLookup,
            format!(
                "page-table entry for address {address}: present={}",
                resident_frame.is_some()
            ),
        );

        let frame = if let Some(frame) = resident_frame {
            record.push_step(StepKind::PageHit, format!("page resident in frame {frame}"));
            log::trace!("page hit: process {process}, address {address} -> frame {frame}");
            frame
        } else {
            self.stats.page_faults += 1;
            record.push_step(
                StepKind::PageFault,
                "page fault, page must be brought into memory",
            );
            log::debug!("page fault: process {process}, address {address}");

            match self.handle_fault(process, address, now) {
                Ok(frame) => {
                    self.tlb.insert(process, address, frame);
                    record.push_step(
                        StepKind::TlbUpdate,
                        format!("cached process {process}, address {address} -> frame {frame}"),
                    );
                    frame
                }
                Err(error) => {
                    record.push_step(StepKind::Failure, error.to_string());
                    self.log.push(record);
                    log::error!(
                        "translation failed: process {process}, address {address}: {error}"
                    );
                    return Err(error);
                }
            }
        };

        // Refresh access state on both the hit and the fault path.
        if let Some(page) = self.frames.page_mut(frame) {
            page.touch(now);
            if kind == AccessKind::Write {
                page.mark_dirty();
            }
        }
        if let Some(entry) = self
            .page_tables
            .get_mut(&process)
            .and_then(|table| table.lookup_mut(address))
        {
            entry.mark_accessed();
            if kind == AccessKind::Write {
                entry.mark_dirty();
            }
        }

        record.set_outcome(frame);
        self.log.push(record);
        Ok(frame)
    }

    /// Empties the translation cache.
    ///
    /// Resident pages stay resident; the next translation for each simply
    /// walks the page table again.
    pub fn flush_tlb(&mut self) {
        self.tlb.flush();
        log::debug!("translation cache flushed");
    }

    /// Returns the current counters.
    pub fn stats(&self) -> Statistics {
        self.stats
    }

    /// Returns the operation log.
    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Returns the operation log mutably, for replay navigation.
    pub fn log_mut(&mut self) -> &mut OperationLog {
        &mut self.log
    }

    /// Produces an owned, side-effect-free view of the complete state.
    pub fn snapshot(&self) -> MemorySnapshot {
        let frames = (0..self.frames.capacity())
            .map(|index| {
                let frame = FrameIndex::new(index);
                FrameView {
                    frame,
                    occupant: self.frames.page(frame).map(|page| PageView {
                        process: page.process(),
                        virtual_address: page.virtual_address(),
                        payload: page.payload().to_owned(),
                        last_accessed: page.last_accessed(),
                        dirty: page.is_dirty(),
                    }),
                }
            })
            .collect();

        let swap = self
            .swap
            .iter()
            .map(|record| SwapView {
                process: record.page().process(),
                virtual_address: record.page().virtual_address(),
                payload: record.page().payload().to_owned(),
                slot: record.slot(),
                evicted_at: record.evicted_at(),
            })
            .collect();

        let page_tables = self
            .page_tables
            .values()
            .map(|table| PageTableView {
                process: table.process(),
                entries: table
                    .iter()
                    .map(|(address, entry)| EntryView {
                        virtual_address: address,
                        present: entry.is_present(),
                        frame: entry.frame(),
                        accessed: entry.accessed(),
                        dirty: entry.dirty(),
                        protection: entry.protection(),
                    })
                    .collect(),
            })
            .collect();

        let tlb = self
            .tlb
            .iter()
            .map(|(process, virtual_address, frame)| TlbView {
                process,
                virtual_address,
                frame,
            })
            .collect();

        MemorySnapshot {
            frames,
            swap,
            page_tables,
            tlb,
            stats: self.stats,
        }
    }

    /// Advances the logical clock and returns the new tick.
    fn tick(&mut self) -> Tick {
        self.clock = self.clock.next();
        self.clock
    }

    /// Runs fault handling for `(process, address)` and records it as its
    /// own operation.
    fn handle_fault(
        &mut self,
        process: ProcessId,
        address: VirtualAddress,
        now: Tick,
    ) -> Result<FrameIndex, TranslateError> {
        let mut record =
            OperationRecord::new(OperationKind::PageFaultHandling, process, address, now);
        let result = self.run_fault_steps(process, address, now, &mut record);
        match &result {
            Ok(frame) => record.set_outcome(*frame),
            Err(error) => record.push_step(StepKind::Failure, error.to_string()),
        }
        self.log.push(record);
        result
    }

    fn run_fault_steps(
        &mut self,
        process: ProcessId,
        address: VirtualAddress,
        now: Tick,
        record: &mut OperationRecord,
    ) -> Result<FrameIndex, TranslateError> {
        let frame = match self.frames.allocate() {
            Some(frame) => frame,
            None => self.evict_lru(now, record)?,
        };

        // Recover the page from swap, or synthesize one for a first
        // reference.
        let page = match self.swap.remove(process, address) {
            Some(stored) => {
                record.push_step(
                    StepKind::SwapIn,
                    format!("recovered page from swap slot {}", stored.slot()),
                );
                log::debug!(
                    "swap-in: process {process}, address {address} from slot {}",
                    stored.slot()
                );
                stored.into_page()
            }
            None => {
                record.push_step(
                    StepKind::PageCreation,
                    format!("created new page for address {address}"),
                );
                Page::new(process, address, self.config.page_size, now)
            }
        };

        self.frames.bind(frame, page);
        record.push_step(StepKind::FrameBinding, format!("bound page into frame {frame}"));

        let entry = self
            .page_tables
            .get_mut(&process)
            .ok_or(TranslateError::UnregisteredProcess(process))?
            .entry(address);
        entry.mark_present(frame);
        entry.mark_accessed();

        Ok(frame)
    }

    /// Frees a frame by evicting the least recently used page to swap.
    ///
    /// Returns the freshly allocated frame. Failure here means the
    /// bookkeeping is broken, not that the caller did anything wrong.
    fn evict_lru(
        &mut self,
        now: Tick,
        record: &mut OperationRecord,
    ) -> Result<FrameIndex, TranslateError> {
        let victim = self
            .frames
            .find_lru_victim()
            .ok_or(TranslateError::MemoryExhausted)?;
        let (victim_process, victim_address, victim_payload) = {
            let page = self
                .frames
                .page(victim)
                .ok_or(TranslateError::MemoryExhausted)?;
            (
                page.process(),
                page.virtual_address(),
                page.payload().to_owned(),
            )
        };

        record.push_step(
            StepKind::Eviction,
            format!("evicting {victim_payload} from frame {victim} (least recently used)"),
        );
        log::debug!("evicting {victim_payload} from frame {victim}");

        // The victim's page table must agree that the page is gone before
        // the frame is reused.
        let table = self.page_tables.get_mut(&victim_process).ok_or(
            TranslateError::CorruptSwapRecord {
                process: victim_process,
                virtual_address: victim_address,
            },
        )?;
        if let Some(entry) = table.lookup_mut(victim_address) {
            entry.mark_absent();
        }

        let page = self
            .frames
            .deallocate(victim)
            .ok_or(TranslateError::MemoryExhausted)?;
        let slot = self.swap.store(page, now);
        record.push_step(StepKind::SwapOut, format!("swapped out to slot {slot}"));

        // Cached translations into the freed frame would now land in the
        // wrong page.
        let dropped = self.tlb.invalidate_frame(victim);
        if dropped > 0 {
            log::trace!("dropped {dropped} cached translation(s) for frame {victim}");
        }

        self.frames
            .allocate()
            .ok_or(TranslateError::MemoryExhausted)
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
