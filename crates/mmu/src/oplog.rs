//! Step-by-step record of memory operations.
//!
//! Every translation and fault-handling run appends one record describing
//! the steps it took. A cursor over the records supports replaying the
//! history backward and forward; appending while the cursor is rewound
//! discards everything past it first, the way a linear undo history does.

use crate::{FrameIndex, ProcessId, Tick, VirtualAddress};

/// What an operation record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A translation request from lookup to result.
    AddressTranslation,
    /// The fault-handling run a translation triggered.
    PageFaultHandling,
}

/// One step inside an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Consulted the translation cache.
    TlbLookup,
    /// The cache held the mapping.
    TlbHit,
    /// The cache did not hold the mapping.
    TlbMiss,
    /// A new mapping was installed in the cache.
    TlbUpdate,
    /// Consulted the page table.
    PageTableLookup,
    /// The page was already resident.
    PageHit,
    /// The page was not resident; fault handling begins.
    PageFault,
    /// A resident page was chosen for eviction.
    Eviction,
    /// The victim page was written to secondary storage.
    SwapOut,
    /// The requested page was recovered from secondary storage.
    SwapIn,
    /// A page was synthesized for a first-time reference.
    PageCreation,
    /// The page was placed into a physical frame.
    FrameBinding,
    /// The operation could not be completed.
    Failure,
}

/// A single step with its human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    kind: StepKind,
    detail: String,
}

impl Step {
    /// Returns what the step did.
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Returns the description shown to a reader.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// The full trace of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    kind: OperationKind,
    process: ProcessId,
    virtual_address: VirtualAddress,
    steps: Vec<Step>,
    outcome: Option<FrameIndex>,
    at: Tick,
}

impl OperationRecord {
    /// Starts an empty record for an operation beginning at `at`.
    pub fn new(
        kind: OperationKind,
        process: ProcessId,
        virtual_address: VirtualAddress,
        at: Tick,
    ) -> Self {
        Self {
            kind,
            process,
            virtual_address,
            steps: Vec::new(),
            outcome: None,
            at,
        }
    }

    /// Appends a step.
    pub fn push_step(&mut self, kind: StepKind, detail: impl Into<String>) {
        self.steps.push(Step {
            kind,
            detail: detail.into(),
        });
    }

    /// Records the frame the operation resolved to.
    pub fn set_outcome(&mut self, frame: FrameIndex) {
        self.outcome = Some(frame);
    }

    /// Returns what the operation was.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns the requesting process.
    pub fn process(&self) -> ProcessId {
        self.process
    }

    /// Returns the requested virtual address.
    pub fn virtual_address(&self) -> VirtualAddress {
        self.virtual_address
    }

    /// Returns the recorded steps in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the resolved frame, or `None` for failed operations.
    pub fn outcome(&self) -> Option<FrameIndex> {
        self.outcome
    }

    /// Returns the tick at which the operation started.
    pub fn at(&self) -> Tick {
        self.at
    }
}

/// Ordered history of operations with a replay cursor.
///
/// The cursor counts how many records lie behind it. Stepping back and
/// forward moves it without losing records; appending truncates everything
/// at and past the cursor first.
pub struct OperationLog {
    records: Vec<OperationRecord>,
    cursor: usize,
}

impl OperationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            cursor: 0,
        }
    }

    /// Appends `record` and places the cursor after it.
    ///
    /// If the cursor was rewound, the records past it are discarded first.
    pub fn push(&mut self, record: OperationRecord) {
        if self.cursor < self.records.len() {
            self.records.truncate(self.cursor);
        }
        self.records.push(record);
        self.cursor = self.records.len();
    }

    /// Moves the cursor one record back and returns the record stepped
    /// over, or `None` at the beginning.
    pub fn step_back(&mut self) -> Option<&OperationRecord> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.records[self.cursor])
    }

    /// Moves the cursor one record forward and returns the record stepped
    /// over, or `None` at the end.
    pub fn step_forward(&mut self) -> Option<&OperationRecord> {
        let record = self.records.get(self.cursor)?;
        self.cursor += 1;
        Some(record)
    }

    /// Places the cursor at `position`, clamped to the record count.
    pub fn seek(&mut self, position: usize) {
        self.cursor = position.min(self.records.len());
    }

    /// Returns the record just behind the cursor, if any.
    pub fn current(&self) -> Option<&OperationRecord> {
        self.cursor.checked_sub(1).map(|i| &self.records[i])
    }

    /// Returns the cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns all records in order, including any ahead of the cursor.
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(address: u64) -> OperationRecord {
        OperationRecord::new(
            OperationKind::AddressTranslation,
            ProcessId::new(1),
            VirtualAddress::new(address),
            Tick::new(address),
        )
    }

    #[test]
    fn push_advances_the_cursor() {
        let mut log = OperationLog::new();
        log.push(record(0));
        log.push(record(1));

        assert_eq!(log.len(), 2);
        assert_eq!(log.cursor(), 2);
        assert_eq!(
            log.current().unwrap().virtual_address(),
            VirtualAddress::new(1)
        );
    }

    #[test]
    fn stepping_replays_in_both_directions() {
        let mut log = OperationLog::new();
        log.push(record(0));
        log.push(record(1));

        let back = log.step_back().unwrap();
        assert_eq!(back.virtual_address(), VirtualAddress::new(1));
        assert_eq!(log.cursor(), 1);

        let forward = log.step_forward().unwrap();
        assert_eq!(forward.virtual_address(), VirtualAddress::new(1));
        assert_eq!(log.cursor(), 2);
        assert!(log.step_forward().is_none());
    }

    #[test]
    fn stepping_back_at_the_beginning_returns_none() {
        let mut log = OperationLog::new();
        assert!(log.step_back().is_none());

        log.push(record(0));
        log.step_back();
        assert!(log.step_back().is_none());
    }

    #[test]
    fn appending_after_rewind_discards_the_tail() {
        let mut log = OperationLog::new();
        log.push(record(0));
        log.push(record(1));
        log.push(record(2));

        log.step_back();
        log.step_back();
        assert_eq!(log.cursor(), 1);

        log.push(record(9));

        assert_eq!(log.len(), 2);
        let addresses: Vec<_> = log
            .records()
            .iter()
            .map(|r| r.virtual_address().as_u64())
            .collect();
        assert_eq!(addresses, vec![0, 9]);
        assert_eq!(log.cursor(), 2);
    }

    #[test]
    fn seek_clamps_to_the_record_count() {
        let mut log = OperationLog::new();
        log.push(record(0));

        log.seek(50);
        assert_eq!(log.cursor(), 1);
        log.seek(0);
        assert!(log.current().is_none());
    }

    #[test]
    fn records_collect_steps_and_outcome() {
        let mut rec = record(0);
        rec.push_step(StepKind::TlbLookup, "checking cache");
        rec.push_step(StepKind::TlbHit, "cache hit");
        rec.set_outcome(FrameIndex::new(4));

        assert_eq!(rec.steps().len(), 2);
        assert_eq!(rec.steps()[1].kind(), StepKind::TlbHit);
        assert_eq!(rec.steps()[1].detail(), "cache hit");
        assert_eq!(rec.outcome(), Some(FrameIndex::new(4)));
    }
}
