//! Randomized request scripts for simulated processes.
//!
//! Each simulated process gets a short script of memory requests; the
//! memory unit itself never generates addresses. Scripts are drained
//! round-robin so the processes appear to run side by side. Pass a seed to
//! make a run reproducible.

use mmu::{AccessKind, ProcessId, VirtualAddress};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// One scripted memory request.
#[derive(Debug, Clone)]
pub struct ScriptedRequest {
    /// The issuing process.
    pub process: ProcessId,
    /// The address to reference.
    pub virtual_address: VirtualAddress,
    /// Read or write.
    pub kind: AccessKind,
    /// Human-readable description of what the process is doing.
    pub description: String,
}

/// The request script of one simulated process.
pub struct ProcessScript {
    process: ProcessId,
    requests: Vec<ScriptedRequest>,
    cursor: usize,
}

impl ProcessScript {
    /// Generates a script of 5 to 10 requests.
    ///
    /// The i-th request references somewhere in the i-th page, reads
    /// roughly 70% of the time, and alternates between data and code
    /// flavored descriptions.
    fn generate(process: ProcessId, rng: &mut SmallRng) -> Self {
        let name = format!("process-{process}");
        let request_count: usize = rng.gen_range(5..11);
        let requests = (0..request_count)
            .map(|i| {
                let offset: u64 = rng.gen_range(0..1000);
                let kind = if rng.gen_bool(0.7) {
                    AccessKind::Read
                } else {
                    AccessKind::Write
                };
                let activity = if rng.gen_bool(0.5) {
                    "data access"
                } else {
                    "code execution"
                };
                ScriptedRequest {
                    process,
                    virtual_address: VirtualAddress::new(i as u64 * 4096 + offset),
                    kind,
                    description: format!("{name} - {activity} #{i}"),
                }
            })
            .collect();

        Self {
            process,
            requests,
            cursor: 0,
        }
    }

    /// Returns the owning process.
    pub fn process(&self) -> ProcessId {
        self.process
    }

    /// Returns the number of requests in the script.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns whether every request has been handed out.
    pub fn is_completed(&self) -> bool {
        self.cursor >= self.requests.len()
    }

    /// Hands out the next request, or `None` once the script is done.
    pub fn next_request(&mut self) -> Option<&ScriptedRequest> {
        let request = self.requests.get(self.cursor)?;
        self.cursor += 1;
        Some(request)
    }
}

/// Scripts for a whole simulation run.
pub struct Workload {
    scripts: Vec<ProcessScript>,
}

impl Workload {
    /// Generates scripts for processes 1 through `process_count`.
    ///
    /// A seed makes the workload reproducible; without one the scripts
    /// differ from run to run.
    pub fn generate(process_count: u32, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let scripts: Vec<_> = (1..=process_count)
            .map(|id| ProcessScript::generate(ProcessId::new(id), &mut rng))
            .collect();
        for script in &scripts {
            log::debug!(
                "process {}: {} scripted requests",
                script.process(),
                script.len()
            );
        }

        Self { scripts }
    }

    /// Returns the process ids covered by this workload.
    pub fn processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.scripts.iter().map(|script| script.process())
    }

    /// Interleaves the scripts one request at a time until all complete.
    pub fn drain_round_robin(mut self) -> Vec<ScriptedRequest> {
        let mut requests = Vec::new();
        while self.scripts.iter().any(|script| !script.is_completed()) {
            for script in &mut self.scripts {
                if let Some(request) = script.next_request() {
                    requests.push(request.clone());
                }
            }
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_workloads_are_reproducible() {
        let first = Workload::generate(3, Some(7)).drain_round_robin();
        let second = Workload::generate(3, Some(7)).drain_round_robin();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.process, b.process);
            assert_eq!(a.virtual_address, b.virtual_address);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.description, b.description);
        }
    }

    #[test]
    fn script_lengths_stay_in_range() {
        for seed in 0..20 {
            let workload = Workload::generate(1, Some(seed));
            let len = workload.scripts[0].len();
            assert!((5..=10).contains(&len), "script of {len} requests");
        }
    }

    #[test]
    fn addresses_land_in_consecutive_pages() {
        let workload = Workload::generate(1, Some(42));
        for (i, request) in workload.scripts[0].requests.iter().enumerate() {
            let address = request.virtual_address.as_u64();
            assert_eq!(address / 4096, i as u64);
            assert!(address % 4096 < 1000);
        }
    }

    #[test]
    fn round_robin_interleaves_processes() {
        let requests = Workload::generate(2, Some(1)).drain_round_robin();

        // Both scripts have at least five requests, so the first four
        // alternate between the two processes.
        let ids: Vec<_> = requests.iter().take(4).map(|r| r.process).collect();
        assert_eq!(
            ids,
            vec![
                ProcessId::new(1),
                ProcessId::new(2),
                ProcessId::new(1),
                ProcessId::new(2)
            ]
        );
    }

    #[test]
    fn scripts_report_completion() {
        let mut workload = Workload::generate(1, Some(3));
        let script = &mut workload.scripts[0];
        assert!(!script.is_completed());

        while script.next_request().is_some() {}
        assert!(script.is_completed());
        assert!(script.next_request().is_none());
    }
}
