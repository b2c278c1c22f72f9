//! Text rendering of memory state views.
//!
//! Everything here works from a [`MemorySnapshot`] alone; the live
//! structures are never touched.

use std::fmt::Write as _;

use mmu::MemorySnapshot;

/// Renders the full state view as text.
pub fn render(snapshot: &MemorySnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "== Physical frames ==");
    for frame in &snapshot.frames {
        match &frame.occupant {
            Some(page) => {
                let _ = writeln!(
                    out,
                    "  frame {}: {} (process {}, address {}, last access {}{})",
                    frame.frame,
                    page.payload,
                    page.process,
                    page.virtual_address,
                    page.last_accessed,
                    if page.dirty { ", dirty" } else { "" },
                );
            }
            None => {
                let _ = writeln!(out, "  frame {}: <empty>", frame.frame);
            }
        }
    }

    let _ = writeln!(out, "== Swap ==");
    if snapshot.swap.is_empty() {
        let _ = writeln!(out, "  <empty>");
    }
    for record in &snapshot.swap {
        let _ = writeln!(
            out,
            "  slot {}: {} (process {}, address {}, evicted at {})",
            record.slot, record.payload, record.process, record.virtual_address, record.evicted_at,
        );
    }

    let _ = writeln!(out, "== Page tables ==");
    for table in &snapshot.page_tables {
        let _ = writeln!(out, "  process {}:", table.process);
        for entry in &table.entries {
            let location = match entry.frame {
                Some(frame) => format!("frame {frame}"),
                None => "not resident".to_owned(),
            };
            let _ = writeln!(
                out,
                "    address {}: {location}, {}{}{}",
                entry.virtual_address,
                entry.protection,
                if entry.accessed { ", accessed" } else { "" },
                if entry.dirty { ", dirty" } else { "" },
            );
        }
    }

    let _ = writeln!(out, "== Translation cache ==");
    if snapshot.tlb.is_empty() {
        let _ = writeln!(out, "  <empty>");
    }
    for mapping in &snapshot.tlb {
        let _ = writeln!(
            out,
            "  process {}, address {} -> frame {}",
            mapping.process, mapping.virtual_address, mapping.frame,
        );
    }

    let _ = writeln!(out, "== Counters ==");
    let stats = snapshot.stats;
    let _ = writeln!(
        out,
        "  cache hits: {}, misses: {}, page faults: {}, hit ratio: {:.1}%",
        stats.tlb_hits,
        stats.tlb_misses,
        stats.page_faults,
        stats.hit_ratio() * 100.0,
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmu::{Mmu, MmuConfig, ProcessId, VirtualAddress};

    fn rendered_state() -> String {
        let mut mmu = Mmu::with_config(MmuConfig {
            frame_count: 2,
            ..MmuConfig::default()
        });
        mmu.register_process(ProcessId::new(1));
        mmu.translate(ProcessId::new(1), VirtualAddress::new(0))
            .unwrap();
        mmu.translate(ProcessId::new(1), VirtualAddress::new(4096))
            .unwrap();
        mmu.translate(ProcessId::new(1), VirtualAddress::new(8192))
            .unwrap();
        render(&mmu.snapshot())
    }

    #[test]
    fn renders_all_five_sections() {
        let text = rendered_state();
        for heading in [
            "== Physical frames ==",
            "== Swap ==",
            "== Page tables ==",
            "== Translation cache ==",
            "== Counters ==",
        ] {
            assert!(text.contains(heading), "missing {heading:?} in:\n{text}");
        }
    }

    #[test]
    fn shows_occupants_and_swap_contents() {
        let text = rendered_state();
        assert!(text.contains("P1_page_8192"));
        assert!(text.contains("slot 0: P1_page_0"));
        assert!(text.contains("page faults: 3"));
    }

    #[test]
    fn renders_empty_sections_as_empty() {
        let mmu = Mmu::new();
        let text = render(&mmu.snapshot());
        assert!(text.contains("frame 0: <empty>"));
        assert!(text.contains("hit ratio: 0.0%"));
    }
}
