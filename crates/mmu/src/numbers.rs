//! Identifier types for the simulated memory subsystem.
//!
//! This module provides newtypes for process ids, virtual addresses, frame
//! indices and swap slots, which are used throughout the simulation core.
//! Keeping them distinct prevents a frame index from being confused with a
//! virtual address in the orchestrator's bookkeeping.

use core::fmt;

/// Macro to define common identifier functionality.
///
/// This macro generates the basic structure and methods common to the
/// identifier types, reducing code duplication.
macro_rules! impl_identifier_common {
    ($name:ident, $raw:ty, $as_raw:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name($raw);

        impl $name {
            /// Creates a new identifier from its raw value.
            #[inline]
            pub const fn new(raw: $raw) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[inline]
            pub const fn $as_raw(self) -> $raw {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$raw> for $name {
            #[inline]
            fn from(raw: $raw) -> Self {
                Self(raw)
            }
        }
    };
}

impl_identifier_common!(
    ProcessId,
    u32,
    as_u32,
    "Identifies one simulated process and its page table."
);

impl_identifier_common!(
    VirtualAddress,
    u64,
    as_u64,
    "A virtual address as issued by a simulated process."
);

impl_identifier_common!(
    FrameIndex,
    usize,
    as_usize,
    "Index of a physical frame slot, in `[0, capacity)`."
);

impl_identifier_common!(
    SwapSlot,
    u64,
    as_u64,
    "Identifier of a page's saved copy in secondary storage."
);

impl SwapSlot {
    /// Returns the slot id following this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl_identifier_common!(
    Tick,
    u64,
    as_u64,
    "Position on the simulation's logical access clock. Later accesses \
     carry strictly larger ticks, which is what least-recently-used victim \
     selection orders by."
);

impl Tick {
    /// The clock value before any access has happened.
    pub const ZERO: Tick = Tick(0);

    /// Returns the tick following this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}
