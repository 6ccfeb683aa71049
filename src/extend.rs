//! Host-side auto-extend policy (spec.md §4.4): decide whether a
//! recoverable fault should be treated as a request to grow the stack or
//! memory, and to what size. Grounded in
//! `original_source/features/auto-extend.c`'s `round_up` growth
//! arithmetic; exposed as a free function so a driver (out of scope here)
//! can call it without re-deriving the bounds checks.

use crate::fault::Fault;
use crate::state::round_up_to_page;
use crate::word::{UWord, Word};

/// A recommended growth action, or `None` if the fault/`bad` combination
/// is outside the "reasonable" range spec.md §4.4 allows the driver to
/// treat as recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    GrowStack { words: UWord },
    GrowMemory { bytes: UWord },
}

/// `bad` is the fault's `BAD` payload (requested stack depth for
/// `StackOverflow`, offending address for the two memory faults).
pub fn recommend_growth(fault: Fault, bad: Word, stack_words: UWord, memory_bytes: UWord, page_size: UWord) -> Option<Recommendation> {
    let bad = bad as UWord;
    let rec = match fault {
        Fault::StackOverflow => {
            if bad >= stack_words && bad < UWord::MAX - stack_words {
                Some(Recommendation::GrowStack { words: round_up_to_page(stack_words + bad, page_size) })
            } else {
                None
            }
        }
        Fault::InvalidMemoryRead | Fault::InvalidMemoryWrite => {
            if bad >= memory_bytes {
                Some(Recommendation::GrowMemory { bytes: round_up_to_page(bad, page_size) })
            } else {
                None
            }
        }
        _ => None,
    };
    if let Some(rec) = rec {
        tracing::warn!(?fault, bad, ?rec, "recommending auto-extend growth");
    }
    rec
}
