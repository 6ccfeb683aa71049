//! The VM's closed, numeric fault taxonomy.
//!
//! Grounded in the teacher's `error.rs` (`InterpreterError`, `RuntimeError`):
//! a `thiserror`-derived enum distinguishes faults the guest can recover
//! from (by growing memory/stack and resuming, or via an in-guest handler)
//! from the crate-internal bookkeeping that drives that recovery.

use thiserror::Error;

/// A single fault raised by the execution cycle, the object codec, or an
/// extra-instruction library. The numeric value is part of the wire
/// contract described in spec.md §4.3/§4.6/§7.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Decoder failed to find a terminator byte, or the opcode is outside
    /// the architecture's defined range.
    #[error("invalid opcode")]
    InvalidOpcode,
    /// A data- or return-stack push exceeded the stack's reserved size.
    #[error("stack overflow")]
    StackOverflow,
    /// A stack read (peek/pop) addressed a position at or past the current
    /// depth.
    #[error("invalid stack read")]
    InvalidStackRead,
    /// A stack write (poke) addressed a position at or past the current
    /// depth.
    #[error("invalid stack write")]
    InvalidStackWrite,
    /// A memory read addressed a byte or word outside `[0, MEMORY)`.
    #[error("memory read out of range")]
    InvalidMemoryRead,
    /// A memory write addressed a byte or word outside `[0, MEMORY)`.
    #[error("memory write out of range")]
    InvalidMemoryWrite,
    /// A word access addressed a byte that is in range but not word-aligned.
    #[error("unaligned memory access")]
    MemoryUnaligned,
    /// `DIVMOD`/`UDIVMOD` (or `THROW`ing the equivalent code) with a zero
    /// divisor.
    #[error("division by zero")]
    DivisionByZero,
    /// `EXTRA` was dispatched with a selector outside the known library
    /// set.
    #[error("invalid library call")]
    InvalidLibrary,
    /// An extra-instruction argument that names a guest address did not
    /// resolve to a valid in-VM range. Distinct from `InvalidMemoryRead`:
    /// this signals "not resolvable" at the host/extra boundary rather
    /// than a runtime memory fault raised by the execution cycle itself.
    #[error("invalid address argument to extra instruction")]
    InvalidAddress,
}

impl Fault {
    /// The wire/exit-status code for this fault, per spec.md §4.3/§7.
    pub const fn code(self) -> i32 {
        match self {
            Fault::InvalidOpcode => 1,
            Fault::StackOverflow => 2,
            Fault::InvalidStackRead => 3,
            Fault::InvalidStackWrite => 4,
            Fault::InvalidMemoryRead => 5,
            Fault::InvalidMemoryWrite => 6,
            Fault::MemoryUnaligned => 7,
            Fault::DivisionByZero => 8,
            Fault::InvalidLibrary => -15,
            Fault::InvalidAddress => -5,
        }
    }

    /// Reconstruct a fault from its wire code, for the `THROW` opcode and
    /// for decoding a code pushed by a prior in-guest trap.
    pub const fn from_code(code: i32) -> Option<Fault> {
        match code {
            1 => Some(Fault::InvalidOpcode),
            2 => Some(Fault::StackOverflow),
            3 => Some(Fault::InvalidStackRead),
            4 => Some(Fault::InvalidStackWrite),
            5 => Some(Fault::InvalidMemoryRead),
            6 => Some(Fault::InvalidMemoryWrite),
            7 => Some(Fault::MemoryUnaligned),
            8 => Some(Fault::DivisionByZero),
            -15 => Some(Fault::InvalidLibrary),
            -5 => Some(Fault::InvalidAddress),
            _ => None,
        }
    }

    /// Whether the host's auto-extend policy (§4.4) may treat this fault as
    /// a request to grow a buffer rather than a terminal error.
    pub const fn is_growable(self) -> bool {
        matches!(
            self,
            Fault::StackOverflow | Fault::InvalidMemoryRead | Fault::InvalidMemoryWrite
        )
    }
}

/// The result of a single execution step: either progress, a clean halt, or
/// a fault that propagated all the way out of the cycle (i.e. `HANDLER`
/// was `0` at the time of the fault).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step completed; the caller should invoke `single_step` again.
    Continue,
    /// The VM executed `HALT`.
    Halt,
    /// A fault escaped to the host.
    Fault(Fault),
    /// `THROW` escaped to the host with a code outside the closed
    /// `Fault` taxonomy. `THROW` lets guest code "raise a fault
    /// explicitly" with whatever code it names (spec.md §4.3); when that
    /// code doesn't match one of this crate's named faults, there's no
    /// `Fault` variant to carry, so the raw code is surfaced as-is.
    Thrown(i32),
}

impl StepOutcome {
    /// The raw status value `SingleStep`/`Run` return per spec.md §4.2:
    /// `0` to continue, `128` on halt, or the negative/positive fault code.
    pub const fn code(self) -> i32 {
        match self {
            StepOutcome::Continue => 0,
            StepOutcome::Halt => crate::consts::HALT,
            StepOutcome::Fault(f) => f.code(),
            StepOutcome::Thrown(code) => code,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    /// Compile-time check that the `cfg_attr`-gated derives actually fire:
    /// fails to compile if `Fault`/`StepOutcome` stop implementing `serde`'s
    /// traits under the `serde` feature.
    #[test]
    fn fault_and_step_outcome_implement_serde_traits() {
        fn assert_impl<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_impl::<Fault>();
        assert_impl::<StepOutcome>();
    }
}
