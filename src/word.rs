//! Word-width primitives.
//!
//! The architecture is parameterised on a word width `W` fixed at build
//! time via the mutually exclusive `word32`/`word64` Cargo features.

#[cfg(all(feature = "word32", feature = "word64"))]
compile_error!("features `word32` and `word64` are mutually exclusive");

#[cfg(not(any(feature = "word32", feature = "word64")))]
compile_error!("exactly one of features `word32` or `word64` must be enabled");

#[cfg(feature = "word32")]
mod width {
    pub type Word = i32;
    pub type UWord = u32;
}

#[cfg(feature = "word64")]
mod width {
    pub type Word = i64;
    pub type UWord = u64;
}

pub use width::{UWord, Word};

/// Width of a [`Word`] in bytes.
pub const WORD_SIZE: usize = std::mem::size_of::<Word>();

/// Width of a [`Word`] in bits.
pub const WORD_BIT: u32 = (WORD_SIZE * 8) as u32;

/// Host endianness, exposed as the architectural `ENDISM` value.
pub const ENDISM: u8 = if cfg!(target_endian = "big") { 1 } else { 0 };

/// `addr` rounded up to the next word boundary.
pub const fn align(addr: UWord) -> UWord {
    let mask = WORD_SIZE as UWord - 1;
    (addr.wrapping_add(mask)) & !mask
}

/// Whether `addr` is word-aligned.
pub const fn is_aligned(addr: UWord) -> bool {
    addr & (WORD_SIZE as UWord - 1) == 0
}

/// Arithmetic right shift: sign-extends regardless of `n`'s representation.
///
/// `n >= WORD_BIT` yields `0` or `-1` depending on the sign of `v`, matching
/// the saturating behaviour of a real barrel shifter; callers that need the
/// VM's `RSHIFT`/`LSHIFT` opcode semantics (logical, zero above width) do
/// their own clamping instead of calling this directly.
pub const fn arshift(v: Word, n: u32) -> Word {
    if n >= WORD_BIT {
        if v < 0 {
            -1
        } else {
            0
        }
    } else {
        v >> n
    }
}

/// Index (0-based) of the highest bit needed to represent `v`'s
/// *magnitude*, or `-1` if `v == 0`. Negative `v` (other than `WORD_MIN`,
/// which cannot be negated) is measured by `|v|`, not by its two's
/// complement bit pattern — e.g. `msbit(-1) == 0`, since `-1` needs only
/// one magnitude bit to round-trip through the instruction encoding's
/// sign-extending chunks. This mirrors `original_source/src/bits_util.c`'s
/// `smite_find_msbit`.
pub const fn msbit(v: Word) -> i32 {
    let mag: UWord = if v < 0 && v != Word::MIN { (-v) as UWord } else { v as UWord };
    WORD_BIT as i32 - 1 - mag.leading_zeros() as i32
}
