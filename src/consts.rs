//! Architectural constants.

use crate::word::{UWord, WORD_SIZE};

/// Payload bits carried per byte of the instruction encoding (`K` in the spec).
pub const CHUNK_BITS: u32 = 6;

/// Mask selecting the low `CHUNK_BITS` bits of a byte.
pub const CHUNK_MASK: u8 = (1 << CHUNK_BITS) - 1;

/// High bit set on both continuation and terminator bytes.
pub const CONTINUATION_BIT: u8 = 0x80;

/// Second-highest bit: set on a terminator, clear on a continuation.
pub const NUMBER_BIT: u8 = 0x40;

/// Highest action opcode value (low 6 bits of an action byte).
pub const ACTION_MAX: u8 = 0x3F;

/// Number of opcodes packed per instruction word (one per byte of `I`).
pub const OPCODES_PER_WORD: usize = WORD_SIZE;

/// Bits occupied by one packed opcode inside `I`.
pub const OPCODE_BIT: u32 = 8;

/// Mask selecting one packed opcode inside `I`.
pub const OPCODE_MASK: UWord = 0xFF;

/// `HALT` status code: terminal success, not a fault.
pub const HALT: i32 = 128;

/// 6-byte, NUL-padded, upper-cased package magic written by `SaveObject`.
pub const OBJECT_MAGIC: [u8; 6] = *b"STACKM";

/// Shebang line written ahead of the object header by `SaveObject`.
pub const OBJECT_SHEBANG: &[u8] = b"#!/usr/bin/env stackm\n";

/// Length, in bytes, of the fixed object header (magic + endism + word size).
pub const OBJECT_HEADER_LEN: usize = OBJECT_MAGIC.len() + 2;

/// Default page size used to round up auto-extend growth requests.
pub const DEFAULT_PAGE_SIZE: UWord = 4096;
