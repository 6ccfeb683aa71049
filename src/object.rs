//! Object file codec: header validation, shebang skip, length-prefixed
//! body. Grounded in `original_source/src/object.c`'s `smite_load_object`/
//! `smite_save_object` (shebang-then-header-then-length-then-bytes
//! framing) and spec.md §4.6.

use std::io::{Read, Write};

use thiserror::Error;

use crate::consts::{OBJECT_HEADER_LEN, OBJECT_MAGIC, OBJECT_SHEBANG};
use crate::state::State;
use crate::word::{is_aligned, UWord, Word, ENDISM, WORD_SIZE};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ObjectError {
    #[error("I/O failure")]
    Io,
    #[error("malformed header or short read")]
    Malformed,
    #[error("incompatible word size or endianness")]
    Incompatible,
    #[error("length/address range or alignment failure")]
    Range,
}

impl From<std::io::Error> for ObjectError {
    fn from(_: std::io::Error) -> Self {
        ObjectError::Io
    }
}

impl ObjectError {
    /// The wire code for this failure, per spec.md §4.6.
    pub const fn code(self) -> i32 {
        match self {
            ObjectError::Io => -1,
            ObjectError::Malformed => -2,
            ObjectError::Incompatible => -3,
            ObjectError::Range => -4,
        }
    }
}

/// `SaveObject(S, addr, len, sink)`: write the shebang, header, length and
/// `len` raw bytes starting at `addr`.
pub fn save_object(state: &State, addr: UWord, len: UWord, sink: &mut impl Write) -> Result<(), ObjectError> {
    let bytes = state.native_address_of_range(addr, len).ok_or(ObjectError::Range)?;

    sink.write_all(OBJECT_SHEBANG)?;
    sink.write_all(&OBJECT_MAGIC)?;
    sink.write_all(&[state.endism(), WORD_SIZE as u8])?;

    let len_word = len as Word;
    let len_bytes = if state.endism() == 1 { len_word.to_be_bytes() } else { len_word.to_le_bytes() };
    sink.write_all(len_bytes.as_ref())?;
    sink.write_all(bytes)?;

    tracing::debug!(addr, len, "object saved");
    Ok(())
}

/// `LoadObject(S, addr, src) -> bytes_loaded`.
pub fn load_object(state: &mut State, addr: UWord, src: &mut impl Read) -> Result<UWord, ObjectError> {
    let mut lookahead = [0u8; 2];
    src.read_exact(&mut lookahead).map_err(|_| ObjectError::Malformed)?;

    let mut header = [0u8; OBJECT_HEADER_LEN];
    if &lookahead == b"#!" {
        skip_shebang_rest(src)?;
        src.read_exact(&mut header).map_err(|_| ObjectError::Malformed)?;
    } else {
        header[..2].copy_from_slice(&lookahead);
        src.read_exact(&mut header[2..]).map_err(|_| ObjectError::Malformed)?;
    }

    if header[..OBJECT_MAGIC.len()] != OBJECT_MAGIC {
        return Err(ObjectError::Malformed);
    }
    let endism = header[OBJECT_MAGIC.len()];
    let word_bytes = header[OBJECT_MAGIC.len() + 1];
    if endism > 1 {
        return Err(ObjectError::Malformed);
    }
    if endism != state.endism() || word_bytes as usize != WORD_SIZE {
        return Err(ObjectError::Incompatible);
    }

    let mut len_bytes = [0u8; WORD_SIZE];
    src.read_exact(&mut len_bytes).map_err(|_| ObjectError::Malformed)?;
    let len = if endism == 1 { Word::from_be_bytes(len_bytes) } else { Word::from_le_bytes(len_bytes) } as UWord;

    if !is_aligned(addr) || len > state.memory_bytes() || addr > state.memory_bytes() - len {
        return Err(ObjectError::Range);
    }

    let dest = state.native_address_of_range_mut(addr, len).ok_or(ObjectError::Range)?;
    src.read_exact(dest).map_err(|_| ObjectError::Malformed)?;

    tracing::debug!(addr, len, "object loaded");
    Ok(len)
}

/// Consume bytes up to and including the first `\n` of a `#!` shebang
/// line, byte-for-byte, regardless of its length.
fn skip_shebang_rest(src: &mut impl Read) -> Result<(), ObjectError> {
    let mut byte = [0u8; 1];
    loop {
        src.read_exact(&mut byte).map_err(|_| ObjectError::Malformed)?;
        if byte[0] == b'\n' {
            return Ok(());
        }
    }
}
