//! The closed set of action opcodes.
//!
//! Grounded in spec.md §4.2's opcode family table. The source snapshot under
//! `original_source/src/opcodes.h` assigns different numeric values to a
//! larger, later-revision opcode set (actions at `0x80..0xBF`) that
//! contradicts spec.md's own `[0, 0x3F]` action range, so the discriminants
//! below are this crate's own closed assignment rather than a port of that
//! table: sequential from `0`, in the order spec.md lists the families,
//! leaving `[47, 63]` reserved (decodes to `Undefined`, which always faults
//! with `INVALID_OPCODE`, per spec.md §9's note on the reserved range).
//! spec.md §4.2's family table has no NOP; this crate does not invent one,
//! so byte `0` is `Pop`, the first opcode the table actually lists.

use crate::fault::Fault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Pop = 0,
    Push = 1,
    Swap = 2,
    RPush = 3,
    Pop2R = 4,
    RPop = 5,
    Lt = 6,
    Eq = 7,
    ULt = 8,
    Add = 9,
    Mul = 10,
    UDivMod = 11,
    DivMod = 12,
    Negate = 13,
    Invert = 14,
    And = 15,
    Or = 16,
    Xor = 17,
    LShift = 18,
    RShift = 19,
    Load = 20,
    Store = 21,
    LoadB = 22,
    StoreB = 23,
    Branch = 24,
    BranchZ = 25,
    Call = 26,
    Ret = 27,
    Throw = 28,
    Halt = 29,
    CallNative = 30,
    Extra = 31,
    PushPSize = 32,
    PushSp = 33,
    StoreSp = 34,
    PushRp = 35,
    StoreRp = 36,
    PushPc = 37,
    PushS0 = 38,
    PushSSize = 39,
    PushR0 = 40,
    PushRSize = 41,
    PushHandler = 42,
    StoreHandler = 43,
    PushMemory = 44,
    PushBadPc = 45,
    PushInvalid = 46,
}

/// Highest opcode discriminant currently assigned; everything above this
/// and up to `ACTION_MAX` is the reserved, undefined hole.
pub const MAX_ASSIGNED: u8 = Opcode::PushInvalid as u8;

impl TryFrom<u8> for Opcode {
    type Error = Fault;

    fn try_from(byte: u8) -> Result<Self, Fault> {
        use Opcode::*;
        Ok(match byte {
            0 => Pop,
            1 => Push,
            2 => Swap,
            3 => RPush,
            4 => Pop2R,
            5 => RPop,
            6 => Lt,
            7 => Eq,
            8 => ULt,
            9 => Add,
            10 => Mul,
            11 => UDivMod,
            12 => DivMod,
            13 => Negate,
            14 => Invert,
            15 => And,
            16 => Or,
            17 => Xor,
            18 => LShift,
            19 => RShift,
            20 => Load,
            21 => Store,
            22 => LoadB,
            23 => StoreB,
            24 => Branch,
            25 => BranchZ,
            26 => Call,
            27 => Ret,
            28 => Throw,
            29 => Halt,
            30 => CallNative,
            31 => Extra,
            32 => PushPSize,
            33 => PushSp,
            34 => StoreSp,
            35 => PushRp,
            36 => StoreRp,
            37 => PushPc,
            38 => PushS0,
            39 => PushSSize,
            40 => PushR0,
            41 => PushRSize,
            42 => PushHandler,
            43 => StoreHandler,
            44 => PushMemory,
            45 => PushBadPc,
            46 => PushInvalid,
            _ => return Err(Fault::InvalidOpcode),
        })
    }
}
