//! Arithmetic, comparison and bitwise opcodes.
//!
//! Division convention grounded in a hand-trace of
//! `original_source/tests/arithmetic.c`'s `correct[]` stack-state array:
//! `DIVMOD`/`UDIVMOD` truncate toward zero (Rust's native `/`/`%` for
//! signed operands), not floored division. Stack effect is the reverse of
//! the conventional Forth `/MOD` ordering: quotient is pushed first,
//! remainder second, so remainder is left on top.

use crate::fault::Fault;
use crate::stack::StackId;
use crate::state::State;
use crate::word::{UWord, Word, WORD_BIT};

const TRUE: Word = -1;
const FALSE: Word = 0;

pub fn add(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, a.wrapping_add(b))
}

pub fn mul(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, a.wrapping_mul(b))
}

pub fn negate(state: &mut State) -> Result<(), Fault> {
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, a.wrapping_neg())
}

pub fn divmod(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    if b == 0 {
        return Err(Fault::DivisionByZero);
    }
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    state.push_stack(StackId::Data, q)?;
    state.push_stack(StackId::Data, r)
}

pub fn udivmod(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)? as UWord;
    let a = state.pop_stack(StackId::Data)? as UWord;
    if b == 0 {
        return Err(Fault::DivisionByZero);
    }
    let q = a / b;
    let r = a % b;
    state.push_stack(StackId::Data, q as Word)?;
    state.push_stack(StackId::Data, r as Word)
}

pub fn lt(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, if a < b { TRUE } else { FALSE })
}

pub fn ult(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)? as UWord;
    let a = state.pop_stack(StackId::Data)? as UWord;
    state.push_stack(StackId::Data, if a < b { TRUE } else { FALSE })
}

pub fn eq(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, if a == b { TRUE } else { FALSE })
}

pub fn invert(state: &mut State) -> Result<(), Fault> {
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, !a)
}

pub fn and(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, a & b)
}

pub fn or(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, a | b)
}

pub fn xor(state: &mut State) -> Result<(), Fault> {
    let b = state.pop_stack(StackId::Data)?;
    let a = state.pop_stack(StackId::Data)?;
    state.push_stack(StackId::Data, a ^ b)
}

pub fn lshift(state: &mut State) -> Result<(), Fault> {
    let n = state.pop_stack(StackId::Data)? as UWord;
    let a = state.pop_stack(StackId::Data)?;
    let result = if n >= WORD_BIT as UWord { 0 } else { a.wrapping_shl(n as u32) };
    state.push_stack(StackId::Data, result)
}

pub fn rshift(state: &mut State) -> Result<(), Fault> {
    let n = state.pop_stack(StackId::Data)? as UWord;
    let a = state.pop_stack(StackId::Data)? as UWord;
    let result = if n >= WORD_BIT as UWord { 0 } else { a.wrapping_shr(n as u32) };
    state.push_stack(StackId::Data, result as Word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm() -> State {
        State::init(64, 8)
    }

    #[test]
    fn add_wraps_modulo_word_width() {
        let mut s = vm();
        s.push_stack(StackId::Data, Word::MAX).unwrap();
        s.push_stack(StackId::Data, 1).unwrap();
        add(&mut s).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), Word::MIN);
    }

    #[test]
    fn negate_of_word_min_is_word_min() {
        let mut s = vm();
        s.push_stack(StackId::Data, Word::MIN).unwrap();
        negate(&mut s).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), Word::MIN);
    }

    #[test]
    fn divmod_truncates_toward_zero() {
        let mut s = vm();
        s.push_stack(StackId::Data, -17).unwrap();
        s.push_stack(StackId::Data, 5).unwrap();
        divmod(&mut s).unwrap();
        // Remainder is on top, quotient below it.
        let r = s.pop_stack(StackId::Data).unwrap();
        let q = s.pop_stack(StackId::Data).unwrap();
        assert_eq!((q, r), (-3, -2));
        assert_eq!(q * 5 + r, -17);
    }

    #[test]
    fn divmod_by_zero_faults() {
        let mut s = vm();
        s.push_stack(StackId::Data, 1).unwrap();
        s.push_stack(StackId::Data, 0).unwrap();
        assert_eq!(divmod(&mut s), Err(Fault::DivisionByZero));
    }

    #[test]
    fn udivmod_satisfies_division_identity() {
        let mut s = vm();
        s.push_stack(StackId::Data, 10).unwrap();
        s.push_stack(StackId::Data, 3).unwrap();
        udivmod(&mut s).unwrap();
        // Remainder is on top, quotient below it.
        let r = s.pop_stack(StackId::Data).unwrap();
        let q = s.pop_stack(StackId::Data).unwrap();
        assert_eq!((q, r), (3, 1));
    }

    #[test]
    fn shift_at_or_past_word_width_is_zero() {
        let mut s = vm();
        s.push_stack(StackId::Data, -1).unwrap();
        s.push_stack(StackId::Data, WORD_BIT as Word).unwrap();
        lshift(&mut s).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);

        s.push_stack(StackId::Data, -1).unwrap();
        s.push_stack(StackId::Data, WORD_BIT as Word).unwrap();
        rshift(&mut s).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);
    }

    #[test]
    fn rshift_is_logical_not_arithmetic() {
        let mut s = vm();
        s.push_stack(StackId::Data, -1).unwrap();
        s.push_stack(StackId::Data, 1).unwrap();
        rshift(&mut s).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), Word::MAX);
    }
}
