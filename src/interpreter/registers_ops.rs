//! Opcodes that expose or mutate architectural registers directly.
//!
//! `STORE_SP`/`STORE_RP` are explicitly **unchecked**: spec.md §4.2 calls
//! them out as raw set operations, so they resize the backing stack buffer
//! to the requested depth (zero-filling on growth) without going through
//! the overflow classification `push_stack`/`pop_stack` apply elsewhere.

use crate::fault::Fault;
use crate::stack::StackId;
use crate::state::State;
use crate::word::{UWord, Word};

pub fn push_sp(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.sp() as Word)
}

pub fn store_sp(state: &mut State) -> Result<(), Fault> {
    let new_sp = state.pop_stack(StackId::Data)? as usize;
    state.dstack_mut().resize(new_sp, 0);
    Ok(())
}

pub fn push_rp(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.rp() as Word)
}

pub fn store_rp(state: &mut State) -> Result<(), Fault> {
    let new_rp = state.pop_stack(StackId::Data)? as usize;
    state.rstack_mut().resize(new_rp, 0);
    Ok(())
}

pub fn push_pc(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.pc() as Word)
}

pub fn push_s0(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.s0() as Word)
}

pub fn push_ssize(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.ssize() as Word)
}

pub fn push_r0(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.r0() as Word)
}

pub fn push_rsize(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.rsize() as Word)
}

pub fn push_handler(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.handler() as Word)
}

pub fn store_handler(state: &mut State) -> Result<(), Fault> {
    let v = state.pop_stack(StackId::Data)?;
    state.set_handler(v as UWord);
    Ok(())
}

pub fn push_memory(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.memory_bytes() as Word)
}

pub fn push_badpc(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.badpc() as Word)
}

pub fn push_invalid(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, state.invalid() as Word)
}

pub fn push_psize(state: &mut State) -> Result<(), Fault> {
    state.push_stack(StackId::Data, State::psize() as Word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_sp_is_unchecked_and_zero_fills_on_growth() {
        let mut s = State::init(64, 8);
        s.push_stack(StackId::Data, 3).unwrap();
        store_sp(&mut s).unwrap();
        assert_eq!(s.sp(), 3);
        assert_eq!(s.dstack_slice(), &[0, 0, 0]);
    }

    #[test]
    fn push_ssize_reports_reserved_capacity_not_depth() {
        let mut s = State::init(64, 8);
        s.push_stack(StackId::Data, 1).unwrap();
        push_ssize(&mut s).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 8);
    }
}
