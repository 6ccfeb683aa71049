//! `LOAD`, `STORE`, `LOADB`, `STOREB`: guest-visible memory access, backed
//! by the bounds/alignment checks in `crate::memory`. `BAD` is set to the
//! offending address before the fallible access so the fault-raising path
//! in `interpreter::mod` can surface it on the in-guest trap or to the
//! host, per spec.md §4.3's "BAD ← offending address" note.

use crate::fault::Fault;
use crate::stack::StackId;
use crate::state::State;
use crate::word::{UWord, Word};

pub fn load(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Data)? as UWord;
    state.bad = addr as Word;
    let v = state.load_word(addr)?;
    state.push_stack(StackId::Data, v)
}

pub fn store(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Data)? as UWord;
    let v = state.pop_stack(StackId::Data)?;
    state.bad = addr as Word;
    state.store_word(addr, v)
}

pub fn loadb(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Data)? as UWord;
    state.bad = addr as Word;
    let v = state.load_byte(addr)?;
    state.push_stack(StackId::Data, v as Word)
}

pub fn storeb(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Data)? as UWord;
    let v = state.pop_stack(StackId::Data)?;
    state.bad = addr as Word;
    state.store_byte(addr, v as u8)
}
