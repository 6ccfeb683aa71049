//! Extra-instruction dispatch: the `EXTRA` trap pops a library selector
//! and a routine selector from the data stack and hands off to one of the
//! two built-in libraries (spec.md §4.5). Selectors flow through the data
//! stack rather than as `EXTRA`'s inline operand, the same way every other
//! parameterised opcode in this crate takes its arguments.

pub mod libc;
pub mod self_lib;

use crate::fault::Fault;
use crate::stack::StackId;
use crate::state::State;
use crate::word::Word;

const LIBRARY_SELF: Word = 0;
const LIBRARY_LIBC: Word = 1;

pub fn dispatch(state: &mut State) -> Result<(), Fault> {
    let routine = state.pop_stack(StackId::Data)?;
    let library = state.pop_stack(StackId::Data)?;
    match library {
        LIBRARY_SELF => self_lib::dispatch(state, self_lib::SelfRoutine::try_from(routine)?),
        LIBRARY_LIBC => libc::dispatch(state, libc::LibcRoutine::try_from(routine)?),
        _ => Err(Fault::InvalidLibrary),
    }
}
