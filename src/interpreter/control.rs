//! Control-flow opcodes: `BRANCH`, `BRANCHZ`, `CALL`, `RET`.
//!
//! Branch/call targets flow through the data stack, the same way every
//! other operand-bearing opcode in this crate takes its argument (`POP(n)`,
//! `STORE_HANDLER`, ...), rather than as an inline encoded operand —
//! consistent with spec.md's instruction stream carrying only actions and
//! number literals, never a third "action with inline address" form.
//! `CALL` pushes the return address (the already-advanced `PC`, i.e. the
//! address of the instruction following `CALL`) onto the return stack.

use crate::fault::Fault;
use crate::stack::StackId;
use crate::state::State;
use crate::word::{UWord, Word};

pub fn branch(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Data)? as UWord;
    state.set_pc(addr);
    state.i = 0;
    Ok(())
}

pub fn branchz(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Data)? as UWord;
    let cond = state.pop_stack(StackId::Data)?;
    if cond == 0 {
        state.set_pc(addr);
        state.i = 0;
    }
    Ok(())
}

pub fn call(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Data)? as UWord;
    state.push_stack(StackId::Return, state.pc() as Word)?;
    state.set_pc(addr);
    state.i = 0;
    Ok(())
}

pub fn ret(state: &mut State) -> Result<(), Fault> {
    let addr = state.pop_stack(StackId::Return)? as UWord;
    state.set_pc(addr);
    state.i = 0;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm() -> State {
        State::init(64, 8)
    }

    #[test]
    fn branch_sets_pc_unconditionally() {
        let mut s = vm();
        s.push_stack(StackId::Data, 0x20).unwrap();
        branch(&mut s).unwrap();
        assert_eq!(s.pc(), 0x20);
    }

    #[test]
    fn branchz_takes_branch_only_when_zero() {
        let mut s = vm();
        s.set_pc(4);
        s.push_stack(StackId::Data, 1).unwrap();
        s.push_stack(StackId::Data, 0x20).unwrap();
        branchz(&mut s).unwrap();
        assert_eq!(s.pc(), 4);

        s.push_stack(StackId::Data, 0).unwrap();
        s.push_stack(StackId::Data, 0x30).unwrap();
        branchz(&mut s).unwrap();
        assert_eq!(s.pc(), 0x30);
    }

    #[test]
    fn call_then_ret_round_trips_pc() {
        let mut s = vm();
        s.set_pc(8);
        s.push_stack(StackId::Data, 0x40).unwrap();
        call(&mut s).unwrap();
        assert_eq!(s.pc(), 0x40);
        ret(&mut s).unwrap();
        assert_eq!(s.pc(), 8);
    }
}
