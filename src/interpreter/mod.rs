//! The fetch-decode-execute cycle: `SingleStep`/`Run` (spec.md §4.2).
//!
//! Grounded in the teacher's `executors/instruction.rs` (`execute` as one
//! big `match` over a decoded instruction, each arm a short call into a
//! per-family module) and, for the fetch step itself, in spec.md §9's
//! note that the `I`/packed-opcode register is just one valid way to
//! model "decode bytes starting at `PC`, advance `PC` past them" — this
//! crate lets [`crate::codec::decode_instruction`] do that directly
//! against memory rather than maintaining a separate sliding window, and
//! uses `I`/`ITYPE` purely for introspection (`PUSH_PC` et al.), which
//! Design Notes §9 says must be behaviourally indistinguishable either way.

mod alu;
mod control;
mod memory_ops;
mod registers_ops;
mod stack_ops;
mod throw;

use crate::codec::{decode_instruction, Decoded};
use crate::extra;
use crate::fault::{Fault, StepOutcome};
use crate::opcode::Opcode;
use crate::stack::StackId;
use crate::state::{InstructionType, State};
use crate::word::{UWord, Word};

/// `SingleStep(S)`: fetch, decode and execute exactly one instruction.
pub fn single_step(state: &mut State) -> StepOutcome {
    let fault_pc = state.pc();

    match decode_instruction(state, fault_pc) {
        Ok((Decoded::Number(v), new_pc)) => {
            tracing::trace!(pc = fault_pc, v, "decoded number literal");
            state.itype = InstructionType::Number;
            state.set_pc(new_pc);
            state.i = 0;
            match state.push_stack(StackId::Data, v) {
                Ok(()) => StepOutcome::Continue,
                Err(f) => raise(state, fault_pc, f),
            }
        }
        Ok((Decoded::Action(byte), new_pc)) => {
            tracing::trace!(pc = fault_pc, opcode = byte, "decoded action");
            state.itype = InstructionType::Action;
            state.set_pc(new_pc);
            state.i = byte as UWord;
            match Opcode::try_from(byte) {
                Ok(opcode) => dispatch(state, opcode, fault_pc),
                Err(f) => raise(state, fault_pc, f),
            }
        }
        Err(f) => raise(state, fault_pc, f),
    }
}

/// `Run(S)`: repeatedly invoke `SingleStep` until a non-`Continue` status.
pub fn run(state: &mut State) -> StepOutcome {
    loop {
        match single_step(state) {
            StepOutcome::Continue => continue,
            other => return other,
        }
    }
}

fn dispatch(state: &mut State, opcode: Opcode, fault_pc: UWord) -> StepOutcome {
    use Opcode::*;

    if opcode == Halt {
        return StepOutcome::Halt;
    }
    if opcode == Throw {
        return match throw::throw(state) {
            Err(f) => raise(state, fault_pc, f),
            Ok(throw::Thrown::Halt) => StepOutcome::Halt,
            Ok(throw::Thrown::Code(code)) => raise_code(state, fault_pc, code, Fault::from_code(code)),
        };
    }

    let result = match opcode {
        Pop => stack_ops::pop(state),
        Push => stack_ops::push(state),
        Swap => stack_ops::swap(state),
        RPush => stack_ops::rpush(state),
        Pop2R => stack_ops::pop2r(state),
        RPop => stack_ops::rpop(state),
        Lt => alu::lt(state),
        Eq => alu::eq(state),
        ULt => alu::ult(state),
        Add => alu::add(state),
        Mul => alu::mul(state),
        UDivMod => alu::udivmod(state),
        DivMod => alu::divmod(state),
        Negate => alu::negate(state),
        Invert => alu::invert(state),
        And => alu::and(state),
        Or => alu::or(state),
        Xor => alu::xor(state),
        LShift => alu::lshift(state),
        RShift => alu::rshift(state),
        Load => memory_ops::load(state),
        Store => memory_ops::store(state),
        LoadB => memory_ops::loadb(state),
        StoreB => memory_ops::storeb(state),
        Branch => control::branch(state),
        BranchZ => control::branchz(state),
        Call => control::call(state),
        Ret => control::ret(state),
        CallNative => call_native(state),
        Extra => extra::dispatch(state),
        PushPSize => registers_ops::push_psize(state),
        PushSp => registers_ops::push_sp(state),
        StoreSp => registers_ops::store_sp(state),
        PushRp => registers_ops::push_rp(state),
        StoreRp => registers_ops::store_rp(state),
        PushPc => registers_ops::push_pc(state),
        PushS0 => registers_ops::push_s0(state),
        PushSSize => registers_ops::push_ssize(state),
        PushR0 => registers_ops::push_r0(state),
        PushRSize => registers_ops::push_rsize(state),
        PushHandler => registers_ops::push_handler(state),
        StoreHandler => registers_ops::store_handler(state),
        PushMemory => registers_ops::push_memory(state),
        PushBadPc => registers_ops::push_badpc(state),
        PushInvalid => registers_ops::push_invalid(state),
        Throw | Halt => unreachable!("handled above"),
    };

    match result {
        Ok(()) => StepOutcome::Continue,
        Err(f) => raise(state, fault_pc, f),
    }
}

#[cfg(feature = "unsafe-native")]
fn call_native(state: &mut State) -> Result<(), Fault> {
    // The guest pushes a word-sized function pointer; the host is trusted
    // to have put a valid `extern "C" fn(&mut State)` there. This is a
    // side channel for embedders linking native helpers into the image,
    // never exercised by portable object files.
    let ptr = state.pop_stack(StackId::Data)? as usize;
    if ptr == 0 {
        return Err(Fault::InvalidOpcode);
    }
    let f: extern "C" fn(&mut State) = unsafe { std::mem::transmute(ptr) };
    f(state);
    Ok(())
}

#[cfg(not(feature = "unsafe-native"))]
fn call_native(_state: &mut State) -> Result<(), Fault> {
    Err(Fault::InvalidOpcode)
}

/// Classify a known VM-raised fault: push its numeric code through the
/// in-guest trap handler if one is installed, else hand it to the caller
/// of `Run`/`SingleStep` (spec.md §4.3).
fn raise(state: &mut State, fault_pc: UWord, fault: Fault) -> StepOutcome {
    raise_code(state, fault_pc, fault.code(), Some(fault))
}

/// Shared trap-entry mechanics for both VM-raised faults and `THROW`.
/// `known` is `Some` when `code` corresponds to a named [`Fault`]; this is
/// what lets `raise_code` surface `StepOutcome::Fault` instead of the
/// generic `StepOutcome::Thrown` for every fault this crate itself raises,
/// while still letting an arbitrary `THROW`n code escape to the host when
/// no handler claims it.
fn raise_code(state: &mut State, fault_pc: UWord, code: i32, known: Option<Fault>) -> StepOutcome {
    state.badpc = fault_pc;
    if state.handler() != 0 {
        tracing::debug!(code, handler = state.handler(), "entering in-guest trap handler");
        let _ = state.push_stack(StackId::Data, code as Word);
        let handler = state.handler();
        state.set_pc(handler);
        state.i = 0;
        StepOutcome::Continue
    } else {
        tracing::trace!(code, pc = fault_pc, "fault escaped to host");
        match known {
            Some(f) => StepOutcome::Fault(f),
            None => StepOutcome::Thrown(code),
        }
    }
}
