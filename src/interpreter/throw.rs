//! `THROW`: pop a code and raise it exactly as if the VM itself had
//! raised a fault of that code (spec.md §4.3). Unlike every other fault
//! in this crate, the code isn't restricted to the closed `Fault`
//! taxonomy — a guest can `THROW` an arbitrary value and, with a handler
//! installed, see that exact value pushed back as `TOS`; `HALT`'s own
//! terminal code (128) is a valid argument too, handled the same way the
//! `HALT` opcode itself is.

use crate::consts::HALT;
use crate::fault::Fault;
use crate::stack::StackId;
use crate::state::State;

/// What a `THROW` resolves to once its code operand has been popped.
pub enum Thrown {
    Halt,
    /// The raw, un-validated code the guest threw.
    Code(i32),
}

pub fn throw(state: &mut State) -> Result<Thrown, Fault> {
    let code = state.pop_stack(StackId::Data)? as i32;
    if code == HALT {
        Ok(Thrown::Halt)
    } else {
        Ok(Thrown::Code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throw_of_halt_code_halts() {
        let mut s = State::init(64, 8);
        s.push_stack(StackId::Data, HALT as crate::word::Word).unwrap();
        assert!(matches!(throw(&mut s), Ok(Thrown::Halt)));
    }

    #[test]
    fn throw_of_arbitrary_code_round_trips_unvalidated() {
        let mut s = State::init(64, 8);
        s.push_stack(StackId::Data, -9).unwrap();
        assert!(matches!(throw(&mut s), Ok(Thrown::Code(-9))));
    }
}
