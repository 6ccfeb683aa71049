//! Black-box integration suite: the concrete seed scenarios of spec.md §8
//! plus the universally-quantified invariants and arithmetic laws it
//! asks for, driven purely through the public host API (`State`, the
//! instruction codec, and `interpreter::{run, single_step}`) rather than
//! any crate-internal helper.

use stackm::codec::{decode_instruction, encode_instruction, Decoded};
use stackm::extend::{recommend_growth, Recommendation};
use stackm::fault::{Fault, StepOutcome};
use stackm::interpreter::{run, single_step};
use stackm::object::{load_object, save_object};
use stackm::opcode::Opcode;
use stackm::stack::StackId;
use stackm::state::{InstructionType, State};
use stackm::word::{UWord, Word, WORD_BIT, WORD_SIZE};

enum Instr {
    Number(Word),
    Action(Opcode),
}
use Instr::{Action, Number};

fn assemble(state: &mut State, pc: UWord, program: &[Instr]) -> UWord {
    let mut addr = pc;
    for instr in program {
        addr += match instr {
            Instr::Number(v) => encode_instruction(state, addr, InstructionType::Number, *v).unwrap(),
            Instr::Action(op) => encode_instruction(state, addr, InstructionType::Action, *op as Word).unwrap(),
        };
    }
    addr
}

/// Drive `single_step` until `state.pc()` reaches `end`, asserting every
/// intermediate step is `Continue`. Used for tests that only care about an
/// opcode's effect on the stacks, not about decoding from memory.
fn run_to(state: &mut State, end: UWord) {
    while state.pc() < end {
        assert_eq!(single_step(state), StepOutcome::Continue);
    }
}

/// Pop every element currently on a stack, bottom to top, leaving it empty.
fn drain(state: &mut State, which: StackId) -> Vec<Word> {
    let mut out = Vec::new();
    while let Ok(v) = state.pop_stack(which) {
        out.push(v);
    }
    out.reverse();
    out
}

#[test]
fn scenario_1_arithmetic() {
    let mut s = State::init(4096, 64);
    let end = assemble(
        &mut s,
        0,
        &[
            Number(0),
            Number(1),
            Number(4),
            Number(-4),
            Number(-1),
            Action(Opcode::Add),
            Action(Opcode::Add),
            Action(Opcode::Negate),
            Action(Opcode::Add),
        ],
    );
    run_to(&mut s, end);
    assert_eq!(drain(&mut s, StackId::Data), vec![0]);
}

#[test]
fn scenario_2_push_duplicates_tos() {
    let mut s = State::init(4096, 64);
    for v in [1, 2, 3] {
        s.push_stack(StackId::Data, v).unwrap();
    }
    let end = assemble(&mut s, 0, &[Number(0), Action(Opcode::Push)]);
    run_to(&mut s, end);
    assert_eq!(drain(&mut s, StackId::Data), vec![1, 2, 3, 3]);
}

#[test]
fn scenario_3_division_by_zero_with_no_handler() {
    let mut s = State::init(4096, 64);
    assemble(&mut s, 0, &[Number(1), Number(0), Action(Opcode::DivMod)]);
    assert_eq!(single_step(&mut s), StepOutcome::Continue);
    assert_eq!(single_step(&mut s), StepOutcome::Continue);
    assert_eq!(single_step(&mut s), StepOutcome::Fault(Fault::DivisionByZero));
}

#[test]
fn scenario_4_throw_path_enters_handler() {
    let mut s = State::init(4096, 64);
    s.set_handler(0x80);
    let throw_pc = assemble(&mut s, 0, &[Number(-9)]);
    assemble(&mut s, throw_pc, &[Action(Opcode::Throw)]);
    assert_eq!(single_step(&mut s), StepOutcome::Continue); // push -9
    assert_eq!(single_step(&mut s), StepOutcome::Continue); // THROW traps in
    assert_eq!(s.pc(), 0x80);
    assert_eq!(drain(&mut s, StackId::Data), vec![-9]);
    assert_eq!(s.badpc(), throw_pc);
}

#[test]
fn scenario_5_object_round_trip_relocates() {
    let mut source = State::init(16, 4);
    for (i, b) in (1u8..=16).enumerate() {
        source.store_byte(i as UWord, b).unwrap();
    }
    let mut buf = Vec::new();
    save_object(&source, 0, 16, &mut buf).unwrap();

    let mut fresh = State::init(16, 4);
    let loaded = load_object(&mut fresh, 0, &mut std::io::Cursor::new(buf)).unwrap();
    assert_eq!(loaded, 16);
    assert_eq!(&fresh.memory()[0..16], &source.memory()[0..16]);
}

#[test]
fn scenario_6_auto_extend_stack_then_resume() {
    // Installs a real subscriber so the `tracing::warn!` emitted by
    // `recommend_growth` below goes somewhere instead of being dropped by
    // the default no-op subscriber; harmless if another test already set one.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut s = State::init(4096, 64);
    for i in 0..64 {
        s.push_stack(StackId::Data, i).unwrap();
    }
    assert_eq!(s.push_stack(StackId::Data, 64), Err(Fault::StackOverflow));

    let bad: Word = 64;
    let rec = recommend_growth(Fault::StackOverflow, bad, s.ssize(), s.memory_bytes(), 4096);
    assert_eq!(rec, Some(Recommendation::GrowStack { words: 4096 }));
    if let Some(Recommendation::GrowStack { words }) = rec {
        s.realloc_stack(words).unwrap();
    }
    assert!(s.push_stack(StackId::Data, 64).is_ok());
}

#[test]
fn invariant_stack_depth_never_exceeds_reserved_capacity() {
    let mut s = State::init(64, 4);
    for i in 0..4 {
        assert!(s.push_stack(StackId::Data, i).is_ok());
    }
    assert_eq!(s.push_stack(StackId::Data, 99), Err(Fault::StackOverflow));
    assert!(s.sp() <= s.ssize());
}

#[test]
fn invariant_word_store_load_round_trips_for_every_aligned_address() {
    let mut s = State::init(64, 4);
    for addr in (0..64).step_by(WORD_SIZE) {
        s.store_word(addr as UWord, addr as Word * 7).unwrap();
    }
    for addr in (0..64).step_by(WORD_SIZE) {
        assert_eq!(s.load_word(addr as UWord).unwrap(), addr as Word * 7);
    }
}

#[test]
fn invariant_byte_store_load_round_trips() {
    let mut s = State::init(32, 4);
    for addr in 0..32u32 {
        s.store_byte(addr as UWord, addr as u8).unwrap();
    }
    for addr in 0..32u32 {
        assert_eq!(s.load_byte(addr as UWord).unwrap(), addr as u8);
    }
}

#[test]
fn invariant_encode_decode_round_trips_every_sampled_number() {
    let mut s = State::init(256, 4);
    let mut addr = 0;
    let samples = [0, 1, -1, 4, -4, 31, 32, 63, -63, -64, 1000, -1000, Word::MAX, Word::MIN];
    for v in samples {
        let written = encode_instruction(&mut s, addr, InstructionType::Number, v).unwrap();
        let (decoded, end) = decode_instruction(&s, addr).unwrap();
        assert_eq!(decoded, Decoded::Number(v));
        assert_eq!(end, addr + written);
        addr = end;
    }
}

#[test]
fn arithmetic_law_add_is_commutative_and_associative_modulo_width() {
    let mut s = State::init(64, 8);
    let (a, b, c) = (17i64 as Word, -42i64 as Word, Word::MAX);

    s.push_stack(StackId::Data, a).unwrap();
    s.push_stack(StackId::Data, b).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::Add)]);
    run_to(&mut s, end);
    let ab = s.pop_stack(StackId::Data).unwrap();

    s.push_stack(StackId::Data, b).unwrap();
    s.push_stack(StackId::Data, a).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::Add)]);
    run_to(&mut s, end);
    let ba = s.pop_stack(StackId::Data).unwrap();
    assert_eq!(ab, ba);

    s.push_stack(StackId::Data, ab).unwrap();
    s.push_stack(StackId::Data, c).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::Add)]);
    run_to(&mut s, end);
    let ab_c = s.pop_stack(StackId::Data).unwrap();

    s.push_stack(StackId::Data, b).unwrap();
    s.push_stack(StackId::Data, c).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::Add)]);
    run_to(&mut s, end);
    let bc = s.pop_stack(StackId::Data).unwrap();
    s.push_stack(StackId::Data, a).unwrap();
    s.push_stack(StackId::Data, bc).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::Add)]);
    run_to(&mut s, end);
    let a_bc = s.pop_stack(StackId::Data).unwrap();

    assert_eq!(ab_c, a_bc);
}

#[test]
fn arithmetic_law_divmod_identity_holds_for_signed_and_unsigned() {
    let mut s = State::init(64, 8);
    for (a, b) in [(17i64, 5i64), (-17, 5), (17, -5), (-17, -5)] {
        s.push_stack(StackId::Data, a as Word).unwrap();
        s.push_stack(StackId::Data, b as Word).unwrap();
        let end = assemble(&mut s, s.pc(), &[Action(Opcode::DivMod)]);
        run_to(&mut s, end);
        let expected_q = (a as Word).wrapping_div(b as Word);
        let expected_r = (a as Word).wrapping_rem(b as Word);
        // Quotient sits below the remainder: DivMod leaves remainder on top.
        assert_eq!(drain(&mut s, StackId::Data), vec![expected_q, expected_r]);
        assert_eq!(expected_q * (b as Word) + expected_r, a as Word);
    }

    s.push_stack(StackId::Data, 17).unwrap();
    s.push_stack(StackId::Data, 5).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::UDivMod)]);
    run_to(&mut s, end);
    assert_eq!(drain(&mut s, StackId::Data), vec![3, 2]);
}

#[test]
fn boundary_shift_at_word_width_is_zero() {
    let mut s = State::init(64, 8);
    s.push_stack(StackId::Data, -1).unwrap();
    s.push_stack(StackId::Data, WORD_BIT as Word).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::LShift)]);
    run_to(&mut s, end);
    assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);

    s.push_stack(StackId::Data, -1).unwrap();
    s.push_stack(StackId::Data, WORD_BIT as Word).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::RShift)]);
    run_to(&mut s, end);
    assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);
}

#[test]
fn boundary_negate_of_word_min_is_word_min() {
    let mut s = State::init(64, 8);
    s.push_stack(StackId::Data, Word::MIN).unwrap();
    let end = assemble(&mut s, s.pc(), &[Action(Opcode::Negate)]);
    run_to(&mut s, end);
    assert_eq!(s.pop_stack(StackId::Data).unwrap(), Word::MIN);
}

#[test]
fn run_drives_a_whole_program_to_halt() {
    let mut s = State::init(4096, 64);
    assemble(&mut s, 0, &[Number(7), Action(Opcode::Halt)]);
    assert_eq!(run(&mut s), StepOutcome::Halt);
}
