//! A byte-addressed stack virtual machine core.
//!
//! The crate is organised the way the architecture itself is layered:
//! word-width primitives ([`word`]), owned state and storage
//! ([`state`]), bounds-checked memory and stack access ([`memory`],
//! [`stack`]), the instruction codec ([`codec`]), the fetch-decode-execute
//! cycle ([`interpreter`]), the extra-instruction libraries ([`extra`]),
//! host-side growth policy ([`extend`]), and the object file format
//! ([`object`]).
//!
//! No component here drives a process: there is no CLI, no plugin
//! loader, and no disassembler. A driver embeds this crate, calls
//! [`state::State::init`], optionally [`object::load_object`], then
//! [`interpreter::run`] or [`interpreter::single_step`] in a loop,
//! recovering from growable faults via [`extend::recommend_growth`].

pub mod codec;
pub mod consts;
pub mod extend;
pub mod extra;
pub mod fault;
pub mod interpreter;
pub mod memory;
pub mod object;
pub mod opcode;
pub mod stack;
pub mod state;
pub mod word;

pub use fault::{Fault, StepOutcome};
pub use opcode::Opcode;
pub use stack::StackId;
pub use state::State;
pub use word::{UWord, Word};
