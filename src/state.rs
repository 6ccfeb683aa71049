//! [`State`]: the VM's owned memory, stacks and architectural registers.
//!
//! Grounded in the teacher's `interpreter.rs` (the struct holding owned
//! buffers plus read-only accessors) and in `original_source/src/storage.c`
//! (`smite_init`/`smite_realloc_memory`/`smite_realloc_stack`/`smite_destroy`),
//! which this module's `init`/`realloc_memory`/`realloc_stack` mirror.

use crate::consts::DEFAULT_PAGE_SIZE;
use crate::word::{align, is_aligned, UWord, Word, ENDISM, WORD_SIZE};

/// Owned VM state: a linear byte memory, a data stack, a return stack, and
/// the architectural registers of spec.md §3.
///
/// The stacks live in their own address space: `S0`/`R0` are fixed at `0`
/// (this crate never relocates a stack's logical base, only its backing
/// capacity), so `SP`/`RP` are simply the current stack depths in words.
#[derive(Debug, Clone)]
pub struct State {
    memory: Vec<u8>,
    dstack: Vec<Word>,
    rstack: Vec<Word>,
    dstack_words: UWord,
    rstack_words: UWord,

    pub(crate) pc: UWord,
    pub(crate) i: UWord,
    pub(crate) itype: InstructionType,
    pub(crate) handler: UWord,
    pub(crate) badpc: UWord,
    pub(crate) invalid: UWord,
    pub(crate) bad: Word,

    argc: UWord,
    argv: Vec<Vec<u8>>,
    argv_len: Vec<UWord>,
}

/// The kind of the last-decoded instruction (`ITYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionType {
    Action,
    Number,
}

impl State {
    /// `Init(memory_bytes, stack_words)`: allocate a zero-filled memory of
    /// `memory_bytes` (rounded up to a word boundary) and two zero-filled
    /// stacks of `stack_words` words each.
    pub fn init(memory_bytes: UWord, stack_words: UWord) -> State {
        let memory_bytes = align(memory_bytes);
        let mut state = State {
            memory: Vec::new(),
            dstack: Vec::new(),
            rstack: Vec::new(),
            dstack_words: 0,
            rstack_words: 0,
            pc: 0,
            i: 0,
            itype: InstructionType::Action,
            handler: 0,
            badpc: 0,
            invalid: 0,
            bad: 0,
            argc: 0,
            argv: Vec::new(),
            argv_len: Vec::new(),
        };
        state.memory.resize(memory_bytes as usize, 0);
        state.dstack.reserve_exact(stack_words as usize);
        state.rstack.reserve_exact(stack_words as usize);
        state.dstack_words = stack_words;
        state.rstack_words = stack_words;
        tracing::debug!(memory_bytes, stack_words, "vm initialised");
        state
    }

    /// Grow (never shrink) the backing memory to `memory_bytes`, rounded up
    /// to a word boundary; new bytes are zero-filled. Returns an error iff
    /// the allocator refuses (modelled here as refusing to shrink).
    pub fn realloc_memory(&mut self, memory_bytes: UWord) -> Result<(), ()> {
        let memory_bytes = align(memory_bytes);
        if (memory_bytes as usize) < self.memory.len() {
            return Err(());
        }
        self.memory.resize(memory_bytes as usize, 0);
        tracing::debug!(memory_bytes, "memory grown");
        Ok(())
    }

    /// Grow (never shrink) both stacks' capacity to `stack_words` words.
    pub fn realloc_stack(&mut self, stack_words: UWord) -> Result<(), ()> {
        if stack_words < self.dstack_words || stack_words < self.rstack_words {
            return Err(());
        }
        self.dstack.reserve_exact(stack_words.saturating_sub(self.dstack_words) as usize);
        self.rstack.reserve_exact(stack_words.saturating_sub(self.rstack_words) as usize);
        self.dstack_words = stack_words;
        self.rstack_words = stack_words;
        tracing::debug!(stack_words, "stacks grown");
        Ok(())
    }

    /// `RegisterArgs`: record `argv` for the `ARGC`/`ARG_LEN`/`ARG_COPY`
    /// extras, precomputing each argument's byte length once.
    pub fn register_args(&mut self, argv: Vec<Vec<u8>>) {
        self.argv_len = argv.iter().map(|a| a.len() as UWord).collect();
        self.argc = argv.len() as UWord;
        self.argv = argv;
    }

    pub fn argc(&self) -> UWord {
        self.argc
    }

    pub fn arg(&self, i: UWord) -> Option<&[u8]> {
        self.argv.get(i as usize).map(Vec::as_slice)
    }

    pub fn arg_len(&self, i: UWord) -> UWord {
        self.argv_len.get(i as usize).copied().unwrap_or(0)
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    pub fn memory_bytes(&self) -> UWord {
        self.memory.len() as UWord
    }

    pub(crate) fn dstack_slice(&self) -> &[Word] {
        &self.dstack
    }

    pub(crate) fn rstack_slice(&self) -> &[Word] {
        &self.rstack
    }

    pub(crate) fn dstack_mut(&mut self) -> &mut Vec<Word> {
        &mut self.dstack
    }

    pub(crate) fn rstack_mut(&mut self) -> &mut Vec<Word> {
        &mut self.rstack
    }

    /* Register accessors: spec.md §3. */

    pub const fn pc(&self) -> UWord {
        self.pc
    }
    pub fn set_pc(&mut self, pc: UWord) {
        self.pc = pc;
    }
    pub const fn i(&self) -> UWord {
        self.i
    }
    pub const fn itype(&self) -> InstructionType {
        self.itype
    }
    pub const fn handler(&self) -> UWord {
        self.handler
    }
    pub fn set_handler(&mut self, handler: UWord) {
        self.handler = handler;
    }
    pub const fn badpc(&self) -> UWord {
        self.badpc
    }
    pub const fn invalid(&self) -> UWord {
        self.invalid
    }
    pub const fn bad(&self) -> Word {
        self.bad
    }
    pub const fn endism(&self) -> u8 {
        ENDISM
    }
    pub const fn s0(&self) -> UWord {
        0
    }
    pub const fn r0(&self) -> UWord {
        0
    }
    pub fn sp(&self) -> UWord {
        self.dstack.len() as UWord
    }
    pub fn rp(&self) -> UWord {
        self.rstack.len() as UWord
    }
    pub const fn ssize(&self) -> UWord {
        self.dstack_words
    }
    pub const fn rsize(&self) -> UWord {
        self.rstack_words
    }
    pub const fn psize() -> UWord {
        // A handle into the host's inner-State table is a single word.
        1
    }
}

/// `round_up(n, page_size)`, used by the host's auto-extend policy (§4.4)
/// and by `init`'s word-alignment of `memory_bytes`.
pub const fn round_up_to_page(n: UWord, page_size: UWord) -> UWord {
    let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
    let rem = n % page_size;
    if rem == 0 {
        n
    } else {
        n - rem + page_size
    }
}

const _: () = assert!(WORD_SIZE > 0);
