//! The `self` extra-instruction library: reflective control of an inner
//! `State`, addressed through an opaque handle rather than a raw host
//! pointer.
//!
//! Grounded in spec.md §9's Design Notes: "a faithful reimplementation
//! should represent this as an opaque handle table: the extra stores an
//! integer handle on the guest stack, and the host maintains a
//! handle→State map." The table is process-wide (a `thread_local`, per
//! §5's note that a host-only thread-local is acceptable for the
//! extra-instruction registry), not carried inside `State` itself.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::fault::Fault;
use crate::object;
use crate::stack::StackId;
use crate::state::State;
use crate::word::{UWord, Word};

/// Routine selectors within the `self` library, popped from the data
/// stack alongside the library selector itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfRoutine {
    Init,
    Destroy,
    ReallocMemory,
    ReallocStack,
    LoadWord,
    StoreWord,
    LoadByte,
    StoreByte,
    Run,
    SingleStep,
    LoadObject,
}

impl TryFrom<Word> for SelfRoutine {
    type Error = Fault;

    fn try_from(v: Word) -> Result<Self, Fault> {
        use SelfRoutine::*;
        Ok(match v {
            0 => Init,
            1 => Destroy,
            2 => ReallocMemory,
            3 => ReallocStack,
            4 => LoadWord,
            5 => StoreWord,
            6 => LoadByte,
            7 => StoreByte,
            8 => Run,
            9 => SingleStep,
            10 => LoadObject,
            _ => return Err(Fault::InvalidLibrary),
        })
    }
}

#[derive(Default)]
struct HandleTable {
    next: UWord,
    states: HashMap<UWord, State>,
}

thread_local! {
    static HANDLES: RefCell<HandleTable> = RefCell::new(HandleTable::default());
}

fn alloc_handle(inner: State) -> UWord {
    HANDLES.with(|t| {
        let mut t = t.borrow_mut();
        t.next += 1;
        let handle = t.next;
        t.states.insert(handle, inner);
        handle
    })
}

/// Dispatch one `self`-library call. `host` is the guest's own `State`
/// (whose data stack carries the routine's arguments and return values);
/// `routine` selects the operation.
pub fn dispatch(host: &mut State, routine: SelfRoutine) -> Result<(), Fault> {
    use SelfRoutine::*;
    match routine {
        Init => {
            let stack_words = host.pop_stack(StackId::Data)? as UWord;
            let memory_bytes = host.pop_stack(StackId::Data)? as UWord;
            let handle = alloc_handle(State::init(memory_bytes, stack_words));
            host.push_stack(StackId::Data, handle as Word)
        }
        Destroy => {
            let handle = host.pop_stack(StackId::Data)? as UWord;
            HANDLES.with(|t| t.borrow_mut().states.remove(&handle));
            Ok(())
        }
        ReallocMemory => {
            let new_bytes = host.pop_stack(StackId::Data)? as UWord;
            let handle = host.pop_stack(StackId::Data)? as UWord;
            with_handle(handle, |inner| inner.realloc_memory(new_bytes).map_err(|()| Fault::InvalidMemoryWrite))?;
            Ok(())
        }
        ReallocStack => {
            let new_words = host.pop_stack(StackId::Data)? as UWord;
            let handle = host.pop_stack(StackId::Data)? as UWord;
            with_handle(handle, |inner| inner.realloc_stack(new_words).map_err(|()| Fault::StackOverflow))?;
            Ok(())
        }
        LoadWord => {
            let addr = host.pop_stack(StackId::Data)? as UWord;
            let handle = host.pop_stack(StackId::Data)? as UWord;
            let v = with_handle(handle, |inner| inner.load_word(addr))?;
            host.push_stack(StackId::Data, v)
        }
        StoreWord => {
            let v = host.pop_stack(StackId::Data)?;
            let addr = host.pop_stack(StackId::Data)? as UWord;
            let handle = host.pop_stack(StackId::Data)? as UWord;
            with_handle(handle, |inner| inner.store_word(addr, v))
        }
        LoadByte => {
            let addr = host.pop_stack(StackId::Data)? as UWord;
            let handle = host.pop_stack(StackId::Data)? as UWord;
            let v = with_handle(handle, |inner| inner.load_byte(addr))?;
            host.push_stack(StackId::Data, v as Word)
        }
        StoreByte => {
            let v = host.pop_stack(StackId::Data)?;
            let addr = host.pop_stack(StackId::Data)? as UWord;
            let handle = host.pop_stack(StackId::Data)? as UWord;
            with_handle(handle, |inner| inner.store_byte(addr, v as u8))
        }
        Run => {
            let handle = host.pop_stack(StackId::Data)? as UWord;
            let status = with_handle(handle, |inner| Ok(crate::interpreter::run(inner).code()))?;
            host.push_stack(StackId::Data, status as Word)
        }
        SingleStep => {
            let handle = host.pop_stack(StackId::Data)? as UWord;
            let status = with_handle(handle, |inner| Ok(crate::interpreter::single_step(inner).code()))?;
            host.push_stack(StackId::Data, status as Word)
        }
        LoadObject => {
            // Source bytes come from the *host's* memory (the region from
            // `src_addr` to the end of its buffer), not a path — there is
            // no filesystem in scope for a guest manipulating an inner
            // State reflectively.
            let dest_addr = host.pop_stack(StackId::Data)? as UWord;
            let src_addr = host.pop_stack(StackId::Data)? as UWord;
            let handle = host.pop_stack(StackId::Data)? as UWord;
            let src_len = host.memory_bytes().saturating_sub(src_addr);
            let bytes = host.native_address_of_range(src_addr, src_len).ok_or(Fault::InvalidAddress)?.to_vec();
            let loaded = with_handle(handle, |inner| {
                object::load_object(inner, dest_addr, &mut std::io::Cursor::new(bytes)).map_err(|_| Fault::InvalidAddress)
            })?;
            host.push_stack(StackId::Data, loaded as Word)
        }
    }
}

fn with_handle<T>(handle: UWord, f: impl FnOnce(&mut State) -> Result<T, Fault>) -> Result<T, Fault> {
    HANDLES.with(|t| {
        let mut t = t.borrow_mut();
        let inner = t.states.get_mut(&handle).ok_or(Fault::InvalidLibrary)?;
        f(inner)
    })
}
