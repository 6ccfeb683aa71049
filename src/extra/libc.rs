//! The `libc` extra-instruction library: argv access and POSIX-flavoured
//! file descriptor I/O, grounded in `original_source/src/extra.c`'s
//! `smite_register_args`/`smite_extra`. File descriptors above the
//! standard three are allocated from a process-wide table (the same
//! "host-only thread-local registry" pattern spec.md §5/§9 sanctions for
//! the `self` library's handle table) since `State` itself owns no
//! operating-system resources.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::fault::Fault;
use crate::stack::StackId;
use crate::state::State;
use crate::word::{UWord, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibcRoutine {
    Argc,
    ArgLen,
    ArgCopy,
    Stdin,
    Stdout,
    Stderr,
    OpenFile,
    CloseFile,
    ReadFile,
    WriteFile,
    FilePosition,
    RepositionFile,
    FlushFile,
    RenameFile,
    DeleteFile,
    FileSize,
    ResizeFile,
    FileStatus,
}

impl TryFrom<Word> for LibcRoutine {
    type Error = Fault;

    fn try_from(v: Word) -> Result<Self, Fault> {
        use LibcRoutine::*;
        Ok(match v {
            0 => Argc,
            1 => ArgLen,
            2 => ArgCopy,
            3 => Stdin,
            4 => Stdout,
            5 => Stderr,
            6 => OpenFile,
            7 => CloseFile,
            8 => ReadFile,
            9 => WriteFile,
            10 => FilePosition,
            11 => RepositionFile,
            12 => FlushFile,
            13 => RenameFile,
            14 => DeleteFile,
            15 => FileSize,
            16 => ResizeFile,
            17 => FileStatus,
            _ => return Err(Fault::InvalidLibrary),
        })
    }
}

const FD_STDIN: i32 = 0;
const FD_STDOUT: i32 = 1;
const FD_STDERR: i32 = 2;

thread_local! {
    static FILES: RefCell<FileTable> = RefCell::new(FileTable::default());
}

#[derive(Default)]
struct FileTable {
    next_fd: i32,
    open: HashMap<i32, File>,
}

impl FileTable {
    fn alloc(&mut self, file: File) -> i32 {
        if self.next_fd < 3 {
            self.next_fd = 3;
        }
        let fd = self.next_fd;
        self.next_fd += 1;
        self.open.insert(fd, file);
        fd
    }
}

/// Resolve a guest byte range to host bytes, mapping out-of-range to the
/// `-5`/`InvalidAddress` "not resolvable" code spec.md §6 reserves for
/// extras that take a guest pointer.
fn guest_bytes<'a>(state: &'a State, addr: UWord, len: UWord) -> Result<&'a [u8], Fault> {
    state.native_address_of_range(addr, len).ok_or(Fault::InvalidAddress)
}

fn guest_bytes_mut<'a>(state: &'a mut State, addr: UWord, len: UWord) -> Result<&'a mut [u8], Fault> {
    state.native_address_of_range_mut(addr, len).ok_or(Fault::InvalidAddress)
}

pub fn dispatch(state: &mut State, routine: LibcRoutine) -> Result<(), Fault> {
    use LibcRoutine::*;
    match routine {
        Argc => state.push_stack(StackId::Data, state.argc() as Word),
        ArgLen => {
            let i = state.pop_stack(StackId::Data)? as UWord;
            state.push_stack(StackId::Data, state.arg_len(i) as Word)
        }
        ArgCopy => {
            let requested_len = state.pop_stack(StackId::Data)? as UWord;
            let buf = state.pop_stack(StackId::Data)? as UWord;
            let i = state.pop_stack(StackId::Data)? as UWord;
            let copied = copy_arg(state, i, buf, requested_len);
            state.push_stack(StackId::Data, copied as Word)
        }
        Stdin => state.push_stack(StackId::Data, FD_STDIN as Word),
        Stdout => state.push_stack(StackId::Data, FD_STDOUT as Word),
        Stderr => state.push_stack(StackId::Data, FD_STDERR as Word),
        OpenFile => {
            let perm = state.pop_stack(StackId::Data)?;
            let path_addr = state.pop_stack(StackId::Data)? as UWord;
            open_file(state, path_addr, perm)
        }
        CloseFile => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let status = FILES.with(|t| t.borrow_mut().open.remove(&fd).is_some());
            state.push_stack(StackId::Data, if status { 0 } else { -1 })
        }
        ReadFile => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let nbytes = state.pop_stack(StackId::Data)? as UWord;
            let buf = state.pop_stack(StackId::Data)? as UWord;
            read_file(state, fd, buf, nbytes)
        }
        WriteFile => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let nbytes = state.pop_stack(StackId::Data)? as UWord;
            let buf = state.pop_stack(StackId::Data)? as UWord;
            write_file(state, fd, buf, nbytes)
        }
        FilePosition => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let pos = with_fd(fd, |f| f.stream_position());
            push_result_pair(state, pos)
        }
        RepositionFile => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let off = state.pop_stack(StackId::Data)? as u64;
            let pos = with_fd(fd, |f| f.seek(SeekFrom::Start(off)));
            push_result_pair(state, pos)
        }
        FlushFile => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let status = with_fd(fd, |f| f.flush());
            state.push_stack(StackId::Data, if status.is_ok() { 0 } else { -1 })
        }
        RenameFile => {
            let old_addr = state.pop_stack(StackId::Data)? as UWord;
            let new_addr = state.pop_stack(StackId::Data)? as UWord;
            let old_path = read_cstr_path(state, old_addr)?;
            let new_path = read_cstr_path(state, new_addr)?;
            let status = std::fs::rename(old_path, new_path).is_ok();
            state.push_stack(StackId::Data, if status { 0 } else { -1 })
        }
        DeleteFile => {
            let addr = state.pop_stack(StackId::Data)? as UWord;
            let path = read_cstr_path(state, addr)?;
            let status = std::fs::remove_file(path).is_ok();
            state.push_stack(StackId::Data, if status { 0 } else { -1 })
        }
        FileSize => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let size = with_fd(fd, |f| f.metadata().map(|m| m.len()));
            push_result_pair(state, size)
        }
        ResizeFile => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let off = state.pop_stack(StackId::Data)? as u64;
            let status = with_fd(fd, |f| f.set_len(off));
            state.push_stack(StackId::Data, if status.is_ok() { 0 } else { -1 })
        }
        FileStatus => {
            let fd = state.pop_stack(StackId::Data)? as i32;
            let ok = with_fd(fd, |f| f.metadata().map(|_| ()));
            state.push_stack(StackId::Data, if ok.is_ok() { 0 } else { -1 })
        }
    }
}

fn copy_arg(state: &mut State, i: UWord, buf: UWord, requested_len: UWord) -> UWord {
    let Some(arg) = state.arg(i) else { return 0 };
    let n = requested_len.min(arg.len() as UWord);
    let src = arg[..n as usize].to_vec();
    let Ok(dest) = guest_bytes_mut(state, buf, n) else { return 0 };
    dest.copy_from_slice(&src);
    n
}

fn open_file(state: &mut State, path_addr: UWord, perm: Word) -> Result<(), Fault> {
    let path = read_cstr_path(state, path_addr)?;
    let mut opts = OpenOptions::new();
    match perm & 0b11 {
        0 => {
            opts.read(true);
        }
        1 => {
            opts.write(true);
        }
        _ => {
            opts.read(true).write(true);
        }
    }
    if perm & 0b100 != 0 {
        opts.create(true).truncate(true);
    }
    match opts.open(&path) {
        Ok(file) => {
            let fd = FILES.with(|t| t.borrow_mut().alloc(file));
            state.push_stack(StackId::Data, fd as Word)?;
            state.push_stack(StackId::Data, 0)
        }
        Err(_) => {
            state.push_stack(StackId::Data, -1)?;
            state.push_stack(StackId::Data, -1)
        }
    }
}

fn read_file(state: &mut State, fd: i32, buf: UWord, nbytes: UWord) -> Result<(), Fault> {
    let mut scratch = vec![0u8; nbytes as usize];
    let read = if fd == FD_STDIN {
        std::io::stdin().read(&mut scratch).ok()
    } else {
        with_fd(fd, |f| f.read(&mut scratch)).ok()
    };
    match read {
        Some(n) => {
            let dest = guest_bytes_mut(state, buf, n as UWord)?;
            dest.copy_from_slice(&scratch[..n]);
            state.push_stack(StackId::Data, n as Word)
        }
        None => state.push_stack(StackId::Data, -1),
    }
}

fn write_file(state: &mut State, fd: i32, buf: UWord, nbytes: UWord) -> Result<(), Fault> {
    let src = guest_bytes(state, buf, nbytes)?.to_vec();
    let written = if fd == FD_STDOUT {
        std::io::stdout().write_all(&src).map(|()| src.len())
    } else if fd == FD_STDERR {
        std::io::stderr().write_all(&src).map(|()| src.len())
    } else {
        with_fd(fd, |f| f.write_all(&src).map(|()| src.len()))
    };
    state.push_stack(StackId::Data, written.map(|n| n as Word).unwrap_or(-1))
}

fn read_cstr_path(state: &State, addr: UWord) -> Result<String, Fault> {
    let max = state.memory_bytes().saturating_sub(addr);
    let region = guest_bytes(state, addr, max)?;
    let end = region.iter().position(|&b| b == 0).unwrap_or(region.len());
    Ok(String::from_utf8_lossy(&region[..end]).into_owned())
}

fn with_fd<T>(fd: i32, f: impl FnOnce(&mut File) -> std::io::Result<T>) -> std::io::Result<T> {
    FILES.with(|t| {
        let mut t = t.borrow_mut();
        let file = t
            .open
            .get_mut(&fd)
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        f(file)
    })
}

fn push_result_pair(state: &mut State, result: std::io::Result<u64>) -> Result<(), Fault> {
    match result {
        Ok(v) => {
            state.push_stack(StackId::Data, v as Word)?;
            state.push_stack(StackId::Data, 0)
        }
        Err(_) => {
            state.push_stack(StackId::Data, -1)?;
            state.push_stack(StackId::Data, -1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argc_and_arg_len_reflect_registered_args() {
        let mut s = State::init(64, 8);
        s.register_args(vec![b"hello".to_vec(), b"world!".to_vec()]);
        dispatch(&mut s, LibcRoutine::Argc).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 2);

        s.push_stack(StackId::Data, 1).unwrap();
        dispatch(&mut s, LibcRoutine::ArgLen).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 6);
    }

    #[test]
    fn arg_len_out_of_range_is_zero_not_a_fault() {
        let mut s = State::init(64, 8);
        s.register_args(vec![b"x".to_vec()]);
        s.push_stack(StackId::Data, 5).unwrap();
        dispatch(&mut s, LibcRoutine::ArgLen).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);
    }

    #[test]
    fn arg_copy_copies_min_of_requested_and_actual_length() {
        let mut s = State::init(64, 8);
        s.register_args(vec![b"hello".to_vec()]);
        s.push_stack(StackId::Data, 0).unwrap();
        s.push_stack(StackId::Data, 0).unwrap();
        s.push_stack(StackId::Data, 100).unwrap();
        dispatch(&mut s, LibcRoutine::ArgCopy).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 5);
        assert_eq!(&s.memory()[0..5], b"hello");
    }

    #[test]
    fn standard_descriptors_are_fixed() {
        let mut s = State::init(16, 4);
        dispatch(&mut s, LibcRoutine::Stdin).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);
        dispatch(&mut s, LibcRoutine::Stdout).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 1);
        dispatch(&mut s, LibcRoutine::Stderr).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 2);
    }

    #[test]
    fn open_write_read_round_trips_through_a_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obj.bin");
        let path_str = path.to_str().unwrap();

        let mut s = State::init(256, 8);
        let path_bytes = path_str.as_bytes();
        for (i, b) in path_bytes.iter().enumerate() {
            s.store_byte(i as UWord, *b).unwrap();
        }
        s.store_byte(path_bytes.len() as UWord, 0).unwrap();

        s.push_stack(StackId::Data, 0).unwrap(); // path addr
        s.push_stack(StackId::Data, 0b101).unwrap(); // write | create+truncate
        dispatch(&mut s, LibcRoutine::OpenFile).unwrap();
        let status = s.pop_stack(StackId::Data).unwrap();
        let fd = s.pop_stack(StackId::Data).unwrap();
        assert_eq!(status, 0);

        let payload_addr = 64u32 as UWord;
        for (i, b) in b"payload".iter().enumerate() {
            s.store_byte(payload_addr + i as UWord, *b).unwrap();
        }
        s.push_stack(StackId::Data, payload_addr as Word).unwrap();
        s.push_stack(StackId::Data, 7).unwrap();
        s.push_stack(StackId::Data, fd).unwrap();
        dispatch(&mut s, LibcRoutine::WriteFile).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 7);

        s.push_stack(StackId::Data, fd).unwrap();
        dispatch(&mut s, LibcRoutine::FlushFile).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);

        s.push_stack(StackId::Data, fd).unwrap();
        dispatch(&mut s, LibcRoutine::CloseFile).unwrap();
        assert_eq!(s.pop_stack(StackId::Data).unwrap(), 0);

        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }
}
