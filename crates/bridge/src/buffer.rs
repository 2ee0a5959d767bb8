//! Raw buffer property access
//!
//! Some host structures carry a raw `(pointer, length)` byte buffer that
//! scripts read and write as a byte string (an ENet-style packet buffer,
//! for example). [`BufferBinding`] associates such a structure with a pair
//! of projection functions and the policies governing resizing, allocation,
//! and oversized writes. Policies are fixed when the binding is built,
//! never chosen per call.
//!
//! # Example
//!
//! ```rust
//! use script_bridge::{AllocStrategy, BufferBinding, OverflowPolicy, ResizePolicy};
//!
//! struct Frame {
//!     data: *mut u8,
//!     len: usize,
//! }
//!
//! fn get(f: &Frame) -> (*mut u8, usize) { (f.data, f.len) }
//! fn set(f: &mut Frame, p: *mut u8, l: usize) { f.data = p; f.len = l; }
//!
//! const FRAME_DATA: BufferBinding<Frame> = BufferBinding::new(
//!     get,
//!     set,
//!     ResizePolicy::Resizable,
//!     AllocStrategy::Realloc,
//!     OverflowPolicy::Truncate,
//! );
//!
//! let mut frame = Frame { data: std::ptr::null_mut(), len: 0 };
//! FRAME_DATA.set_buffer(&mut frame, b"payload").unwrap();
//! assert_eq!(&FRAME_DATA.get_buffer(&frame)[..], b"payload");
//! FRAME_DATA.set_length(&mut frame, 0);
//! ```

use crate::error::{BridgeError, Result};
use bytes::Bytes;
use std::alloc::{self, Layout};
use std::ptr;
use std::slice;

/// Whether `set_buffer` may change the buffer's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Writes resize the buffer to fit.
    Resizable,
    /// The length is owned elsewhere; writes never change it.
    Fixed,
}

/// How the backing allocation is resized.
///
/// A buffer must use one strategy for its whole lifetime; mixing them on the
/// same allocation is undefined behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocStrategy {
    /// Grow or shrink in place when possible.
    Realloc,
    /// Drop the old allocation and take a fresh one; contents are not
    /// carried over.
    Fresh,
}

/// What happens when a write exceeds a fixed-length buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Silently drop the excess bytes.
    Truncate,
    /// Fail without writing anything.
    Reject,
}

/// Binding of an owning structure to its raw buffer and length fields
///
/// `get` returns the current `(pointer, length)` pair; `set` stores a new
/// pair. The binding assumes it owns the allocation behind the pointer for
/// resizing purposes; the host must not resize it through another path.
pub struct BufferBinding<S> {
    get: fn(&S) -> (*mut u8, usize),
    set: fn(&mut S, *mut u8, usize),
    resize: ResizePolicy,
    alloc: AllocStrategy,
    overflow: OverflowPolicy,
}

impl<S> BufferBinding<S> {
    /// Build a binding; policies are resolved here, once per bound type.
    pub const fn new(
        get: fn(&S) -> (*mut u8, usize),
        set: fn(&mut S, *mut u8, usize),
        resize: ResizePolicy,
        alloc: AllocStrategy,
        overflow: OverflowPolicy,
    ) -> Self {
        Self {
            get,
            set,
            resize,
            alloc,
            overflow,
        }
    }

    /// Current buffer length in bytes.
    pub fn get_length(&self, owner: &S) -> usize {
        (self.get)(owner).1
    }

    /// Copy out exactly `length` bytes as an immutable byte string.
    pub fn get_buffer(&self, owner: &S) -> Bytes {
        let (ptr, len) = (self.get)(owner);
        if ptr.is_null() || len == 0 {
            return Bytes::new();
        }
        // get() reports the live allocation; len bytes are readable.
        Bytes::copy_from_slice(unsafe { slice::from_raw_parts(ptr, len) })
    }

    /// Resize the buffer. No-op when the length is unchanged; a zero length
    /// releases the allocation. New bytes are zero-filled: the whole buffer
    /// under [`AllocStrategy::Fresh`], the grown tail under
    /// [`AllocStrategy::Realloc`].
    pub fn set_length(&self, owner: &mut S, new_len: usize) {
        let (old_ptr, old_len) = (self.get)(owner);
        if old_len == new_len {
            return;
        }
        let new_ptr = match self.alloc {
            AllocStrategy::Realloc => unsafe { realloc_bytes(old_ptr, old_len, new_len) },
            AllocStrategy::Fresh => unsafe {
                free_bytes(old_ptr, old_len);
                alloc_bytes(new_len)
            },
        };
        (self.set)(owner, new_ptr, new_len);
    }

    /// Write bytes into the buffer.
    ///
    /// Resizes to fit first when the policy permits; otherwise an oversized
    /// write is truncated or rejected per [`OverflowPolicy`]. A rejected
    /// write leaves the buffer untouched.
    pub fn set_buffer(&self, owner: &mut S, bytes: &[u8]) -> Result<()> {
        if self.resize == ResizePolicy::Resizable {
            self.set_length(owner, bytes.len());
        }
        let (ptr, len) = (self.get)(owner);
        if bytes.len() > len && self.overflow == OverflowPolicy::Reject {
            return Err(BridgeError::BufferOverflow {
                capacity: len,
                len: bytes.len(),
            });
        }
        let count = len.min(bytes.len());
        if count > 0 {
            // Source and destination never alias: bytes is a native slice,
            // ptr is the binding-owned allocation.
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, count) };
        }
        Ok(())
    }
}

fn byte_layout(len: usize) -> Layout {
    // Align 1: only fails past isize::MAX, a caller contract violation.
    Layout::from_size_align(len, 1).expect("buffer length overflows isize")
}

unsafe fn alloc_bytes(len: usize) -> *mut u8 {
    if len == 0 {
        return ptr::null_mut();
    }
    let layout = byte_layout(len);
    // Zeroed: the buffer is readable through get_buffer before any write.
    let ptr = alloc::alloc_zeroed(layout);
    if ptr.is_null() {
        alloc::handle_alloc_error(layout);
    }
    ptr
}

unsafe fn free_bytes(ptr: *mut u8, len: usize) {
    if !ptr.is_null() && len > 0 {
        alloc::dealloc(ptr, byte_layout(len));
    }
}

unsafe fn realloc_bytes(ptr: *mut u8, old_len: usize, new_len: usize) -> *mut u8 {
    if ptr.is_null() || old_len == 0 {
        return alloc_bytes(new_len);
    }
    if new_len == 0 {
        free_bytes(ptr, old_len);
        return ptr::null_mut();
    }
    let new_ptr = alloc::realloc(ptr, byte_layout(old_len), new_len);
    if new_ptr.is_null() {
        alloc::handle_alloc_error(byte_layout(new_len));
    }
    if new_len > old_len {
        // realloc leaves the grown tail uninitialized; zero it so the
        // buffer stays readable through get_buffer.
        ptr::write_bytes(new_ptr.add(old_len), 0, new_len - old_len);
    }
    new_ptr
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame {
        data: *mut u8,
        len: usize,
    }

    impl Frame {
        fn empty() -> Self {
            Self {
                data: ptr::null_mut(),
                len: 0,
            }
        }
    }

    fn frame_get(f: &Frame) -> (*mut u8, usize) {
        (f.data, f.len)
    }

    fn frame_set(f: &mut Frame, ptr: *mut u8, len: usize) {
        f.data = ptr;
        f.len = len;
    }

    const REALLOC: BufferBinding<Frame> = BufferBinding::new(
        frame_get,
        frame_set,
        ResizePolicy::Resizable,
        AllocStrategy::Realloc,
        OverflowPolicy::Truncate,
    );

    const FRESH: BufferBinding<Frame> = BufferBinding::new(
        frame_get,
        frame_set,
        ResizePolicy::Resizable,
        AllocStrategy::Fresh,
        OverflowPolicy::Truncate,
    );

    const FIXED: BufferBinding<Frame> = BufferBinding::new(
        frame_get,
        frame_set,
        ResizePolicy::Fixed,
        AllocStrategy::Realloc,
        OverflowPolicy::Truncate,
    );

    const FIXED_REJECT: BufferBinding<Frame> = BufferBinding::new(
        frame_get,
        frame_set,
        ResizePolicy::Fixed,
        AllocStrategy::Realloc,
        OverflowPolicy::Reject,
    );

    #[test]
    fn roundtrip_with_realloc() {
        let mut frame = Frame::empty();

        REALLOC.set_buffer(&mut frame, b"hello world").unwrap();
        assert_eq!(REALLOC.get_length(&frame), 11);
        assert_eq!(&REALLOC.get_buffer(&frame)[..], b"hello world");

        // Shrinking keeps the prefix under Realloc.
        REALLOC.set_length(&mut frame, 5);
        assert_eq!(&REALLOC.get_buffer(&frame)[..], b"hello");

        REALLOC.set_length(&mut frame, 0);
        assert!(frame.data.is_null());
        assert_eq!(REALLOC.get_buffer(&frame), Bytes::new());
    }

    #[test]
    fn roundtrip_with_fresh_allocation() {
        let mut frame = Frame::empty();

        FRESH.set_buffer(&mut frame, b"abc").unwrap();
        assert_eq!(&FRESH.get_buffer(&frame)[..], b"abc");

        FRESH.set_buffer(&mut frame, b"longer payload").unwrap();
        assert_eq!(&FRESH.get_buffer(&frame)[..], b"longer payload");

        FRESH.set_length(&mut frame, 0);
    }

    #[test]
    fn fresh_length_yields_zeroed_bytes() {
        let mut frame = Frame::empty();

        REALLOC.set_length(&mut frame, 8);
        assert_eq!(&REALLOC.get_buffer(&frame)[..], &[0u8; 8]);

        REALLOC.set_length(&mut frame, 0);

        FRESH.set_length(&mut frame, 4);
        assert_eq!(&FRESH.get_buffer(&frame)[..], &[0u8; 4]);

        FRESH.set_length(&mut frame, 0);
    }

    #[test]
    fn growing_zero_fills_the_tail() {
        let mut frame = Frame::empty();
        REALLOC.set_buffer(&mut frame, b"ab").unwrap();

        REALLOC.set_length(&mut frame, 6);
        assert_eq!(&REALLOC.get_buffer(&frame)[..], b"ab\0\0\0\0");

        REALLOC.set_length(&mut frame, 0);
    }

    #[test]
    fn set_length_is_a_noop_when_unchanged() {
        let mut frame = Frame::empty();
        REALLOC.set_buffer(&mut frame, b"stable").unwrap();
        let ptr_before = frame.data;

        REALLOC.set_length(&mut frame, 6);
        assert_eq!(frame.data, ptr_before);

        REALLOC.set_length(&mut frame, 0);
    }

    #[test]
    fn fixed_buffers_truncate_oversized_writes() {
        let mut frame = Frame::empty();
        REALLOC.set_length(&mut frame, 4);

        FIXED.set_buffer(&mut frame, b"truncated").unwrap();
        assert_eq!(FIXED.get_length(&frame), 4);
        assert_eq!(&FIXED.get_buffer(&frame)[..], b"trun");

        REALLOC.set_length(&mut frame, 0);
    }

    #[test]
    fn reject_policy_refuses_oversized_writes() {
        let mut frame = Frame::empty();
        REALLOC.set_buffer(&mut frame, b"base").unwrap();

        let err = FIXED_REJECT.set_buffer(&mut frame, b"too large").unwrap_err();
        assert!(matches!(
            err,
            BridgeError::BufferOverflow {
                capacity: 4,
                len: 9
            }
        ));
        // Rejected writes leave the contents untouched.
        assert_eq!(&FIXED_REJECT.get_buffer(&frame)[..], b"base");

        REALLOC.set_length(&mut frame, 0);
    }

    #[test]
    fn fixed_buffers_accept_shorter_writes() {
        let mut frame = Frame::empty();
        REALLOC.set_buffer(&mut frame, b"xxxx").unwrap();

        FIXED.set_buffer(&mut frame, b"ab").unwrap();
        assert_eq!(&FIXED.get_buffer(&frame)[..], b"abxx");

        REALLOC.set_length(&mut frame, 0);
    }
}
