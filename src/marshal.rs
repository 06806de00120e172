//! # Array Marshaling
//!
//! Transport of fixed-length double-precision sequences across the native
//! engine boundary. The engine's entry points take raw pointers to
//! contiguous `f64` buffers that the caller owns; [`EngineBuffer`] is the
//! owning handle for one such buffer.
//!
//! Every buffer is acquired and released within the dynamic extent of a
//! single engine call: the bridge allocates its inputs and outputs, runs the
//! native call, copies results out, and lets scope exit free everything.
//! Release happens exactly once per buffer on every exit path, native error
//! codes included, because it is tied to `Drop`.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

/// An owned, fixed-length block of doubles for handoff to the native engine.
///
/// The block is plain heap memory in native byte order. It is freed when the
/// `EngineBuffer` is dropped; the raw pointer obtained via [`as_ptr`] or
/// [`as_mut_ptr`] must not outlive the buffer.
///
/// [`as_ptr`]: EngineBuffer::as_ptr
/// [`as_mut_ptr`]: EngineBuffer::as_mut_ptr
pub struct EngineBuffer {
    ptr: NonNull<f64>,
    len: usize,
}

// SAFETY: the buffer is exclusively owned; nothing aliases it across threads.
unsafe impl Send for EngineBuffer {}

impl EngineBuffer {
    /// Allocate a buffer of `len` doubles without initializing it.
    ///
    /// Used to reserve space for engine outputs. A zero-length request
    /// allocates nothing.
    pub fn reserve(len: usize) -> Self {
        if len == 0 {
            return Self {
                ptr: NonNull::dangling(),
                len: 0,
            };
        }
        let layout = Self::layout(len);
        let raw = unsafe { alloc(layout) } as *mut f64;
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };
        Self { ptr, len }
    }

    /// Allocate a buffer and fill it with a byte-for-byte copy of `values`.
    pub fn copy_in(values: &[f64]) -> Self {
        let buf = Self::reserve(values.len());
        if !values.is_empty() {
            unsafe {
                std::ptr::copy_nonoverlapping(values.as_ptr(), buf.ptr.as_ptr(), values.len());
            }
        }
        buf
    }

    /// Copy the buffer contents into a newly owned `Vec`.
    ///
    /// The result is an independent copy, never a view: it stays valid after
    /// the buffer is dropped.
    pub fn copy_out(&self) -> Vec<f64> {
        let mut out = vec![0.0f64; self.len];
        if self.len > 0 {
            unsafe {
                std::ptr::copy_nonoverlapping(self.ptr.as_ptr(), out.as_mut_ptr(), self.len);
            }
        }
        out
    }

    /// Number of doubles in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no doubles.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw read pointer for the native call.
    pub fn as_ptr(&self) -> *const f64 {
        self.ptr.as_ptr()
    }

    /// Raw write pointer for the native call.
    pub fn as_mut_ptr(&mut self) -> *mut f64 {
        self.ptr.as_ptr()
    }

    fn layout(len: usize) -> Layout {
        // Cannot overflow in practice: inputs are existing slices and outputs
        // are bounded by the engine's tap/point caps.
        Layout::array::<f64>(len).expect("buffer length overflows address space")
    }
}

impl Drop for EngineBuffer {
    fn drop(&mut self) {
        if self.len > 0 {
            unsafe {
                dealloc(self.ptr.as_ptr() as *mut u8, Self::layout(self.len));
            }
        }
    }
}

impl std::fmt::Debug for EngineBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuffer")
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_bit_identical() {
        let values = [
            0.0,
            -0.0,
            1.0,
            -1.0,
            0.1,
            std::f64::consts::PI,
            f64::MIN_POSITIVE,
            5e-324, // smallest subnormal
            f64::MAX,
            -f64::MAX,
        ];
        let buf = EngineBuffer::copy_in(&values);
        let back = buf.copy_out();
        assert_eq!(back.len(), values.len());
        for (a, b) in values.iter().zip(&back) {
            assert_eq!(a.to_bits(), b.to_bits(), "{} != {}", a, b);
        }
    }

    #[test]
    fn test_reserve_then_write_then_copy_out() {
        let mut buf = EngineBuffer::reserve(4);
        assert_eq!(buf.len(), 4);
        unsafe {
            for i in 0..4 {
                *buf.as_mut_ptr().add(i) = (i as f64) * 0.5;
            }
        }
        let out = buf.copy_out();
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_copy_survives_buffer_release() {
        let values = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        let buf = EngineBuffer::copy_in(&values);
        let out = buf.copy_out();
        drop(buf);
        assert_eq!(out, values);
    }

    #[test]
    fn test_zero_length_buffer() {
        let buf = EngineBuffer::reserve(0);
        assert!(buf.is_empty());
        assert!(buf.copy_out().is_empty());

        let buf = EngineBuffer::copy_in(&[]);
        assert_eq!(buf.len(), 0);
    }
}
