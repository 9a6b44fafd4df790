// Copyright (C) 2026 beanwire contributors
//
// This file is part of beanwire.
//
// beanwire is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// beanwire is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with beanwire.  If not, see <http://www.gnu.org/licenses/>.
//! scratch
//!
//! # Introduction
//!
//! A growable, per-thread byte buffer used to materialize a length-
//! dynamic field's payload before its 4-byte length prefix is known.
//! Reused across fields and records on the same thread; grows on demand
//! and, if it ever exceeds 1 MiB, shrinks back to 1 KiB on the next
//! reset to bound idle memory between large records.
//!
//! One thread owns one buffer (`thread_local!`, not a `Mutex`-guarded
//! shared buffer): the spec this implements is explicit that reentrancy
//! is only safe because a thread never has two dynamic-length encodings
//! open at once at the same stack layer. Nested `Externalizable`
//! recursion works because the outer frame has already flushed the
//! buffer and restored the real output sink before the inner field's
//! encode begins.

use std::cell::RefCell;

const SHRINK_THRESHOLD: usize = 1024 * 1024;
const SHRINK_TARGET: usize = 1024;

#[derive(Default)]
pub struct ScratchBuffer {
    buf: Vec<u8>,
}

impl ScratchBuffer {
    pub fn reset(&mut self) {
        if self.buf.capacity() > SHRINK_THRESHOLD {
            self.buf = Vec::with_capacity(SHRINK_TARGET);
        } else {
            self.buf.clear();
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl std::io::Write for ScratchBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

thread_local! {
    static SCRATCH: RefCell<ScratchBuffer> = RefCell::new(ScratchBuffer::default());
}

/// Run `f` with exclusive access to this thread's scratch buffer, freshly
/// reset. Panics (via `RefCell`'s borrow check) if called re-entrantly on
/// the same thread while an outer call's `f` is still running-- exactly
/// the "two dynamic-length encodings open at once" misuse the spec this
/// crate implements says must never happen.
pub fn with_scratch<R>(f: impl FnOnce(&mut ScratchBuffer) -> R) -> R {
    SCRATCH.with(|cell| {
        let mut buf = cell.borrow_mut();
        buf.reset();
        f(&mut buf)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinks_after_growing_past_threshold() {
        with_scratch(|buf| {
            buf.append(&vec![0u8; SHRINK_THRESHOLD + 1]);
            assert!(buf.size() > SHRINK_THRESHOLD);
        });
        with_scratch(|buf| {
            assert!(buf.buf.capacity() <= SHRINK_TARGET * 2);
            assert_eq!(buf.size(), 0);
        });
    }

    #[test]
    fn reset_clears_without_shrinking_small_buffers() {
        with_scratch(|buf| {
            buf.append(&[1, 2, 3]);
        });
        with_scratch(|buf| {
            assert_eq!(buf.size(), 0);
        });
    }
}
