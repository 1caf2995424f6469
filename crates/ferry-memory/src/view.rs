//! Bounds-checked typed views over one module's linear memory.
//!
//! A [`MemoryView`] wraps a `wasmtime::Memory` together with a cached window
//! size. Wasm memories may grow while the guest runs, which replaces the
//! backing buffer; [`MemoryView::check`] re-reads the current size so that
//! accesses past an old growth boundary become valid again. Every access is
//! validated against the cached window and fails with an explicit
//! [`AccessError`] instead of wrapping around or faulting.

use tracing::debug;
use wasmtime::{AsContext, AsContextMut, Memory};

use crate::error::{AccessError, AccessResult};

/// A bounds-checked view over one module's current linear memory.
///
/// Views are cheap to copy; the label identifies which module the memory
/// belongs to and shows up in error messages and the aliasing check.
#[derive(Clone, Copy)]
pub struct MemoryView {
    /// The wasm memory this view tracks.
    memory: Memory,
    /// Which module the memory belongs to, e.g. `"memfs"` or `"guest"`.
    label: &'static str,
    /// Size of the memory the last time this view looked.
    cached_len: usize,
    /// Incremented every time `check` observes a growth.
    generation: u64,
}

impl MemoryView {
    /// Create a view over `memory`, caching its current size.
    pub fn new(ctx: impl AsContext, memory: Memory, label: &'static str) -> Self {
        let cached_len = memory.data_size(&ctx);
        Self {
            memory,
            label,
            cached_len,
            generation: 0,
        }
    }

    /// The module label this view was created with.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The size of the view's current window in bytes.
    pub fn len(&self) -> usize {
        self.cached_len
    }

    /// Whether the view's window is empty.
    pub fn is_empty(&self) -> bool {
        self.cached_len == 0
    }

    /// How many growths this view has observed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Re-validate the view against the memory's current size.
    ///
    /// Must be called before any access that follows a call into wasm, since
    /// the module may have grown its memory in the meantime.
    pub fn check(&mut self, ctx: impl AsContext) {
        let current = self.memory.data_size(&ctx);
        if current != self.cached_len {
            debug!(
                label = self.label,
                old_size = self.cached_len,
                new_size = current,
                "memory grew; refreshing view"
            );
            self.cached_len = current;
            self.generation += 1;
        }
    }

    /// Validate that `[offset, offset + len)` fits inside the cached window.
    fn bounds(&self, offset: u64, len: u64) -> AccessResult<std::ops::Range<usize>> {
        let out_of_bounds = || AccessError::OutOfBounds {
            label: self.label,
            offset,
            len,
            size: self.cached_len as u64,
        };
        let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > self.cached_len as u64 {
            return Err(out_of_bounds());
        }
        Ok(offset as usize..end as usize)
    }

    /// Read one byte at `offset`.
    pub fn read8(&self, ctx: impl AsContext, offset: u32) -> AccessResult<u8> {
        let range = self.bounds(u64::from(offset), 1)?;
        Ok(self.memory.data(&ctx)[range.start])
    }

    /// Write one byte at `offset`.
    pub fn write8(&self, mut ctx: impl AsContextMut, offset: u32, value: u8) -> AccessResult<()> {
        let range = self.bounds(u64::from(offset), 1)?;
        self.memory.data_mut(&mut ctx)[range.start] = value;
        Ok(())
    }

    /// Read the little-endian 32-bit word containing `offset`.
    ///
    /// The offset is truncated to 4-byte granularity, matching word-indexed
    /// addressing.
    pub fn read32(&self, ctx: impl AsContext, offset: u32) -> AccessResult<u32> {
        let range = self.bounds(u64::from(offset & !3), 4)?;
        let data = self.memory.data(&ctx);
        let o = range.start;
        Ok(u32::from_le_bytes([
            data[o],
            data[o + 1],
            data[o + 2],
            data[o + 3],
        ]))
    }

    /// Write `value` as the little-endian 32-bit word containing `offset`.
    pub fn write32(&self, mut ctx: impl AsContextMut, offset: u32, value: u32) -> AccessResult<()> {
        let range = self.bounds(u64::from(offset & !3), 4)?;
        self.memory.data_mut(&mut ctx)[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Write a 64-bit value as two consecutive 32-bit words, low word first.
    pub fn write64(
        &self,
        mut ctx: impl AsContextMut,
        offset: u32,
        low: u32,
        high: u32,
    ) -> AccessResult<()> {
        let high_offset = offset.checked_add(4).ok_or(AccessError::OutOfBounds {
            label: self.label,
            offset: u64::from(offset),
            len: 8,
            size: self.cached_len as u64,
        })?;
        self.write32(&mut ctx, offset, low)?;
        self.write32(&mut ctx, high_offset, high)
    }

    /// Read `len` raw bytes starting at `offset`.
    pub fn read_bytes(&self, ctx: impl AsContext, offset: u32, len: u32) -> AccessResult<Vec<u8>> {
        let range = self.bounds(u64::from(offset), u64::from(len))?;
        Ok(self.memory.data(&ctx)[range].to_vec())
    }

    /// Write `bytes` starting at `offset`.
    ///
    /// The full destination range is validated before anything is written.
    pub fn write_bytes(
        &self,
        mut ctx: impl AsContextMut,
        offset: u32,
        bytes: &[u8],
    ) -> AccessResult<()> {
        let range = self.bounds(u64::from(offset), bytes.len() as u64)?;
        self.memory.data_mut(&mut ctx)[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Decode a string starting at `offset`, one byte per character.
    ///
    /// Decoding stops at the first NUL byte or after `len` bytes when a bound
    /// is given; an unbounded scan stops at the end of the window. The
    /// terminator is not included. A bounded range that does not fit inside
    /// the window is an error; an unbounded scan starting at or past the end
    /// decodes the empty string.
    pub fn read_string(
        &self,
        ctx: impl AsContext,
        offset: u32,
        len: Option<u32>,
    ) -> AccessResult<String> {
        let end = match len {
            Some(len) => self.bounds(u64::from(offset), u64::from(len))?.end,
            None => self.cached_len,
        };
        let data = self.memory.data(&ctx);
        let mut out = String::new();
        let mut i = offset as usize;
        while i < end {
            let byte = data[i];
            if byte == 0 {
                break;
            }
            out.push(char::from(byte));
            i += 1;
        }
        Ok(out)
    }

    /// Encode `text` at `offset`, one byte per character, plus one NUL.
    ///
    /// Characters above U+00FF cannot be marshaled and fail with
    /// [`AccessError::WideCharacter`]. Returns the number of bytes written,
    /// including the terminator.
    pub fn write_string(
        &self,
        mut ctx: impl AsContextMut,
        offset: u32,
        text: &str,
    ) -> AccessResult<u32> {
        let overflow = |cursor: u32| AccessError::OutOfBounds {
            label: self.label,
            offset: u64::from(cursor),
            len: 1,
            size: self.cached_len as u64,
        };

        let mut cursor = offset;
        for ch in text.chars() {
            let code = u32::from(ch);
            if code > 0xff {
                return Err(AccessError::WideCharacter {
                    label: self.label,
                    ch,
                    code,
                });
            }
            self.write8(&mut ctx, cursor, code as u8)?;
            cursor = cursor.checked_add(1).ok_or_else(|| overflow(cursor))?;
        }
        self.write8(&mut ctx, cursor, 0)?;
        Ok(cursor - offset + 1)
    }
}

impl std::fmt::Debug for MemoryView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryView")
            .field("label", &self.label)
            .field("cached_len", &self.cached_len)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::{Engine, MemoryType, Store};

    fn store_with_memory() -> (Store<()>, Memory) {
        let engine = Engine::default();
        let mut store = Store::new(&engine, ());
        let memory = Memory::new(&mut store, MemoryType::new(1, Some(4))).unwrap();
        (store, memory)
    }

    #[test]
    fn test_read_write_words() {
        let (mut store, memory) = store_with_memory();
        let view = MemoryView::new(&store, memory, "guest");

        view.write32(&mut store, 16, 0xdead_beef).unwrap();
        assert_eq!(view.read32(&store, 16).unwrap(), 0xdead_beef);
        // Word addressing truncates to 4-byte granularity.
        assert_eq!(view.read32(&store, 18).unwrap(), 0xdead_beef);

        view.write8(&mut store, 16, 0x01).unwrap();
        assert_eq!(view.read8(&store, 16).unwrap(), 0x01);
        assert_eq!(view.read32(&store, 16).unwrap(), 0xdead_be01);
    }

    #[test]
    fn test_write64_splits_words() {
        let (mut store, memory) = store_with_memory();
        let view = MemoryView::new(&store, memory, "guest");

        view.write64(&mut store, 8, 11, 0).unwrap();
        assert_eq!(view.read32(&store, 8).unwrap(), 11);
        assert_eq!(view.read32(&store, 12).unwrap(), 0);
    }

    #[test]
    fn test_out_of_bounds_access_fails() {
        let (mut store, memory) = store_with_memory();
        let view = MemoryView::new(&store, memory, "guest");
        let size = view.len() as u32;

        assert!(matches!(
            view.read8(&store, size),
            Err(AccessError::OutOfBounds { label: "guest", .. })
        ));
        assert!(view.write32(&mut store, size + 2, 1).is_err());
        assert!(view.read_bytes(&store, size - 4, 8).is_err());
        // Word truncation keeps a straddling offset inside the window.
        assert!(view.write32(&mut store, size - 2, 1).is_ok());
    }

    #[test]
    fn test_writes_near_address_limit_fail() {
        let (mut store, memory) = store_with_memory();
        let view = MemoryView::new(&store, memory, "guest");

        // offset + 4 would wrap around the 32-bit address space.
        let err = view.write64(&mut store, u32::MAX - 1, 1, 0).unwrap_err();
        assert!(matches!(err, AccessError::OutOfBounds { len: 8, .. }));

        assert!(view.write_string(&mut store, u32::MAX, "ab").is_err());
    }

    #[test]
    fn test_string_round_trip() {
        let (mut store, memory) = store_with_memory();
        let view = MemoryView::new(&store, memory, "guest");

        let written = view.write_string(&mut store, 100, "USER=alice").unwrap();
        assert_eq!(written, 11);
        assert_eq!(view.read8(&store, 110).unwrap(), 0);
        assert_eq!(view.read_string(&store, 100, None).unwrap(), "USER=alice");

        // Bounded reads stop at the NUL even when the bound is wider.
        assert_eq!(
            view.read_string(&store, 100, Some(64)).unwrap(),
            "USER=alice"
        );
        // And stop at the bound even without a NUL.
        assert_eq!(view.read_string(&store, 100, Some(4)).unwrap(), "USER");
    }

    #[test]
    fn test_write_string_rejects_wide_characters() {
        let (mut store, memory) = store_with_memory();
        let view = MemoryView::new(&store, memory, "guest");

        let err = view.write_string(&mut store, 0, "héllo…").unwrap_err();
        assert!(matches!(err, AccessError::WideCharacter { ch: '…', .. }));

        // Latin-1 range is fine.
        view.write_string(&mut store, 0, "héllo").unwrap();
        assert_eq!(view.read_string(&store, 0, None).unwrap(), "héllo");
    }

    #[test]
    fn test_unbounded_scan_past_end_is_empty() {
        let (store, memory) = store_with_memory();
        let view = MemoryView::new(&store, memory, "guest");
        let size = view.len() as u32;

        assert_eq!(view.read_string(&store, size, None).unwrap(), "");
        assert_eq!(view.read_string(&store, size + 100, None).unwrap(), "");
    }

    #[test]
    fn test_check_refreshes_after_growth() {
        let (mut store, memory) = store_with_memory();
        let mut view = MemoryView::new(&store, memory, "guest");
        let initial = view.len();
        let past_end = initial as u32 + 8;

        assert!(view.read8(&store, past_end).is_err());

        memory.grow(&mut store, 1).unwrap();
        // Stale until re-checked.
        assert!(view.read8(&store, past_end).is_err());
        assert_eq!(view.generation(), 0);

        view.check(&store);
        assert_eq!(view.generation(), 1);
        assert_eq!(view.len(), initial + 65536);
        assert_eq!(view.read8(&store, past_end).unwrap(), 0);

        // No growth, no new generation.
        view.check(&store);
        assert_eq!(view.generation(), 1);
    }
}
