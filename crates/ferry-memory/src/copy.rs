//! The cross-module byte copy primitive.
//!
//! This is the only path by which bytes move between the two modules'
//! memories. Both views are re-checked before the copy, the source range is
//! staged into a host buffer, and the destination range is validated before
//! anything is written, so a failed copy leaves both memories untouched.

use wasmtime::AsContextMut;

use crate::error::{AccessError, AccessResult};
use crate::view::MemoryView;

/// Copy `size` bytes from `src` at `src_offset` to `dst` at `dst_offset`.
///
/// Source and destination must belong to different modules; a copy where both
/// views carry the same label fails with [`AccessError::AliasedCopy`]. The
/// copy is all-or-nothing: any out-of-range region fails before the
/// destination is modified.
pub fn copy(
    mut ctx: impl AsContextMut,
    dst: &mut MemoryView,
    dst_offset: u32,
    src: &mut MemoryView,
    src_offset: u32,
    size: u32,
) -> AccessResult<()> {
    if dst.label() == src.label() {
        return Err(AccessError::AliasedCopy { label: dst.label() });
    }

    // Either memory may have grown since the views were last used.
    dst.check(&ctx);
    src.check(&ctx);

    let bytes = src.read_bytes(&ctx, src_offset, size)?;
    dst.write_bytes(&mut ctx, dst_offset, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::{Engine, Memory, MemoryType, Store};

    fn twin_memories() -> (Store<()>, MemoryView, MemoryView) {
        let engine = Engine::default();
        let mut store = Store::new(&engine, ());
        let fs = Memory::new(&mut store, MemoryType::new(1, None)).unwrap();
        let guest = Memory::new(&mut store, MemoryType::new(1, None)).unwrap();
        let fs_view = MemoryView::new(&store, fs, "memfs");
        let guest_view = MemoryView::new(&store, guest, "guest");
        (store, fs_view, guest_view)
    }

    #[test]
    fn test_copy_between_modules() {
        let (mut store, mut fs, mut guest) = twin_memories();

        fs.write_bytes(&mut store, 16, b"hello").unwrap();
        copy(&mut store, &mut guest, 64, &mut fs, 16, 5).unwrap();
        assert_eq!(guest.read_bytes(&store, 64, 5).unwrap(), b"hello");
    }

    #[test]
    fn test_round_trip_is_identity() {
        let (mut store, mut fs, mut guest) = twin_memories();

        let payload = [1u8, 2, 3, 4, 5, 6, 7, 8];
        fs.write_bytes(&mut store, 32, &payload).unwrap();

        copy(&mut store, &mut guest, 0, &mut fs, 32, 8).unwrap();
        copy(&mut store, &mut fs, 32, &mut guest, 0, 8).unwrap();

        assert_eq!(fs.read_bytes(&store, 32, 8).unwrap(), payload);
    }

    #[test]
    fn test_zero_length_copy() {
        let (mut store, mut fs, mut guest) = twin_memories();
        copy(&mut store, &mut guest, 0, &mut fs, 0, 0).unwrap();
    }

    #[test]
    fn test_aliased_copy_rejected() {
        let (mut store, mut fs, _) = twin_memories();
        let mut other = fs;

        let err = copy(&mut store, &mut other, 0, &mut fs, 64, 4).unwrap_err();
        assert_eq!(err, AccessError::AliasedCopy { label: "memfs" });
    }

    #[test]
    fn test_failed_copy_writes_nothing() {
        let (mut store, mut fs, mut guest) = twin_memories();

        fs.write_bytes(&mut store, 0, &[0xaa; 16]).unwrap();
        let dst_end = guest.len() as u32 - 4;

        // Source range is fine, destination runs past the end.
        let err = copy(&mut store, &mut guest, dst_end, &mut fs, 0, 16).unwrap_err();
        assert!(matches!(err, AccessError::OutOfBounds { label: "guest", .. }));

        // Destination bytes inside the window are untouched.
        assert_eq!(guest.read_bytes(&store, dst_end, 4).unwrap(), vec![0; 4]);
    }
}
