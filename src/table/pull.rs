// src/table/pull.rs
//! Block assembly shared by the row and column accessors.

use super::common::RawView;
use crate::buffer::Buffer;
use crate::element::{Element, Scalar};
use crate::error::Result;
use crate::memory::{AllocKind, MemoryContext};
use tracing::{debug, trace, warn};

/// Fills `block` with `count` values of `T`.
///
/// The sources are tried in order:
/// 1. `direct` holds `T` at a suitable alignment: `block` becomes an
///    immutable view of it, sharing ownership with the table.
/// 2. `direct` holds another data type: its bytes are converted in one pass.
/// 3. No contiguous storage: `fill_cells` writes each value.
///
/// A `direct` view whose length does not match `count` values is ignored and
/// the cells are read instead.
///
/// For 2 and 3, the block of `block` is written in place when it is mutable,
/// not shared and large enough. Otherwise a new block is allocated from `ctx`
/// and replaces the old one once it is filled.
///
/// On error `block` keeps its count, block and ownership. Values of a block
/// reused in place are unspecified after a failed fill.
pub(crate) fn pull_block<T, F>(
    ctx: &MemoryContext,
    block: &mut Buffer<T>,
    count: usize,
    kind: AllocKind,
    direct: Option<RawView>,
    fill_cells: F,
) -> Result<()>
where
    T: Element,
    F: FnOnce(&mut [T]) -> Result<()>,
{
    if count == 0 {
        block.reset();
        return Ok(());
    }

    let direct = direct.filter(|view| {
        let expected = count.checked_mul(view.data_type.size_in_bytes());
        let matches = expected == Some(view.bytes.count());
        if !matches {
            warn!(
                count,
                bytes = view.bytes.count(),
                dtype = ?view.data_type,
                "table block does not match the requested shape, reading cells"
            );
        }
        matches
    });

    if let Some(view) = direct.as_ref().filter(|view| view.data_type == T::DATA_TYPE) {
        match view.bytes.cast_view::<T>(0, count) {
            Ok(mut alias) => {
                alias.freeze();
                *block = alias;
                debug!(count, dtype = ?T::DATA_TYPE, "zero-copy pull");
                return Ok(());
            }
            Err(err) => trace!(%err, "table block not viewable, copying"),
        }
    }

    if let Some(out) = block.reusable_mut(count) {
        trace!(count, "reusing caller block");
        fill(out, direct, fill_cells)?;
        block.count = count;
        return Ok(());
    }

    let mut fresh = Buffer::empty(ctx, count, kind)?;
    fill(fresh.as_mut_slice()?, direct, fill_cells)?;
    *block = fresh;
    Ok(())
}

fn fill<T, F>(out: &mut [T], direct: Option<RawView>, fill_cells: F) -> Result<()>
where
    T: Element,
    F: FnOnce(&mut [T]) -> Result<()>,
{
    match direct {
        Some(view) => {
            debug!(count = out.len(), from = ?view.data_type, to = ?T::DATA_TYPE, "converting table block");
            convert(&view, out);
            Ok(())
        }
        None => {
            debug!(count = out.len(), to = ?T::DATA_TYPE, "converting table cells");
            fill_cells(out)
        }
    }
}

/// Converts the values of `view` into `out`, element by element in order.
///
/// `view` holds exactly `out.len()` values.
fn convert<T: Element>(view: &RawView, out: &mut [T]) {
    let width = view.data_type.size_in_bytes();
    for (dst, src) in out.iter_mut().zip(view.bytes.as_slice().chunks_exact(width)) {
        *dst = T::from_scalar(Scalar::read(view.data_type, src));
    }
}
