// demos/basic_usage.rs
//! Basic usage of buffers, memory contexts and table accessors

use blockbuf::prelude::*;

fn main() -> Result<()> {
    println!("=== Shared Buffers ===\n");

    let ctx = MemoryContext::default();
    let mut buf = Buffer::<f64>::zeros(&ctx, 8, AllocKind::Host)?;
    buf.as_mut_slice()?[0] = 3.5;

    let copy = buf.clone();
    println!("Count: {}, size: {} bytes", copy.count(), copy.size());
    println!("Shared block: {}", copy.data() == buf.data());
    println!("Unique: {}", buf.is_unique());

    let tail = buf.slice(4..8)?;
    drop(buf);
    drop(copy);
    println!("Slice still readable after parents dropped: {:?}", tail.as_slice());

    println!("\n=== Borrowed Memory ===\n");

    let source = [10i32, 20, 30];
    let mut borrowed = unsafe { Buffer::wrap(source.as_ptr(), source.len())? };
    println!("Owns memory: {}", borrowed.owns_memory());
    println!("Mutable: {}", borrowed.has_mutable_data());

    borrowed.need_mutable_data(&ctx, AllocKind::Host)?;
    borrowed.as_mut_slice()?[1] = 99;
    println!("Copied on demand: {:?} (source {:?})", borrowed.as_slice(), source);

    println!("\n=== Table Accessors ===\n");

    let table = HomogenTable::from_vec(
        vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0],
        3,
        2,
        DataLayout::RowMajor,
    )?;

    let rows = RowAccessor::<f32>::new(&table)?.pull(&ctx, Range::new(1, -1), AllocKind::Host)?;
    println!("Rows 1..: {:?}", rows.as_slice());
    println!("Zero-copy: {}", !rows.has_mutable_data());

    let as_ints = RowAccessor::<i64>::new(&table)?.pull(&ctx, Range::all(), AllocKind::Host)?;
    println!("Converted to i64: {:?}", as_ints.as_slice());

    let accessor = ColumnAccessor::<f64>::new(&table)?;
    let mut block = Buffer::new();
    for column in 0..table.column_count() {
        let values = accessor.pull_into(&ctx, &mut block, column, Range::all(), AllocKind::Host)?;
        println!("Column {}: {:?}", column, values);
    }

    println!("\n=== Context Statistics ===\n");

    let stats = ctx.stats();
    println!("Acquired: {}", stats.acquired);
    println!("Allocated: {}", stats.allocated);
    println!("Reused: {} ({:.1}%)", stats.reused, stats.reuse_rate());
    println!("In use: {}", stats.in_use());

    Ok(())
}
