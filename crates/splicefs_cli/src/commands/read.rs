//! Cat and show-ranges command implementations.

use super::{display, Context};
use crate::error::CliResult;
use splicefs_codec::Cid;
use splicefs_core::{traverse_ranges, BlockStore};
use std::io::{self, Write};

/// Runs the cat command.
pub fn cat(ctx: &Context, cid: &Cid) -> CliResult<()> {
    let store = ctx.open_read_only()?;
    let mut out = io::stdout().lock();
    for chunk in store.read_stream(cid) {
        out.write_all(&chunk?)?;
    }
    out.flush()?;
    Ok(())
}

/// Runs the show-ranges command.
pub fn show_ranges(ctx: &Context, cid: &Cid, depth: usize) -> CliResult<()> {
    let store = ctx.open_read_only()?;
    for entry in traverse_ranges(&store, cid, depth) {
        let entry = entry?;
        let text = format!(
            "{}: [{}, {}) size: {}",
            display(&entry.cid),
            entry.offset,
            entry.end(),
            entry.length
        );
        ctx.print(&entry, text)?;
    }
    Ok(())
}
