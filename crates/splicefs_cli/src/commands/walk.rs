//! Walk-dir and stat command implementations.

use super::{entry_line, Context};
use crate::error::CliResult;
use splicefs_codec::Cid;
use splicefs_core::{stat as stat_path, traverse_directory};

/// Runs the walk-dir command.
pub fn run(ctx: &Context, cid: &Cid, prefix: &str, include_dirs: bool) -> CliResult<()> {
    let store = ctx.open_read_only()?;
    for entry in traverse_directory(&store, cid, prefix, include_dirs) {
        let entry = entry?;
        ctx.print(&entry, entry_line(&entry.cid, &entry.path, entry.size))?;
    }
    Ok(())
}

/// Runs the stat command.
pub fn stat(ctx: &Context, path: &str) -> CliResult<()> {
    let store = ctx.open_read_only()?;
    match stat_path(&store, path)? {
        Some(entry) => ctx.print(&entry, entry_line(&entry.cid, &entry.path, entry.size)),
        None => ctx.print(&None::<()>, "Not Found!"),
    }
}
