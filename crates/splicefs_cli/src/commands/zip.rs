//! Zip-dir command implementation.

use super::{display, Context};
use crate::error::CliResult;
use splicefs_codec::Cid;
use splicefs_core::create_zip;

/// Runs the zip-dir command.
pub fn run(ctx: &Context, dir: &Cid) -> CliResult<()> {
    let store = ctx.open()?;
    let output = create_zip(&store, dir, &ctx.config)?;
    store.flush()?;

    tracing::info!(parts = output.parts.len(), size = output.size, "archive created");
    let text = format!("{} - {}", display(&output.cid), output.size);
    ctx.print(&output, text)
}
