//! Put and add command implementations.

use super::{display, Context};
use crate::error::CliResult;
use crate::OutputFormat;
use serde::Serialize;
use splicefs_core::{split_add_file, BlockStore};
use std::fs::File;
use std::path::Path;

#[derive(Serialize)]
struct PutOutput {
    cid: String,
    size: u64,
}

/// Runs the put command.
pub fn put(ctx: &Context, file: &Path) -> CliResult<()> {
    let store = ctx.open()?;
    let mut source = File::open(file)?;
    let (cid, size) = store.ingest_chunked(&mut source, &ctx.config.import)?;
    store.flush()?;

    let cid = display(&cid);
    let text = cid.clone();
    ctx.print(&PutOutput { cid, size }, text)
}

/// Runs the add command.
///
/// In text mode each stored segment is printed as it completes, followed
/// by the identifier of the whole file.
pub fn run(ctx: &Context, content: &Path, splits: &Path) -> CliResult<()> {
    let store = ctx.open()?;
    let output = split_add_file(&store, content, splits, &ctx.config, |added| {
        if ctx.format == OutputFormat::Text {
            println!(
                "{}: [{}, {}) size: {}",
                display(&added.cid),
                added.offset,
                added.offset + added.length,
                added.length
            );
        }
        Ok(())
    })?;
    store.flush()?;

    ctx.print(&output, display(&output.cid))
}
