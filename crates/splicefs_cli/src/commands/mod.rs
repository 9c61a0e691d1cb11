//! CLI command implementations.

pub mod add;
pub mod dir;
pub mod read;
pub mod walk;
pub mod zip;

use crate::error::CliResult;
use crate::OutputFormat;
use serde::Serialize;
use splicefs_codec::Cid;
use splicefs_core::{Blockstore, Config};
use splicefs_storage::FileBackend;
use std::fmt::Display;
use std::path::PathBuf;

/// Settings shared by every command.
pub struct Context {
    /// Block store directory.
    pub store: PathBuf,
    /// Core configuration.
    pub config: Config,
    /// Output format.
    pub format: OutputFormat,
}

impl Context {
    /// Opens the store for writing, creating it if needed.
    pub fn open(&self) -> CliResult<Blockstore<FileBackend>> {
        Ok(Blockstore::open(&self.store)?)
    }

    /// Opens an existing store for reading.
    pub fn open_read_only(&self) -> CliResult<Blockstore<FileBackend>> {
        Ok(Blockstore::open_read_only(&self.store)?)
    }

    /// Prints one result in the selected format.
    pub fn print<T: Serialize + ?Sized>(&self, value: &T, text: impl Display) -> CliResult<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
            OutputFormat::Text => println!("{text}"),
        }
        Ok(())
    }
}

/// Identifiers are always printed in their version-1 form.
pub fn display(cid: &Cid) -> String {
    cid.to_v1().to_string()
}

/// `<cid>: "<path>" - <size>`
pub fn entry_line(cid: &Cid, path: &str, size: u64) -> String {
    format!("{}: {path:?} - {size}", display(cid))
}

#[derive(Serialize)]
struct CidOutput {
    cid: String,
}

/// Prints a single identifier.
pub fn print_cid(ctx: &Context, cid: &Cid) -> CliResult<()> {
    let cid = display(cid);
    ctx.print(&CidOutput { cid: cid.clone() }, cid)
}
