//! Concat, make-dir and add-to-dir command implementations.

use super::{print_cid, Context};
use crate::error::CliResult;
use splicefs_codec::Cid;
use splicefs_core::{add_to_dir, concat as concat_files, make_dir, DirEntryInput};

/// Parses a `name=cid` argument.
pub fn parse_entry(arg: &str) -> Result<(String, Cid), String> {
    let (name, cid) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected name=cid, got {arg:?}"))?;
    let cid = cid.parse().map_err(|e| format!("{e}"))?;
    Ok((name.to_string(), cid))
}

fn inputs(entries: Vec<(String, Cid)>) -> Vec<(String, DirEntryInput)> {
    entries
        .into_iter()
        .map(|(name, cid)| (name, DirEntryInput::new(cid)))
        .collect()
}

/// Runs the concat command.
pub fn concat(ctx: &Context, cids: &[Cid]) -> CliResult<()> {
    let store = ctx.open()?;
    let cid = concat_files(&store, cids)?;
    store.flush()?;
    print_cid(ctx, &cid)
}

/// Runs the make-dir command.
pub fn make(ctx: &Context, entries: Vec<(String, Cid)>) -> CliResult<()> {
    let store = ctx.open()?;
    let cid = make_dir(&store, inputs(entries))?;
    store.flush()?;
    print_cid(ctx, &cid)
}

/// Runs the add-to-dir command.
pub fn extend(ctx: &Context, dir: &Cid, entries: Vec<(String, Cid)>) -> CliResult<()> {
    let store = ctx.open()?;
    let cid = add_to_dir(&store, dir, inputs(entries))?;
    store.flush()?;
    print_cid(ctx, &cid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_arguments() {
        let cid = "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e";
        let (name, parsed) = parse_entry(&format!("hello.txt={cid}")).unwrap();
        assert_eq!(name, "hello.txt");
        assert_eq!(parsed.to_string(), cid);

        let (name, _) = parse_entry(&format!("a=b={cid}")).unwrap();
        assert_eq!(name, "a=b");

        assert!(parse_entry("no-separator").is_err());
        assert!(parse_entry("x=not-a-cid").is_err());
    }
}
