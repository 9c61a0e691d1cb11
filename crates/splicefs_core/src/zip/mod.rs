//! ZIP archives assembled from stored files.
//!
//! [`ZipEncoder`] produces a streaming-layout archive with markers around
//! each file's data region; [`splice`] stores the bytes between markers
//! and links each file's existing identifier in place of its data.

mod crc;
mod encoder;
mod synth;

pub use crc::{crc32, Crc32};
pub use encoder::{archive_len, dos_datetime, ZipEncoder, ZipPart, ZipSource};
pub use synth::{create_zip, splice, ZipOutput};
