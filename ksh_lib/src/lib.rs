//! A library for reading and writing `.ksh` shader container files.
//!
//! A `.ksh` file bundles a vertex shader and a pixel shader as named source text
//! along with other data like uniform tables, unknown sections, or padding.
//! Two physical layouts are supported.
//! The [container] layout has a magic, version, section table, and optional checksum.
//! The [legacy] layout is the headerless format used by Don't Starve Together.
//!
//! # Getting Started
//! The core never touches the file system. Read the bytes, analyze, edit, and build.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ksh_lib::{KshDocument, KshFormat, ShaderSection, build};
//!
//! let format = KshFormat::default();
//! let document = KshDocument::new(
//!     &format,
//!     ShaderSection::vertex("main_vs", "VS_SRC"),
//!     ShaderSection::pixel("main_ps", "PS_SRC"),
//! );
//! let bytes = document.to_bytes(&format)?;
//!
//! // Edit the vertex shader while keeping everything else.
//! let document = KshDocument::from_bytes(&format, &bytes)?;
//! let vs = ShaderSection::vertex("main_vs", "VS_SRC_V2");
//! let edited = build(&format, &document.preserved, &vs, &document.ps)?;
//! assert_eq!("VS_SRC_V2", KshDocument::from_bytes(&format, &edited)?.vs.content);
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! Only the two shader sections are decoded into Rust types.
//! Everything else is kept as opaque [Preserved] data that the builder copies and repositions.
//! This allows writing a binary identical output when no shaders are modified
//! and preserves data that is not understood, like sections added by newer tools.
//!
//! Analyzing and building are pure functions over byte buffers with no shared state.
//! Format limits are passed explicitly as a [KshFormat].
use std::io::Cursor;

use binrw::BinReaderExt;

use crate::error::FormatError;

pub mod container;
pub mod error;
pub mod format;
pub mod interface;
pub mod legacy;

mod analyze;
mod build;
mod document;
mod layout;
mod text;

pub use analyze::analyze;
pub use build::build;
pub use document::{KshDocument, Preserved, ShaderRole, ShaderSection};
pub use error::{AnalyzeError, BuildError, ErrorKind};
pub use format::KshFormat;
pub use layout::{OffsetRange, RangeKind};
pub use legacy::analyze_legacy;

fn read_u32(reader: &mut Cursor<&[u8]>, context: &'static str) -> Result<u32, FormatError> {
    let position = reader.position();
    reader
        .read_le()
        .map_err(|_| FormatError::UnexpectedEnd { position, context })
}

/// Read `len` bytes without allocating more than the remaining input.
fn read_bytes<'a>(
    reader: &mut Cursor<&'a [u8]>,
    len: u64,
    context: &'static str,
) -> Result<&'a [u8], FormatError> {
    let bytes: &'a [u8] = *reader.get_ref();
    let start = reader.position();
    let end = start
        .checked_add(len)
        .filter(|end| *end <= bytes.len() as u64)
        .ok_or(FormatError::UnexpectedEnd {
            position: start,
            context,
        })?;
    reader.set_position(end);
    Ok(&bytes[start as usize..end as usize])
}

/// Read a `u32` length followed by that many bytes.
fn read_len_prefixed<'a>(
    reader: &mut Cursor<&'a [u8]>,
    context: &'static str,
) -> Result<&'a [u8], FormatError> {
    let len = read_u32(reader, context)?;
    read_bytes(reader, len as u64, context)
}

fn remaining(reader: &Cursor<&[u8]>) -> u64 {
    (reader.get_ref().len() as u64).saturating_sub(reader.position())
}
