//! Utilities for splitting a container into byte ranges during parsing.
use crate::error::FormatError;

/// Byte range `[start, end)` claimed by a structure in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetRange {
    pub start: u64,
    pub end: u64,
    pub kind: RangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Header,
    Table,
    /// The index of the entry in the section table.
    Section(usize),
}

impl std::fmt::Display for OffsetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            RangeKind::Header => write!(f, "header")?,
            RangeKind::Table => write!(f, "section table")?,
            RangeKind::Section(i) => write!(f, "section {i}")?,
        }
        write!(f, " [{}, {})", self.start, self.end)
    }
}

/// A contiguous piece of a container in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk {
    Header,
    Table,
    Section(usize),
    /// Bytes not claimed by any structure like padding or unknown data.
    Raw(Vec<u8>),
}

/// Split `bytes[..end]` into chunks in file order.
///
/// Unclaimed gaps become [Chunk::Raw] so they can be written back unmodified.
/// Overlapping ranges are ambiguous and rejected.
pub(crate) fn partition(
    ranges: &[OffsetRange],
    bytes: &[u8],
    end: u64,
) -> Result<Vec<Chunk>, FormatError> {
    let mut ranges = ranges.to_vec();

    // Gap detection assumes offsets are sorted.
    // Empty ranges sort before non empty ranges at the same start.
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut chunks = Vec::new();
    let mut position = 0;
    let mut previous: Option<&OffsetRange> = None;

    for range in &ranges {
        if let Some(previous) = previous
            && range.start < previous.end
        {
            return Err(FormatError::OverlappingRanges {
                current: previous.clone(),
                next: range.clone(),
            });
        }

        if range.start > position {
            chunks.push(Chunk::Raw(
                bytes[position as usize..range.start as usize].to_vec(),
            ));
        }

        chunks.push(match range.kind {
            RangeKind::Header => Chunk::Header,
            RangeKind::Table => Chunk::Table,
            RangeKind::Section(i) => Chunk::Section(i),
        });

        position = range.end;
        previous = Some(range);
    }

    if position < end {
        chunks.push(Chunk::Raw(bytes[position as usize..end as usize].to_vec()));
    }

    Ok(chunks)
}
