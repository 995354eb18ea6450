//! Error types for analyzing and building `.ksh` files.
//!
//! Every failure belongs to one [ErrorKind] so callers can decide how to
//! present it without matching on individual variants.
use thiserror::Error;

use crate::{ShaderRole, format::TextEncoding, layout::OffsetRange};

/// The broad category of a failure.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// The container structure is invalid.
    Format,
    /// The stored checksum does not match the file contents.
    Integrity,
    /// Text is not representable in the format's character encoding.
    Encoding,
    /// A caller supplied name or content violates a format limit.
    Validation,
}

/// Why a legacy uniform declaration could not be read.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UniformIssue {
    UnexpectedEnd,
    /// The scope or type is not a known value.
    UnknownValue,
    TooManyDefaultValues,
    Other,
}

impl std::fmt::Display for UniformIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniformIssue::UnexpectedEnd => write!(f, "unexpected end of data"),
            UniformIssue::UnknownValue => write!(f, "unknown scope or type"),
            UniformIssue::TooManyDefaultValues => write!(f, "too many default values"),
            UniformIssue::Other => write!(f, "malformed declaration"),
        }
    }
}

impl From<&binrw::Error> for UniformIssue {
    fn from(e: &binrw::Error) -> Self {
        if e.is_eof() {
            return UniformIssue::UnexpectedEnd;
        }
        match e.root_cause() {
            binrw::Error::NoVariantMatch { .. } | binrw::Error::EnumErrors { .. } => {
                UniformIssue::UnknownValue
            }
            binrw::Error::AssertFail { .. } => UniformIssue::TooManyDefaultValues,
            _ => UniformIssue::Other,
        }
    }
}

/// A structurally invalid file.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("expected at least {expected} bytes but found {actual}")]
    TooShort { expected: u64, actual: u64 },

    #[error("invalid magic {found:?}, expected {expected:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("unsupported format version {version}, supported versions are {supported:?}")]
    UnsupportedVersion { version: u32, supported: Vec<u32> },

    #[error("declared file size {declared} exceeds the available {actual} bytes")]
    Truncated { declared: u64, actual: u64 },

    #[error("declared file size {declared} is smaller than the minimum of {minimum} bytes")]
    InvalidFileSize { declared: u64, minimum: u64 },

    #[error("section table at {offset} with {count} entries does not fit in {end} bytes")]
    TableOutOfBounds { offset: u64, count: u32, end: u64 },

    #[error("section {index} at {offset} with size {size} does not fit in {end} bytes")]
    SectionOutOfBounds {
        index: usize,
        offset: u64,
        size: u64,
        end: u64,
    },

    #[error("expected exactly one {role} shader section but found {count}")]
    SectionCount { role: ShaderRole, count: usize },

    #[error("{current} overlaps {next}")]
    OverlappingRanges {
        current: OffsetRange,
        next: OffsetRange,
    },

    #[error("{role} shader name is empty")]
    EmptyName { role: ShaderRole },

    #[error("{role} shader name length {len} exceeds the maximum of {max}")]
    NameTooLong { role: ShaderRole, len: u64, max: u32 },

    #[error("{role} shader content length {len} exceeds the maximum of {max}")]
    ContentTooLong { role: ShaderRole, len: u64, max: u32 },

    #[error("{role} shader section size {declared} does not match its encoded size {actual}")]
    SectionSize {
        role: ShaderRole,
        declared: u64,
        actual: u64,
    },

    #[error("unexpected end of data at byte {position} reading {context}")]
    UnexpectedEnd { position: u64, context: &'static str },

    #[error("{role} shader content is missing its NUL terminator")]
    MissingTerminator { role: ShaderRole },

    #[error("{role} shader references uniform {index} but only {count} uniforms are declared")]
    UniformIndex {
        role: ShaderRole,
        index: u32,
        count: usize,
    },

    #[error("invalid uniform {index} at byte {position}: {reason}")]
    Uniform {
        index: u32,
        position: u64,
        reason: UniformIssue,
    },

    #[error("error reading data: {0}")]
    Binrw(#[from] binrw::Error),
}

/// The stored checksum does not match the checksum of the file contents.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("checksum mismatch: stored {stored:#010x} but contents hash to {computed:#010x}")]
pub struct IntegrityError {
    pub stored: u32,
    pub computed: u32,
}

/// Shader text that cannot be represented in a [TextEncoding].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{role} shader {field} is not valid {encoding}: {issue} at byte {position}")]
pub struct EncodingError {
    pub role: ShaderRole,
    pub field: TextField,
    pub encoding: TextEncoding,
    pub issue: EncodingIssue,
    /// The byte index of the first unrepresentable character.
    pub position: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextField {
    Name,
    Content,
}

impl std::fmt::Display for TextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextField::Name => write!(f, "name"),
            TextField::Content => write!(f, "content"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EncodingIssue {
    InvalidSequence,
    UnsupportedCharacter(char),
    /// NUL terminated text cannot contain NUL.
    InteriorNul,
}

impl std::fmt::Display for EncodingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingIssue::InvalidSequence => write!(f, "invalid byte sequence"),
            EncodingIssue::UnsupportedCharacter(c) => write!(f, "unsupported character {c:?}"),
            EncodingIssue::InteriorNul => write!(f, "interior NUL character"),
        }
    }
}

/// A caller supplied shader section that the format cannot store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected a {expected} shader section but found a {found} shader section")]
    RoleMismatch {
        expected: ShaderRole,
        found: ShaderRole,
    },

    #[error("{role} shader name is empty")]
    EmptyName { role: ShaderRole },

    #[error("{role} shader name length {len} exceeds the maximum of {max}")]
    NameTooLong { role: ShaderRole, len: u64, max: u32 },

    #[error("{role} shader content length {len} exceeds the maximum of {max}")]
    ContentTooLong { role: ShaderRole, len: u64, max: u32 },

    #[error("file size {size} exceeds the maximum representable offset")]
    FileTooLarge { size: u64 },
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("invalid file: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl From<binrw::Error> for AnalyzeError {
    fn from(e: binrw::Error) -> Self {
        Self::Format(FormatError::Binrw(e))
    }
}

impl AnalyzeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzeError::Format(_) => ErrorKind::Format,
            AnalyzeError::Integrity(_) => ErrorKind::Integrity,
            AnalyzeError::Encoding(_) => ErrorKind::Encoding,
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The preserved layout could not be serialized.
    #[error("error writing data: {0}")]
    Write(#[from] binrw::Error),
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Validation(_) => ErrorKind::Validation,
            BuildError::Encoding(_) => ErrorKind::Encoding,
            BuildError::Write(_) => ErrorKind::Format,
        }
    }
}
