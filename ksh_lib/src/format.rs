//! Format constants shared by the analyzer and builder.
//!
//! Limits live in a [KshFormat] value instead of globals so that files using
//! different magic values, versions, or limits can be handled side by side.

/// The size in bytes of the container [Header](crate::container::Header).
pub const HEADER_SIZE: u64 = 24;

/// The size in bytes of a single [SectionEntry](crate::container::SectionEntry).
pub const SECTION_ENTRY_SIZE: u64 = 12;

/// The size in bytes of the CRC-32 trailer.
pub const CHECKSUM_SIZE: u64 = 4;

/// The default container magic.
pub const MAGIC: [u8; 4] = *b"KSHC";

/// The container version written for new files.
pub const VERSION: u32 = 1;

/// Immutable limits and identifiers for a single container format revision.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KshFormat {
    /// The four bytes at the start of every container file.
    pub magic: [u8; 4],
    /// The version written by [KshDocument::new](crate::KshDocument::new).
    pub version: u32,
    /// Versions accepted by the analyzer.
    /// Unknown versions are rejected rather than interpreted as the closest match.
    pub supported_versions: Vec<u32>,
    /// The maximum length in bytes of an encoded shader name.
    pub max_name_len: u32,
    /// The maximum length in bytes of encoded shader content.
    pub max_content_len: u32,
    pub encoding: TextEncoding,
}

impl Default for KshFormat {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            supported_versions: vec![VERSION],
            max_name_len: 255,
            max_content_len: 16 * 1024 * 1024,
            encoding: TextEncoding::Utf8,
        }
    }
}

impl KshFormat {
    pub fn supports_version(&self, version: u32) -> bool {
        self.supported_versions.contains(&version)
    }
}

/// The character set used for shader names and content.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextEncoding {
    Utf8,
    /// 7-bit ASCII only.
    Ascii,
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "UTF-8"),
            TextEncoding::Ascii => write!(f, "ASCII"),
        }
    }
}
