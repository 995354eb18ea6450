//! The container layout with a header, section table, and optional checksum.
//!
//! # Layout
//! All values are little endian.
//!
//! | Offset | Size | Description |
//! | --- | --- | --- |
//! | 0 | 24 | [Header] |
//! | `table_offset` | 12 * `section_count` | [SectionEntry] for each section |
//! | varies | varies | section data, padding, and unknown data |
//! | `file_size - 4` | 4 | CRC-32 of all previous bytes if [HeaderFlags::has_checksum] |
//!
//! The checksum flag itself is only covered by the checksum when it is set.
//! Clearing the flag turns the stored CRC into unclaimed data at the end of the file,
//! so a file with a cleared flag is analyzed without any integrity check.
use bilge::prelude::*;
use binrw::{BinRead, BinWrite};

use crate::{ShaderRole, format::KshFormat, layout::Chunk};

#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
#[brw(little)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    pub flags: HeaderFlags,
    /// The size of the file including the checksum.
    pub file_size: u32,
    pub section_count: u32,
    /// The absolute offset of the first [SectionEntry].
    pub table_offset: u32,
}

#[bitsize(32)]
#[derive(DebugBits, FromBits, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
#[br(map = u32::into)]
#[bw(map = |&x| u32::from(x))]
pub struct HeaderFlags {
    pub has_checksum: bool,
    pub unk: u31,
}

#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
#[brw(little)]
pub struct SectionEntry {
    #[br(map = |x: u32| SectionKind::from(x))]
    #[bw(map = |k: &SectionKind| u32::from(*k))]
    pub kind: SectionKind,
    /// The absolute offset of the section data.
    pub offset: u32,
    /// The size of the section data in bytes.
    pub size: u32,
}

/// The type tag of a [SectionEntry].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SectionKind {
    Vertex,
    Pixel,
    /// An unknown tag. The data is copied without being interpreted.
    Opaque(u32),
}

impl From<u32> for SectionKind {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Vertex,
            2 => Self::Pixel,
            v => Self::Opaque(v),
        }
    }
}

impl From<SectionKind> for u32 {
    fn from(value: SectionKind) -> Self {
        match value {
            SectionKind::Vertex => 1,
            SectionKind::Pixel => 2,
            SectionKind::Opaque(v) => v,
        }
    }
}

impl SectionKind {
    pub fn role(&self) -> Option<ShaderRole> {
        match self {
            SectionKind::Vertex => Some(ShaderRole::Vertex),
            SectionKind::Pixel => Some(ShaderRole::Pixel),
            SectionKind::Opaque(_) => None,
        }
    }
}

impl From<ShaderRole> for SectionKind {
    fn from(value: ShaderRole) -> Self {
        match value {
            ShaderRole::Vertex => Self::Vertex,
            ShaderRole::Pixel => Self::Pixel,
        }
    }
}

/// A section table entry without its offset and size.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) enum PreservedSection {
    /// Data is replaced by the shader passed to the builder.
    Shader(ShaderRole),
    Opaque { kind: u32, data: Vec<u8> },
}

impl PreservedSection {
    pub fn kind(&self) -> SectionKind {
        match self {
            PreservedSection::Shader(role) => (*role).into(),
            PreservedSection::Opaque { kind, .. } => SectionKind::Opaque(*kind),
        }
    }
}

/// The structure of a container file excluding shader names and content.
#[derive(Debug, PartialEq, Clone)]
pub struct ContainerLayout {
    /// The original header. Offsets and sizes are recalculated when building.
    pub(crate) header: Header,
    /// Sections in table order.
    pub(crate) sections: Vec<PreservedSection>,
    /// Every byte of the declared file excluding the checksum in file order.
    pub(crate) chunks: Vec<Chunk>,
    /// Bytes after the declared file size.
    pub(crate) trailing: Vec<u8>,
}

impl ContainerLayout {
    /// A header and table followed by the vertex and pixel shader with a checksum.
    pub fn new(format: &KshFormat) -> Self {
        Self {
            header: Header {
                magic: format.magic,
                version: format.version,
                flags: HeaderFlags::new(true, u31::new(0)),
                file_size: 0,
                section_count: 2,
                table_offset: crate::format::HEADER_SIZE as u32,
            },
            sections: vec![
                PreservedSection::Shader(ShaderRole::Vertex),
                PreservedSection::Shader(ShaderRole::Pixel),
            ],
            chunks: vec![
                Chunk::Header,
                Chunk::Table,
                Chunk::Section(0),
                Chunk::Section(1),
            ],
            trailing: Vec::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn has_checksum(&self) -> bool {
        self.header.flags.has_checksum()
    }

    /// The section kinds in table order.
    pub fn section_kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind()).collect()
    }

    /// The data for each section with an unknown kind in table order.
    pub fn opaque_sections(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.sections.iter().filter_map(|s| match s {
            PreservedSection::Opaque { kind, data } => Some((*kind, data.as_slice())),
            PreservedSection::Shader(_) => None,
        })
    }

    /// Bytes stored after the declared file size.
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }
}
