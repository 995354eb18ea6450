use std::io::{Cursor, Seek, SeekFrom};

use binrw::BinRead;
use log::{debug, trace};

use crate::{
    KshDocument, Preserved, ShaderRole, ShaderSection,
    container::{ContainerLayout, Header, PreservedSection, SectionEntry},
    error::{AnalyzeError, FormatError, IntegrityError, TextField},
    format::{CHECKSUM_SIZE, HEADER_SIZE, KshFormat, SECTION_ENTRY_SIZE},
    layout::{OffsetRange, RangeKind, partition},
    read_bytes, read_u32,
    text::decode_text,
};

/// Decode a container file into its shader sections and preserved data.
///
/// Structural checks happen before the checksum, which happens before
/// interpreting anything after the header.
pub fn analyze(format: &KshFormat, bytes: &[u8]) -> Result<KshDocument, AnalyzeError> {
    let len = bytes.len() as u64;
    if len < HEADER_SIZE {
        return Err(FormatError::TooShort {
            expected: HEADER_SIZE,
            actual: len,
        }
        .into());
    }

    let mut reader = Cursor::new(bytes);
    let header = Header::read(&mut reader)?;
    trace!("{header:?}");

    if header.magic != format.magic {
        return Err(FormatError::BadMagic {
            expected: format.magic,
            found: header.magic,
        }
        .into());
    }

    if !format.supports_version(header.version) {
        return Err(FormatError::UnsupportedVersion {
            version: header.version,
            supported: format.supported_versions.clone(),
        }
        .into());
    }

    let declared = header.file_size as u64;
    if declared > len {
        return Err(FormatError::Truncated {
            declared,
            actual: len,
        }
        .into());
    }

    let has_checksum = header.flags.has_checksum();
    let trailer_size = if has_checksum { CHECKSUM_SIZE } else { 0 };
    let minimum = HEADER_SIZE + trailer_size;
    if declared < minimum {
        return Err(FormatError::InvalidFileSize { declared, minimum }.into());
    }

    // The checksum covers everything before the trailer.
    let body_end = declared - trailer_size;
    if has_checksum {
        check_checksum(bytes, body_end)?;
    }

    let entries = read_section_table(&mut reader, &header, body_end)?;

    for (index, entry) in entries.iter().enumerate() {
        let offset = entry.offset as u64;
        let size = entry.size as u64;
        if offset + size > body_end {
            return Err(FormatError::SectionOutOfBounds {
                index,
                offset,
                size,
                end: body_end,
            }
            .into());
        }
    }

    for role in [ShaderRole::Vertex, ShaderRole::Pixel] {
        let count = entries
            .iter()
            .filter(|e| e.kind.role() == Some(role))
            .count();
        if count != 1 {
            return Err(FormatError::SectionCount { role, count }.into());
        }
    }

    let table_offset = header.table_offset as u64;
    let mut ranges = vec![
        OffsetRange {
            start: 0,
            end: HEADER_SIZE,
            kind: RangeKind::Header,
        },
        OffsetRange {
            start: table_offset,
            end: table_offset + entries.len() as u64 * SECTION_ENTRY_SIZE,
            kind: RangeKind::Table,
        },
    ];
    ranges.extend(entries.iter().enumerate().map(|(i, e)| OffsetRange {
        start: e.offset as u64,
        end: e.offset as u64 + e.size as u64,
        kind: RangeKind::Section(i),
    }));
    let chunks = partition(&ranges, bytes, body_end)?;

    let mut vs = None;
    let mut ps = None;
    let mut sections = Vec::new();
    for entry in &entries {
        let data = &bytes[entry.offset as usize..entry.offset as usize + entry.size as usize];
        match entry.kind.role() {
            Some(role) => {
                let section = read_shader_section(format, role, data)?;
                match role {
                    ShaderRole::Vertex => vs = Some(section),
                    ShaderRole::Pixel => ps = Some(section),
                }
                sections.push(PreservedSection::Shader(role));
            }
            None => sections.push(PreservedSection::Opaque {
                kind: entry.kind.into(),
                data: data.to_vec(),
            }),
        }
    }

    let trailing = bytes[declared as usize..].to_vec();
    if !trailing.is_empty() {
        debug!(
            "Preserving {} bytes after declared file size {declared}",
            trailing.len()
        );
    }

    let vs = vs.ok_or(FormatError::SectionCount {
        role: ShaderRole::Vertex,
        count: 0,
    })?;
    let ps = ps.ok_or(FormatError::SectionCount {
        role: ShaderRole::Pixel,
        count: 0,
    })?;

    Ok(KshDocument {
        vs,
        ps,
        preserved: Preserved::Container(ContainerLayout {
            header,
            sections,
            chunks,
            trailing,
        }),
    })
}

fn check_checksum(bytes: &[u8], body_end: u64) -> Result<(), IntegrityError> {
    let end = body_end as usize;
    let stored = u32::from_le_bytes([bytes[end], bytes[end + 1], bytes[end + 2], bytes[end + 3]]);
    let computed = crc32fast::hash(&bytes[..end]);
    if stored != computed {
        Err(IntegrityError { stored, computed })
    } else {
        Ok(())
    }
}

fn read_section_table(
    reader: &mut Cursor<&[u8]>,
    header: &Header,
    body_end: u64,
) -> Result<Vec<SectionEntry>, AnalyzeError> {
    let offset = header.table_offset as u64;
    let count = header.section_count;

    // Check the size before reading to avoid allocating for invalid counts.
    let table_end = offset + count as u64 * SECTION_ENTRY_SIZE;
    if offset < HEADER_SIZE || table_end > body_end {
        return Err(FormatError::TableOutOfBounds {
            offset,
            count,
            end: body_end,
        }
        .into());
    }

    reader
        .seek(SeekFrom::Start(offset))
        .map_err(binrw::Error::Io)?;
    let entries = (0..count)
        .map(|_| SectionEntry::read(&mut *reader))
        .collect::<binrw::BinResult<Vec<_>>>()?;
    trace!("{entries:?}");
    Ok(entries)
}

/// Decode the length prefixed name and content filling all of `data`.
fn read_shader_section(
    format: &KshFormat,
    role: ShaderRole,
    data: &[u8],
) -> Result<ShaderSection, AnalyzeError> {
    let mut reader = Cursor::new(data);

    let name_len = read_u32(&mut reader, "shader name length")?;
    if name_len == 0 {
        return Err(FormatError::EmptyName { role }.into());
    }
    if name_len > format.max_name_len {
        return Err(FormatError::NameTooLong {
            role,
            len: name_len as u64,
            max: format.max_name_len,
        }
        .into());
    }
    let name = read_bytes(&mut reader, name_len as u64, "shader name")?;

    let content_len = read_u32(&mut reader, "shader content length")?;
    if content_len > format.max_content_len {
        return Err(FormatError::ContentTooLong {
            role,
            len: content_len as u64,
            max: format.max_content_len,
        }
        .into());
    }
    let content = read_bytes(&mut reader, content_len as u64, "shader content")?;

    let actual = reader.position();
    if actual != data.len() as u64 {
        return Err(FormatError::SectionSize {
            role,
            declared: data.len() as u64,
            actual,
        }
        .into());
    }

    Ok(ShaderSection {
        role,
        name: decode_text(name, format.encoding, role, TextField::Name)?,
        content: decode_text(content, format.encoding, role, TextField::Content)?,
    })
}
