use std::io::{Cursor, Write};

use binrw::{BinWrite, BinWriterExt};
use log::trace;

use crate::{
    Preserved, ShaderRole, ShaderSection,
    container::{ContainerLayout, Header, PreservedSection, SectionEntry},
    error::{BuildError, TextField, ValidationError},
    format::{CHECKSUM_SIZE, HEADER_SIZE, KshFormat, SECTION_ENTRY_SIZE},
    layout::Chunk,
    legacy::build_legacy,
    text::check_text,
};

/// Create a complete file from `preserved` with new vertex and pixel shaders.
///
/// The output only depends on the inputs,
/// so building an unmodified document reproduces the analyzed bytes.
pub fn build(
    format: &KshFormat,
    preserved: &Preserved,
    vs: &ShaderSection,
    ps: &ShaderSection,
) -> Result<Vec<u8>, BuildError> {
    validate_section(format, vs, ShaderRole::Vertex)?;
    validate_section(format, ps, ShaderRole::Pixel)?;

    match preserved {
        Preserved::Container(layout) => build_container(layout, vs, ps),
        Preserved::Legacy(layout) => build_legacy(format, layout, vs, ps),
    }
}

fn validate_section(
    format: &KshFormat,
    section: &ShaderSection,
    role: ShaderRole,
) -> Result<(), BuildError> {
    if section.role != role {
        return Err(ValidationError::RoleMismatch {
            expected: role,
            found: section.role,
        }
        .into());
    }

    if section.name.is_empty() {
        return Err(ValidationError::EmptyName { role }.into());
    }

    let name_len = section.name.len() as u64;
    if name_len > format.max_name_len as u64 {
        return Err(ValidationError::NameTooLong {
            role,
            len: name_len,
            max: format.max_name_len,
        }
        .into());
    }

    let content_len = section.content.len() as u64;
    if content_len > format.max_content_len as u64 {
        return Err(ValidationError::ContentTooLong {
            role,
            len: content_len,
            max: format.max_content_len,
        }
        .into());
    }

    check_text(&section.name, format.encoding, role, TextField::Name)?;
    check_text(&section.content, format.encoding, role, TextField::Content)?;
    Ok(())
}

fn build_container(
    layout: &ContainerLayout,
    vs: &ShaderSection,
    ps: &ShaderSection,
) -> Result<Vec<u8>, BuildError> {
    let vs_data = shader_section_bytes(vs)?;
    let ps_data = shader_section_bytes(ps)?;

    let section_data: Vec<&[u8]> = layout
        .sections
        .iter()
        .map(|section| match section {
            PreservedSection::Shader(ShaderRole::Vertex) => vs_data.as_slice(),
            PreservedSection::Shader(ShaderRole::Pixel) => ps_data.as_slice(),
            PreservedSection::Opaque { data, .. } => data.as_slice(),
        })
        .collect();

    let table_size = layout.sections.len() as u64 * SECTION_ENTRY_SIZE;
    let chunk_size = |chunk: &Chunk| -> u64 {
        match chunk {
            Chunk::Header => HEADER_SIZE,
            Chunk::Table => table_size,
            Chunk::Section(i) => section_data[*i].len() as u64,
            Chunk::Raw(bytes) => bytes.len() as u64,
        }
    };

    // Calculate the new position of everything first since the header
    // and table come before the data they describe.
    let mut position = 0;
    let mut table_offset = 0;
    let mut section_offsets = vec![0; layout.sections.len()];
    for chunk in &layout.chunks {
        match chunk {
            Chunk::Table => table_offset = position,
            Chunk::Section(i) => section_offsets[*i] = position,
            Chunk::Header | Chunk::Raw(_) => (),
        }
        position += chunk_size(chunk);
    }

    let trailer_size = if layout.has_checksum() {
        CHECKSUM_SIZE
    } else {
        0
    };
    let size = position + trailer_size;
    let file_size = u32::try_from(size).map_err(|_| ValidationError::FileTooLarge { size })?;

    let mut writer = Cursor::new(Vec::with_capacity(size as usize + layout.trailing.len()));
    for chunk in &layout.chunks {
        match chunk {
            Chunk::Header => {
                let header = Header {
                    file_size,
                    table_offset: table_offset as u32,
                    ..layout.header
                };
                trace!("{header:?}");
                header.write(&mut writer)?;
            }
            Chunk::Table => {
                for (i, section) in layout.sections.iter().enumerate() {
                    SectionEntry {
                        kind: section.kind(),
                        offset: section_offsets[i] as u32,
                        size: section_data[i].len() as u32,
                    }
                    .write(&mut writer)?;
                }
            }
            Chunk::Section(i) => writer
                .write_all(section_data[*i])
                .map_err(binrw::Error::Io)?,
            Chunk::Raw(bytes) => writer.write_all(bytes).map_err(binrw::Error::Io)?,
        }
    }

    let mut bytes = writer.into_inner();
    if layout.has_checksum() {
        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());
    }
    bytes.extend_from_slice(&layout.trailing);
    Ok(bytes)
}

/// The length prefixed name and content for a validated section.
fn shader_section_bytes(section: &ShaderSection) -> Result<Vec<u8>, BuildError> {
    let mut writer = Cursor::new(Vec::new());
    writer.write_le(&(section.name.len() as u32))?;
    writer
        .write_all(section.name.as_bytes())
        .map_err(binrw::Error::Io)?;
    writer.write_le(&(section.content.len() as u32))?;
    writer
        .write_all(section.content.as_bytes())
        .map_err(binrw::Error::Io)?;
    Ok(writer.into_inner())
}
