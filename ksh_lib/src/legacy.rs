//! The headerless layout used by Don't Starve Together.
//!
//! # Layout
//! All values are little endian. Strings are a `u32` length followed by the bytes.
//!
//! | Description |
//! | --- |
//! | file name string |
//! | `u32` uniform count followed by each [Uniform] |
//! | vertex shader name string |
//! | vertex shader content string including a NUL terminator |
//! | pixel shader name string |
//! | pixel shader content string including a NUL terminator |
//! | `u32` count followed by `u32` uniform indices used by the vertex shader |
//! | `u32` count followed by `u32` uniform indices used by the pixel shader |
//!
//! The uniform table depends on the shader source, which is not parsed.
//! Everything outside the two shaders is preserved unmodified when building.
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use binrw::{BinRead, BinResult, BinWriterExt, binread};
use log::debug;

use crate::{
    KshDocument, Preserved, ShaderRole, ShaderSection,
    error::{AnalyzeError, BuildError, FormatError, TextField, ValidationError},
    format::KshFormat,
    read_bytes, read_len_prefixed, read_u32, remaining,
    text::{check_nul_terminated, decode_text},
};

// The name length, scope, type, and array length.
const MIN_UNIFORM_SIZE: u64 = 16;

// Larger than any default value count written by the game's tools.
const MAX_DEFAULT_VALUES: u32 = 1024;

/// A uniform declaration shared by both shaders.
#[derive(Debug, BinRead, PartialEq, Clone)]
#[br(little)]
pub struct Uniform {
    #[br(parse_with = parse_uniform_name)]
    pub name: String,

    pub scope: UniformScope,

    pub data_type: UniformType,

    /// The number of array elements or `1` for non array uniforms.
    pub array_length: u32,

    /// Default values as raw `u32` words.
    /// Samplers have no default values.
    #[br(if(data_type != UniformType::Sampler2D))]
    pub default_data: Option<DefaultData>,
}

#[binread]
#[derive(Debug, PartialEq, Clone)]
#[br(little)]
pub struct DefaultData {
    #[br(temp, assert(count <= MAX_DEFAULT_VALUES))]
    count: u32,

    #[br(count = count)]
    pub values: Vec<u32>,
}

#[derive(Debug, BinRead, PartialEq, Eq, Clone, Copy)]
#[br(repr(u32))]
pub enum UniformScope {
    Uniform = 0,
}

#[derive(Debug, BinRead, PartialEq, Eq, Clone, Copy)]
#[br(repr(u32))]
pub enum UniformType {
    Float = 0,
    Vec2 = 2,
    Vec3 = 3,
    Vec4 = 4,
    Mat4 = 20,
    Sampler2D = 43,
}

impl UniformType {
    /// The number of default `u32` words for a non array uniform.
    pub fn default_data_len(&self) -> usize {
        match self {
            UniformType::Float => 1,
            UniformType::Vec2 => 2,
            UniformType::Vec3 => 3,
            UniformType::Vec4 => 4,
            UniformType::Mat4 => 16,
            UniformType::Sampler2D => 0,
        }
    }
}

// Check the length against the remaining bytes before allocating.
fn parse_uniform_name<R: Read + Seek>(
    reader: &mut R,
    endian: binrw::Endian,
    _args: (),
) -> BinResult<String> {
    let len = u32::read_options(reader, endian, ())?;

    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    if len as u64 > end - position {
        return Err(binrw::Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }

    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The structure of a legacy file excluding shader names and content.
#[derive(Debug, PartialEq, Clone)]
pub struct LegacyLayout {
    /// The file name and uniform table.
    prefix: Vec<u8>,
    /// The uniform references and any trailing bytes.
    suffix: Vec<u8>,
    file_name: String,
    uniforms: Vec<Uniform>,
    vs_uniforms: Vec<u32>,
    ps_uniforms: Vec<u32>,
}

impl LegacyLayout {
    /// A file with no uniforms and no uniform references.
    pub fn new(file_name: &str) -> Self {
        let mut prefix = Vec::new();
        prefix.extend_from_slice(&(file_name.len() as u32).to_le_bytes());
        prefix.extend_from_slice(file_name.as_bytes());
        prefix.extend_from_slice(&0u32.to_le_bytes());

        Self {
            prefix,
            suffix: [0u8; 8].to_vec(),
            file_name: file_name.to_string(),
            uniforms: Vec::new(),
            vs_uniforms: Vec::new(),
            ps_uniforms: Vec::new(),
        }
    }

    /// The name stored at the start of the file, usually the file stem.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    /// The names of the uniforms referenced by the shader for `role` in order.
    pub fn uniform_names(&self, role: ShaderRole) -> Vec<&str> {
        let indices = match role {
            ShaderRole::Vertex => &self.vs_uniforms,
            ShaderRole::Pixel => &self.ps_uniforms,
        };
        // Indices are validated when analyzing.
        indices
            .iter()
            .filter_map(|i| self.uniforms.get(*i as usize))
            .map(|u| u.name.as_str())
            .collect()
    }
}

/// Decode a legacy file into its shader sections and preserved data.
pub fn analyze_legacy(format: &KshFormat, bytes: &[u8]) -> Result<KshDocument, AnalyzeError> {
    let mut reader = Cursor::new(bytes);

    let file_name = read_len_prefixed(&mut reader, "file name")?;
    let file_name = String::from_utf8_lossy(file_name).into_owned();

    let uniform_count = read_u32(&mut reader, "uniform count")?;
    if uniform_count as u64 * MIN_UNIFORM_SIZE > remaining(&reader) {
        return Err(FormatError::UnexpectedEnd {
            position: reader.position(),
            context: "uniforms",
        }
        .into());
    }
    let uniforms = (0..uniform_count)
        .map(|index| {
            let position = reader.position();
            Uniform::read(&mut reader).map_err(|e| FormatError::Uniform {
                index,
                position,
                reason: (&e).into(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!("{file_name}: {} uniforms", uniforms.len());

    let shaders_start = reader.position() as usize;
    let vs = read_shader(format, ShaderRole::Vertex, &mut reader)?;
    let ps = read_shader(format, ShaderRole::Pixel, &mut reader)?;
    let shaders_end = reader.position() as usize;

    let vs_uniforms = read_uniform_indices(&mut reader, ShaderRole::Vertex, uniforms.len())?;
    let ps_uniforms = read_uniform_indices(&mut reader, ShaderRole::Pixel, uniforms.len())?;

    let trailing = remaining(&reader);
    if trailing > 0 {
        debug!("Preserving {trailing} bytes after uniform references");
    }

    Ok(KshDocument {
        vs,
        ps,
        preserved: Preserved::Legacy(LegacyLayout {
            prefix: bytes[..shaders_start].to_vec(),
            suffix: bytes[shaders_end..].to_vec(),
            file_name,
            uniforms,
            vs_uniforms,
            ps_uniforms,
        }),
    })
}

fn read_shader(
    format: &KshFormat,
    role: ShaderRole,
    reader: &mut Cursor<&[u8]>,
) -> Result<ShaderSection, AnalyzeError> {
    let name_len = read_u32(reader, "shader name length")?;
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
    let name = read_bytes(reader, name_len as u64, "shader name")?;

    // The stored length includes the NUL terminator.
    let stored_len = read_u32(reader, "shader content length")?;
    if stored_len == 0 {
        return Err(FormatError::MissingTerminator { role }.into());
    }
    let content_len = stored_len - 1;
    if content_len > format.max_content_len {
        return Err(FormatError::ContentTooLong {
            role,
            len: content_len as u64,
            max: format.max_content_len,
        }
        .into());
    }
    let content = read_bytes(reader, stored_len as u64, "shader content")?;
    let (terminator, content) = content
        .split_last()
        .ok_or(FormatError::MissingTerminator { role })?;
    if *terminator != 0 {
        return Err(FormatError::MissingTerminator { role }.into());
    }

    let content = decode_text(content, format.encoding, role, TextField::Content)?;
    check_nul_terminated(&content, format.encoding, role, TextField::Content)?;

    Ok(ShaderSection {
        role,
        name: decode_text(name, format.encoding, role, TextField::Name)?,
        content,
    })
}

fn read_uniform_indices(
    reader: &mut Cursor<&[u8]>,
    role: ShaderRole,
    uniform_count: usize,
) -> Result<Vec<u32>, FormatError> {
    let count = read_u32(reader, "uniform reference count")?;
    if count as u64 * 4 > remaining(reader) {
        return Err(FormatError::UnexpectedEnd {
            position: reader.position(),
            context: "uniform references",
        });
    }

    (0..count)
        .map(|_| {
            let index = read_u32(reader, "uniform reference")?;
            if index as usize >= uniform_count {
                Err(FormatError::UniformIndex {
                    role,
                    index,
                    count: uniform_count,
                })
            } else {
                Ok(index)
            }
        })
        .collect()
}

pub(crate) fn build_legacy(
    format: &KshFormat,
    layout: &LegacyLayout,
    vs: &ShaderSection,
    ps: &ShaderSection,
) -> Result<Vec<u8>, BuildError> {
    let mut writer = Cursor::new(Vec::new());
    writer.get_mut().extend_from_slice(&layout.prefix);
    writer.set_position(layout.prefix.len() as u64);

    for section in [vs, ps] {
        write_shader(format, section, &mut writer)?;
    }

    let mut bytes = writer.into_inner();
    bytes.extend_from_slice(&layout.suffix);
    Ok(bytes)
}

fn write_shader(
    format: &KshFormat,
    section: &ShaderSection,
    writer: &mut Cursor<Vec<u8>>,
) -> Result<(), BuildError> {
    check_nul_terminated(
        &section.content,
        format.encoding,
        section.role,
        TextField::Content,
    )?;

    let stored_len = u32::try_from(section.content.len() + 1).map_err(|_| {
        ValidationError::ContentTooLong {
            role: section.role,
            len: section.content.len() as u64,
            max: format.max_content_len,
        }
    })?;

    writer.write_le(&(section.name.len() as u32))?;
    writer
        .write_all(section.name.as_bytes())
        .map_err(binrw::Error::Io)?;
    writer.write_le(&stored_len)?;
    writer
        .write_all(section.content.as_bytes())
        .map_err(binrw::Error::Io)?;
    writer.write_le(&0u8)?;
    Ok(())
}
