use crate::{
    analyze::analyze,
    build::build,
    container::ContainerLayout,
    error::{AnalyzeError, BuildError},
    format::KshFormat,
    legacy::{LegacyLayout, analyze_legacy},
};

/// The pipeline stage of a [ShaderSection].
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ShaderRole {
    Vertex,
    /// Also called a fragment shader.
    Pixel,
}

impl std::fmt::Display for ShaderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderRole::Vertex => write!(f, "vertex"),
            ShaderRole::Pixel => write!(f, "pixel"),
        }
    }
}

/// A named shader program stored as source text.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ShaderSection {
    pub role: ShaderRole,
    /// A short label like the original file name `anim.vs`.
    pub name: String,
    /// The shader source. This is never compiled or validated.
    pub content: String,
}

impl ShaderSection {
    pub fn new(role: ShaderRole, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn vertex(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(ShaderRole::Vertex, name, content)
    }

    pub fn pixel(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(ShaderRole::Pixel, name, content)
    }
}

/// Everything in a file that is not shader name or content data.
///
/// The builder only needs this and two [ShaderSection] to recreate the file.
#[derive(Debug, PartialEq, Clone)]
pub enum Preserved {
    /// A file starting with the container magic.
    Container(ContainerLayout),
    /// The headerless layout used by Don't Starve Together.
    Legacy(LegacyLayout),
}

impl Preserved {
    /// The minimal container skeleton for `format` with no extra sections.
    pub fn container(format: &KshFormat) -> Self {
        Self::Container(ContainerLayout::new(format))
    }

    /// The minimal legacy skeleton with no uniforms.
    pub fn legacy(file_name: &str) -> Self {
        Self::Legacy(LegacyLayout::new(file_name))
    }
}

/// A decoded `.ksh` file with exactly one vertex and one pixel shader.
#[derive(Debug, PartialEq, Clone)]
pub struct KshDocument {
    pub vs: ShaderSection,
    pub ps: ShaderSection,
    pub preserved: Preserved,
}

impl KshDocument {
    /// Create a new container file for `format`.
    pub fn new(format: &KshFormat, vs: ShaderSection, ps: ShaderSection) -> Self {
        Self {
            vs,
            ps,
            preserved: Preserved::container(format),
        }
    }

    /// Create a new legacy file. The `file_name` is usually the output file stem.
    pub fn new_legacy(file_name: &str, vs: ShaderSection, ps: ShaderSection) -> Self {
        Self {
            vs,
            ps,
            preserved: Preserved::legacy(file_name),
        }
    }

    /// Analyze `bytes` as a container if it starts with the format magic
    /// and as a legacy file otherwise.
    pub fn from_bytes<T: AsRef<[u8]>>(format: &KshFormat, bytes: T) -> Result<Self, AnalyzeError> {
        let bytes = bytes.as_ref();
        if bytes.starts_with(&format.magic) {
            analyze(format, bytes)
        } else {
            analyze_legacy(format, bytes)
        }
    }

    /// Build the file using the document's own shader sections.
    pub fn to_bytes(&self, format: &KshFormat) -> Result<Vec<u8>, BuildError> {
        build(format, &self.preserved, &self.vs, &self.ps)
    }

    pub fn section(&self, role: ShaderRole) -> &ShaderSection {
        match role {
            ShaderRole::Vertex => &self.vs,
            ShaderRole::Pixel => &self.ps,
        }
    }
}
