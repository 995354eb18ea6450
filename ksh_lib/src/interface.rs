//! Serializable request and response types for front ends.
//!
//! These mirror the commands exposed by the shader editor.
//! File access is left to the caller.
use serde::{Deserialize, Serialize};

use crate::{
    KshDocument, Preserved, ShaderSection,
    error::{AnalyzeError, BuildError},
    format::KshFormat,
};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ShaderInfo {
    pub name: String,
    pub content: String,
}

impl From<&ShaderSection> for ShaderInfo {
    fn from(section: &ShaderSection) -> Self {
        Self {
            name: section.name.clone(),
            content: section.content.clone(),
        }
    }
}

/// The shaders of an analyzed file.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AnalyzeOutput {
    pub vs: ShaderInfo,
    pub ps: ShaderInfo,
}

impl From<&KshDocument> for AnalyzeOutput {
    fn from(document: &KshDocument) -> Self {
        Self {
            vs: (&document.vs).into(),
            ps: (&document.ps).into(),
        }
    }
}

/// Analyze either layout and return only the shader names and content.
pub fn analyze_ksh(format: &KshFormat, bytes: &[u8]) -> Result<AnalyzeOutput, AnalyzeError> {
    KshDocument::from_bytes(format, bytes).map(|d| AnalyzeOutput::from(&d))
}

/// A request to build a file from edited shaders.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct BuildKshParams {
    /// The destination chosen by the user.
    pub output_path: String,
    pub vs_name: String,
    pub vs_content: String,
    pub ps_name: String,
    pub ps_content: String,
}

impl BuildKshParams {
    pub fn vs(&self) -> ShaderSection {
        ShaderSection::vertex(&self.vs_name, &self.vs_content)
    }

    pub fn ps(&self) -> ShaderSection {
        ShaderSection::pixel(&self.ps_name, &self.ps_content)
    }

    /// Build the bytes to write to [output_path](#structfield.output_path).
    pub fn build(&self, format: &KshFormat, preserved: &Preserved) -> Result<Vec<u8>, BuildError> {
        crate::build(format, preserved, &self.vs(), &self.ps())
    }
}
