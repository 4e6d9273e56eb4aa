// ============================================================================
// ERRORS — typed failures for rendering, intake and comparison
// ============================================================================

use std::fmt;

/// Which half of the program failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompileFailed { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {0}")]
    ProgramLinkFailed(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("rendering context lost: {0}")]
    ContextLost(String),
    #[error("export failed: {0}")]
    ExportFailed(String),
    #[error("renderer has been disposed")]
    Disposed,
}

/// Failures while accepting a source file.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("unsupported input type '{0}' (expected PNG or JPEG)")]
    Unsupported(String),
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("size mismatch: original is {original:?}, processed is {processed:?}")]
    SizeMismatch {
        original: (u32, u32),
        processed: (u32, u32),
    },
}
