use thiserror::Error;

#[derive(Debug, Error)]
pub enum NnsError {
    #[error("unsupported file version {found} (expected {expected})")]
    UnsupportedVersion { found: i32, expected: i32 },

    #[error("truncated file: {section} needs {needed} bytes, {available} available")]
    TruncatedFile {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("invalid {section} count: {count}")]
    InvalidCount { section: &'static str, count: i32 },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("adjacency and admittance disagree on {mismatches} entries")]
    InconsistentState { mismatches: usize },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NnsError>;
