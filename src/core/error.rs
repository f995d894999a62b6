use thiserror::Error;

use super::context::ShaderStage;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures while acquiring the drawing surface or graphics context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("surface '{0}' not found")]
    SurfaceNotFound(String),

    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Every failure the engine reports. None of these cross the public API as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error("failed to load shader source '{locator}' (status {status})")]
    ShaderLoad { locator: String, status: u16 },

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    ProgramLink { log: String },

    #[error("linked program has no {kind} named '{name}'")]
    MissingLocation { kind: &'static str, name: String },

    #[error("pixel data is {actual} bytes, surface needs exactly {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("engine is not ready: {0}")]
    NotReady(&'static str),
}

impl EngineError {
    /// Recoverable errors leave the engine fully usable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::DimensionMismatch { .. })
    }
}
