pub mod backend;
pub mod cli;
pub mod core;
pub mod demo;
pub mod logging;

pub use backend::{ContextConfig, SurfaceRegistry, WgpuContext};
pub use crate::core::{
    EngineError, EnvironmentError, FileLoader, Pixel, PixelEngine, RenderStats, SourceLoader,
    SourceResponse, SurfaceRef,
};
