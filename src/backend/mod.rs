pub mod reflect;
pub mod registry;
pub mod wgpu_context;

pub use registry::SurfaceRegistry;
pub use wgpu_context::{ContextConfig, WgpuContext, WgpuProgram, WgpuShader, WgpuTexture, WgpuUniform};
