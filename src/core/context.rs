use std::fmt;
use std::sync::Arc;

use winit::window::Window;

use super::dimensions::SurfaceDimensions;
use super::error::EnvironmentError;

/// Shader stage a source is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

/// How the caller names the drawing surface
#[derive(Clone)]
pub enum SurfaceRef {
    /// Looked up by identifier in the provider's registry
    Id(String),
    /// A window the caller already holds
    Window(Arc<Window>),
    /// Render into an offscreen texture that can be read back
    Offscreen,
}

impl fmt::Debug for SurfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceRef::Id(id) => f.debug_tuple("Id").field(id).finish(),
            SurfaceRef::Window(window) => f.debug_tuple("Window").field(&window.id()).finish(),
            SurfaceRef::Offscreen => f.write_str("Offscreen"),
        }
    }
}

impl From<&str> for SurfaceRef {
    fn from(id: &str) -> Self {
        SurfaceRef::Id(id.to_string())
    }
}

impl From<String> for SurfaceRef {
    fn from(id: String) -> Self {
        SurfaceRef::Id(id)
    }
}

impl From<Arc<Window>> for SurfaceRef {
    fn from(window: Arc<Window>) -> Self {
        SurfaceRef::Window(window)
    }
}

/// Resolves a surface and opens a graphics context sized to it
pub trait ContextProvider {
    type Context: GraphicsContext;

    fn acquire(
        &self,
        surface: &SurfaceRef,
        dims: SurfaceDimensions,
    ) -> Result<Self::Context, EnvironmentError>;
}

/// Outcome of a draw that could not be presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// Surface was reconfigured or timed out; the frame is dropped
    SkippedFrame(String),
    /// Device or surface is gone for good
    Fatal(String),
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::SkippedFrame(reason) => write!(f, "frame skipped: {reason}"),
            DrawError::Fatal(reason) => write!(f, "fatal draw error: {reason}"),
        }
    }
}

/// The narrow set of graphics calls the engine issues
///
/// Modelled on a GL-style context: stages are compiled separately, attached to a
/// program and linked; inputs are resolved to locations by name afterwards.
/// Compile and link failures carry the backend's diagnostic text.
pub trait GraphicsContext {
    type Texture;
    type Shader;
    type Program;
    type Buffer;
    type Uniform: Clone + fmt::Debug;

    fn viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// RGBA8 texture with clamp-to-edge wrapping, filled with `initial`
    fn create_texture(&mut self, dims: SurfaceDimensions, initial: &[u8]) -> Self::Texture;
    fn bind_texture(&mut self, unit: u32, texture: &Self::Texture);
    /// Replace the whole texture contents
    fn upload_texture(&mut self, texture: &Self::Texture, pixels: &[u8]);

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Self::Program;
    fn attach_shader(&mut self, program: &mut Self::Program, shader: &Self::Shader);
    fn link_program(&mut self, program: &mut Self::Program) -> Result<(), String>;
    fn delete_program(&mut self, program: Self::Program);
    fn use_program(&mut self, program: &Self::Program);

    fn attribute_location(&self, program: &Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<Self::Uniform>;

    /// Static buffer of 2D vertices
    fn create_vertex_buffer(&mut self, vertices: &[[f32; 2]]) -> Self::Buffer;
    fn bind_attribute(&mut self, location: u32, buffer: &Self::Buffer);

    /// Column-major 4x4 matrix
    fn set_uniform_matrix(&mut self, uniform: &Self::Uniform, matrix: &[f32; 16]);
    fn set_uniform_texture_unit(&mut self, uniform: &Self::Uniform, unit: u32);

    /// Draw `vertex_count` vertices as a triangle list with the active program
    fn draw_triangles(&mut self, vertex_count: u32) -> Result<(), DrawError>;
}
