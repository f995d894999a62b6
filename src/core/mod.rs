pub mod clock;
pub mod context;
pub mod dimensions;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matrix;
pub mod pixel_buffer;
pub mod shader_program;

pub use clock::{Clock, FpsCounter};
pub use context::{ContextProvider, DrawError, GraphicsContext, ShaderStage, SurfaceRef};
pub use dimensions::{SurfaceDimensions, CHANNELS};
pub use engine::{LocationTable, PixelEngine, RenderStats, UNIT_QUAD};
pub use error::{EngineError, EnvironmentError, Result};
pub use loader::{FileLoader, SourceLoader, SourceResponse};
pub use pixel_buffer::{Pixel, PixelBuffer};
