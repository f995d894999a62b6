use std::time::{Duration, Instant};

use super::context::{ContextProvider, DrawError, GraphicsContext, SurfaceRef};
use super::dimensions::SurfaceDimensions;
use super::error::{EngineError, EnvironmentError, Result};
use super::loader::{FileLoader, SourceLoader};
use super::matrix;
use super::pixel_buffer::{Pixel, PixelBuffer};
use super::shader_program;

pub const ATTR_POSITION: &str = "position";
pub const ATTR_TEXCOORD: &str = "texcoord";
pub const UNIFORM_MATRIX: &str = "u_matrix";
pub const UNIFORM_IMAGE: &str = "u_image";

/// Texture unit the surface texture is bound to
pub const TEXTURE_UNIT: u32 = 0;

/// Two triangles over the unit square
pub const UNIT_QUAD: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
];

const QUAD_VERTEX_COUNT: u32 = UNIT_QUAD.len() as u32;

/// Shader inputs resolved once after linking
#[derive(Debug, Clone)]
pub struct LocationTable<U> {
    pub position: u32,
    pub texcoord: u32,
    pub matrix: U,
    pub image: U,
}

impl<U: Clone + std::fmt::Debug> LocationTable<U> {
    fn resolve<C>(ctx: &C, program: &C::Program) -> Result<Self>
    where
        C: GraphicsContext<Uniform = U>,
    {
        let attribute = |name: &str| {
            ctx.attribute_location(program, name).ok_or_else(|| EngineError::MissingLocation {
                kind: "attribute",
                name: name.to_string(),
            })
        };
        let uniform = |name: &str| {
            ctx.uniform_location(program, name).ok_or_else(|| EngineError::MissingLocation {
                kind: "uniform",
                name: name.to_string(),
            })
        };

        let table = Self {
            position: attribute(ATTR_POSITION)?,
            texcoord: attribute(ATTR_TEXCOORD)?,
            matrix: uniform(UNIFORM_MATRIX)?,
            image: uniform(UNIFORM_IMAGE)?,
        };
        log::debug!("Resolved shader locations: {:?}", table);
        Ok(table)
    }
}

// Held only so the backend keeps the buffers alive
#[allow(dead_code)]
struct QuadGeometry<B> {
    positions: B,
    texcoords: B,
}

/// Timing of the most recent render call
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    pub last_duration: Duration,
    pub last_ended: Option<Instant>,
    pub frames: u64,
}

impl RenderStats {
    fn record(&mut self, start: Instant, end: Instant) {
        self.last_duration = end.duration_since(start);
        self.last_ended = Some(end);
        self.frames += 1;
    }
}

/// Everything that exists only once the surface and context were acquired
struct GpuResources<C: GraphicsContext> {
    context: C,
    texture: C::Texture,
    #[allow(dead_code)]
    program: Option<C::Program>,
    locations: Option<LocationTable<C::Uniform>>,
    #[allow(dead_code)]
    geometry: Option<QuadGeometry<C::Buffer>>,
}

/// Per-pixel rendering engine
///
/// Lifecycle:
/// 1. [`PixelEngine::new`] acquires surface, context and texture (`is_safe`)
/// 2. [`PixelEngine::initialize`] builds the program, quad and matrix (`is_initialized`)
/// 3. per frame: write pixels, then [`PixelEngine::render`]
///
/// Failures never panic; they are logged and reported through the flags or a
/// returned [`EngineError`]. The per-pixel accessors are the exception: they
/// do not validate coordinates at all (see [`PixelBuffer`]).
pub struct PixelEngine<C: GraphicsContext> {
    buffer: PixelBuffer,
    requested: (u32, u32),
    gpu: Option<GpuResources<C>>,
    environment_error: Option<EnvironmentError>,
    init_attempted: bool,
    initialized: bool,
    stats: RenderStats,
}

impl<C: GraphicsContext> PixelEngine<C> {
    /// Acquire the surface and context and allocate the buffer and texture
    ///
    /// Never fails outright: if the surface cannot be resolved or no context
    /// can be created, the engine is returned with `is_safe() == false`.
    pub fn new<P>(provider: &P, surface: impl Into<SurfaceRef>, width: u32, height: u32) -> Self
    where
        P: ContextProvider<Context = C>,
    {
        let surface = surface.into();

        match Self::acquire(provider, &surface, width, height) {
            Ok(engine) => {
                log::info!("Pixel engine ready on {:?} ({}x{})", surface, width, height);
                engine
            }
            Err(e) => {
                log::error!("Cannot use surface {:?}: {}", surface, e);
                Self {
                    buffer: PixelBuffer::unallocated(),
                    requested: (width, height),
                    gpu: None,
                    environment_error: Some(e),
                    init_attempted: false,
                    initialized: false,
                    stats: RenderStats::default(),
                }
            }
        }
    }

    fn acquire<P>(
        provider: &P,
        surface: &SurfaceRef,
        width: u32,
        height: u32,
    ) -> std::result::Result<Self, EnvironmentError>
    where
        P: ContextProvider<Context = C>,
    {
        let dims = SurfaceDimensions::new(width, height)?;
        let mut context = provider.acquire(surface, dims)?;
        context.viewport(0, 0, width, height);

        let buffer = PixelBuffer::new(dims);
        let texture = context.create_texture(dims, buffer.pixels());
        log::debug!("Allocated {} byte pixel buffer and texture", buffer.len());

        Ok(Self {
            buffer,
            requested: (width, height),
            gpu: Some(GpuResources {
                context,
                texture,
                program: None,
                locations: None,
                geometry: None,
            }),
            environment_error: None,
            init_attempted: false,
            initialized: false,
            stats: RenderStats::default(),
        })
    }

    /// Load shader sources from the working directory and build the pipeline
    pub async fn initialize(&mut self, vertex: &str, fragment: &str) -> Result<()> {
        self.initialize_with(&FileLoader::current_dir(), vertex, fragment).await
    }

    /// Build the pipeline with shader sources fetched through `loader`
    ///
    /// Only one attempt is allowed per engine. After a failure the engine stays
    /// safe but can never render; construct a new one to retry.
    pub async fn initialize_with<L>(&mut self, loader: &L, vertex: &str, fragment: &str) -> Result<()>
    where
        L: SourceLoader + ?Sized,
    {
        let dims = self.buffer.dimensions();

        let Some(gpu) = self.gpu.as_mut() else {
            log::error!("initialize() called on an engine without a surface");
            return Err(EngineError::NotReady("surface and context were never acquired"));
        };
        if self.init_attempted {
            log::error!("initialize() called twice");
            return Err(EngineError::NotReady("initialize already ran on this engine"));
        }
        self.init_attempted = true;

        let program = shader_program::create_program(&mut gpu.context, loader, vertex, fragment).await?;
        gpu.context.use_program(&program);

        let locations = match LocationTable::resolve(&gpu.context, &program) {
            Ok(locations) => locations,
            Err(e) => {
                log::error!("{}", e);
                gpu.context.delete_program(program);
                return Err(e);
            }
        };

        let geometry = QuadGeometry {
            positions: gpu.context.create_vertex_buffer(&UNIT_QUAD),
            texcoords: gpu.context.create_vertex_buffer(&UNIT_QUAD),
        };
        gpu.context.bind_attribute(locations.position, &geometry.positions);
        gpu.context.bind_attribute(locations.texcoord, &geometry.texcoords);

        gpu.context.set_uniform_texture_unit(&locations.image, TEXTURE_UNIT);
        let transform = matrix::surface_transform(dims);
        gpu.context.set_uniform_matrix(&locations.matrix, &transform.to_cols_array());

        gpu.program = Some(program);
        gpu.locations = Some(locations);
        gpu.geometry = Some(geometry);
        self.initialized = true;

        log::info!("Pixel engine initialized");
        Ok(())
    }

    /// Upload the whole buffer to the texture and draw the quad once
    pub fn render(&mut self) {
        if !self.initialized {
            log::warn!("render() called before initialize() succeeded; ignored");
            return;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let start = Instant::now();

        gpu.context.bind_texture(TEXTURE_UNIT, &gpu.texture);
        gpu.context.upload_texture(&gpu.texture, self.buffer.pixels());

        match gpu.context.draw_triangles(QUAD_VERTEX_COUNT) {
            Ok(()) => {}
            Err(e @ DrawError::SkippedFrame(_)) => log::warn!("{}", e),
            Err(e @ DrawError::Fatal(_)) => log::error!("{}", e),
        }

        self.stats.record(start, Instant::now());
    }

    /// Write pixel (x, y). Coordinates are not validated.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, red: u8, green: u8, blue: u8, alpha: u8) {
        self.buffer.set_pixel(x, y, red, green, blue, alpha);
    }

    /// Read pixel (x, y). Coordinates are not validated.
    #[inline(always)]
    pub fn get_pixel(&self, x: u32, y: u32) -> Pixel {
        self.buffer.get_pixel(x, y)
    }

    /// # Safety
    ///
    /// (x, y) must address a pixel inside the buffer.
    #[inline(always)]
    pub unsafe fn set_pixel_unchecked(&mut self, x: u32, y: u32, red: u8, green: u8, blue: u8, alpha: u8) {
        self.buffer.set_pixel_unchecked(x, y, red, green, blue, alpha);
    }

    /// # Safety
    ///
    /// (x, y) must address a pixel inside the buffer.
    #[inline(always)]
    pub unsafe fn get_pixel_unchecked(&self, x: u32, y: u32) -> Pixel {
        self.buffer.get_pixel_unchecked(x, y)
    }

    /// Replace the buffer with `source`, which must be exactly width*height*4 bytes
    pub fn load_pixel_data(&mut self, source: &[u8]) -> Result<()> {
        self.buffer.load(source).inspect_err(|e| log::warn!("load_pixel_data: {}", e))
    }

    /// Fill the whole buffer with one color
    pub fn clear(&mut self, red: u8, green: u8, blue: u8, alpha: u8) {
        self.buffer.clear(red, green, blue, alpha);
    }

    pub fn pixels(&self) -> &[u8] {
        self.buffer.pixels()
    }

    pub fn is_safe(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Why construction failed, if it did
    pub fn environment_error(&self) -> Option<&EnvironmentError> {
        self.environment_error.as_ref()
    }

    /// Dimensions requested at construction
    pub fn dimensions(&self) -> (u32, u32) {
        self.requested
    }

    /// Shader locations, once initialized
    pub fn locations(&self) -> Option<&LocationTable<C::Uniform>> {
        self.gpu.as_ref().and_then(|gpu| gpu.locations.as_ref())
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn last_render_duration(&self) -> Duration {
        self.stats.last_duration
    }

    pub fn last_render_ended(&self) -> Option<Instant> {
        self.stats.last_ended
    }

    pub(crate) fn context(&self) -> Option<&C> {
        self.gpu.as_ref().map(|gpu| &gpu.context)
    }
}
