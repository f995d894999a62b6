use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::reflect::{self, Resource, ResourceKind, StageInterface, Varying};
use crate::core::{DrawError, GraphicsContext, PixelEngine, ShaderStage, SurfaceDimensions};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const MATRIX_BYTES: u64 = 16 * 4;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Device and presentation settings for [`WgpuContext`]
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Falls back to FIFO when the surface does not support it
    pub present_mode: wgpu::PresentMode,
    pub force_fallback_adapter: bool,
    pub desired_maximum_frame_latency: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::PRIMARY,
            power_preference: wgpu::PowerPreference::default(),
            present_mode: wgpu::PresentMode::Fifo,
            force_fallback_adapter: false,
            desired_maximum_frame_latency: 2,
        }
    }
}

enum RenderTarget {
    Window {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
    },
}

/// Surface texture plus the id used to tell bindings apart
pub struct WgpuTexture {
    id: u64,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// A compiled stage and its reflected interface
#[derive(Clone)]
pub struct WgpuShader {
    module: wgpu::ShaderModule,
    interface: StageInterface,
}

#[derive(Clone)]
struct LinkedProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    /// Vertex inputs in slot order
    attributes: Vec<Varying>,
    resources: Vec<Resource>,
    uniform_buffers: HashMap<u32, wgpu::Buffer>,
}

#[derive(Default)]
pub struct WgpuProgram {
    vertex: Option<WgpuShader>,
    fragment: Option<WgpuShader>,
    linked: Option<LinkedProgram>,
}

/// A resolved uniform: its `@binding` and what lives there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WgpuUniform {
    pub binding: u32,
    pub kind: ResourceKind,
}

/// [`GraphicsContext`] over wgpu, presenting to a window or an offscreen texture
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: RenderTarget,
    format: wgpu::TextureFormat,
    dims: SurfaceDimensions,
    viewport: [f32; 4],
    sampler: wgpu::Sampler,
    next_texture_id: u64,
    /// Texture unit -> (texture id, view)
    units: HashMap<u32, (u64, wgpu::TextureView)>,
    active: Option<LinkedProgram>,
    /// Uniform binding -> texture unit
    texture_units: HashMap<u32, u32>,
    /// Attribute location -> vertex buffer
    attributes: HashMap<u32, wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
}

impl WgpuContext {
    /// Open a device for `window`, or for an offscreen target when `window` is None
    pub fn new(window: Option<Arc<Window>>, dims: SurfaceDimensions, config: &ContextConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let surface = match &window {
            Some(window) => {
                let _ = window.request_inner_size(winit::dpi::PhysicalSize::new(dims.width, dims.height));
                Some(instance.create_surface(window.clone())?)
            }
            None => None,
        };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power_preference,
            compatible_surface: surface.as_ref(),
            force_fallback_adapter: config.force_fallback_adapter,
        }))
        .map_err(|e| format!("Failed to find appropriate adapter: {:?}", e))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Pixel Engine Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: Default::default(),
        }))
        .map_err(|e| format!("Failed to create device: {:?}", e))?;

        Self::check_dimensions(dims, &device.limits())?;

        let (target, format) = match surface {
            Some(surface) => {
                let config = Self::surface_config(&surface, &adapter, dims, config)?;
                surface.configure(&device, &config);
                let format = config.format;
                (RenderTarget::Window { surface, config }, format)
            }
            None => {
                let texture = Self::create_offscreen_target(&device, dims);
                (RenderTarget::Offscreen { texture }, TEXTURE_FORMAT)
            }
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Pixel Texture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "Graphics context on {} ({:?}), target format {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format
        );

        Ok(Self {
            device,
            queue,
            target,
            format,
            dims,
            viewport: [0.0, 0.0, dims.width as f32, dims.height as f32],
            sampler,
            next_texture_id: 0,
            units: HashMap::new(),
            active: None,
            texture_units: HashMap::new(),
            attributes: HashMap::new(),
            bind_group: None,
        })
    }

    /// Surfaces larger than the device's 2D texture limit are rejected up front
    fn check_dimensions(dims: SurfaceDimensions, limits: &wgpu::Limits) -> Result<()> {
        let max = limits.max_texture_dimension_2d;
        if dims.width > max || dims.height > max {
            return Err(format!(
                "surface {}x{} exceeds the device texture limit of {}",
                dims.width, dims.height, max
            )
            .into());
        }
        Ok(())
    }

    /// Byte-exact output needs a non-sRGB format, so prefer one
    fn surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        dims: SurfaceDimensions,
        config: &ContextConfig,
    ) -> Result<wgpu::SurfaceConfiguration> {
        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or("surface is not compatible with the adapter")?;
        let present_mode = if caps.present_modes.contains(&config.present_mode) {
            config.present_mode
        } else {
            wgpu::PresentMode::Fifo
        };

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: dims.width,
            height: dims.height,
            present_mode,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: config.desired_maximum_frame_latency,
        })
    }

    fn create_offscreen_target(device: &wgpu::Device, dims: SurfaceDimensions) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: Self::extent(dims),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    fn extent(dims: SurfaceDimensions) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: dims.width,
            height: dims.height,
            depth_or_array_layers: 1,
        }
    }

    /// Format of the render target
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn is_offscreen(&self) -> bool {
        matches!(self.target, RenderTarget::Offscreen { .. })
    }

    /// Read back the offscreen target as tightly packed RGBA rows
    ///
    /// Blocks on the device until the copy is mapped.
    pub fn capture(&self) -> Result<Vec<u8>> {
        let RenderTarget::Offscreen { texture } = &self.target else {
            return Err("capture is only available on offscreen targets".into());
        };

        let row_bytes = self.dims.bytes_per_row();
        let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Buffer"),
            size: padded_row as u64 * self.dims.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.dims.height),
                },
            },
            Self::extent(self.dims),
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .ok();

        match receiver.recv() {
            Ok(Ok(())) => {
                let data = slice.get_mapped_range();
                let pixels = data
                    .chunks_exact(padded_row as usize)
                    .flat_map(|row| &row[..row_bytes as usize])
                    .copied()
                    .collect();
                drop(data);
                readback.unmap();
                Ok(pixels)
            }
            Ok(Err(e)) => Err(format!("Buffer mapping failed: {:?}", e).into()),
            Err(_) => Err("Channel closed before receiving result".into()),
        }
    }

    /// Run `f` inside a validation error scope and return the captured error text
    fn validated<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> std::result::Result<T, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(value),
        }
    }

    fn build_bind_group(&self, active: &LinkedProgram) -> std::result::Result<wgpu::BindGroup, DrawError> {
        let mut entries = Vec::with_capacity(active.resources.len());

        for resource in &active.resources {
            let resource_binding = match resource.kind {
                ResourceKind::Matrix => active
                    .uniform_buffers
                    .get(&resource.binding)
                    .map(|buffer| buffer.as_entire_binding()),
                ResourceKind::Texture => {
                    let unit = self.texture_units.get(&resource.binding).copied().unwrap_or(0);
                    self.units
                        .get(&unit)
                        .map(|(_, view)| wgpu::BindingResource::TextureView(view))
                }
                ResourceKind::Sampler => Some(wgpu::BindingResource::Sampler(&self.sampler)),
            };

            let Some(resource_binding) = resource_binding else {
                return Err(DrawError::Fatal(format!("nothing bound for '{}'", resource.name)));
            };
            entries.push(wgpu::BindGroupEntry {
                binding: resource.binding,
                resource: resource_binding,
            });
        }

        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Pixel Bind Group"),
            layout: &active.bind_group_layout,
            entries: &entries,
        }))
    }

    fn bind_group_layout_entry(resource: &Resource) -> wgpu::BindGroupLayoutEntry {
        let ty = match resource.kind {
            ResourceKind::Matrix => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(MATRIX_BYTES),
            },
            ResourceKind::Texture => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            ResourceKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        };

        wgpu::BindGroupLayoutEntry {
            binding: resource.binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty,
            count: None,
        }
    }

    /// Acquire the texture to draw into; surface problems become skipped frames
    fn acquire_frame(&self) -> std::result::Result<(Option<wgpu::SurfaceTexture>, wgpu::TextureView), DrawError> {
        match &self.target {
            RenderTarget::Offscreen { texture } => {
                Ok((None, texture.create_view(&wgpu::TextureViewDescriptor::default())))
            }
            RenderTarget::Window { surface, config } => match surface.get_current_texture() {
                Ok(frame) => {
                    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
                    Ok((Some(frame), view))
                }
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    surface.configure(&self.device, config);
                    Err(DrawError::SkippedFrame("surface lost or outdated, reconfigured".into()))
                }
                Err(wgpu::SurfaceError::OutOfMemory) => Err(DrawError::Fatal("out of memory".into())),
                Err(e) => Err(DrawError::SkippedFrame(e.to_string())),
            },
        }
    }
}

impl GraphicsContext for WgpuContext {
    type Texture = WgpuTexture;
    type Shader = WgpuShader;
    type Program = WgpuProgram;
    type Buffer = wgpu::Buffer;
    type Uniform = WgpuUniform;

    fn viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = [x as f32, y as f32, width as f32, height as f32];
    }

    fn create_texture(&mut self, dims: SurfaceDimensions, initial: &[u8]) -> WgpuTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pixel Texture"),
            size: Self::extent(dims),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.next_texture_id += 1;
        let texture = WgpuTexture { id: self.next_texture_id, texture, view };
        self.upload_texture(&texture, initial);
        texture
    }

    fn bind_texture(&mut self, unit: u32, texture: &WgpuTexture) {
        let unchanged = self.units.get(&unit).is_some_and(|(id, _)| *id == texture.id);
        if !unchanged {
            self.units.insert(unit, (texture.id, texture.view.clone()));
            self.bind_group = None;
        }
    }

    fn upload_texture(&mut self, texture: &WgpuTexture, pixels: &[u8]) {
        let size = texture.texture.size();
        self.queue.write_texture(
            texture.texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> std::result::Result<WgpuShader, String> {
        let interface = reflect::compile(stage, source)?;
        let label = match stage {
            ShaderStage::Vertex => "Pixel Vertex Shader",
            ShaderStage::Fragment => "Pixel Fragment Shader",
        };

        let module = self.validated(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })?;

        Ok(WgpuShader { module, interface })
    }

    fn delete_shader(&mut self, shader: WgpuShader) {
        drop(shader);
    }

    fn create_program(&mut self) -> WgpuProgram {
        WgpuProgram::default()
    }

    fn attach_shader(&mut self, program: &mut WgpuProgram, shader: &WgpuShader) {
        match shader.interface.stage {
            ShaderStage::Vertex => program.vertex = Some(shader.clone()),
            ShaderStage::Fragment => program.fragment = Some(shader.clone()),
        }
    }

    fn link_program(&mut self, program: &mut WgpuProgram) -> std::result::Result<(), String> {
        let (Some(vertex), Some(fragment)) = (&program.vertex, &program.fragment) else {
            return Err("program needs both a vertex and a fragment stage".into());
        };

        let resources = reflect::link(&vertex.interface, &fragment.interface)?;

        let mut attributes = vertex.interface.inputs.clone();
        attributes.sort_by_key(|a| a.location);
        if let Some(bad) = attributes.iter().find(|a| a.format != Some(wgpu::VertexFormat::Float32x2)) {
            return Err(format!("attribute '{}' must be vec2<f32>", bad.name));
        }

        let layout_entries: Vec<_> = resources.iter().map(Self::bind_group_layout_entry).collect();
        let vertex_attributes: Vec<[wgpu::VertexAttribute; 1]> = attributes
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: a.location,
                }]
            })
            .collect();
        let vertex_buffers: Vec<_> = vertex_attributes
            .iter()
            .map(|attribute| wgpu::VertexBufferLayout {
                array_stride: wgpu::VertexFormat::Float32x2.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();
        let format = self.format;

        let (pipeline, bind_group_layout) = self.validated(|device| {
            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Pixel Bind Group Layout"),
                entries: &layout_entries,
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Pixel Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Pixel Render Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: Some(&vertex.interface.entry_point),
                    buffers: &vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment.module,
                    entry_point: Some(&fragment.interface.entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            (pipeline, bind_group_layout)
        })?;

        let uniform_buffers = resources
            .iter()
            .filter(|r| r.kind == ResourceKind::Matrix)
            .map(|r| {
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&r.name),
                    size: MATRIX_BYTES,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (r.binding, buffer)
            })
            .collect();

        program.linked = Some(LinkedProgram {
            pipeline,
            bind_group_layout,
            attributes,
            resources,
            uniform_buffers,
        });
        Ok(())
    }

    fn delete_program(&mut self, program: WgpuProgram) {
        drop(program);
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        match &program.linked {
            Some(linked) => {
                self.active = Some(linked.clone());
                self.bind_group = None;
            }
            None => log::warn!("use_program called with an unlinked program"),
        }
    }

    fn attribute_location(&self, program: &WgpuProgram, name: &str) -> Option<u32> {
        let linked = program.linked.as_ref()?;
        linked.attributes.iter().find(|a| a.name == name).map(|a| a.location)
    }

    fn uniform_location(&self, program: &WgpuProgram, name: &str) -> Option<WgpuUniform> {
        let linked = program.linked.as_ref()?;
        linked
            .resources
            .iter()
            .find(|r| r.name == name)
            .map(|r| WgpuUniform { binding: r.binding, kind: r.kind })
    }

    fn create_vertex_buffer(&mut self, vertices: &[[f32; 2]]) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        })
    }

    fn bind_attribute(&mut self, location: u32, buffer: &wgpu::Buffer) {
        self.attributes.insert(location, buffer.clone());
    }

    fn set_uniform_matrix(&mut self, uniform: &WgpuUniform, matrix: &[f32; 16]) {
        let buffer = self
            .active
            .as_ref()
            .and_then(|active| active.uniform_buffers.get(&uniform.binding));
        match buffer {
            Some(buffer) => self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(matrix)),
            None => log::warn!("No matrix uniform at @binding({}) in the active program", uniform.binding),
        }
    }

    fn set_uniform_texture_unit(&mut self, uniform: &WgpuUniform, unit: u32) {
        if uniform.kind != ResourceKind::Texture {
            log::warn!("@binding({}) is not a texture", uniform.binding);
            return;
        }
        self.texture_units.insert(uniform.binding, unit);
        self.bind_group = None;
    }

    fn draw_triangles(&mut self, vertex_count: u32) -> std::result::Result<(), DrawError> {
        let Some(active) = self.active.as_ref() else {
            return Err(DrawError::Fatal("no program in use".into()));
        };

        let bind_group = match self.bind_group.take() {
            Some(bind_group) => bind_group,
            None => self.build_bind_group(active)?,
        };

        let mut slots = Vec::with_capacity(active.attributes.len());
        for attribute in &active.attributes {
            match self.attributes.get(&attribute.location) {
                Some(buffer) => slots.push(buffer),
                None => {
                    self.bind_group = Some(bind_group);
                    return Err(DrawError::Fatal(format!("no buffer bound to '{}'", attribute.name)));
                }
            }
        }

        let (frame, view) = match self.acquire_frame() {
            Ok(acquired) => acquired,
            Err(e) => {
                self.bind_group = Some(bind_group);
                return Err(e);
            }
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pixel Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pixel Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let [x, y, w, h] = self.viewport;
            render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
            render_pass.set_pipeline(&active.pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            for (slot, buffer) in slots.iter().enumerate() {
                render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            render_pass.draw(0..vertex_count, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }

        self.bind_group = Some(bind_group);
        Ok(())
    }
}

impl PixelEngine<WgpuContext> {
    /// Read back the last frame of an engine built on an offscreen target
    pub fn capture(&self) -> Option<Vec<u8>> {
        let context = self.context()?;
        context
            .capture()
            .map_err(|e| log::error!("Capture failed: {}", e))
            .ok()
    }
}
