//! Recording graphics context shared by the integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{self, BoxFuture, FutureExt};
use pixel_blit::core::{
    ContextProvider, DrawError, EnvironmentError, GraphicsContext, ShaderStage, SourceLoader,
    SourceResponse, SurfaceDimensions, SurfaceRef,
};

pub const VERTEX: &str = "pixels.vert";
pub const FRAGMENT: &str = "pixels.frag";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Viewport(u32, u32, u32, u32),
    CreateTexture { id: usize, width: u32, height: u32 },
    BindTexture { unit: u32, id: usize },
    UploadTexture { id: usize, pixels: Vec<u8> },
    CompileShader(ShaderStage),
    DeleteShader(ShaderStage),
    CreateProgram,
    AttachShader(ShaderStage),
    LinkProgram,
    DeleteProgram,
    UseProgram,
    CreateVertexBuffer(Vec<[f32; 2]>),
    BindAttribute { location: u32, buffer: usize },
    SetUniformMatrix { name: String, matrix: [f32; 16] },
    SetUniformTextureUnit { name: String, unit: u32 },
    Draw(u32),
}

/// Calls plus live resource counts, shared between the test and the context
#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<Call>,
    pub live_shaders: i32,
    pub live_programs: i32,
}

impl MockState {
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

/// Failures the mock should inject
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub fail_compile: Option<ShaderStage>,
    pub fail_link: bool,
    /// Attribute or uniform name that does not resolve after linking
    pub missing: Option<&'static str>,
    pub draw_error: Option<DrawError>,
}

pub struct MockShader {
    pub stage: ShaderStage,
}

#[derive(Default)]
pub struct MockProgram {
    pub stages: Vec<ShaderStage>,
    pub linked: bool,
}

pub struct MockContext {
    state: Rc<RefCell<MockState>>,
    behavior: Behavior,
    next_id: usize,
}

impl MockContext {
    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsContext for MockContext {
    type Texture = usize;
    type Shader = MockShader;
    type Program = MockProgram;
    type Buffer = usize;
    type Uniform = String;

    fn viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn create_texture(&mut self, dims: SurfaceDimensions, _initial: &[u8]) -> usize {
        let id = self.next_id();
        self.record(Call::CreateTexture { id, width: dims.width, height: dims.height });
        id
    }

    fn bind_texture(&mut self, unit: u32, texture: &usize) {
        self.record(Call::BindTexture { unit, id: *texture });
    }

    fn upload_texture(&mut self, texture: &usize, pixels: &[u8]) {
        self.record(Call::UploadTexture { id: *texture, pixels: pixels.to_vec() });
    }

    fn compile_shader(&mut self, stage: ShaderStage, _source: &str) -> Result<MockShader, String> {
        self.record(Call::CompileShader(stage));
        if self.behavior.fail_compile == Some(stage) {
            return Err(format!("error: {stage} stage does not compile"));
        }
        self.state.borrow_mut().live_shaders += 1;
        Ok(MockShader { stage })
    }

    fn delete_shader(&mut self, shader: MockShader) {
        self.record(Call::DeleteShader(shader.stage));
        self.state.borrow_mut().live_shaders -= 1;
    }

    fn create_program(&mut self) -> MockProgram {
        self.record(Call::CreateProgram);
        self.state.borrow_mut().live_programs += 1;
        MockProgram::default()
    }

    fn attach_shader(&mut self, program: &mut MockProgram, shader: &MockShader) {
        self.record(Call::AttachShader(shader.stage));
        program.stages.push(shader.stage);
    }

    fn link_program(&mut self, program: &mut MockProgram) -> Result<(), String> {
        self.record(Call::LinkProgram);
        if self.behavior.fail_link {
            return Err("error: varying 'uv' is not written".into());
        }
        program.linked = program.stages.len() == 2;
        Ok(())
    }

    fn delete_program(&mut self, _program: MockProgram) {
        self.record(Call::DeleteProgram);
        self.state.borrow_mut().live_programs -= 1;
    }

    fn use_program(&mut self, _program: &MockProgram) {
        self.record(Call::UseProgram);
    }

    fn attribute_location(&self, program: &MockProgram, name: &str) -> Option<u32> {
        if !program.linked || self.behavior.missing == Some(name) {
            return None;
        }
        match name {
            "position" => Some(0),
            "texcoord" => Some(1),
            _ => None,
        }
    }

    fn uniform_location(&self, program: &MockProgram, name: &str) -> Option<String> {
        if !program.linked || self.behavior.missing == Some(name) {
            return None;
        }
        matches!(name, "u_matrix" | "u_image").then(|| name.to_string())
    }

    fn create_vertex_buffer(&mut self, vertices: &[[f32; 2]]) -> usize {
        self.record(Call::CreateVertexBuffer(vertices.to_vec()));
        self.next_id()
    }

    fn bind_attribute(&mut self, location: u32, buffer: &usize) {
        self.record(Call::BindAttribute { location, buffer: *buffer });
    }

    fn set_uniform_matrix(&mut self, uniform: &String, matrix: &[f32; 16]) {
        self.record(Call::SetUniformMatrix { name: uniform.clone(), matrix: *matrix });
    }

    fn set_uniform_texture_unit(&mut self, uniform: &String, unit: u32) {
        self.record(Call::SetUniformTextureUnit { name: uniform.clone(), unit });
    }

    fn draw_triangles(&mut self, vertex_count: u32) -> Result<(), DrawError> {
        self.record(Call::Draw(vertex_count));
        match &self.behavior.draw_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Knows a fixed set of surface ids and hands out recording contexts
pub struct MockProvider {
    pub state: Rc<RefCell<MockState>>,
    pub behavior: Behavior,
    surfaces: Vec<String>,
    context_error: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_behavior(Behavior::default())
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        Self {
            state: Rc::default(),
            behavior,
            surfaces: vec!["canvas".to_string()],
            context_error: None,
        }
    }

    /// Every acquire fails as if no context could be created
    pub fn without_context() -> Self {
        Self {
            context_error: Some("no adapter".into()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }
}

impl ContextProvider for MockProvider {
    type Context = MockContext;

    fn acquire(&self, surface: &SurfaceRef, _dims: SurfaceDimensions) -> Result<MockContext, EnvironmentError> {
        if let SurfaceRef::Id(id) = surface {
            if !self.surfaces.contains(id) {
                return Err(EnvironmentError::SurfaceNotFound(id.clone()));
            }
        }
        if let Some(reason) = &self.context_error {
            return Err(EnvironmentError::ContextUnavailable(reason.clone()));
        }
        Ok(MockContext {
            state: self.state.clone(),
            behavior: self.behavior.clone(),
            next_id: 0,
        })
    }
}

/// Serves sources from memory; unknown locators get 404
#[derive(Default)]
pub struct MemoryLoader {
    sources: HashMap<String, SourceResponse>,
}

impl MemoryLoader {
    /// Both default locators answer 200
    pub fn with_shaders() -> Self {
        Self::default()
            .with(VERTEX, SourceResponse::ok("vertex source"))
            .with(FRAGMENT, SourceResponse::ok("fragment source"))
    }

    pub fn with(mut self, locator: &str, response: SourceResponse) -> Self {
        self.sources.insert(locator.to_string(), response);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load<'a>(&'a self, locator: &'a str) -> BoxFuture<'a, SourceResponse> {
        let response = self
            .sources
            .get(locator)
            .cloned()
            .unwrap_or_else(|| SourceResponse::failed(404));
        future::ready(response).boxed()
    }
}
