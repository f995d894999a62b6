use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use pixel_blit::cli::Cli;
use pixel_blit::core::{Clock, FileLoader, FpsCounter, PixelEngine};
use pixel_blit::demo::NoiseProducer;
use pixel_blit::logging::init_logging;
use pixel_blit::{SurfaceRegistry, WgpuContext};

const FPS_UPDATE_INTERVAL: f32 = 1.0;

struct App {
    cli: Cli,
    registry: SurfaceRegistry,
    window: Option<Arc<Window>>,
    engine: Option<PixelEngine<WgpuContext>>,
    producer: NoiseProducer,
    clock: Clock,
    fps: FpsCounter,
    frames: u64,
}

impl App {
    fn new(cli: Cli) -> Self {
        let registry = SurfaceRegistry::new(cli.context_config());
        Self {
            cli,
            registry,
            window: None,
            engine: None,
            producer: NoiseProducer::new(),
            clock: Clock::new(),
            fps: FpsCounter::new(FPS_UPDATE_INTERVAL),
            frames: 0,
        }
    }

    fn start_engine(&self) -> anyhow::Result<PixelEngine<WgpuContext>> {
        let cli = &self.cli;
        let mut engine = PixelEngine::new(&self.registry, cli.surface.as_str(), cli.width, cli.height);
        if let Some(e) = engine.environment_error() {
            anyhow::bail!("engine has no usable surface: {}", e);
        }

        let loader = FileLoader::new(&cli.shader_root);
        pollster::block_on(engine.initialize_with(&loader, &cli.vertex, &cli.fragment))
            .context("failed to initialize the pixel engine")?;
        Ok(engine)
    }

    fn update_title(&self, fps: f32) {
        if let (Some(window), Some(engine)) = (&self.window, &self.engine) {
            let render_ms = engine.last_render_duration().as_secs_f64() * 1000.0;
            window.set_title(&format!("pixel-blit | {:.0} fps | render {:.2} ms", fps, render_ms));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("pixel-blit")
                .with_resizable(false)
                .with_inner_size(winit::dpi::PhysicalSize::new(self.cli.width, self.cli.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.registry.register(self.cli.surface.clone(), window.clone());
        self.window = Some(window);

        match self.start_engine() {
            Ok(engine) => {
                self.engine = Some(engine);
                self.clock.reset();
            }
            Err(e) => {
                log::error!("{:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                let delta = self.clock.tick();

                let Some(engine) = self.engine.as_mut() else {
                    return;
                };
                self.producer.produce(engine);
                engine.render();
                self.frames += 1;

                if let Some(fps) = self.fps.frame(delta) {
                    self.update_title(fps);
                }

                if self.cli.frames.is_some_and(|limit| self.frames >= limit) {
                    log::info!("Rendered {} frames, exiting", self.frames);
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging_config());

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(cli);

    log::info!("pixel-blit - Escape to quit");
    event_loop.run_app(&mut app).context("event loop failed")?;

    Ok(())
}
