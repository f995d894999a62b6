//! End-to-end through wgpu on an offscreen target. Skipped when no adapter exists.

use pixel_blit::core::{EnvironmentError, FileLoader, PixelEngine, SurfaceRef};
use pixel_blit::{ContextConfig, SurfaceRegistry, WgpuContext};

fn offscreen_engine(width: u32, height: u32) -> Option<PixelEngine<WgpuContext>> {
    let registry = SurfaceRegistry::new(ContextConfig {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let mut engine = PixelEngine::new(&registry, SurfaceRef::Offscreen, width, height);
    if !engine.is_safe() {
        eprintln!("skipping: {:?}", engine.environment_error());
        return None;
    }

    let loader = FileLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders"));
    pollster::block_on(engine.initialize_with(&loader, "pixels.vert.wgsl", "pixels.frag.wgsl")).unwrap();
    Some(engine)
}

#[cfg(test)]
mod capture_tests {
    use super::*;

    #[test]
    fn test_single_red_pixel_reaches_the_target() {
        let Some(mut engine) = offscreen_engine(4, 4) else {
            return;
        };

        engine.set_pixel(1, 2, 255, 0, 0, 255);
        engine.render();

        let frame = engine.capture().unwrap();
        assert_eq!(frame.len(), 4 * 4 * 4);

        for y in 0..4 {
            for x in 0..4 {
                let idx = ((y * 4 + x) * 4) as usize;
                let expected: &[u8] = if (x, y) == (1, 2) { &[255, 0, 0, 255] } else { &[0, 0, 0, 0] };
                assert_eq!(&frame[idx..idx + 4], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_origin_pixel_is_top_left() {
        let Some(mut engine) = offscreen_engine(4, 4) else {
            return;
        };

        engine.set_pixel(0, 0, 255, 0, 0, 255);
        engine.render();

        let frame = engine.capture().unwrap();
        assert_eq!(&frame[..4], &[255, 0, 0, 255]);
        assert!(frame[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_oversized_surface_is_unsafe() {
        let registry = SurfaceRegistry::new(ContextConfig {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let Some(available) = offscreen_engine(1, 1) else {
            return;
        };
        drop(available);

        let engine = PixelEngine::new(&registry, SurfaceRef::Offscreen, 1 << 20, 4);

        assert!(!engine.is_safe());
        assert!(matches!(
            engine.environment_error(),
            Some(EnvironmentError::ContextUnavailable(reason)) if reason.contains("texture limit")
        ));
    }

    #[test]
    fn test_capture_matches_buffer_after_load() {
        let Some(mut engine) = offscreen_engine(8, 3) else {
            return;
        };

        let data: Vec<u8> = (0..8 * 3 * 4).map(|i| (i * 7 % 256) as u8).collect();
        engine.load_pixel_data(&data).unwrap();
        engine.render();

        assert_eq!(engine.capture().unwrap(), data);
        assert_eq!(engine.stats().frames, 1);
    }

    #[test]
    fn test_bad_shader_root_fails_initialize() {
        let registry = SurfaceRegistry::default();
        let mut engine = PixelEngine::new(&registry, SurfaceRef::Offscreen, 2, 2);
        if !engine.is_safe() {
            return;
        }

        let loader = FileLoader::new(env!("CARGO_MANIFEST_DIR"));
        let result = pollster::block_on(engine.initialize_with(&loader, "missing.wgsl", "also_missing.wgsl"));
        assert!(result.is_err());
        assert!(!engine.is_initialized());
    }
}
