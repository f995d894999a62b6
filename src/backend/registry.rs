use std::collections::HashMap;
use std::sync::Arc;

use winit::window::Window;

use super::wgpu_context::{ContextConfig, WgpuContext};
use crate::core::{ContextProvider, EnvironmentError, SurfaceDimensions, SurfaceRef};

/// Named windows an engine can be pointed at, plus the device settings to open them with
#[derive(Default)]
pub struct SurfaceRegistry {
    windows: HashMap<String, Arc<Window>>,
    config: ContextConfig,
}

impl SurfaceRegistry {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            windows: HashMap::new(),
            config,
        }
    }

    /// Make `window` resolvable as `id`, replacing any earlier entry
    pub fn register(&mut self, id: impl Into<String>, window: Arc<Window>) {
        let id = id.into();
        log::debug!("Registered surface '{}'", id);
        self.windows.insert(id, window);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Window>> {
        self.windows.get(id)
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    fn resolve(&self, surface: &SurfaceRef) -> Result<Option<Arc<Window>>, EnvironmentError> {
        match surface {
            SurfaceRef::Id(id) => self
                .windows
                .get(id)
                .cloned()
                .map(Some)
                .ok_or_else(|| EnvironmentError::SurfaceNotFound(id.clone())),
            SurfaceRef::Window(window) => Ok(Some(window.clone())),
            SurfaceRef::Offscreen => Ok(None),
        }
    }
}

impl ContextProvider for SurfaceRegistry {
    type Context = WgpuContext;

    fn acquire(&self, surface: &SurfaceRef, dims: SurfaceDimensions) -> Result<WgpuContext, EnvironmentError> {
        let window = self.resolve(surface)?;
        WgpuContext::new(window, dims, &self.config)
            .map_err(|e| EnvironmentError::ContextUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_is_not_found() {
        let registry = SurfaceRegistry::default();
        let err = registry.resolve(&SurfaceRef::from("missing")).unwrap_err();
        assert_eq!(err, EnvironmentError::SurfaceNotFound("missing".into()));
    }

    #[test]
    fn config_is_kept() {
        let registry = SurfaceRegistry::new(ContextConfig {
            force_fallback_adapter: true,
            ..Default::default()
        });
        assert!(registry.config().force_fallback_adapter);
        assert!(registry.get("canvas").is_none());
    }

    #[test]
    fn offscreen_needs_no_window() {
        let registry = SurfaceRegistry::default();
        assert!(registry.resolve(&SurfaceRef::Offscreen).unwrap().is_none());
    }

    #[test]
    fn unknown_id_fails_acquire_without_touching_the_gpu() {
        let registry = SurfaceRegistry::default();
        let dims = SurfaceDimensions::new(4, 4).unwrap();
        assert!(matches!(
            registry.acquire(&SurfaceRef::from("nope"), dims),
            Err(EnvironmentError::SurfaceNotFound(_))
        ));
    }
}
