// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::backend::ContextConfig;
use crate::logging::LoggingConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "pixel-blit")]
#[command(about = "Per-pixel noise demo for the pixel engine", long_about = None)]
pub struct Cli {
    /// Surface width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Id the window is registered under and the engine is pointed at
    #[arg(long, default_value = "canvas")]
    pub surface: String,

    /// Vertex shader locator, relative to the shader root
    #[arg(long, default_value = "pixels.vert.wgsl")]
    pub vertex: String,

    /// Fragment shader locator, relative to the shader root
    #[arg(long, default_value = "pixels.frag.wgsl")]
    pub fragment: String,

    /// Directory shader locators are resolved against
    #[arg(long = "shader-root", default_value = "shaders")]
    pub shader_root: PathBuf,

    /// Exit after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Log filter, env_logger syntax (overrides RUST_LOG)
    #[arg(long = "log")]
    pub log_filter: Option<String>,

    /// Use the software fallback adapter
    #[arg(long = "fallback-adapter", default_value = "false")]
    pub fallback_adapter: bool,
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log_filter.clone(),
            ..Default::default()
        }
    }

    pub fn context_config(&self) -> ContextConfig {
        ContextConfig {
            force_fallback_adapter: self.fallback_adapter,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["pixel-blit"]);
        assert_eq!((cli.width, cli.height), (800, 600));
        assert_eq!(cli.surface, "canvas");
        assert_eq!(cli.frames, None);
        assert!(!cli.context_config().force_fallback_adapter);
    }

    #[test]
    fn flags_map_to_configs() {
        let cli = Cli::parse_from([
            "pixel-blit",
            "--width",
            "960",
            "--height",
            "640",
            "--frames",
            "10",
            "--log",
            "debug",
            "--fallback-adapter",
        ]);
        assert_eq!((cli.width, cli.height), (960, 640));
        assert_eq!(cli.frames, Some(10));
        assert_eq!(cli.logging_config().env_filter.as_deref(), Some("debug"));
        assert!(cli.context_config().force_fallback_adapter);
    }
}
