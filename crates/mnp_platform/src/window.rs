use std::sync::Arc;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// Startup configuration for the game window. The viewport is a fixed
/// 800x400 and is not exposed as a runtime flag.
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Renders physics geometry and body outlines when true.
    pub physics_debug: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Menina".to_string(),
            width: 800,
            height: 400,
            physics_debug: true,
        }
    }
}

pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Arc<Window> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = event_loop
        .create_window(attrs)
        .expect("Failed to create window");
    Arc::new(window)
}
