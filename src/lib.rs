//! # kandinsky-canvas-core
//!
//! Core of a browser text-to-image client.
//!
//! This crate provides platform-agnostic data structures and logic for:
//! - A loading animation of pulsing discs scattered without overlap over a grid
//! - The animation lifecycle (start/stop) and its self-rescheduling redraw loop
//! - Persisting credentials and prompt settings in a key-value store
//! - Submitting a generation job and polling it while the animation runs
//!
//! ## Features
//!
//! - `web` - Canvas surface, `requestAnimationFrame` scheduler, local
//!   storage, `fetch` client and clipboard export for WASM builds
//! - `toml` - Load [`AppConfig`] from TOML
//!
//! ## Example
//!
//! ```rust,ignore
//! use kandinsky_canvas_core::web::{FetchClient, LocalStorageStore, WebLoader, sleep_ms, draw_base64_png};
//! use kandinsky_canvas_core::{generate_image, AppConfig, GenerationParams, Settings};
//!
//! let config = AppConfig::default();
//! let mut store = LocalStorageStore::new()?;
//! let settings = Settings::load(&store);
//! settings.save_prompt(&mut store)?;
//!
//! let mut loader = WebLoader::new(&canvas, config.loader_config())?;
//! let client = FetchClient::new(config.service.clone(), &settings);
//! let params = GenerationParams::from_settings(&settings, &config.service);
//!
//! let images = generate_image(&client, &mut loader, &params, &config.poll, sleep_ms, |_| {}).await?;
//! if let Some(image) = images.first() {
//!     draw_base64_png(&canvas, image)?;
//! }
//! ```

mod animator;
mod color;
mod config;
mod error;
mod generation;
pub mod render;
mod schedule;
mod settings;
mod shape;

pub use animator::{AnimatorState, LoadingAnimator, LoadingIndicator};
pub use color::{parse_color, Rgba};
pub use config::{AppConfig, LoaderConfig};
pub use error::{Error, Result};
pub use generation::{
    generate_image, GenerationClient, GenerationParams, GenerationStatus, PollPolicy, Query,
    RunResponse, ServiceConfig, StatusResponse,
};
pub use render::{DrawCommand, Point, RecordingSurface, Surface, TextStyle};
pub use schedule::{FrameHandle, ManualScheduler, Scheduler};
pub use settings::{
    ImageStyle, MemoryStore, Settings, SettingsStore, DESCRIPTION_TOKEN, KEY_TOKEN, SECRET_TOKEN,
    STYLE_TOKEN,
};
pub use shape::{CellGrid, Shape, ShapeField, ShapeStyle, MIN_CELL_SIZE};

/// Browser implementations of the collaborator traits.
#[cfg(feature = "web")]
pub mod web {
    pub use crate::animator::web::{CanvasAnimator, JsRng, WebLoader};
    pub use crate::generation::web::{sleep_ms, FetchClient};
    pub use crate::render::web::{
        context_2d, copy_canvas_to_clipboard, draw_base64_png, png_clipboard_item, CanvasSurface,
    };
    pub use crate::schedule::web::{AnimationFrameScheduler, FrameCallback};
    pub use crate::settings::web::LocalStorageStore;
}
