//! PDF rasterization
//!
//! Drives a headless Chromium process over the DevTools protocol. Browser
//! acquisition walks an ordered strategy list (pinned path, PATH discovery,
//! bundled resolution); geometry converts the millimeter layout contract
//! into the inch-based print call.

mod driver;
pub mod geometry;
mod launch;

use std::time::Duration;

use thiserror::Error;

use crate::config::BrowserConfig;

pub use geometry::{MarginsMm, Orientation, PageGeometry, PaperFormat, PhysicalSpec};

/// Rendering failures. All of these surface as server errors; client-input
/// problems are rejected before a render is attempted.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("browser error: {0}")]
    Browser(#[from] anyhow::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Browser window size and device scale, applied via launch flags.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl Viewport {
    /// Interior renders destined for print.
    pub const BOOK: Viewport = Viewport {
        width: 1200,
        height: 1600,
        scale_factor: 5.0,
    };

    /// Smaller, cheaper raster for email-attached output.
    pub const EMAIL: Viewport = Viewport {
        width: 1000,
        height: 1400,
        scale_factor: 1.2,
    };

    /// Cover spread raster.
    pub const COVER: Viewport = Viewport {
        width: 1200,
        height: 800,
        scale_factor: 5.0,
    };
}

/// Everything one print call needs beyond the HTML itself.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub geometry: PageGeometry,
    pub viewport: Viewport,
    /// Wait for the window load event before settling assets.
    pub wait_for_full_load: bool,
    /// Per-image settle bound; a slower image counts as settled.
    pub image_settle_timeout: Duration,
    /// Engine-drawn centered page-number footer.
    pub page_number_footer: bool,
    /// Caller-supplied Chromium flags, merged into the baseline set.
    pub extra_args: Vec<String>,
}

/// Render HTML to PDF bytes on the current thread.
///
/// Blocking: the DevTools client is synchronous and a render holds a whole
/// browser process. Async callers wrap this in `spawn_blocking`.
pub fn render(html: &str, job: &RenderJob, config: &BrowserConfig) -> Result<Vec<u8>, RenderError> {
    driver::render_blocking(html, job, config)
}
