//! Render sequence
//!
//! One browser process per render call. The assembled HTML is persisted to
//! a temp file and loaded over `file://`, the tab is switched to print
//! media, fonts and images are allowed to settle, and the page is printed.
//! The `Browser` value lives on this call's stack, so the child process is
//! killed on every exit path when it drops.

use std::io::Write as _;
use std::time::Duration;

use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::types::PrintToPdfOptions;

use crate::config::BrowserConfig;

use super::geometry::mm_to_in;
use super::launch;
use super::{RenderError, RenderJob};

/// Upper bound on navigation and individual CDP calls.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Engine footer: centered page number in the body typeface.
const FOOTER_TEMPLATE: &str = r#"<div style="font-size:9pt;width:100%;text-align:center;color:#5a6573;font-family:Frank;"><span class="pageNumber"></span></div>"#;

/// Engine header is always blank; the document draws its own header band.
const EMPTY_TEMPLATE: &str = "<div></div>";

/// Resolves once `document.readyState` is complete (subresources loaded).
const FULL_LOAD_JS: &str = r#"
new Promise((resolve) => {
    if (document.readyState === 'complete') { resolve(true); return; }
    window.addEventListener('load', () => resolve(true), { once: true });
})
"#;

const FONTS_READY_JS: &str = "document.fonts.ready.then(() => true)";

/// Wait for every image with a per-image bound; a timed-out or broken
/// image counts as settled.
fn image_settle_js(timeout: Duration) -> String {
    format!(
        r#"
Promise.all(Array.from(document.images).map((img) => {{
    if (img.complete) return Promise.resolve();
    return new Promise((resolve) => {{
        const done = () => resolve();
        img.addEventListener('load', done, {{ once: true }});
        img.addEventListener('error', done, {{ once: true }});
        setTimeout(done, {});
    }});
}})).then(() => true)
"#,
        timeout.as_millis()
    )
}

/// Render `html` to PDF bytes. Blocking; callers run this on a blocking
/// thread.
pub(super) fn render_blocking(
    html: &str,
    job: &RenderJob,
    config: &BrowserConfig,
) -> Result<Vec<u8>, RenderError> {
    let browser = launch::acquire(config, job.viewport, &job.extra_args)?;

    let mut file = tempfile::Builder::new()
        .prefix("storybook-render-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(html.as_bytes())?;
    file.flush()?;
    let url = format!("file://{}", file.path().display());

    let tab = browser.new_tab()?;
    tab.set_default_timeout(NAVIGATION_TIMEOUT);
    tab.navigate_to(&url)?;
    tab.wait_until_navigated()?;

    if job.wait_for_full_load {
        tab.evaluate(FULL_LOAD_JS, true)?;
    }

    // Print stylesheets govern pagination; emulate before measuring fonts
    // and images so nothing settles under screen CSS.
    tab.call_method(Emulation::SetEmulatedMedia {
        media: Some("print".to_string()),
        features: None,
    })?;
    tab.evaluate(FONTS_READY_JS, true)?;
    tab.evaluate(&image_settle_js(job.image_settle_timeout), true)?;

    let pdf = tab.print_to_pdf(Some(print_options(job)))?;
    tracing::debug!(bytes = pdf.len(), "pdf rasterization complete");
    Ok(pdf)
}

fn print_options(job: &RenderJob) -> PrintToPdfOptions {
    let (width_in, height_in, margins) = job.geometry.paper_in();
    let (header, footer, show) = if job.page_number_footer {
        (
            Some(EMPTY_TEMPLATE.to_string()),
            Some(FOOTER_TEMPLATE.to_string()),
            Some(true),
        )
    } else {
        (None, None, Some(false))
    };
    PrintToPdfOptions {
        print_background: Some(true),
        prefer_css_page_size: Some(false),
        paper_width: Some(width_in),
        paper_height: Some(height_in),
        margin_top: Some(mm_to_in(margins.top)),
        margin_bottom: Some(mm_to_in(margins.bottom)),
        margin_left: Some(mm_to_in(margins.left)),
        margin_right: Some(mm_to_in(margins.right)),
        display_header_footer: show,
        header_template: header,
        footer_template: footer,
        ..Default::default()
    }
}
