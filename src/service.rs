//! PDF service facade
//!
//! Three render operations, each a validation pass, an assembly pass and a
//! print pass with variant-specific defaults. Validation happens before any
//! rendering cost; the synchronous browser work runs on a blocking thread.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::assemble::{self, RenderContext};
use crate::assets::AssetCache;
use crate::book::{Gender, Story};
use crate::config::BrowserConfig;
use crate::error::{AppError, Result};
use crate::palette::PalettePicker;
use crate::render::{
    self, MarginsMm, Orientation, PageGeometry, PaperFormat, PhysicalSpec, RenderJob, Viewport,
};

const BOOK_IMAGE_SETTLE: Duration = Duration::from_secs(15);
const TEXT_ONLY_IMAGE_SETTLE: Duration = Duration::from_secs(8);

/// Request body shared by all three generate endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRequest {
    pub story: Option<Story>,
    /// Older clients send the story under this key.
    pub selected_story: Option<Story>,
    pub child_name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub child_age: Option<String>,
    pub selected_gender: Option<String>,
    pub options: Option<PdfOptions>,
}

/// Recognized per-call options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfOptions {
    pub format: Option<String>,
    pub orientation: Option<String>,
    pub margin: Option<MarginSpec>,
    pub optimize_for_email: bool,
}

/// Per-edge margins as sent by clients (`"20mm"` strings or bare numbers).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarginSpec {
    pub top: Option<MmValue>,
    pub right: Option<MmValue>,
    pub bottom: Option<MmValue>,
    pub left: Option<MmValue>,
}

/// A millimeter quantity accepted as a number or a `"<n>mm"` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmValue(pub f64);

impl<'de> Deserialize<'de> for MmValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Str(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => MmValue(n),
            Raw::Str(s) => MmValue(parse_mm(&s)),
        })
    }
}

fn parse_mm(raw: &str) -> f64 {
    raw.trim()
        .trim_end_matches("mm")
        .trim()
        .parse()
        .unwrap_or(0.0)
}

/// `childAge` arrives as a string or a number depending on the client.
fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }
    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Str(s) => s,
        // Integral ages print without a trailing `.0`.
        Raw::Num(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Raw::Num(n) => n.to_string(),
    }))
}

/// A request that passed field validation.
#[derive(Debug)]
struct ValidatedRequest {
    story: Story,
    ctx: RenderContext,
    options: PdfOptions,
}

fn validate(req: GenerateRequest, require_gender: bool) -> Result<ValidatedRequest> {
    let story = req.story.or(req.selected_story);
    let mut missing: Vec<&str> = Vec::new();
    if story.is_none() {
        missing.push("story");
    }
    if req.child_name.as_deref().map_or(true, str::is_empty) {
        missing.push("childName");
    }
    if require_gender && req.selected_gender.as_deref().map_or(true, str::is_empty) {
        missing.push("selectedGender");
    }
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    let options = req.options.unwrap_or_default();
    let gender = Gender::from_request(req.selected_gender.as_deref().unwrap_or(""));
    Ok(ValidatedRequest {
        story: story.unwrap_or_default(),
        ctx: RenderContext {
            child_name: req.child_name.unwrap_or_default(),
            child_age: req.child_age,
            gender,
            optimize_for_email: options.optimize_for_email,
        },
        options,
    })
}

/// Digital sheet geometry from caller options with a variant default margin.
fn sheet_geometry(options: &PdfOptions, default_margin_mm: f64) -> PageGeometry {
    let format = options
        .format
        .as_deref()
        .and_then(PaperFormat::parse)
        .unwrap_or(PaperFormat::A4);
    let orientation = match options.orientation.as_deref() {
        Some("landscape") => Orientation::Landscape,
        _ => Orientation::Portrait,
    };
    let margins = match options.margin {
        Some(spec) => MarginsMm {
            top: spec.top.map_or(default_margin_mm, |v| v.0),
            right: spec.right.map_or(default_margin_mm, |v| v.0),
            bottom: spec.bottom.map_or(default_margin_mm, |v| v.0),
            left: spec.left.map_or(default_margin_mm, |v| v.0),
        },
        None => MarginsMm::uniform(default_margin_mm),
    };
    PageGeometry::Sheet {
        format,
        orientation,
        margins,
    }
}

/// The service owned by application state.
pub struct PdfService {
    browser: BrowserConfig,
    assets: Arc<AssetCache>,
    palette: Arc<dyn PalettePicker>,
}

impl PdfService {
    pub fn new(
        browser: BrowserConfig,
        assets: Arc<AssetCache>,
        palette: Arc<dyn PalettePicker>,
    ) -> Self {
        Self {
            browser,
            assets,
            palette,
        }
    }

    /// Full illustrated book.
    pub async fn render_book(&self, req: GenerateRequest) -> Result<Vec<u8>> {
        let ValidatedRequest {
            story,
            ctx,
            options,
        } = validate(req, true)?;
        let bundle = self.assets.bundle().await?;
        let html = assemble::assemble_book(&story, &ctx, &bundle)?;

        let book_type = story.book_type();
        let geometry = if book_type.is_physical() {
            PageGeometry::interior_spread(PhysicalSpec::for_book_type(book_type))
        } else {
            sheet_geometry(&options, 20.0)
        };
        let job = RenderJob {
            geometry,
            viewport: if ctx.optimize_for_email {
                Viewport::EMAIL
            } else {
                Viewport::BOOK
            },
            wait_for_full_load: false,
            image_settle_timeout: BOOK_IMAGE_SETTLE,
            page_number_footer: true,
            extra_args: Vec::new(),
        };
        self.print(html, job).await
    }

    /// Text-only variant: same story shape through the assembler, always
    /// sheet geometry regardless of book type.
    pub async fn render_text_only(&self, req: GenerateRequest) -> Result<Vec<u8>> {
        let ValidatedRequest {
            story,
            ctx,
            options,
        } = validate(req, true)?;
        let bundle = self.assets.bundle().await?;
        let html = assemble::assemble_book(&story, &ctx, &bundle)?;

        let job = RenderJob {
            geometry: sheet_geometry(&options, 5.0),
            viewport: Viewport::BOOK,
            wait_for_full_load: true,
            image_settle_timeout: TEXT_ONLY_IMAGE_SETTLE,
            page_number_footer: true,
            extra_args: Vec::new(),
        };
        self.print(html, job).await
    }

    /// Cover spread; gender is not required.
    pub async fn render_cover(&self, req: GenerateRequest) -> Result<Vec<u8>> {
        let ValidatedRequest { story, ctx, .. } = validate(req, false)?;
        let bundle = self.assets.bundle().await?;

        // Plain cover URL when present, otherwise the resolved cover
        // source (which may be a data URI).
        let palette_source = story
            .cover_image
            .as_ref()
            .and_then(|img| img.url.clone())
            .or_else(|| Some(assemble::cover_image_src(&story)).filter(|s| !s.is_empty()));
        let gradient = self.palette.gradient_for(palette_source.as_deref()).await;
        let html = assemble::assemble_cover(&story, &ctx, &bundle, &gradient)?;

        let job = RenderJob {
            geometry: PageGeometry::cover_spread(story.book_type()),
            viewport: Viewport::COVER,
            wait_for_full_load: false,
            image_settle_timeout: BOOK_IMAGE_SETTLE,
            page_number_footer: false,
            extra_args: Vec::new(),
        };
        self.print(html, job).await
    }

    async fn print(&self, html: String, job: RenderJob) -> Result<Vec<u8>> {
        let browser = self.browser.clone();
        let pdf = tokio::task::spawn_blocking(move || render::render(&html, &job, &browser))
            .await
            .map_err(|e| AppError::Task(e.to_string()))??;
        Ok(pdf)
    }
}
