//! Document assembly
//!
//! Turns a story record plus a recipient context into a complete HTML
//! document string: template selection by book type, placeholder
//! substitution, image resolution with override precedence, per-format
//! pagination, page furniture and the dedication section.
//!
//! Assembly is synchronous and pure over an [`AssetBundle`] snapshot, so
//! identical inputs always produce byte-identical output.

mod images;
mod pages;
mod text;

use thiserror::Error;

use crate::assets::{AssetBundle, FontSet, TemplateKey};
use crate::book::{BookType, Gender, Story};

pub use images::{optimize_image_url, ImageQuality, EMAIL_COVER_QUALITY, EMAIL_QUALITY, PRINT_QUALITY};
pub use text::{escape, personalize};

/// Brand line printed on the dedication card.
const SITE_BRAND: &str = "Storybook Studio";

/// Fallback dedication when no recipient name is available anywhere.
const GENERIC_DEDICATION: &str = "ספר זה נוצר באהבה עבור ילד אהוב";

/// Default dedication message for the cover template.
const COVER_DEDICATION_DEFAULT: &str = "ספר מיוחד זה נוצר במיוחד עבורך, עם אהבה רבה";

/// Default dedication title.
const DEDICATION_TITLE_DEFAULT: &str = "מוקדש באהבה";

/// Assembly failures. Template absence is the one condition where assembly
/// cannot degrade; everything else falls back with reduced fidelity.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("template not found for key: {0}")]
    TemplateNotFound(&'static str),
}

/// Typed recipient/options context for one assembly.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub child_name: String,
    pub child_age: Option<String>,
    pub gender: Gender,
    pub optimize_for_email: bool,
}

/// Assemble the interior document (illustrated and text-only variants).
pub fn assemble_book(
    story: &Story,
    ctx: &RenderContext,
    assets: &AssetBundle,
) -> Result<String, AssembleError> {
    let book_type = story.book_type();
    let key = interior_template_key(book_type);
    let template = assets
        .templates
        .get(key)
        .or_else(|| assets.templates.get(TemplateKey::Digital))
        .ok_or(AssembleError::TemplateNotFound(key.as_str()))?;

    let source_pages = story.pages_for(ctx.gender);
    tracing::debug!(
        pages = source_pages.len(),
        book_type = ?book_type,
        optimize_for_email = ctx.optimize_for_email,
        "assembling interior document"
    );
    let pages_html = pages::pages_html(
        story,
        &source_pages,
        ctx,
        assets.leaf_data_url.as_deref(),
    );

    let mut font_css = interior_font_css(&assets.fonts);
    if ctx.optimize_for_email {
        font_css.push_str(EMAIL_OPTIMIZE_CSS);
    }

    let cover_src = interior_cover_src(story, ctx);
    let dedication = dedication_section(story, ctx, assets, book_type.is_physical());

    Ok(template
        .replacen("/*__FONT_CSS__*/", &font_css, 1)
        .replace("{{BOOK_TITLE}}", &escape(story.title.as_deref().unwrap_or("")))
        .replace(
            "{{BOOK_SUBTITLE}}",
            &escape(
                story
                    .short_description
                    .as_deref()
                    .or(story.back_cover_text.as_deref())
                    .unwrap_or(""),
            ),
        )
        .replace(
            "{{BOOK_DESCRIPTION}}",
            &escape(
                story
                    .back_cover_text
                    .as_deref()
                    .or(story.description.as_deref())
                    .unwrap_or(""),
            ),
        )
        .replace("{{CHILD_NAME}}", &escape(&ctx.child_name))
        .replace("{{COVER_IMAGE_URL}}", &escape(&cover_src))
        .replace(
            "{{SITE_LOGO_URL}}",
            assets.logo_data_url.as_deref().unwrap_or(""),
        )
        .replace("{{BLANK_PAGES}}", "")
        .replace("{{DEDICATION_PAGE}}", &dedication)
        .replace("{{PAGES}}", &pages_html))
}

/// Assemble the cover document. `gradient` is the (start, end) color pair
/// supplied by the palette collaborator.
pub fn assemble_cover(
    story: &Story,
    ctx: &RenderContext,
    assets: &AssetBundle,
    gradient: &(String, String),
) -> Result<String, AssembleError> {
    let key = cover_template_key(story.book_type());
    let template = assets
        .templates
        .get(key)
        .ok_or(AssembleError::TemplateNotFound(key.as_str()))?;

    let cover_src = cover_image_src(story);
    let child_photo_src = child_photo_src(story);
    let gradient_css = format!(
        ".bg-tint{{background:linear-gradient(90deg, {}, {}) !important;}}",
        gradient.1, gradient.0
    );

    Ok(template
        .replacen("/*__FONT_CSS__*/", &cover_font_css(&assets.fonts), 1)
        .replacen("/*__GRADIENT_CSS__*/", &gradient_css, 1)
        .replace("{{BOOK_TITLE}}", &escape(story.title.as_deref().unwrap_or("")))
        .replace(
            "{{BOOK_SUBTITLE}}",
            &escape(
                story
                    .short_description
                    .as_deref()
                    .or(story.back_cover_text.as_deref())
                    .unwrap_or(""),
            ),
        )
        .replace(
            "{{BOOK_DESCRIPTION}}",
            &escape(
                story
                    .back_cover_text
                    .as_deref()
                    .or(story.description.as_deref())
                    .unwrap_or(""),
            ),
        )
        .replace("{{CHILD_NAME}}", &escape(&ctx.child_name))
        .replace("{{COVER_IMAGE_URL}}", &escape(&cover_src))
        .replace("{{BACK_COVER_TEXT}}", &escape(story.back_cover_text.as_deref().unwrap_or("")))
        .replace("{{CHILD_PHOTO_URL}}", &escape(&child_photo_src))
        .replace(
            "{{SITE_LOGO_URL}}",
            assets.logo_data_url.as_deref().unwrap_or(""),
        )
        .replace(
            "{{DEDICATION_MESSAGE}}",
            &escape(
                story
                    .dedication_message
                    .as_deref()
                    .unwrap_or(COVER_DEDICATION_DEFAULT),
            ),
        ))
}

fn interior_template_key(book_type: BookType) -> TemplateKey {
    match book_type {
        BookType::Hardcover => TemplateKey::Hardcover,
        BookType::Softcover => TemplateKey::Softcover,
        BookType::Digital => TemplateKey::Digital,
    }
}

fn cover_template_key(book_type: BookType) -> TemplateKey {
    match book_type {
        BookType::Softcover => TemplateKey::CoverSoftcover,
        _ => TemplateKey::Cover,
    }
}

/// Stripped-down visuals for small email attachments.
const EMAIL_OPTIMIZE_CSS: &str = "\n.sheet{ background: none !important; background-image: none !important; }\n.cover-image{ filter: none !important; }\n";

/// `@font-face` declarations for the interior document. Absent font slots
/// are skipped so the family list degrades to `sans-serif`.
fn interior_font_css(fonts: &FontSet) -> String {
    let mut css = String::new();
    push_otf_face(&mut css, "SpacerRegular", fonts.spacer_regular.as_deref(), 400);
    push_otf_face(&mut css, "SpacerBold", fonts.spacer_bold.as_deref(), 700);
    push_otf_face(&mut css, "SpacerBlack", fonts.spacer_black.as_deref(), 900);
    push_body_face(&mut css, fonts.body.as_deref());
    if !css.is_empty() {
        css.push_str(
            "html,body{font-family:'SpacerRegular','SpacerBold','SpacerBlack',sans-serif;}\n",
        );
    }
    css
}

/// Cover font CSS: the three cover faces plus the body face.
fn cover_font_css(fonts: &FontSet) -> String {
    let mut css = String::new();
    push_otf_face(&mut css, "SpacerRegular", fonts.spacer_regular.as_deref(), 400);
    push_otf_face(&mut css, "SpacerBold", fonts.spacer_bold.as_deref(), 700);
    push_otf_face(&mut css, "SpacerBlack", fonts.spacer_black.as_deref(), 900);
    push_body_face(&mut css, fonts.body.as_deref());
    if fonts.body.is_some() {
        css.push_str("html,body{font-family:'Frank',sans-serif;}\n");
    }
    css
}

/// Body text face (`Frank`), used by running text and the engine footer.
fn push_body_face(css: &mut String, blob: Option<&str>) {
    if let Some(blob) = blob {
        css.push_str(&format!(
            "@font-face{{font-family:'Frank';src:url('data:font/ttf;base64,{}') format('truetype');font-weight:700;font-style:normal;font-display:swap;}}\n",
            blob
        ));
    }
}

fn push_otf_face(css: &mut String, family: &str, blob: Option<&str>, weight: u16) {
    if let Some(blob) = blob {
        css.push_str(&format!(
            "@font-face{{font-family:'{}';src:url('data:font/otf;base64,{}') format('opentype');font-weight:{};font-style:normal;font-display:swap;}}\n",
            family, blob, weight
        ));
    }
}

/// Cover slot for interior templates, with override precedence:
/// selected override, main override, story cover URL, embedded cover binary.
fn interior_cover_src(story: &Story, ctx: &RenderContext) -> String {
    let raw = story
        .cover_image_override()
        .and_then(|choices| choices.preferred())
        .map(str::to_string)
        .or_else(|| {
            story
                .cover_image
                .as_ref()
                .and_then(|img| img.url.clone().or_else(|| img.data_uri()))
        });
    match raw {
        Some(src) if !src.starts_with("data:") => {
            let quality = if ctx.optimize_for_email {
                EMAIL_COVER_QUALITY
            } else {
                PRINT_QUALITY
            };
            optimize_image_url(&src, quality)
        }
        Some(src) => src,
        None => String::new(),
    }
}

/// Cover image for the cover template: embedded binary first, then URL.
/// Also feeds the palette collaborator when the story has no plain cover
/// URL. Empty when the story carries no cover reference at all.
pub fn cover_image_src(story: &Story) -> String {
    let Some(cover) = story.cover_image.as_ref() else {
        return String::new();
    };
    if let Some(data_uri) = cover.data_uri() {
        return data_uri;
    }
    match cover.url.as_deref() {
        Some(url) => optimize_image_url(url, PRINT_QUALITY),
        None => String::new(),
    }
}

/// Child-photo source, resolved through the fixed fallback chain.
fn child_photo_src(story: &Story) -> String {
    if let Some(photo) = story.child_photo.as_ref() {
        if let Some(data_uri) = photo.data_uri() {
            return data_uri;
        }
        if let Some(url) = photo.url.as_deref() {
            return optimize_image_url(url, PRINT_QUALITY);
        }
    }
    story
        .uploaded_image
        .as_deref()
        .or(story.original_character_image.as_deref())
        .or(story.character_image_base64.as_deref())
        .or_else(|| {
            story
                .book_data
                .as_ref()
                .and_then(|d| d.character_image_base64.as_deref())
        })
        .or_else(|| {
            story
                .book_data
                .as_ref()
                .and_then(|d| d.uploaded_image.as_deref())
        })
        .unwrap_or("")
        .to_string()
}

/// Build the dedication page section.
fn dedication_section(
    story: &Story,
    ctx: &RenderContext,
    assets: &AssetBundle,
    physical: bool,
) -> String {
    let raw = story
        .dedication_message
        .as_deref()
        .or(story.back_cover_text.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let fallback_name = Some(ctx.child_name.as_str())
        .filter(|s| !s.is_empty())
        .or(story.child_name.as_deref())
        .or_else(|| story.book_data.as_ref().and_then(|d| d.child_name.as_deref()))
        .or_else(|| story.book_content.as_ref().and_then(|c| c.child_name.as_deref()));

    let default_dedication = match fallback_name {
        Some(name) => format!("ספר זה נוצר באהבה עבור {}", name),
        None => GENERIC_DEDICATION.to_string(),
    };
    let resolved = raw.map(str::to_string).unwrap_or(default_dedication);
    let dedication_text = personalize(&resolved, &ctx.child_name, ctx.child_age.as_deref())
        .trim()
        .to_string();

    let title_text = story
        .title
        .as_deref()
        .or_else(|| story.book_data.as_ref().and_then(|d| d.title.as_deref()))
        .unwrap_or(DEDICATION_TITLE_DEFAULT);

    // Physical books get leaf ornaments around the dedication title when
    // the ornament asset is available.
    let title_html = match assets.leaf_data_url.as_deref().filter(|_| physical) {
        Some(leaf) => format!(
            r#"<div class="dedication-title-with-leaves"><img src="{leaf}" alt="leaf-left" class="dedication-leaf-left" /><span class="dedication-title-text">{title}</span><img src="{leaf}" alt="leaf-right" class="dedication-leaf-right" /></div>"#,
            leaf = leaf,
            title = escape(title_text),
        ),
        None => escape(title_text),
    };

    format!(
        r#"<section class="page dedication"><div class="dedication-sheet"><div class="dedication-card"><div class="dedication-title">{}</div><div class="dedication-text">{}</div><div class="dedication-accent">{}</div></div></div></section>"#,
        title_html,
        escape(&dedication_text),
        SITE_BRAND,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::{TemplateKey, TemplateSet};
    use crate::book::{Gender, HARDCOVER_CLASSIFIER, SOFTCOVER_CLASSIFIER};

    fn interior_template() -> String {
        "<html><style>/*__FONT_CSS__*/</style><h1>{{BOOK_TITLE}}</h1>{{DEDICATION_PAGE}}{{PAGES}}{{BOOK_SUBTITLE}}{{BOOK_DESCRIPTION}}{{CHILD_NAME}}{{COVER_IMAGE_URL}}{{SITE_LOGO_URL}}{{BLANK_PAGES}}</html>".to_string()
    }

    fn cover_template() -> String {
        "<html><style>/*__FONT_CSS__*/ /*__GRADIENT_CSS__*/</style>{{BOOK_TITLE}}{{BOOK_SUBTITLE}}{{BOOK_DESCRIPTION}}{{CHILD_NAME}}[{{COVER_IMAGE_URL}}][{{CHILD_PHOTO_URL}}]{{BACK_COVER_TEXT}}{{SITE_LOGO_URL}}{{DEDICATION_MESSAGE}}</html>".to_string()
    }

    fn bundle() -> AssetBundle {
        let mut templates = TemplateSet::new();
        templates.insert(TemplateKey::Digital, format!("digital:{}", interior_template()));
        templates.insert(TemplateKey::Hardcover, format!("hardcover:{}", interior_template()));
        templates.insert(TemplateKey::Softcover, format!("softcover:{}", interior_template()));
        templates.insert(TemplateKey::Cover, format!("cover:{}", cover_template()));
        templates.insert(
            TemplateKey::CoverSoftcover,
            format!("cover-softcover:{}", cover_template()),
        );
        AssetBundle {
            templates: Arc::new(templates),
            fonts: Arc::new(FontSet::default()),
            logo_data_url: None,
            leaf_data_url: None,
        }
    }

    fn ctx() -> RenderContext {
        RenderContext {
            child_name: "נועה".to_string(),
            child_age: Some("5".to_string()),
            gender: Gender::Girl,
            optimize_for_email: false,
        }
    }

    fn story_with_type(book_type: Option<&str>) -> Story {
        serde_json::from_value(serde_json::json!({
            "title": "הרפתקה",
            "bookType": book_type,
            "pages": [{ "text": "שלום [שם הילד]" }]
        }))
        .unwrap()
    }

    #[test]
    fn template_selection_follows_book_type() {
        let assets = bundle();
        for (classifier, prefix) in [
            (Some(HARDCOVER_CLASSIFIER), "hardcover:"),
            (Some(SOFTCOVER_CLASSIFIER), "softcover:"),
            (Some("something else"), "digital:"),
            (None, "digital:"),
        ] {
            let html = assemble_book(&story_with_type(classifier), &ctx(), &assets).unwrap();
            assert!(
                html.starts_with(prefix),
                "classifier {:?} selected wrong template",
                classifier
            );
        }
    }

    #[test]
    fn missing_template_is_fatal() {
        let assets = AssetBundle {
            templates: Arc::new(TemplateSet::new()),
            fonts: Arc::new(FontSet::default()),
            logo_data_url: None,
            leaf_data_url: None,
        };
        let err = assemble_book(&story_with_type(None), &ctx(), &assets).unwrap_err();
        assert!(matches!(err, AssembleError::TemplateNotFound(_)));
    }

    #[test]
    fn assembly_is_deterministic() {
        let assets = bundle();
        let story = story_with_type(Some(HARDCOVER_CLASSIFIER));
        let first = assemble_book(&story, &ctx(), &assets).unwrap();
        let second = assemble_book(&story, &ctx(), &assets).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn story_text_is_escaped() {
        let assets = bundle();
        let story: Story = serde_json::from_value(serde_json::json!({
            "title": "<script>alert('x')</script>",
            "pages": [{ "text": "a & b < c \" d ' e" }]
        }))
        .unwrap();
        let html = assemble_book(&story, &ctx(), &assets).unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("a & b < c"));
        assert!(html.contains("&amp;"));
    }

    #[test]
    fn placeholder_substitution_reaches_output() {
        let assets = bundle();
        let story: Story = serde_json::from_value(serde_json::json!({
            "pages": [{ "text": "[שם הילד] בן [גיל הילד]" }]
        }))
        .unwrap();
        let html = assemble_book(&story, &ctx(), &assets).unwrap();
        assert!(html.contains("נועה"));
        assert!(html.contains('5'));
        assert!(!html.contains("[שם הילד]"));
        assert!(!html.contains("[גיל הילד]"));
    }

    #[test]
    fn no_tokens_remain_after_final_substitution() {
        let assets = bundle();
        let html = assemble_book(&story_with_type(None), &ctx(), &assets).unwrap();
        for token in [
            "{{BOOK_TITLE}}",
            "{{PAGES}}",
            "{{DEDICATION_PAGE}}",
            "{{CHILD_NAME}}",
            "/*__FONT_CSS__*/",
        ] {
            assert!(!html.contains(token), "{} leaked into output", token);
        }
    }

    #[test]
    fn dedication_prefers_explicit_message() {
        let assets = bundle();
        let story: Story = serde_json::from_value(serde_json::json!({
            "dedicationMessage": "באהבה מסבא וסבתא",
            "backCoverText": "טקסט גב",
            "pages": []
        }))
        .unwrap();
        let html = assemble_book(&story, &ctx(), &assets).unwrap();
        assert!(html.contains("באהבה מסבא וסבתא"));
    }

    #[test]
    fn dedication_falls_back_to_generated_message() {
        let assets = bundle();
        let story: Story = serde_json::from_value(serde_json::json!({ "pages": [] })).unwrap();
        let html = assemble_book(&story, &ctx(), &assets).unwrap();
        assert!(html.contains("ספר זה נוצר באהבה עבור נועה"));
    }

    #[test]
    fn cover_selects_softcover_variant() {
        let assets = bundle();
        let gradient = ("#0ea5e9".to_string(), "#38bdf8".to_string());
        let soft = assemble_cover(
            &story_with_type(Some(SOFTCOVER_CLASSIFIER)),
            &ctx(),
            &assets,
            &gradient,
        )
        .unwrap();
        assert!(soft.starts_with("cover-softcover:"));

        let plain = assemble_cover(&story_with_type(None), &ctx(), &assets, &gradient).unwrap();
        assert!(plain.starts_with("cover:"));
    }

    #[test]
    fn cover_gradient_css_is_injected() {
        let assets = bundle();
        let gradient = ("#111111".to_string(), "#222222".to_string());
        let html = assemble_cover(&story_with_type(None), &ctx(), &assets, &gradient).unwrap();
        assert!(html.contains("linear-gradient(90deg, #222222, #111111)"));
    }

    #[test]
    fn child_photo_chain_reaches_uploaded_image() {
        let story: Story = serde_json::from_value(serde_json::json!({
            "uploadedImage": "https://img/uploaded.png"
        }))
        .unwrap();
        assert_eq!(child_photo_src(&story), "https://img/uploaded.png");
    }

    #[test]
    fn child_photo_prefers_embedded_photo() {
        let story: Story = serde_json::from_value(serde_json::json!({
            "childPhoto": { "base64": "QUJD", "mimeType": "image/jpeg" },
            "uploadedImage": "https://img/uploaded.png"
        }))
        .unwrap();
        assert_eq!(child_photo_src(&story), "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn interior_cover_override_wins() {
        let story: Story = serde_json::from_value(serde_json::json!({
            "coverImage": { "url": "https://img/story-cover.png" },
            "imageState": { "cover": { "images": { "selectedImage": "https://img/chosen.png" } } }
        }))
        .unwrap();
        assert_eq!(interior_cover_src(&story, &ctx()), "https://img/chosen.png");
    }
}
