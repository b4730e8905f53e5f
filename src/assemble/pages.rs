//! Interior sheet construction
//!
//! Physical formats (hardcover/softcover) drop the leading source page and
//! emit two sheets per remaining page: an image-only sheet followed by a
//! text-only sheet. The plain digital layout emits one combined sheet per
//! page with image/text placement alternating by display position. Every
//! sheet carries four corner crop-mark indicators; the template CSS decides
//! whether they are visible for the target format.

use crate::book::{Page, Story};

use super::images::{optimize_image_url, EMAIL_QUALITY, PRINT_QUALITY};
use super::text::{escape, personalize};
use super::RenderContext;

const CROP_MARKS: &str = concat!(
    r#"<div class="crop-mark top-left"></div>"#,
    r#"<div class="crop-mark top-right"></div>"#,
    r#"<div class="crop-mark bottom-left"></div>"#,
    r#"<div class="crop-mark bottom-right"></div>"#,
);

/// Visible placeholder emitted when a page has no usable image reference.
const MISSING_IMAGE_BLOCK: &str = r#"<div class="img-fallback">תמונה חסרה</div>"#;

/// Build the `{{PAGES}}` HTML for the resolved page sequence.
pub(crate) fn pages_html(
    story: &Story,
    pages: &[Page],
    ctx: &RenderContext,
    leaf_data_url: Option<&str>,
) -> String {
    let physical = story.book_type().is_physical();
    let title = story.title.as_deref().unwrap_or("");

    pages
        .iter()
        .enumerate()
        // The leading source page of a physical book is cover-adjacent
        // content and never rendered as interior.
        .filter(|(source_index, _)| !(physical && *source_index == 0))
        .enumerate()
        .map(|(display_index, (source_index, page))| {
            let block = PageBlock {
                story,
                page,
                source_index,
                display_index,
                title,
                leaf_data_url,
            };
            if physical {
                block.physical_sheets(ctx)
            } else {
                block.digital_sheet(ctx)
            }
        })
        .collect()
}

struct PageBlock<'a> {
    story: &'a Story,
    page: &'a Page,
    source_index: usize,
    display_index: usize,
    title: &'a str,
    leaf_data_url: Option<&'a str>,
}

impl PageBlock<'_> {
    /// Resolve this page's image with override precedence, or `None` when
    /// no reference of any kind exists.
    fn image_src(&self, ctx: &RenderContext) -> Option<String> {
        let raw = self
            .story
            .page_image_override(self.source_index)
            .and_then(|choices| choices.preferred())
            .or(self.page.image_url.as_deref())
            .filter(|src| !src.is_empty())?;
        let quality = if ctx.optimize_for_email {
            EMAIL_QUALITY
        } else {
            PRINT_QUALITY
        };
        Some(optimize_image_url(raw, quality))
    }

    fn text_html(&self, ctx: &RenderContext) -> String {
        let raw = self.page.text.as_deref().unwrap_or("");
        let personalized = personalize(raw, &ctx.child_name, ctx.child_age.as_deref());
        format!(r#"<p class="story">{}</p>"#, escape(&personalized))
    }

    fn img_html(&self, src: Option<&str>) -> String {
        match src {
            Some(src) => format!(r#"<img class="img" src="{}" />"#, escape(src)),
            None => MISSING_IMAGE_BLOCK.to_string(),
        }
    }

    /// Centered header band: leaf ornament, title, mirrored leaf ornament.
    /// Taller and larger in the physical layout.
    fn header_html(&self, physical: bool) -> String {
        let Some(leaf) = self.leaf_data_url else {
            return String::new();
        };
        let (top, gap, size) = if physical {
            ("12mm", "2mm", "24pt")
        } else {
            ("6mm", "14mm", "10pt")
        };
        format!(
            r#"<div style="position:absolute;left:0;right:0;top:{top};display:flex;align-items:center;justify-content:center;gap:{gap};pointer-events:none;z-index:5;"><img src="{leaf}" alt="leaf-left" style="height:6mm;opacity:.65;transform:scaleX(-1);" /><span style="font-size:{size};color:#5a6573;white-space:nowrap;">{title}</span><img src="{leaf}" alt="leaf-right" style="height:6mm;opacity:.65;" /></div>"#,
            top = top,
            gap = gap,
            size = size,
            leaf = leaf,
            title = escape(self.title),
        )
    }

    /// Centered footer page-number band.
    fn number_html(&self, physical: bool) -> String {
        let (bottom, size) = if physical { ("12mm", "24pt") } else { ("6mm", "10pt") };
        format!(
            r#"<div style="position:absolute;left:0;right:0;bottom:{bottom};display:flex;align-items:center;justify-content:center;pointer-events:none;color:#5a6573;font-size:{size};z-index:5;">- {num} -</div>"#,
            bottom = bottom,
            size = size,
            num = self.display_index + 1,
        )
    }

    /// Two consecutive sheets: image sheet, then text sheet.
    fn physical_sheets(&self, ctx: &RenderContext) -> String {
        let src = self.image_src(ctx);
        let img_html = self.img_html(src.as_deref());
        let bg_style = match src.as_deref() {
            Some(src) => format!(r#" style="background-image:url('{}')""#, escape(src)),
            None => String::new(),
        };
        let image_sheet = format!(
            r#"<section class="page bg-image"{bg}>{crops}<div class="sheet"><div class="imgbox">{img}</div></div></section>"#,
            bg = bg_style,
            crops = CROP_MARKS,
            img = img_html,
        );
        let text_sheet = format!(
            r#"<section class="page">{crops}<div class="sheet">{header}<div class="textbox">{text}</div>{number}</div></section>"#,
            crops = CROP_MARKS,
            header = self.header_html(true),
            text = self.text_html(ctx),
            number = self.number_html(true),
        );
        image_sheet + &text_sheet
    }

    /// One combined sheet; image leads on right-hand pages, text leads on
    /// left-hand pages.
    fn digital_sheet(&self, ctx: &RenderContext) -> String {
        let is_right = self.display_index % 2 == 0;
        let img_html = self.img_html(self.image_src(ctx).as_deref());
        let text_html = self.text_html(ctx);
        let body = if is_right {
            format!(
                r#"<div class="imgbox">{}</div><div class="textbox">{}</div>"#,
                img_html, text_html
            )
        } else {
            format!(
                r#"<div class="textbox">{}</div><div class="imgbox">{}</div>"#,
                text_html, img_html
            )
        };
        format!(
            r#"<section class="page {side}">{crops}<div class="sheet">{header}{body}{number}</div></section>"#,
            side = if is_right { "right" } else { "left" },
            crops = CROP_MARKS,
            header = self.header_html(false),
            body = body,
            number = self.number_html(false),
        )
    }
}
