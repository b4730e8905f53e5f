//! Story record and related types
//!
//! The shapes here mirror the client payload faithfully (camelCase field
//! names, everything optional) so that partial stories deserialize without
//! failing; the assembler is responsible for degrading gracefully when
//! fields are absent.

use std::collections::HashMap;

use serde::Deserialize;

/// Book-type classifier strings carried by the source content system.
///
/// These are wire values, not display strings; they must match the upstream
/// catalog exactly.
pub const HARDCOVER_CLASSIFIER: &str = "ספר כריכה קשה";
pub const SOFTCOVER_CLASSIFIER: &str = "חוברת כריכה רכה";

/// Resolved book format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookType {
    Digital,
    Hardcover,
    Softcover,
}

impl BookType {
    /// Classify a raw `bookType` string. Unknown or absent values resolve
    /// to the digital layout.
    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some(HARDCOVER_CLASSIFIER) => BookType::Hardcover,
            Some(SOFTCOVER_CLASSIFIER) => BookType::Softcover,
            _ => BookType::Digital,
        }
    }

    /// Physical formats require bleed, spine and crop-mark geometry.
    pub fn is_physical(self) -> bool {
        matches!(self, BookType::Hardcover | BookType::Softcover)
    }
}

/// Recipient gender, used to select the matching page branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Boy,
    Girl,
}

impl Gender {
    /// Parse the `selectedGender` request field. Anything other than
    /// `"girl"` maps to the boy branch, matching the upstream contract.
    pub fn from_request(raw: &str) -> Self {
        if raw == "girl" {
            Gender::Girl
        } else {
            Gender::Boy
        }
    }

    /// Key into a gender-keyed page map.
    pub fn branch_key(self) -> &'static str {
        match self {
            Gender::Girl => "female",
            Gender::Boy => "male",
        }
    }

    fn other_branch_key(self) -> &'static str {
        match self {
            Gender::Girl => "male",
            Gender::Boy => "female",
        }
    }
}

/// A single story page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub text: Option<String>,
    pub image_url: Option<String>,
}

/// Page sequence: either a flat ordered list or a mapping keyed by gender
/// branch (`male` / `female`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoryPages {
    Flat(Vec<Page>),
    ByGender(HashMap<String, Vec<Page>>),
}

/// An image reference that may be a URL or embedded binary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSource {
    pub url: Option<String>,
    pub base64: Option<String>,
    pub mime_type: Option<String>,
}

impl ImageSource {
    /// Re-encode the embedded binary as a data URI with its stated MIME
    /// type (default `image/png`).
    pub fn data_uri(&self) -> Option<String> {
        self.base64.as_ref().map(|b64| {
            let mime = self.mime_type.as_deref().unwrap_or("image/png");
            format!("data:{};base64,{}", mime, b64)
        })
    }
}

/// Explicit per-page image selections that take precedence over the page's
/// own default image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageChoices {
    pub selected_image: Option<String>,
    pub main_image: Option<String>,
}

impl ImageChoices {
    /// Selected image wins over main image.
    pub fn preferred(&self) -> Option<&str> {
        self.selected_image
            .as_deref()
            .or(self.main_image.as_deref())
    }
}

/// Image override state for one page (or the cover).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageImageState {
    pub images: Option<ImageChoices>,
}

/// Per-story image override map. Page keys are stringified source indices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageState {
    pub pages: HashMap<String, PageImageState>,
    pub cover: Option<PageImageState>,
}

/// Legacy nested book payload fields some clients still send.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookData {
    pub title: Option<String>,
    pub child_name: Option<String>,
    pub character_image_base64: Option<String>,
    pub uploaded_image: Option<String>,
}

/// Legacy nested content payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookContent {
    pub child_name: Option<String>,
}

/// The source content record for one book.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Story {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub back_cover_text: Option<String>,
    pub dedication_message: Option<String>,
    pub book_type: Option<String>,
    pub pages: Option<StoryPages>,
    pub cover_image: Option<ImageSource>,
    pub child_photo: Option<ImageSource>,
    pub uploaded_image: Option<String>,
    pub original_character_image: Option<String>,
    pub character_image_base64: Option<String>,
    pub child_name: Option<String>,
    pub book_data: Option<BookData>,
    pub book_content: Option<BookContent>,
    pub image_state: Option<ImageState>,
}

impl Story {
    /// Resolved book type (unknown classifiers default to digital).
    pub fn book_type(&self) -> BookType {
        BookType::classify(self.book_type.as_deref())
    }

    /// Resolve the page sequence for the given recipient gender.
    ///
    /// Flat sequences are used as-is. Gender-keyed sequences select the
    /// matching branch; if that branch is absent the opposite branch is
    /// used, and an empty sequence is the last resort.
    pub fn pages_for(&self, gender: Gender) -> Vec<Page> {
        match &self.pages {
            Some(StoryPages::Flat(pages)) => pages.clone(),
            Some(StoryPages::ByGender(map)) => map
                .get(gender.branch_key())
                .or_else(|| map.get(gender.other_branch_key()))
                .cloned()
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Image override for a source page index, if any.
    pub fn page_image_override(&self, source_index: usize) -> Option<&ImageChoices> {
        self.image_state
            .as_ref()?
            .pages
            .get(&source_index.to_string())?
            .images
            .as_ref()
    }

    /// Image override for the cover, if any.
    pub fn cover_image_override(&self) -> Option<&ImageChoices> {
        self.image_state.as_ref()?.cover.as_ref()?.images.as_ref()
    }
}
