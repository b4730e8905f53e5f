//! In-memory asset cache
//!
//! An explicitly constructed cache owned by the application state. Template
//! lookups try a fixed list of candidate directories; the first existing
//! file wins. Missing fonts and ornaments degrade with a warning, missing
//! templates leave their key absent (with one designated fallback:
//! digital -> softcover). The template token contract is checked once at
//! load time so broken template files are visible in the logs, not in the
//! rendered output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};

use crate::config::AssetConfig;

/// Candidate asset directories, tried in priority order.
const CANDIDATE_DIRS: &[&str] = &["pdf-templates", "assets/pdf-templates", "templates"];

/// Font files and the CSS family each maps to.
const BODY_FONT_FILE: &str = "frank-bold.ttf";
const SPACER_REGULAR_FILE: &str = "spacer-regular.otf";
const SPACER_BOLD_FILE: &str = "spacer-bold.otf";
const SPACER_BLACK_FILE: &str = "spacer-black.otf";

const LOGO_FILE: &str = "logo.png";
const LEAF_FILE: &str = "leaf.svg";

/// Asset loading errors
#[derive(Debug, Error)]
pub enum AssetError {
    /// Reading an existing asset file failed
    #[error("failed to read asset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Template lookup key, one per supported render format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    Digital,
    Hardcover,
    Softcover,
    Cover,
    CoverSoftcover,
}

impl TemplateKey {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKey::Digital => "digital",
            TemplateKey::Hardcover => "hardcover",
            TemplateKey::Softcover => "softcover",
            TemplateKey::Cover => "cover",
            TemplateKey::CoverSoftcover => "cover-softcover",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            TemplateKey::Digital => "book-template-digital.html",
            TemplateKey::Hardcover => "book-template-pages.html",
            TemplateKey::Softcover => "book-template-softcover.html",
            TemplateKey::Cover => "cover-template.html",
            TemplateKey::CoverSoftcover => "cover-template-softcover.html",
        }
    }

    fn all() -> [TemplateKey; 5] {
        [
            TemplateKey::Softcover,
            TemplateKey::Digital,
            TemplateKey::Hardcover,
            TemplateKey::Cover,
            TemplateKey::CoverSoftcover,
        ]
    }

    /// Placeholder tokens this template is expected to carry.
    fn expected_tokens(self) -> &'static [&'static str] {
        const INTERIOR: &[&str] = &[
            "/*__FONT_CSS__*/",
            "{{BOOK_TITLE}}",
            "{{BOOK_SUBTITLE}}",
            "{{BOOK_DESCRIPTION}}",
            "{{CHILD_NAME}}",
            "{{COVER_IMAGE_URL}}",
            "{{SITE_LOGO_URL}}",
            "{{BLANK_PAGES}}",
            "{{DEDICATION_PAGE}}",
            "{{PAGES}}",
        ];
        const COVER: &[&str] = &[
            "/*__FONT_CSS__*/",
            "/*__GRADIENT_CSS__*/",
            "{{BOOK_TITLE}}",
            "{{BOOK_SUBTITLE}}",
            "{{BOOK_DESCRIPTION}}",
            "{{CHILD_NAME}}",
            "{{COVER_IMAGE_URL}}",
            "{{BACK_COVER_TEXT}}",
            "{{CHILD_PHOTO_URL}}",
            "{{SITE_LOGO_URL}}",
            "{{DEDICATION_MESSAGE}}",
        ];
        match self {
            TemplateKey::Cover | TemplateKey::CoverSoftcover => COVER,
            _ => INTERIOR,
        }
    }
}

/// Loaded template contents by format key.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    map: HashMap<TemplateKey, String>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: TemplateKey, content: String) {
        self.map.insert(key, content);
    }

    pub fn get(&self, key: TemplateKey) -> Option<&str> {
        self.map.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Loaded font blobs (base64), absent slots mean the file was missing and
/// the emitted CSS degrades to a generic typeface.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    /// Body text face (`Frank`)
    pub body: Option<String>,
    /// Cover faces (`SpacerRegular` / `SpacerBold` / `SpacerBlack`)
    pub spacer_regular: Option<String>,
    pub spacer_bold: Option<String>,
    pub spacer_black: Option<String>,
}

impl FontSet {
    pub fn has_cover_faces(&self) -> bool {
        self.spacer_regular.is_some() && self.spacer_bold.is_some() && self.spacer_black.is_some()
    }
}

/// Snapshot of all assets one assembly needs, resolved up front so the
/// assembler itself stays synchronous and pure.
#[derive(Clone)]
pub struct AssetBundle {
    pub templates: Arc<TemplateSet>,
    pub fonts: Arc<FontSet>,
    pub logo_data_url: Option<String>,
    pub leaf_data_url: Option<String>,
}

/// Process-wide asset cache.
///
/// Templates are loaded once and reused unless hot reload is enabled, in
/// which case every lookup re-reads from disk. Fonts and ornaments are
/// loaded once per process lifetime.
pub struct AssetCache {
    dirs: Vec<PathBuf>,
    hot_reload: bool,
    templates: RwLock<Option<Arc<TemplateSet>>>,
    fonts: OnceCell<Arc<FontSet>>,
    logo: OnceCell<Option<String>>,
    leaf: OnceCell<Option<String>>,
}

impl AssetCache {
    pub fn new(config: &AssetConfig) -> Self {
        let dirs = match &config.dir {
            Some(dir) => vec![dir.clone()],
            None => CANDIDATE_DIRS.iter().map(PathBuf::from).collect(),
        };
        Self {
            dirs,
            hot_reload: config.hot_reload,
            templates: RwLock::new(None),
            fonts: OnceCell::new(),
            logo: OnceCell::new(),
            leaf: OnceCell::new(),
        }
    }

    /// Find the first candidate directory containing `file`.
    fn find_file(&self, file: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file))
            .find(|path| path.exists())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, AssetError> {
        std::fs::read(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loaded templates, re-read from disk when hot reload is on.
    pub async fn templates(&self) -> Result<Arc<TemplateSet>, AssetError> {
        if self.hot_reload {
            return self.reload().await;
        }
        if let Some(set) = self.templates.read().await.clone() {
            return Ok(set);
        }
        self.reload().await
    }

    /// Drop the cached template set; the next lookup re-reads from disk.
    pub async fn invalidate(&self) {
        *self.templates.write().await = None;
    }

    /// Re-read all templates from disk and replace the cached set.
    pub async fn reload(&self) -> Result<Arc<TemplateSet>, AssetError> {
        let set = Arc::new(self.load_templates()?);
        *self.templates.write().await = Some(set.clone());
        Ok(set)
    }

    fn load_templates(&self) -> Result<TemplateSet, AssetError> {
        let mut set = TemplateSet::new();
        for key in TemplateKey::all() {
            let path = match self.find_file(key.file_name()) {
                Some(path) => path,
                None if key == TemplateKey::Digital => {
                    // Designated substitute: the softcover layout doubles as
                    // the digital layout when no dedicated file exists.
                    match self.find_file(TemplateKey::Softcover.file_name()) {
                        Some(path) => {
                            tracing::warn!(
                                "digital template not found, falling back to softcover template"
                            );
                            path
                        }
                        None => continue,
                    }
                }
                None => {
                    tracing::debug!(key = key.as_str(), "template file not found");
                    continue;
                }
            };
            let bytes = self.read_file(&path)?;
            let content = String::from_utf8_lossy(&bytes).into_owned();
            validate_tokens(key, &content);
            set.insert(key, content);
        }
        if set.is_empty() {
            tracing::warn!("no PDF templates found in any candidate directory");
        }
        Ok(set)
    }

    /// Font blobs, loaded once per process.
    pub async fn fonts(&self) -> Arc<FontSet> {
        self.fonts
            .get_or_init(|| async { Arc::new(self.load_fonts()) })
            .await
            .clone()
    }

    fn load_fonts(&self) -> FontSet {
        let mut fonts = FontSet {
            body: self.load_font_file(BODY_FONT_FILE),
            spacer_regular: self.load_font_file(SPACER_REGULAR_FILE),
            spacer_bold: self.load_font_file(SPACER_BOLD_FILE),
            spacer_black: self.load_font_file(SPACER_BLACK_FILE),
        };
        if !fonts.has_cover_faces() {
            tracing::warn!(
                regular = fonts.spacer_regular.is_some(),
                bold = fonts.spacer_bold.is_some(),
                black = fonts.spacer_black.is_some(),
                "cover font set incomplete, emitted CSS will fall back to sans-serif"
            );
        }
        if fonts.body.is_none() {
            tracing::warn!("body font {} not found", BODY_FONT_FILE);
        }
        // Normalize empty files to absent slots
        for slot in [
            &mut fonts.body,
            &mut fonts.spacer_regular,
            &mut fonts.spacer_bold,
            &mut fonts.spacer_black,
        ] {
            if slot.as_deref() == Some("") {
                *slot = None;
            }
        }
        fonts
    }

    fn load_font_file(&self, file: &str) -> Option<String> {
        let path = self.find_file(file)?;
        match self.read_file(&path) {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(e) => {
                tracing::warn!("failed to load font {}: {}", file, e);
                None
            }
        }
    }

    /// Site logo as a data URL, loaded once.
    pub async fn logo_data_url(&self) -> Option<String> {
        self.logo
            .get_or_init(|| async { self.load_data_url(LOGO_FILE, "image/png") })
            .await
            .clone()
    }

    /// Leaf ornament as a data URL, loaded once.
    pub async fn leaf_data_url(&self) -> Option<String> {
        self.leaf
            .get_or_init(|| async { self.load_data_url(LEAF_FILE, "image/svg+xml") })
            .await
            .clone()
    }

    fn load_data_url(&self, file: &str, mime: &str) -> Option<String> {
        let path = self.find_file(file)?;
        match self.read_file(&path) {
            Ok(bytes) => Some(format!("data:{};base64,{}", mime, BASE64.encode(bytes))),
            Err(e) => {
                tracing::warn!("failed to load {}: {}", file, e);
                None
            }
        }
    }

    /// Resolve everything one assembly needs in a single snapshot.
    pub async fn bundle(&self) -> Result<AssetBundle, AssetError> {
        Ok(AssetBundle {
            templates: self.templates().await?,
            fonts: self.fonts().await,
            logo_data_url: self.logo_data_url().await,
            leaf_data_url: self.leaf_data_url().await,
        })
    }
}

/// Log a warning for every expected token a template file is missing.
/// The token contract is a design agreement with the template assets;
/// violating it degrades output rather than failing a render.
fn validate_tokens(key: TemplateKey, content: &str) {
    for token in key.expected_tokens() {
        if !content.contains(token) {
            tracing::warn!(
                template = key.as_str(),
                token,
                "template is missing an expected placeholder token"
            );
        }
    }
}
