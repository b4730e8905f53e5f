//! Cover gradient palette
//!
//! The cover template tints its background with a two-color gradient
//! derived from the cover artwork. Derivation is a pluggable collaborator;
//! the built-in implementation returns a fixed sky-blue pair.

use async_trait::async_trait;

/// Supplies the `(start, end)` gradient colors for a cover render.
#[async_trait]
pub trait PalettePicker: Send + Sync {
    async fn gradient_for(&self, image_url: Option<&str>) -> (String, String);
}

/// Fixed placeholder palette.
pub struct StubPalette;

#[async_trait]
impl PalettePicker for StubPalette {
    async fn gradient_for(&self, _image_url: Option<&str>) -> (String, String) {
        ("#0ea5e9".to_string(), "#38bdf8".to_string())
    }
}
