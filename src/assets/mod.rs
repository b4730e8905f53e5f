//! Asset loading and caching
//!
//! Fonts, HTML templates and ornament images are read from a conventional
//! asset directory and cached in memory. Templates can be hot-reloaded for
//! iterative template work; fonts and ornaments are loaded once per process.

mod cache;

pub use cache::{AssetBundle, AssetCache, AssetError, FontSet, TemplateKey, TemplateSet};
