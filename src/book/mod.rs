//! Story data model
//!
//! Typed representation of the JSON payload the client sends for a render:
//! the story record, its pages (flat or gender-keyed), per-page image
//! overrides, and the book-type classifier.

mod story;

pub use story::{
    BookData, BookType, Gender, ImageChoices, ImageSource, ImageState, Page, PageImageState,
    Story, StoryPages, HARDCOVER_CLASSIFIER, SOFTCOVER_CLASSIFIER,
};
