//! PDF page geometry
//!
//! Physical interiors and covers are printed as one continuous wide page
//! sized from the trim/spine/bleed constants; the print shop cuts and folds
//! from the crop marks. Digital output uses conventional paper formats.
//! `Page.printToPDF` takes inches, layout CSS speaks millimeters.

use crate::book::BookType;

const MM_PER_INCH: f64 = 25.4;

/// Trim size of a finished page, both dimensions (square format).
pub const TRIM_MM: f64 = 220.0;

/// Spine and bleed allowances per physical format.
#[derive(Debug, Clone, Copy)]
pub struct PhysicalSpec {
    pub spine_mm: f64,
    pub bleed_mm: f64,
}

pub const HARDCOVER_SPEC: PhysicalSpec = PhysicalSpec {
    spine_mm: 8.0,
    bleed_mm: 15.0,
};

pub const SOFTCOVER_SPEC: PhysicalSpec = PhysicalSpec {
    spine_mm: 5.0,
    bleed_mm: 5.0,
};

impl PhysicalSpec {
    pub fn for_book_type(book_type: BookType) -> Self {
        match book_type {
            BookType::Softcover => SOFTCOVER_SPEC,
            // Digital covers are printed on the hardcover spread as well.
            _ => HARDCOVER_SPEC,
        }
    }

    /// Full spread width: two trim pages plus spine plus bleed on both
    /// outer edges.
    pub fn spread_width_mm(&self) -> f64 {
        TRIM_MM * 2.0 + self.spine_mm + 2.0 * self.bleed_mm
    }

    /// Full spread height: trim plus bleed top and bottom.
    pub fn spread_height_mm(&self) -> f64 {
        TRIM_MM + 2.0 * self.bleed_mm
    }
}

/// Conventional paper formats for digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperFormat {
    A4,
    Letter,
}

impl PaperFormat {
    /// Portrait (width, height) in inches.
    fn dimensions_in(self) -> (f64, f64) {
        match self {
            PaperFormat::A4 => (8.27, 11.69),
            PaperFormat::Letter => (8.5, 11.0),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "a4" => Some(PaperFormat::A4),
            "letter" => Some(PaperFormat::Letter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Per-edge margins in millimeters.
#[derive(Debug, Clone, Copy)]
pub struct MarginsMm {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl MarginsMm {
    pub fn uniform(mm: f64) -> Self {
        Self {
            top: mm,
            bottom: mm,
            left: mm,
            right: mm,
        }
    }
}

/// Resolved page geometry for one print call.
#[derive(Debug, Clone, Copy)]
pub enum PageGeometry {
    /// One continuous borderless page with explicit dimensions.
    Spread { width_mm: f64, height_mm: f64 },
    /// Conventional paper sheets with margins.
    Sheet {
        format: PaperFormat,
        orientation: Orientation,
        margins: MarginsMm,
    },
}

impl PageGeometry {
    /// Interior spread for a physical format.
    pub fn interior_spread(spec: PhysicalSpec) -> Self {
        PageGeometry::Spread {
            width_mm: spec.spread_width_mm(),
            height_mm: spec.spread_height_mm(),
        }
    }

    /// Cover spread (same dimensions as the interior spread of the format).
    pub fn cover_spread(book_type: BookType) -> Self {
        Self::interior_spread(PhysicalSpec::for_book_type(book_type))
    }

    /// Paper dimensions in inches: `(width, height, margins)`.
    /// Spreads are borderless.
    pub fn paper_in(&self) -> (f64, f64, MarginsMm) {
        match *self {
            PageGeometry::Spread {
                width_mm,
                height_mm,
            } => (
                width_mm / MM_PER_INCH,
                height_mm / MM_PER_INCH,
                MarginsMm::uniform(0.0),
            ),
            PageGeometry::Sheet {
                format,
                orientation,
                margins,
            } => {
                let (w, h) = format.dimensions_in();
                let (w, h) = match orientation {
                    Orientation::Portrait => (w, h),
                    Orientation::Landscape => (h, w),
                };
                (w, h, margins)
            }
        }
    }
}

pub fn mm_to_in(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardcover_spread_dimensions() {
        assert_eq!(HARDCOVER_SPEC.spread_width_mm(), 478.0);
        assert_eq!(HARDCOVER_SPEC.spread_height_mm(), 250.0);
    }

    #[test]
    fn softcover_spread_dimensions() {
        assert_eq!(SOFTCOVER_SPEC.spread_width_mm(), 455.0);
        assert_eq!(SOFTCOVER_SPEC.spread_height_mm(), 230.0);
    }

    #[test]
    fn spread_paper_is_borderless() {
        let geometry = PageGeometry::interior_spread(HARDCOVER_SPEC);
        let (w, h, margins) = geometry.paper_in();
        assert!((w - 478.0 / 25.4).abs() < 1e-9);
        assert!((h - 250.0 / 25.4).abs() < 1e-9);
        assert_eq!(margins.top, 0.0);
        assert_eq!(margins.left, 0.0);
    }

    #[test]
    fn landscape_swaps_sheet_dimensions() {
        let portrait = PageGeometry::Sheet {
            format: PaperFormat::A4,
            orientation: Orientation::Portrait,
            margins: MarginsMm::uniform(20.0),
        };
        let landscape = PageGeometry::Sheet {
            format: PaperFormat::A4,
            orientation: Orientation::Landscape,
            margins: MarginsMm::uniform(20.0),
        };
        let (pw, ph, _) = portrait.paper_in();
        let (lw, lh, _) = landscape.paper_in();
        assert_eq!((pw, ph), (lh, lw));
    }

    #[test]
    fn digital_cover_uses_hardcover_spread() {
        let geometry = PageGeometry::cover_spread(crate::book::BookType::Digital);
        let (w, _, _) = geometry.paper_in();
        assert!((w - 478.0 / 25.4).abs() < 1e-9);
    }

    #[test]
    fn paper_format_parse_is_case_insensitive() {
        assert_eq!(PaperFormat::parse("A4"), Some(PaperFormat::A4));
        assert_eq!(PaperFormat::parse("letter"), Some(PaperFormat::Letter));
        assert_eq!(PaperFormat::parse("tabloid"), None);
    }
}
