//! Image delivery optimization
//!
//! Known image CDN URLs are rewritten to request a specific width, quality
//! and format. Print-destined renders ask for high-resolution assets;
//! email-destined renders ask for small ones. Anything that is not a
//! recognized CDN URL passes through untouched.

/// Target width/quality for a delivery context.
#[derive(Debug, Clone, Copy)]
pub struct ImageQuality {
    pub width: u32,
    pub quality: u8,
}

/// Print-quality delivery (interior and cover art).
pub const PRINT_QUALITY: ImageQuality = ImageQuality {
    width: 2400,
    quality: 90,
};

/// Bandwidth-constrained delivery for interior pages.
pub const EMAIL_QUALITY: ImageQuality = ImageQuality {
    width: 600,
    quality: 40,
};

/// Bandwidth-constrained delivery for the cover slot.
pub const EMAIL_COVER_QUALITY: ImageQuality = ImageQuality {
    width: 800,
    quality: 40,
};

/// Rewrite a Cloudinary delivery URL to request sized, recompressed assets.
/// Non-CDN URLs (including data URIs) are returned unchanged.
pub fn optimize_image_url(url: &str, quality: ImageQuality) -> String {
    if url.contains("res.cloudinary.com/") {
        return url.replacen(
            "/upload/",
            &format!("/upload/f_auto,q_{},w_{}/", quality.quality, quality.width),
            1,
        );
    }
    url.to_string()
}
