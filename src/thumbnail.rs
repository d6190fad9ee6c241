// src/thumbnail.rs
//! First-page PDF thumbnail rendering.
//!
//! The geometry is kept separate from Pdfium so the scaling and rotation
//! math stays unit-testable; rasterization itself runs under
//! `spawn_blocking` because Pdfium is not async-safe.

use image::{Rgba, RgbaImage};
use pdfium_render::prelude::*;
use thiserror::Error;

/// Angle of the decorative rotated-thumbnail variant.
pub const ROTATION_DEGREES: f32 = 15.0;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Failed to fetch PDF bytes: {0}")]
    Fetch(String),

    #[error("Failed to load PDF document: {0}")]
    Load(String),

    #[error("PDF has no pages")]
    EmptyDocument,

    #[error("Failed to render PDF page: {0}")]
    Render(String),
}

/// Bitmap of a rendered first page.
pub struct RenderedThumbnail {
    pub image: RgbaImage,
}

impl RenderedThumbnail {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Pixel dimensions for a page scaled so its height equals `target_height`.
/// Width is derived from the page's aspect ratio, never specified directly.
pub fn scaled_dimensions(intrinsic_width: f32, intrinsic_height: f32, target_height: f32) -> (u32, u32) {
    if intrinsic_height <= 0.0 {
        return (0, target_height.round().max(0.0) as u32);
    }
    let scale = target_height / intrinsic_height;
    let width = (intrinsic_width * scale).round().max(0.0) as u32;
    let height = target_height.round().max(0.0) as u32;
    (width, height)
}

/// Bounding box of a `width` x `height` surface rotated by `degrees`, large
/// enough that no content is clipped.
pub fn rotated_bounds(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let w = width as f32;
    let h = height as f32;
    let out_w = (w * cos + h * sin).ceil() as u32;
    let out_h = (h * cos + w * sin).ceil() as u32;
    (out_w, out_h)
}

/// Render page 1 of `bytes` scaled to `target_height` pixels tall.
pub fn render_first_page(bytes: &[u8], target_height: u32) -> Result<RenderedThumbnail, ThumbnailError> {
    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| ThumbnailError::Load(format!("Pdfium unavailable: {:?}", e)))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ThumbnailError::Load(format!("{:?}", e)))?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(ThumbnailError::EmptyDocument);
    }
    let page = pages
        .first()
        .map_err(|e| ThumbnailError::Load(format!("{:?}", e)))?;

    // Measure at scale 1.0, then derive the final pixel size.
    let (width, height) = scaled_dimensions(page.width().value, page.height().value, target_height as f32);

    let bitmap = page
        .render_with_config(&PdfRenderConfig::new().set_target_size(width as i32, height as i32))
        .map_err(|e| ThumbnailError::Render(format!("{:?}", e)))?;

    Ok(RenderedThumbnail {
        image: bitmap.as_image().into_rgba8(),
    })
}

/// Variant that composites the page onto a canvas sized to the rotated
/// bounding box, rotated [`ROTATION_DEGREES`] about its center.
pub fn render_first_page_rotated(
    bytes: &[u8],
    target_height: u32,
) -> Result<RenderedThumbnail, ThumbnailError> {
    let flat = render_first_page(bytes, target_height)?;
    Ok(RenderedThumbnail {
        image: rotate_about_center(&flat.image, ROTATION_DEGREES),
    })
}

/// Async wrapper; Pdfium work is moved off the cooperative scheduler.
pub async fn render_async(
    bytes: Vec<u8>,
    target_height: u32,
    rotated: bool,
) -> Result<RenderedThumbnail, ThumbnailError> {
    tokio::task::spawn_blocking(move || {
        if rotated {
            render_first_page_rotated(&bytes, target_height)
        } else {
            render_first_page(&bytes, target_height)
        }
    })
    .await
    .map_err(|e| ThumbnailError::Render(e.to_string()))?
}

/// Fetch PDF bytes from a source locator (signed URL or backend URL).
pub async fn fetch_pdf(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ThumbnailError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ThumbnailError::Fetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ThumbnailError::Fetch(format!("HTTP {}", response.status().as_u16())));
    }

    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| ThumbnailError::Fetch(e.to_string()))
}

/// Composite `src` onto a white canvas sized to the rotated bounding box,
/// rotated `degrees` about the center. Inverse mapping with nearest-neighbor
/// sampling; destination pixels outside the source stay white.
fn rotate_about_center(src: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = src.dimensions();
    let (out_w, out_h) = rotated_bounds(w, h, degrees);

    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (src_cx, src_cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let (dst_cx, dst_cy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

    let mut out = RgbaImage::from_pixel(out_w, out_h, Rgba([255, 255, 255, 255]));
    for y in 0..out_h {
        for x in 0..out_w {
            let dx = x as f32 + 0.5 - dst_cx;
            let dy = y as f32 + 0.5 - dst_cy;
            // Rotate the destination offset back into source space.
            let sx = cos * dx + sin * dy + src_cx;
            let sy = -sin * dx + cos * dy + src_cy;
            if sx >= 0.0 && sy >= 0.0 {
                let (sx, sy) = (sx as u32, sy as u32);
                if sx < w && sy < h {
                    out.put_pixel(x, y, *src.get_pixel(sx, sy));
                }
            }
        }
    }
    out
}

// ===== View state machine =====

pub enum ThumbnailState {
    Loading,
    Displaying(RenderedThumbnail),
    Error(ThumbnailError),
}

/// Conditional-UI state for one thumbnail slot:
/// `loading -> {displaying | error}`, re-entering `loading` whenever the
/// inputs change. A generation counter invalidates in-flight renders; the
/// fetch itself is not aborted, late results are simply discarded.
pub struct ThumbnailView {
    state: ThumbnailState,
    generation: u64,
    target_height: u32,
}

impl ThumbnailView {
    pub fn new(target_height: u32) -> Self {
        Self {
            state: ThumbnailState::Loading,
            generation: 0,
            target_height,
        }
    }

    pub fn state(&self) -> &ThumbnailState {
        &self.state
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    /// The source locator changed: back to loading, invalidating any render
    /// still in flight. Returns the ticket the new render must present.
    pub fn reload(&mut self) -> u64 {
        self.generation += 1;
        self.state = ThumbnailState::Loading;
        self.generation
    }

    pub fn set_target_height(&mut self, target_height: u32) -> u64 {
        self.target_height = target_height;
        self.reload()
    }

    /// Apply a finished render. Stale tickets are discarded; returns whether
    /// the result was applied.
    pub fn complete(
        &mut self,
        ticket: u64,
        result: Result<RenderedThumbnail, ThumbnailError>,
    ) -> bool {
        if ticket != self.generation {
            return false;
        }
        self.state = match result {
            Ok(thumbnail) => ThumbnailState::Displaying(thumbnail),
            Err(e) => ThumbnailState::Error(e),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_is_rounded_and_width_derived() {
        // Intrinsic 100x150, requested height 200.
        assert_eq!(scaled_dimensions(100.0, 150.0, 200.0), (133, 200));
        // US letter points at 100px tall.
        assert_eq!(scaled_dimensions(612.0, 792.0, 100.0), (77, 100));
        // Fractional target heights round.
        assert_eq!(scaled_dimensions(100.0, 100.0, 99.6), (100, 100));
    }

    #[test]
    fn degenerate_page_height_does_not_divide_by_zero() {
        assert_eq!(scaled_dimensions(100.0, 0.0, 200.0), (0, 200));
    }

    #[test]
    fn rotated_bounds_match_the_closed_form() {
        let (w, h) = (100u32, 150u32);
        let theta = 15.0f32.to_radians();
        let expected_w = (w as f32 * theta.cos().abs() + h as f32 * theta.sin().abs()).ceil() as u32;
        let expected_h = (h as f32 * theta.cos().abs() + w as f32 * theta.sin().abs()).ceil() as u32;
        assert_eq!(rotated_bounds(w, h, 15.0), (expected_w, expected_h));
        assert_eq!(rotated_bounds(w, h, 15.0), (136, 171));
    }

    #[test]
    fn zero_rotation_keeps_dimensions() {
        assert_eq!(rotated_bounds(80, 120, 0.0), (80, 120));
    }

    #[test]
    fn rotation_composites_without_clipping() {
        let src = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let out = rotate_about_center(&src, ROTATION_DEGREES);

        assert_eq!((out.width(), out.height()), rotated_bounds(10, 10, ROTATION_DEGREES));
        // The source center maps onto the destination center.
        let center = out.get_pixel(out.width() / 2, out.height() / 2);
        assert_eq!(*center, Rgba([255, 0, 0, 255]));
        // Corners lie outside the rotated source and stay white.
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn stale_render_results_are_discarded() {
        let mut view = ThumbnailView::new(200);
        let first = view.reload();
        let second = view.reload();

        let stale = RenderedThumbnail {
            image: RgbaImage::new(1, 1),
        };
        assert!(!view.complete(first, Ok(stale)));
        assert!(matches!(view.state(), ThumbnailState::Loading));

        let fresh = RenderedThumbnail {
            image: RgbaImage::new(2, 2),
        };
        assert!(view.complete(second, Ok(fresh)));
        assert!(matches!(view.state(), ThumbnailState::Displaying(_)));
    }

    #[test]
    fn error_state_holds_until_inputs_change() {
        let mut view = ThumbnailView::new(100);
        let ticket = view.reload();
        view.complete(ticket, Err(ThumbnailError::EmptyDocument));
        assert!(matches!(view.state(), ThumbnailState::Error(_)));

        // A new input re-enters loading; there is no retry in place.
        view.set_target_height(150);
        assert!(matches!(view.state(), ThumbnailState::Loading));
        assert_eq!(view.target_height(), 150);
    }

    #[test]
    fn corrupt_bytes_report_a_load_error() {
        // Only runs meaningfully where a Pdfium library is present; binding
        // failure also maps to Load, so the assertion holds either way.
        let result = render_first_page(b"not a pdf", 100);
        assert!(matches!(result, Err(ThumbnailError::Load(_))));
    }
}
