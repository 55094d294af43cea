// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
#[cfg(feature = "text")]
use std::sync::Arc;

/// An SVG rasterizer.
pub trait Rasterizer: Send + Sync {
    /// Renders the `head`, `view_box` and `tail` concatenation into a `width * height` buffer.
    ///
    /// Each pixel is a native-endian `u32` with alpha in the upper 8 bits,
    /// then red, then green, then blue. Alpha is premultiplied.
    /// Rows are stored from top to bottom.
    ///
    /// `width` and `height` are guarantee to be > 0.
    fn rasterize(
        &self,
        head: &[u8],
        view_box: &[u8],
        tail: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<u32>, RenderError>;
}

/// A rasterizer error.
#[derive(Debug)]
pub enum RenderError {
    /// Failed to parse an SVG data.
    Parsing(usvg::Error),

    /// Failed to allocate an image.
    ///
    /// Probably because it's too big or there is not enough memory.
    InvalidSize,

    /// Any other rasterizer specific error.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<usvg::Error> for RenderError {
    fn from(e: usvg::Error) -> Self {
        RenderError::Parsing(e)
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            RenderError::Parsing(ref e) => write!(f, "{}", e),
            RenderError::InvalidSize => write!(f, "the main canvas creation failed"),
            RenderError::Other(ref e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RenderError {}

/// A [`Rasterizer`] that uses `usvg` and `resvg`.
///
/// The image is stretched to the requested size.
#[derive(Clone)]
pub struct ResvgRasterizer {
    /// Directory that will be used during relative paths resolving.
    ///
    /// Default: `None`
    pub resources_dir: Option<PathBuf>,

    /// Target DPI.
    ///
    /// Default: 96.0
    pub dpi: f32,

    /// A default font family.
    ///
    /// Default: Times New Roman
    pub font_family: String,

    /// A default font size.
    ///
    /// Default: 12
    pub font_size: f32,

    /// A list of languages used to resolve a `systemLanguage` conditional attribute.
    ///
    /// Default: `[en]`
    pub languages: Vec<String>,

    /// Default: GeometricPrecision
    pub shape_rendering: usvg::ShapeRendering,

    /// Default: OptimizeLegibility
    pub text_rendering: usvg::TextRendering,

    /// Default: OptimizeQuality
    pub image_rendering: usvg::ImageRendering,

    /// A database of fonts usable by text.
    ///
    /// Empty by default, so text is not rendered until fonts are loaded.
    #[cfg(feature = "text")]
    pub fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        ResvgRasterizer {
            resources_dir: None,
            dpi: 96.0,
            font_family: "Times New Roman".to_owned(),
            font_size: 12.0,
            languages: vec!["en".to_string()],
            shape_rendering: usvg::ShapeRendering::default(),
            text_rendering: usvg::TextRendering::default(),
            image_rendering: usvg::ImageRendering::default(),
            #[cfg(feature = "text")]
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }
}

impl ResvgRasterizer {
    /// Creates a rasterizer with a shared font database.
    #[cfg(feature = "text")]
    pub fn with_fontdb(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        ResvgRasterizer {
            fontdb,
            ..ResvgRasterizer::default()
        }
    }

    /// Creates a rasterizer that uses system fonts.
    #[cfg(feature = "system-fonts")]
    pub fn with_system_fonts() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        ResvgRasterizer::with_fontdb(Arc::new(fontdb))
    }

    fn usvg_options(&self) -> usvg::Options<'static> {
        let mut opt = usvg::Options::default();
        opt.resources_dir = self.resources_dir.clone();
        opt.dpi = self.dpi;
        opt.font_family = self.font_family.clone();
        opt.font_size = self.font_size;
        opt.languages = self.languages.clone();
        opt.shape_rendering = self.shape_rendering;
        opt.text_rendering = self.text_rendering;
        opt.image_rendering = self.image_rendering;
        #[cfg(feature = "text")]
        {
            opt.fontdb = self.fontdb.clone();
        }
        opt
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(
        &self,
        head: &[u8],
        view_box: &[u8],
        tail: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<u32>, RenderError> {
        let mut data = Vec::with_capacity(head.len() + view_box.len() + tail.len());
        data.extend_from_slice(head);
        data.extend_from_slice(view_box);
        data.extend_from_slice(tail);

        let tree = usvg::Tree::from_data(&data, &self.usvg_options())?;
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(RenderError::InvalidSize)?;

        let size = tree.size();
        let ts = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, ts, &mut pixmap.as_mut());

        Ok(pixmap.pixels().iter().map(|p| pack_argb(*p)).collect())
    }
}

#[inline]
fn pack_argb(c: tiny_skia::PremultipliedColorU8) -> u32 {
    (c.alpha() as u32) << 24 | (c.red() as u32) << 16 | (c.green() as u32) << 8 | c.blue() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rasterize(svg: &str, width: u32, height: u32) -> Result<Vec<u32>, RenderError> {
        // Split at the insertion point the same way the scanner does.
        let pos = svg.find('>').unwrap();
        let (head, tail) = svg.split_at(pos);
        let head = format!("{}\n", head);
        ResvgRasterizer::default().rasterize(
            head.as_bytes(),
            b"viewBox=\"0 0 10 10\"",
            tail.as_bytes(),
            width,
            height,
        )
    }

    #[test]
    fn buffer_size() {
        let svg = "<svg xmlns='http://www.w3.org/2000/svg'><rect width='10' height='10' fill='red'/></svg>";
        assert_eq!(rasterize(svg, 20, 7).unwrap().len(), 20 * 7);
        assert_eq!(rasterize(svg, 1, 1).unwrap().len(), 1);
    }

    #[test]
    fn pixel_format() {
        let svg = "<svg xmlns='http://www.w3.org/2000/svg'>\
                   <rect width='5' height='10' fill='#ff0000'/>\
                   <rect x='5' width='5' height='10' fill='#0000ff' fill-opacity='0.5'/>\
                   </svg>";
        let pixels = rasterize(svg, 10, 10).unwrap();
        assert_eq!(pixels[0], 0xFFFF0000);
        // Premultiplied 50% blue.
        let right = pixels[9];
        let alpha = right >> 24;
        assert!((127..=128).contains(&alpha));
        assert_eq!(right & 0xFF, alpha);
        assert_eq!(right & 0x00FFFF00, 0);
    }

    #[test]
    fn invalid_markup() {
        let res = rasterize("<svg xmlns='http://www.w3.org/2000/svg'><g></svg>", 10, 10);
        assert!(matches!(res, Err(RenderError::Parsing(_))));
    }

    #[test]
    fn pack() {
        let c = tiny_skia::PremultipliedColorU8::from_rgba(1, 2, 3, 4).unwrap();
        assert_eq!(pack_argb(c), 0x04010203);
    }
}
