// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`resvg-sprites` turns annotated SVG images into a catalog of named sub-assets.

A single SVG image may hold many icons or sprites. Each one is marked by a `<rect>`
inside a hidden group with the `METADATA` id or label:

```xml
<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32">
  <g inkscape:label="METADATA" style="display:none">
    <rect id="ship" x="0" y="0" width="32" height="32"/>
    <rect id="rock1" x="32" y="0" width="32" height="32"><desc>Obstacle</desc></rect>
  </g>
  ...
</svg>
```

When this file is added as `sprites.svg`, the catalog contains `sprites`, `sprites/ship`
and `sprites/rock`. A rectangle inside of a larger one becomes its child.

```no_run
let mut catalog = resvg_sprites::Catalog::new();
catalog.add("assets").unwrap();
for line in catalog.diagnostics() {
    eprintln!("{}", line);
}

let pixels = catalog.image("assets/sprites/ship", 64, 64).unwrap();
let meta: resvg_sprites::Metadata = catalog.meta("assets/sprites/ship").unwrap();
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::identity_op)]
#![allow(clippy::uninlined_format_args)]

mod asset;
mod error;
mod geom;
mod hierarchy;
mod options;
mod render;
mod scanner;
mod store;
mod stream;

use std::path::{Component, Path};
use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;

pub use crate::asset::{Asset, ImageAsset, Metadata};
pub use crate::error::Error;
pub use crate::geom::Rect;
pub use crate::options::Options;
pub use crate::render::{Rasterizer, RenderError, ResvgRasterizer};
pub use crate::store::{Node, Store};

pub use tiny_skia;
pub use usvg;

/// An asset catalog.
///
/// Assets are addressed by case-insensitive `/`-separated paths.
pub struct Catalog {
    options: Options,
    store: Store,
    rasterizer: Box<dyn Rasterizer>,
    diagnostics: Vec<String>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("options", &self.options)
            .field("store", &self.store)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new()
    }
}

impl Catalog {
    /// Creates an empty catalog with default options and [`ResvgRasterizer`].
    ///
    /// System fonts are loaded when the `system-fonts` feature is enabled.
    pub fn new() -> Self {
        Catalog::with_options(Options::default())
    }

    /// Creates an empty catalog with [`ResvgRasterizer`].
    ///
    /// System fonts are loaded when the `system-fonts` feature is enabled.
    pub fn with_options(options: Options) -> Self {
        Catalog::with_rasterizer(options, Box::new(default_rasterizer()))
    }

    /// Creates an empty catalog with a custom rasterizer.
    pub fn with_rasterizer(options: Options, rasterizer: Box<dyn Rasterizer>) -> Self {
        Catalog {
            options,
            store: Store::new(),
            rasterizer,
            diagnostics: Vec::new(),
        }
    }

    /// Returns processing options.
    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the underlying store.
    #[inline]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Adds a file or a directory.
    ///
    /// Directories are scanned recursively. Files without a supported extension are ignored.
    /// A file is registered under its path: lower-cased, normalized and without extension.
    ///
    /// Problems with a particular document are not errors. They are recorded
    /// in [`diagnostics`](Catalog::diagnostics) and the document is skipped.
    ///
    /// Returns an error when a file or a directory cannot be read.
    /// Assets added before the error stay in the catalog.
    pub fn add<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let walker = walkdir::WalkDir::new(path.as_ref())
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file = entry.path();
            let ext = match file.extension().and_then(|e| e.to_str()) {
                Some(ext) => ext.to_ascii_lowercase(),
                None => continue,
            };

            if !self.options.is_supported_extension(&ext) {
                continue;
            }

            let data = std::fs::read(file).map_err(|e| Error::Io(file.to_path_buf(), e))?;
            let label = file.display().to_string();

            let data = if ext == "svgz" {
                match usvg::decompress_svgz(&data) {
                    Ok(v) => v,
                    Err(_) => {
                        self.diagnose(&label, &Error::MalformedGZip);
                        continue;
                    }
                }
            } else {
                data
            };

            let segments = match logical_path(file, &self.options) {
                Ok(v) => v,
                Err(e) => {
                    self.diagnose(&label, &e);
                    continue;
                }
            };

            self.add_document(&label, &segments, &data);
        }

        Ok(())
    }

    /// Adds an in-memory SVG document under the provided path.
    ///
    /// The path is treated the same way as a file path passed to [`add`](Catalog::add),
    /// so a trailing `.svg` or `.svgz` is removed. Other extensions are kept.
    /// Problems with the document are recorded in [`diagnostics`](Catalog::diagnostics).
    pub fn add_data(&mut self, path: &str, data: &[u8]) {
        match logical_path(Path::new(path), &self.options) {
            Ok(segments) => self.add_document(path, &segments, data),
            Err(e) => self.diagnose(path, &e),
        }
    }

    /// Returns the full paths of all assets at or below `prefix`.
    ///
    /// `prefix` is a path, not a partial name: `ui/but` doesn't match `ui/buttons`.
    /// The order is unspecified and paths do not start with `/`.
    #[inline]
    pub fn list(&self, prefix: &str) -> Vec<String> {
        self.store.list(prefix)
    }

    /// Returns an asset by path.
    #[inline]
    pub fn get(&self, path: &str) -> Option<&Asset> {
        self.store.get(path)
    }

    /// Decodes an asset's metadata.
    ///
    /// [`Metadata`] can be used to get the fields every asset has.
    pub fn meta<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let data = self.meta_raw(path)?;
        Ok(serde_json::from_slice(data)?)
    }

    /// Returns an asset's metadata in JSON format.
    pub fn meta_raw(&self, path: &str) -> Result<&[u8], Error> {
        let asset = self.store.get(path).ok_or(Error::NotFound)?;
        Ok(asset.meta_json())
    }

    /// Renders an image asset.
    ///
    /// Returns `width * height` premultiplied pixels as described in [`Rasterizer::rasterize`].
    pub fn image(&self, path: &str, width: i32, height: i32) -> Result<Vec<u32>, Error> {
        let asset = self.store.get(path).ok_or(Error::NotFound)?;
        let image = asset.as_image().ok_or(Error::WrongAssetKind)?;
        if width <= 0 || height <= 0 {
            return Err(Error::IllegalDimensions);
        }

        let pixels = self.rasterizer.rasterize(
            image.head(),
            image.view_box(),
            image.tail(),
            width as u32,
            height as u32,
        )?;

        Ok(pixels)
    }

    /// Returns problems found while adding documents, one per line.
    #[inline]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Returns and clears problems found while adding documents.
    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Returns the number of assets.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Checks that the catalog has no assets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn add_document(&mut self, label: &str, segments: &[String], data: &[u8]) {
        let doc = match scanner::scan(data, &self.options.metadata_group) {
            Ok(doc) => doc,
            Err(e) => {
                self.diagnose(label, &e);
                return;
            }
        };

        let head: Arc<[u8]> = Arc::from(doc.head);
        let tail: Arc<[u8]> = Arc::from(doc.tail);

        // The node is created even when the document's own viewport is broken,
        // so sub-assets still have a parent.
        self.store.node_mut(segments);

        let view_box = document_view_box(&doc.root_attrs);
        let whole = geom::parse_view_box(&view_box)
            .ok_or(Error::InvalidCoordinates(view_box))
            .and_then(|rect| {
                ImageAsset::new(rect, head.clone(), tail.clone(), &scanner::Record::new())
            });

        match whole {
            Ok(image) => {
                debug!("'{}' registered as '{}'.", label, segments.join("/"));
                self.store.node_mut(segments).set_asset(Asset::Image(image));
            }
            Err(e) => self.diagnose(label, &e),
        }

        let hierarchy = hierarchy::build(&doc.records);
        for (id, e) in hierarchy.errors {
            match e {
                Error::InvalidCoordinates(_) => self.diagnose(&format!("{}/{}", label, id), &e),
                _ => self.diagnose(&format!("{} => rect {}", label, id), &e),
            }
        }

        for placement in hierarchy.placements {
            let record = &doc.records[placement.record];
            let image = ImageAsset::new(placement.view_box, head.clone(), tail.clone(), record);

            let mut path = segments.to_vec();
            path.extend(placement.path);

            match image {
                Ok(image) => {
                    debug!("'{}' registered as '{}'.", label, path.join("/"));
                    self.store.node_mut(&path).set_asset(Asset::Image(image));
                }
                Err(e) => {
                    let id = record.get("id").map(String::as_str).unwrap_or("");
                    self.diagnose(&format!("{} => rect {}", label, id), &e);
                }
            }
        }
    }

    fn diagnose(&mut self, label: &str, e: &Error) {
        let line = format!("{}: {}", label, e);
        warn!("{}", line);
        self.diagnostics.push(line);
    }
}

#[cfg(feature = "system-fonts")]
fn default_rasterizer() -> ResvgRasterizer {
    ResvgRasterizer::with_system_fonts()
}

#[cfg(not(feature = "system-fonts"))]
fn default_rasterizer() -> ResvgRasterizer {
    ResvgRasterizer::default()
}

/// Returns the root viewport of a document.
///
/// Falls back to `width` and `height` when `viewBox` is missing or too short to be valid.
fn document_view_box(attrs: &std::collections::HashMap<String, String>) -> String {
    match attrs.get("viewBox") {
        Some(view_box) if view_box.len() >= 7 => view_box.clone(),
        _ => {
            let attr = |name: &str| attrs.get(name).map(String::as_str).unwrap_or("");
            format!("0 0 {} {}", attr("width"), attr("height"))
        }
    }
}

/// Converts a file path into catalog path segments.
///
/// Only a supported extension is removed.
fn logical_path(path: &Path, options: &Options) -> Result<Vec<String>, Error> {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| options.is_supported_extension(e));
    let path = if supported {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };

    let mut names = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => names.push(name.to_string_lossy().into_owned()),
            Component::ParentDir => {
                names.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if names.is_empty() {
        return Err(Error::InvalidSegment(path.display().to_string()));
    }

    names.iter().map(|name| store::path_segment(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct MockRasterizer {
        calls: Arc<AtomicUsize>,
    }

    impl Rasterizer for MockRasterizer {
        fn rasterize(
            &self,
            _head: &[u8],
            view_box: &[u8],
            _tail: &[u8],
            width: u32,
            height: u32,
        ) -> Result<Vec<u32>, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if view_box.is_empty() {
                return Err(RenderError::InvalidSize);
            }

            Ok(vec![0xFF00FF00; (width * height) as usize])
        }
    }

    fn mock_catalog() -> (Catalog, Arc<AtomicUsize>) {
        let rasterizer = MockRasterizer::default();
        let calls = rasterizer.calls.clone();
        let catalog = Catalog::with_rasterizer(Options::default(), Box::new(rasterizer));
        (catalog, calls)
    }

    fn sorted(mut paths: Vec<String>) -> Vec<String> {
        paths.sort();
        paths
    }

    const SHEET: &str = "\
<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"200\" height=\"100\">
  <g id=\"METADATA\">
    <rect id=\"c\" x=\"50\" y=\"50\" width=\"10\" height=\"10\"/>
    <rect id=\"a\" x=\"0\" y=\"0\" width=\"100\" height=\"100\"/>
    <rect id=\"b\" x=\"10\" y=\"10\" width=\"20\" height=\"20\"><desc>Button</desc></rect>
  </g>
  <path d=\"M0 0 L10 10\"/>
</svg>";

    #[test]
    fn nested_assets() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data("ui/Sheet.svg", SHEET.as_bytes());

        assert!(catalog.diagnostics().is_empty());
        assert_eq!(sorted(catalog.list("")), vec!["ui/sheet", "ui/sheet/a", "ui/sheet/a/b", "ui/sheet/a/c"]);

        let b: Metadata = catalog.meta("UI/sheet/a/b").unwrap();
        assert_eq!((b.x, b.y, b.width, b.height), (10, 10, 20, 20));
        assert_eq!((b.centerx, b.centery), (10, 10));
        assert_eq!(b.description.as_deref(), Some("Button"));

        let c = catalog.get("ui/sheet/a/c").unwrap().as_image().unwrap();
        assert_eq!(c.view_box(), b"viewBox=\"50 50 10 10\"");
        assert!(!c.to_svg().windows(8).any(|w| w == b"METADATA"));
    }

    #[test]
    fn whole_document_view_box() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data("a", b"<svg width='16' height='8'><g/></svg>");
        catalog.add_data("b", b"<svg viewBox='1 2 30 40' width='16'><g/></svg>");

        let a = catalog.get("a").unwrap().as_image().unwrap();
        assert_eq!(a.rect(), Rect::from_xywh(0, 0, 16, 8).unwrap());
        assert_eq!(a.to_svg(), b"<svg\nviewBox=\"0 0 16 8\"><g/></svg>".to_vec());

        let b = catalog.get("b").unwrap().as_image().unwrap();
        assert_eq!(b.rect(), Rect::from_xywh(1, 2, 30, 40).unwrap());
    }

    #[test]
    fn degenerate_view_box() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data("a", b"<svg viewBox='0 0 1' width='4' height='2'><g/></svg>");

        let a = catalog.get("a").unwrap().as_image().unwrap();
        assert_eq!(a.rect(), Rect::from_xywh(0, 0, 4, 2).unwrap());
        assert!(catalog.diagnostics().is_empty());
    }

    #[test]
    fn far_sub_asset_is_kept() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data(
            "a",
            b"<svg width='4' height='2'><g id='METADATA'>\
              <rect id='far' x='1100000000' y='0' width='10' height='10'/>\
              <rect id='near' x='0' y='0' width='2' height='2'/>\
              </g></svg>",
        );

        assert_eq!(sorted(catalog.list("")), vec!["a", "a/far", "a/near"]);
        let far: Metadata = catalog.meta("a/far").unwrap();
        assert_eq!(far.x, 1_100_000_000);
        assert!(catalog.diagnostics().is_empty());
    }

    #[cfg(feature = "system-fonts")]
    #[test]
    fn default_rasterizer_has_system_fonts() {
        let expected = ResvgRasterizer::with_system_fonts();
        assert_eq!(default_rasterizer().fontdb.len(), expected.fontdb.len());
    }

    #[test]
    fn missing_size_keeps_sub_assets() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data(
            "doc",
            b"<svg><g id='METADATA'><rect id='x' x='0' y='0' width='4' height='4'/></g></svg>",
        );

        assert_eq!(catalog.list(""), vec!["doc/x"]);
        assert_eq!(catalog.diagnostics().len(), 1);
        assert!(catalog.diagnostics()[0].starts_with("doc: cannot parse coordinates"));
    }

    #[test]
    fn malformed_document() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data("broken.svg", b"<svg width='1' height='1'><g>");

        assert!(catalog.is_empty());
        assert!(catalog.store().node("broken").is_none());
        assert_eq!(catalog.diagnostics().len(), 1);
        assert!(catalog.diagnostics()[0].starts_with("broken.svg: "));
    }

    #[test]
    fn numbered_ids_last_wins() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data(
            "icons",
            b"<svg width='30' height='10'><g id='METADATA'>\
              <rect id='icon1' x='0' y='0' width='10' height='10'/>\
              <rect id='icon2' x='20' y='0' width='10' height='10'/>\
              </g></svg>",
        );

        assert_eq!(sorted(catalog.list("/")), vec!["icons", "icons/icon"]);
        let meta: Metadata = catalog.meta("icons/icon").unwrap();
        assert_eq!(meta.x, 20);

        // Digits are not stripped from queries.
        assert!(matches!(catalog.meta::<Metadata>("icons/icon2"), Err(Error::NotFound)));
    }

    #[test]
    fn invalid_rect_id() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data(
            "doc",
            b"<svg width='30' height='10'><g id='METADATA'>\
              <rect id='42' x='0' y='0' width='10' height='10'/>\
              <rect id='bad' x='0' y='zero' width='10' height='10'/>\
              </g></svg>",
        );

        assert_eq!(catalog.list(""), vec!["doc"]);
        let diagnostics = sorted(catalog.take_diagnostics());
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].starts_with("doc => rect 42: "));
        assert_eq!(diagnostics[1], "doc/bad: cannot parse coordinates \"0 zero 10 10\"");
        assert!(catalog.diagnostics().is_empty());
    }

    #[test]
    fn invalid_document_path() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data("icons/2024/ship.svg", b"<svg width='1' height='1'/>");
        catalog.add_data("", b"<svg width='1' height='1'><g/></svg>");

        assert!(catalog.is_empty());
        assert_eq!(catalog.diagnostics().len(), 2);
    }

    #[test]
    fn replace() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data("a", b"<svg width='1' height='1'><g/></svg>");
        catalog.add_data("A.svg", b"<svg width='2' height='2'><g/></svg>");

        assert_eq!(catalog.len(), 1);
        let meta: Metadata = catalog.meta("a").unwrap();
        assert_eq!(meta.width, 2);
    }

    #[test]
    fn image_checks() {
        let (mut catalog, calls) = mock_catalog();
        catalog.add_data("a", b"<svg width='1' height='1'><g/></svg>");

        assert!(matches!(catalog.image("a", 0, 10), Err(Error::IllegalDimensions)));
        assert!(matches!(catalog.image("a", 10, -1), Err(Error::IllegalDimensions)));
        assert!(matches!(catalog.image("b", 10, 10), Err(Error::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(catalog.image("a", 3, 2).unwrap().len(), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn meta_errors() {
        let (mut catalog, _) = mock_catalog();
        catalog.add_data("a", b"<svg width='1' height='1'><g/></svg>");

        assert!(matches!(catalog.meta_raw("missing"), Err(Error::NotFound)));
        assert!(matches!(catalog.meta::<Vec<u8>>("a"), Err(Error::Metadata(_))));
    }

    #[test]
    fn logical_paths() {
        let opt = Options::default();
        let path = |s: &str| logical_path(Path::new(s), &opt).unwrap().join("/");
        assert_eq!(path("Assets/UI/Ship1.svg"), "assets/ui/ship");
        assert_eq!(path("/tmp/./a/../b.SVG"), "tmp/b");
        assert_eq!(path("icons"), "icons");
        assert_eq!(path("packed.SVGZ"), "packed");
        assert_eq!(path("sprites.v2"), "sprites.v");
        assert_eq!(path("notes.txt"), "notes.txt");
        assert!(logical_path(Path::new(""), &opt).is_err());
        assert!(logical_path(Path::new("a/12/b.svg"), &opt).is_err());

        let no_svgz = Options {
            allow_svgz: false,
            ..Options::default()
        };
        let segments = logical_path(Path::new("packed.svgz"), &no_svgz).unwrap();
        assert_eq!(segments, vec!["packed.svgz"]);
    }
}
