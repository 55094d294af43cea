// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::geom::{self, Rect};
use crate::scanner::Record;
use crate::Error;

/// A catalog asset.
#[derive(Clone, Debug)]
pub enum Asset {
    /// A rectangular part of an SVG image.
    Image(ImageAsset),
}

impl Asset {
    /// Returns the asset as an image, if it is one.
    #[inline]
    pub fn as_image(&self) -> Option<&ImageAsset> {
        match self {
            Asset::Image(ref image) => Some(image),
        }
    }

    /// Returns the asset's metadata in JSON format.
    #[inline]
    pub fn meta_json(&self) -> &[u8] {
        match self {
            Asset::Image(ref image) => image.meta_json(),
        }
    }
}

/// A rectangular part of an SVG image.
///
/// `head`, `view_box` and `tail` concatenated together form a complete SVG document
/// that shows only the asset's area.
#[derive(Clone, Debug)]
pub struct ImageAsset {
    head: Arc<[u8]>,
    view_box: Vec<u8>,
    tail: Arc<[u8]>,
    meta: Vec<u8>,
    rect: Rect,
}

impl ImageAsset {
    /// Creates a new image asset.
    ///
    /// `record` holds the attributes of the rectangle that describes the asset.
    /// It's empty for a whole document.
    pub(crate) fn new(
        rect: Rect,
        head: Arc<[u8]>,
        tail: Arc<[u8]>,
        record: &Record,
    ) -> Result<Self, Error> {
        let meta = meta_json(&rect, record)?;
        Ok(ImageAsset {
            head,
            view_box: format!("viewBox=\"{}\"", rect).into_bytes(),
            tail,
            meta,
            rect,
        })
    }

    /// SVG markup up to the location where the `viewBox` attribute of the root element
    /// has to be inserted.
    ///
    /// Never includes `viewBox`, `width` and `height`. Always ends with whitespace.
    #[inline]
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// The `viewBox="..."` attribute to be inserted between the head and the tail.
    #[inline]
    pub fn view_box(&self) -> &[u8] {
        &self.view_box
    }

    /// SVG markup following the `viewBox` insertion point.
    #[inline]
    pub fn tail(&self) -> &[u8] {
        &self.tail
    }

    /// The asset's viewport.
    ///
    /// A nested asset's viewport is relative to its parent asset.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Metadata in JSON format.
    ///
    /// Always includes `x`, `y`, `width`, `height`, `centerx` and `centery`.
    #[inline]
    pub fn meta_json(&self) -> &[u8] {
        &self.meta
    }

    /// Returns the complete SVG document.
    pub fn to_svg(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.head.len() + self.view_box.len() + self.tail.len());
        data.extend_from_slice(&self.head);
        data.extend_from_slice(&self.view_box);
        data.extend_from_slice(&self.tail);
        data
    }
}

/// The always present part of an asset's metadata.
#[derive(Clone, PartialEq, Eq, Deserialize, Debug)]
pub struct Metadata {
    /// Viewport X position.
    pub x: i32,
    /// Viewport Y position.
    pub y: i32,
    /// Viewport width.
    pub width: i32,
    /// Viewport height.
    pub height: i32,
    /// Rotation center X, relative to the viewport.
    pub centerx: i32,
    /// Rotation center Y, relative to the viewport.
    pub centery: i32,
    /// Text of the rectangle's `<desc>` element.
    #[serde(default)]
    pub description: Option<String>,
}

fn meta_json(rect: &Rect, record: &Record) -> Result<Vec<u8>, Error> {
    // Inkscape stores the rotation center as an offset from the bbox center, Y up.
    let offset = |name: &str| {
        record
            .get(name)
            .and_then(|v| geom::parse_number(v))
            .unwrap_or(0.0)
    };
    let cx = (rect.width() as f64 / 2.0 + offset("transform-center-x")).round() as i32;
    let cy = (rect.height() as f64 / 2.0 - offset("transform-center-y")).round() as i32;

    let mut map = Map::new();
    for (name, value) in record {
        map.insert(name.clone(), Value::String(value.clone()));
    }

    map.insert("x".to_string(), rect.x().into());
    map.insert("y".to_string(), rect.y().into());
    map.insert("width".to_string(), rect.width().into());
    map.insert("height".to_string(), rect.height().into());
    map.insert("centerx".to_string(), cx.into());
    map.insert("centery".to_string(), cy.into());

    Ok(serde_json::to_vec(&Value::Object(map))?)
}
