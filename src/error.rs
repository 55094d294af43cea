// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use crate::render::RenderError;

/// List of all errors.
#[derive(Debug)]
pub enum Error {
    /// Failed to open, stat or read a file.
    Io(PathBuf, std::io::Error),

    /// Failed to traverse a directory.
    Walk(walkdir::Error),

    /// An input data ended earlier than expected.
    ///
    /// Usually means a truncated document.
    UnexpectedEndOfStream,

    /// Compressed SVG must use the GZip algorithm.
    MalformedGZip,

    /// The document has no root element.
    MissingRootElement,

    /// The markup structure is not the one expected at the given output position.
    MalformedMarkup(usize),

    /// A path component has no non-digit characters left
    /// after trailing digits were stripped.
    InvalidSegment(String),

    /// A rectangle description cannot be parsed or has a negative size.
    InvalidCoordinates(String),

    /// Metadata cannot be converted to or from JSON.
    Metadata(serde_json::Error),

    /// No asset is registered under the requested path.
    NotFound,

    /// The requested asset exists but does not support the requested operation.
    WrongAssetKind,

    /// The provided width/height are illegal.
    ///
    /// Occurs when width and/or height are <= 0.
    IllegalDimensions,

    /// The rasterizer failed to render an asset.
    Rasterizer(RenderError),
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Error::Walk(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Metadata(e)
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Error::Rasterizer(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Io(ref path, ref e) => {
                write!(f, "failed to read '{}' cause {}", path.display(), e)
            }
            Error::Walk(ref e) => {
                write!(f, "directory traversal failed cause {}", e)
            }
            Error::UnexpectedEndOfStream => {
                write!(f, "not a well-formed SVG file: unexpected end of stream")
            }
            Error::MalformedGZip => {
                write!(f, "provided data has a malformed GZip content")
            }
            Error::MissingRootElement => {
                write!(f, "not a well-formed SVG file: no root element")
            }
            Error::MalformedMarkup(pos) => {
                write!(f, "not a well-formed SVG file: unexpected markup at {}", pos)
            }
            Error::InvalidSegment(ref segment) => {
                write!(
                    f,
                    "all path components must contain at least 1 non-digit character, got '{}'",
                    segment
                )
            }
            Error::InvalidCoordinates(ref text) => {
                write!(f, "cannot parse coordinates \"{}\"", text)
            }
            Error::Metadata(ref e) => {
                write!(f, "JSON conversion error: {}", e)
            }
            Error::NotFound => {
                write!(f, "asset not found")
            }
            Error::WrongAssetKind => {
                write!(f, "incorrect asset type")
            }
            Error::IllegalDimensions => {
                write!(f, "illegal image dimensions")
            }
            Error::Rasterizer(ref e) => {
                write!(f, "rendering failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(_, ref e) => Some(e),
            Error::Walk(ref e) => Some(e),
            Error::Metadata(ref e) => Some(e),
            Error::Rasterizer(ref e) => Some(e),
            _ => None,
        }
    }
}
