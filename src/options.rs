// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Processing options.
#[derive(Clone, Debug)]
pub struct Options {
    /// The `id`/`label` of the authoring group that holds sub-asset rectangles.
    ///
    /// Must be upper-case, otherwise the group would never be excised.
    ///
    /// Default: `METADATA`
    pub metadata_group: String,

    /// Accept gzip-compressed documents with the `.svgz` extension.
    ///
    /// Default: `true`
    pub allow_svgz: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            metadata_group: "METADATA".to_string(),
            allow_svgz: true,
        }
    }
}

impl Options {
    /// Checks that a file with the provided extension should be processed.
    ///
    /// The extension is compared case-insensitively.
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        ext == "svg" || (self.allow_svgz && ext == "svgz")
    }
}
