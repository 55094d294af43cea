// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::{Asset, Error};

/// A catalog node.
///
/// A node can have an asset and children at the same time.
#[derive(Clone, Default, Debug)]
pub struct Node {
    asset: Option<Asset>,
    children: HashMap<String, Node>,
}

impl Node {
    /// Returns node's asset.
    #[inline]
    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    /// Returns node's child by a path segment.
    #[inline]
    pub fn child(&self, segment: &str) -> Option<&Node> {
        self.children.get(segment)
    }

    /// Returns an iterator over children and their path segments.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replaces the node's asset.
    ///
    /// There is no way to remove an asset, a failed asset construction
    /// must leave the previous one intact.
    #[inline]
    pub(crate) fn set_asset(&mut self, asset: Asset) {
        self.asset = Some(asset);
    }

    fn collect(&self, prefix: &mut Vec<String>, paths: &mut Vec<String>) {
        if self.asset.is_some() {
            paths.push(prefix.join("/"));
        }

        for (segment, child) in &self.children {
            prefix.push(segment.clone());
            child.collect(prefix, paths);
            prefix.pop();
        }
    }

    fn count(&self) -> usize {
        let own = usize::from(self.asset.is_some());
        own + self.children.values().map(Node::count).sum::<usize>()
    }
}

/// A path trie that holds assets.
///
/// Paths are `/`-separated and case-insensitive.
#[derive(Clone, Default, Debug)]
pub struct Store {
    root: Node,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Store::default()
    }

    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns a node by path segments, creating missing nodes along the way.
    pub(crate) fn node_mut<S: AsRef<str>>(&mut self, segments: &[S]) -> &mut Node {
        let mut node = &mut self.root;
        for segment in segments {
            node = node
                .children
                .entry(segment.as_ref().to_string())
                .or_default();
        }

        node
    }

    /// Returns a node by path. The node may have no asset.
    pub fn node(&self, path: &str) -> Option<&Node> {
        let mut node = &self.root;
        for segment in split_path(path) {
            node = node.children.get(&segment)?;
        }

        Some(node)
    }

    /// Returns an asset by path.
    ///
    /// Returns `None` when the path doesn't exist or when it doesn't have an asset.
    pub fn get(&self, path: &str) -> Option<&Asset> {
        self.node(path)?.asset()
    }

    /// Returns the full paths of all assets at or below `prefix`.
    ///
    /// The order is unspecified. Paths do not start with `/`.
    /// An empty prefix, `/` and `.` refer to the whole store.
    pub fn list(&self, prefix: &str) -> Vec<String> {
        let node = match self.node(prefix) {
            Some(node) => node,
            None => return Vec::new(),
        };

        let mut paths = Vec::new();
        node.collect(&mut split_path(prefix), &mut paths);
        paths
    }

    /// Returns the number of assets.
    pub fn len(&self) -> usize {
        self.root.count()
    }

    /// Checks that the store has no assets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits a query path into lower-cased segments.
///
/// Empty and `.` segments are skipped.
pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(|s| s.to_lowercase())
        .collect()
}

/// Converts an id or a file name into a path segment.
///
/// Trailing ASCII digits are removed, so numbered variants like `icon1` and `icon2`
/// share the same segment.
pub(crate) fn path_segment(name: &str) -> Result<String, Error> {
    let segment = name.to_lowercase();
    let segment = segment.trim_end_matches(|c: char| c.is_ascii_digit());
    if segment.is_empty() {
        return Err(Error::InvalidSegment(name.to_string()));
    }

    Ok(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::test_asset;

    fn sorted(mut paths: Vec<String>) -> Vec<String> {
        paths.sort();
        paths
    }

    #[test]
    fn segments() {
        assert_eq!(path_segment("Icon12").unwrap(), "icon");
        assert_eq!(path_segment("a1b2").unwrap(), "a1b");
        assert!(matches!(path_segment("123"), Err(Error::InvalidSegment(_))));
        assert!(matches!(path_segment(""), Err(Error::InvalidSegment(_))));
    }

    #[test]
    fn split() {
        assert_eq!(split_path("/Icons//Ship/"), vec!["icons", "ship"]);
        assert_eq!(split_path("./a/./b"), vec!["a", "b"]);
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
    }

    #[test]
    fn get_requires_asset() {
        let mut store = Store::new();
        store.node_mut(&["a", "b"]).set_asset(test_asset(1));

        assert!(store.get("a/b").is_some());
        assert!(store.get("/A/B").is_some());
        assert!(store.node("a").is_some());
        assert!(store.get("a").is_none());
        assert!(store.get("a/c").is_none());
    }

    #[test]
    fn list_prefix() {
        let mut store = Store::new();
        store.node_mut(&["ui", "buttons"]).set_asset(test_asset(1));
        store.node_mut(&["ui", "buttons", "ok"]).set_asset(test_asset(2));
        store.node_mut(&["ui", "icons", "ship"]).set_asset(test_asset(3));
        store.node_mut(&["logo"]).set_asset(test_asset(4));

        let all = sorted(store.list(""));
        assert_eq!(all, vec!["logo", "ui/buttons", "ui/buttons/ok", "ui/icons/ship"]);
        assert_eq!(sorted(store.list("/")), all);
        assert_eq!(sorted(store.list(".")), all);

        assert_eq!(sorted(store.list("ui")), vec!["ui/buttons", "ui/buttons/ok", "ui/icons/ship"]);
        assert_eq!(sorted(store.list("/UI/buttons/")), vec!["ui/buttons", "ui/buttons/ok"]);
        assert!(store.list("ui/but").is_empty());
        assert!(store.list("missing").is_empty());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn replace_keeps_nodes() {
        let mut store = Store::new();
        store.node_mut(&["a"]).set_asset(test_asset(1));
        store.node_mut(&["a"]).set_asset(test_asset(2));

        assert_eq!(store.list(""), vec!["a"]);
        assert_eq!(store.get("a").unwrap().meta_json(), test_asset(2).meta_json());
    }
}
