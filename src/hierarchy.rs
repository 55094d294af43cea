// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Reconstructs sub-asset nesting from metadata rectangles.

Rectangles are visited from the largest to the smallest. Each one becomes a child
of the smallest already placed rectangle that contains it, so a sprite sheet
rectangle holding several icon rectangles becomes a parent of those icons.
*/

use crate::geom::{self, Rect};
use crate::scanner::Record;
use crate::store::path_segment;
use crate::Error;

/// A sub-asset position in the hierarchy.
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Placement {
    /// Path segments relative to the document.
    pub path: Vec<String>,
    /// Viewport relative to the parent placement.
    /// Absolute for top-level placements.
    pub view_box: Rect,
    /// Index of the source record.
    pub record: usize,
}

/// The result of hierarchy reconstruction.
#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    /// Placements in processing order. Later placements on the same path win.
    pub placements: Vec<Placement>,
    /// Rejected records as `(id, error)`.
    pub errors: Vec<(String, Error)>,
}

struct Context {
    /// `None` for the document itself, which contains every rect.
    rect: Option<Rect>,
    path: Vec<String>,
}

impl Context {
    fn contains(&self, rect: &Rect) -> bool {
        self.rect.map_or(true, |r| r.contains(rect))
    }
}

/// Builds a hierarchy out of metadata records.
pub(crate) fn build(records: &[Record]) -> Hierarchy {
    let mut hierarchy = Hierarchy::default();

    let mut candidates = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        match record_rect(record) {
            Ok(rect) => candidates.push((idx, rect)),
            Err(e) => hierarchy.errors.push((record_id(record).to_string(), e)),
        }
    }

    // The sort is stable, so equal areas keep the document order.
    candidates.sort_by(|a, b| b.1.area().cmp(&a.1.area()));

    let mut claimed = vec![false; candidates.len()];
    let mut current = Context {
        rect: None,
        path: Vec::new(),
    };
    let mut stack: Vec<Context> = Vec::new();

    loop {
        let found = candidates
            .iter()
            .enumerate()
            .position(|(i, (_, rect))| !claimed[i] && current.contains(rect));

        let i = match found {
            Some(i) => i,
            None => match stack.pop() {
                Some(parent) => {
                    current = parent;
                    continue;
                }
                None => break,
            },
        };

        claimed[i] = true;
        let (idx, rect) = candidates[i];
        let id = record_id(&records[idx]);
        let segment = match path_segment(id) {
            Ok(v) => v,
            Err(e) => {
                hierarchy.errors.push((id.to_string(), e));
                continue;
            }
        };

        let view_box = match current.rect {
            Some(ref parent) => rect.relative_to(parent),
            None => rect,
        };

        let mut path = current.path.clone();
        path.push(segment);

        hierarchy.placements.push(Placement {
            path: path.clone(),
            view_box,
            record: idx,
        });

        let parent = std::mem::replace(
            &mut current,
            Context {
                rect: Some(rect),
                path,
            },
        );
        stack.push(parent);
    }

    hierarchy
}

fn record_id(record: &Record) -> &str {
    record.get("id").map(String::as_str).unwrap_or("")
}

fn record_rect(record: &Record) -> Result<Rect, Error> {
    let field = |name: &str| record.get(name).map(String::as_str).unwrap_or("");
    let text = format!(
        "{} {} {} {}",
        field("x"),
        field("y"),
        field("width"),
        field("height")
    );

    geom::parse_view_box(&text).ok_or(Error::InvalidCoordinates(text))
}
