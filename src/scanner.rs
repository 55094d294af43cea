// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
A single pass SVG canonicalizer.

The scanner reads the input byte by byte and writes a reduced copy of it:
whitespace runs are collapsed, comments are dropped, the root `viewBox`, `width`
and `height` attributes are removed and authoring groups (groups with an
all upper-case `id` or `label`) are excised together with their content.

Rectangles inside the metadata group are harvested before the group is excised.

The scanner is not an XML parser. It relies on the conventions of SVG editors:

- a comment must not contain `>`, since a comment ends at the first `>`;
- only one authoring group can be pending at a time,
  upper-case groups inside of it are not tracked separately.
*/

use std::collections::HashMap;

use crate::stream::{ByteExt, Stream};
use crate::Error;

/// Attributes of a metadata rectangle.
///
/// A `<desc>` child is stored under the `description` key.
pub(crate) type Record = HashMap<String, String>;

/// A canonical document.
///
/// `head`, followed by a `viewBox="..."` attribute, followed by `tail`
/// is a complete SVG document.
#[derive(Debug)]
pub(crate) struct Document {
    /// Markup up to the viewport insertion point. Always ends with whitespace.
    pub head: Vec<u8>,
    /// Markup after the viewport insertion point.
    pub tail: Vec<u8>,
    /// The removed `viewBox`, `width` and `height` attributes of the root element.
    pub root_attrs: HashMap<String, String>,
    /// Rectangles found inside the metadata group, in document order.
    pub records: Vec<Record>,
}

struct KillRegion {
    /// Nesting level at which the region ends.
    level: i32,
    /// Output length to restore once the region ends.
    out: usize,
    /// Whether rectangles inside of the region should be collected.
    metadata: bool,
}

/// Canonicalizes an SVG document.
///
/// `metadata_group` is the `id`/`label` of the group that holds sub-asset rectangles.
pub(crate) fn scan(data: &[u8], metadata_group: &str) -> Result<Document, Error> {
    let mut s = Stream::from(data);
    let mut out: Vec<u8> = Vec::with_capacity(data.len() + 1);

    // Incremented on a start tag and decremented on an end tag.
    let mut level: i32 = 0;
    let mut kill: Option<KillRegion> = None;

    // Local name of the most recent start tag and
    // the output position of its `<`.
    let mut tag_name = String::new();
    let mut tag_start = 0;
    let mut in_tag = false;

    // Local name of the most recent attribute and the output position where it starts.
    let mut attr_name = String::new();
    let mut attr_start = 0;

    let mut attributes = Record::new();
    let mut records = Vec::new();
    let mut root_attrs = HashMap::new();

    // Output position of the `>` that closes the root start tag.
    let mut insert_pos = None;

    loop {
        let mut c = s.read_byte()?;
        let in_metadata = kill.as_ref().map_or(false, |k| k.metadata);

        if c == b'<' {
            match s.curr_byte()? {
                b'?' => {
                    // Processing instructions are copied as is.
                    while c != b'>' {
                        out.push(c);
                        c = s.read_byte()?;
                    }
                }
                b'!' => {
                    s.skip_past(b'>')?;
                    continue;
                }
                b'/' => {
                    let end_tag_start = out.len();
                    let mut name_start = out.len() + 2;
                    while c != b'>' {
                        out.push(c);
                        c = s.read_byte()?;
                        if c == b':' {
                            name_start = out.len() + 1;
                        }
                    }

                    let name = local_name(&out, name_start);
                    if name == "desc" {
                        let text_start = out[..end_tag_start]
                            .iter()
                            .rposition(|b| *b == b'>')
                            .map(|p| p + 1)
                            .ok_or(Error::MalformedMarkup(end_tag_start))?;
                        let text = unescape_text(&out[text_start..end_tag_start]);
                        attributes.insert("description".to_string(), text);
                    } else if in_metadata && name == "rect" {
                        records.push(attributes.clone());
                    }

                    level -= 1;
                    if level == 0 {
                        out.push(b'>');
                        break;
                    }

                    if close_kill_region(&mut kill, level, &mut out) {
                        continue;
                    }
                }
                _ => {
                    in_tag = true;
                    tag_start = out.len();
                    attr_name.clear();
                    let mut name_start = tag_start + 1;
                    while c > b' ' && c != b'/' && c != b'>' {
                        out.push(c);
                        c = s.read_byte()?;
                        if c == b':' {
                            name_start = out.len() + 1;
                        }
                    }

                    tag_name = local_name(&out, name_start);
                    if tag_name == "rect" {
                        attributes = Record::new();
                    }

                    level += 1;

                    // `<foo>` and `<foo/`. The closing byte should be processed as a regular one.
                    if c == b'>' || c == b'/' {
                        s.step_back();
                        continue;
                    }
                }
            }
        } else if !in_metadata && c.is_space() {
            s.skip_spaces();
            c = b' ';
        } else if in_tag && c.is_quote() {
            out.push(c);
            let value_start = out.len();
            let mut d = s.read_byte()?;
            while d != c {
                out.push(d);
                d = s.read_byte()?;
            }

            let value = String::from_utf8_lossy(&out[value_start..]).into_owned();
            let name = std::mem::take(&mut attr_name);

            if level == 1 && matches!(name.as_str(), "viewBox" | "width" | "height") {
                root_attrs.insert(name, value);
                out.truncate(attr_start);
                if out.last().map_or(false, |b| b.is_space()) {
                    out.pop();
                }
                continue;
            }

            if tag_name == "rect" {
                attributes.insert(name.clone(), value.clone());
            }

            if tag_name == "g"
                && kill.is_none()
                && (name == "id" || name == "label")
                && value.to_uppercase() == value
            {
                kill = Some(KillRegion {
                    level: level - 1,
                    out: tag_start,
                    metadata: value == metadata_group,
                });
            }
        } else if in_tag {
            if c == b'/' {
                if in_metadata && tag_name == "rect" {
                    records.push(attributes.clone());
                }

                out.push(c);
                c = s.read_byte()?;

                level -= 1;
                if level == 0 {
                    out.push(c);
                    break;
                }

                if close_kill_region(&mut kill, level, &mut out) {
                    in_tag = false;
                    continue;
                }
            }

            if c == b'>' {
                in_tag = false;
                if level == 1 && insert_pos.is_none() {
                    insert_pos = Some(out.len());
                }
            } else if c == b'=' {
                let (start, name) = attribute_name(&out);
                attr_start = start;
                attr_name = name;
            }
        }

        out.push(c);
    }

    let insert_pos = insert_pos.ok_or(Error::MissingRootElement)?;
    if insert_pos > out.len() {
        return Err(Error::MalformedMarkup(insert_pos));
    }

    let tail = out.split_off(insert_pos);
    out.push(b'\n');
    out.shrink_to_fit();

    Ok(Document {
        head: out,
        tail,
        root_attrs,
        records,
    })
}

/// Restores the output to the state before the pending kill region
/// if the region ends at the current level.
fn close_kill_region(kill: &mut Option<KillRegion>, level: i32, out: &mut Vec<u8>) -> bool {
    match kill {
        Some(ref region) if region.level == level => {
            out.truncate(region.out);
            *kill = None;
            true
        }
        _ => false,
    }
}

fn local_name(out: &[u8], start: usize) -> String {
    let name = out.get(start..).unwrap_or_default();
    String::from_utf8_lossy(name).trim_end().to_string()
}

/// Returns the position where the attribute before `=` starts, including its prefix,
/// and its local name.
fn attribute_name(out: &[u8]) -> (usize, String) {
    let mut end = out.len();
    while end > 0 && out[end - 1].is_space() {
        end -= 1;
    }

    let mut start = end;
    while start > 0 && out[start - 1].is_name_byte() {
        start -= 1;
    }

    let name = String::from_utf8_lossy(&out[start..end]).into_owned();

    if start > 0 && out[start - 1] == b':' {
        start -= 1;
        while start > 0 && out[start - 1].is_name_byte() {
            start -= 1;
        }
    }

    (start, name)
}

fn unescape_text(text: &[u8]) -> String {
    let text = String::from_utf8_lossy(text);
    match quick_xml::escape::unescape(&text) {
        Ok(v) => v.into_owned(),
        Err(_) => text.into_owned(),
    }
}
