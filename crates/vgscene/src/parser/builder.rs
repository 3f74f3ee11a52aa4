// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{AId, EId, Error};
use crate::xml::{XmlEvent, XmlEventSource};

/// Deeper documents are rejected, since every level costs a recursion during rendering.
const MAX_DEPTH: usize = 2048;
const MAX_NODES: usize = 1_000_000;

pub(crate) type RawId = usize;

#[derive(Clone, PartialEq, Debug)]
pub(crate) enum RawKind {
    Element(EId),
    Text(String),
}

#[derive(Debug)]
pub(crate) struct RawNode {
    pub parent: Option<RawId>,
    pub children: Vec<RawId>,
    pub kind: RawKind,
    pub attrs: Vec<(AId, String)>,
}

/// An untyped SVG tree.
///
/// The first node is always the root `svg` element.
/// Nodes are stored in the document order.
#[derive(Debug)]
pub(crate) struct RawDocument {
    pub nodes: Vec<RawNode>,
    /// Content of all `style` elements.
    pub style_text: String,
    /// Links from `xml-stylesheet` processing instructions.
    pub style_sheet_links: Vec<String>,
}

impl RawDocument {
    #[inline]
    pub fn root(&self) -> RawId {
        0
    }

    #[inline]
    pub fn element(&self, id: RawId) -> Option<EId> {
        match self.nodes[id].kind {
            RawKind::Element(eid) => Some(eid),
            RawKind::Text(_) => None,
        }
    }

    #[inline]
    pub fn attribute(&self, id: RawId, aid: AId) -> Option<&str> {
        self.nodes[id]
            .attrs
            .iter()
            .find(|(name, _)| *name == aid)
            .map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn has_attribute(&self, id: RawId, aid: AId) -> bool {
        self.attribute(id, aid).is_some()
    }

    pub fn parent_element(&self, id: RawId) -> Option<RawId> {
        self.nodes[id].parent
    }

    /// Returns the previous element sibling.
    pub fn prev_sibling_element(&self, id: RawId) -> Option<RawId> {
        let parent = self.nodes[id].parent?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .find(|c| self.element(**c).is_some())
            .copied()
    }

    fn append(&mut self, parent: Option<RawId>, kind: RawKind, attrs: Vec<(AId, String)>) -> RawId {
        let id = self.nodes.len();
        self.nodes.push(RawNode {
            parent,
            children: Vec::new(),
            kind,
            attrs,
        });

        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }

        id
    }

    fn is_space_preserved(&self, mut id: RawId) -> bool {
        loop {
            match self.attribute(id, AId::Space) {
                Some("preserve") => return true,
                Some("default") => return false,
                _ => {}
            }

            match self.nodes[id].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }
}

enum Frame {
    Node(RawId),
    Style,
    Skip,
}

/// Builds a raw tree from XML events.
///
/// Stops pulling events once the root element is closed.
pub(crate) fn build<S: XmlEventSource>(source: &mut S) -> Result<RawDocument, Error> {
    let mut doc = RawDocument {
        nodes: Vec::new(),
        style_text: String::new(),
        style_sheet_links: Vec::new(),
    };

    let mut stack: Vec<Frame> = Vec::new();
    while let Some(event) = source.next_event() {
        match event {
            XmlEvent::StartElement { name, attributes } => {
                if stack.len() >= MAX_DEPTH {
                    return Err(Error::ElementsLimitReached);
                }

                let frame = start_element(&name, attributes, &stack, &mut doc)?;
                stack.push(frame);
            }
            XmlEvent::EndElement => {
                stack.pop();
                if stack.is_empty() && !doc.nodes.is_empty() {
                    break;
                }
            }
            XmlEvent::Text(text) => match stack.last() {
                Some(Frame::Style) => {
                    doc.style_text.push_str(&text);
                    doc.style_text.push('\n');
                }
                Some(Frame::Node(id)) => {
                    let id = *id;
                    if doc.element(id).map_or(false, |e| e.is_text_content()) {
                        append_text(id, &text, &mut doc)?;
                    }
                }
                _ => {}
            },
            XmlEvent::ProcessingInstruction { target, value } => {
                if target == "xml-stylesheet" {
                    if let Some(href) = value.as_deref().and_then(parse_style_sheet_pi) {
                        doc.style_sheet_links.push(href.to_string());
                    }
                }
            }
        }
    }

    if doc.nodes.is_empty() {
        return Err(Error::NotAnSvg);
    }

    Ok(doc)
}

fn start_element(
    name: &str,
    attributes: Vec<(String, String)>,
    stack: &[Frame],
    doc: &mut RawDocument,
) -> Result<Frame, Error> {
    let parent_id = match stack.last() {
        None => {
            if !doc.nodes.is_empty() {
                return Ok(Frame::Skip);
            }

            if EId::from_str(name) != Some(EId::Svg) {
                return Err(Error::NotAnSvg);
            }

            let attrs = parse_attributes(attributes);
            return Ok(Frame::Node(doc.append(None, RawKind::Element(EId::Svg), attrs)));
        }
        Some(Frame::Node(id)) => *id,
        Some(Frame::Style) | Some(Frame::Skip) => return Ok(Frame::Skip),
    };

    let eid = match EId::from_str(name) {
        Some(eid) => eid,
        None => {
            log::debug!("Unknown element '{}'. Skipped.", name);
            return Ok(Frame::Skip);
        }
    };

    if eid == EId::Style {
        let is_css = attributes
            .iter()
            .find(|(name, _)| name == "type")
            .map_or(true, |(_, value)| value.is_empty() || value == "text/css");
        return Ok(if is_css { Frame::Style } else { Frame::Skip });
    }

    let parent_eid = match doc.element(parent_id) {
        Some(eid) => eid,
        None => return Ok(Frame::Skip),
    };

    if !parent_eid.can_have_child(eid) {
        log::warn!("'{}' cannot be a child of {:?}. Skipped.", name, parent_eid);
        return Ok(Frame::Skip);
    }

    if doc.nodes.len() >= MAX_NODES {
        return Err(Error::ElementsLimitReached);
    }

    let attrs = parse_attributes(attributes);
    Ok(Frame::Node(doc.append(
        Some(parent_id),
        RawKind::Element(eid),
        attrs,
    )))
}

fn parse_attributes(attributes: Vec<(String, String)>) -> Vec<(AId, String)> {
    let mut list: Vec<(AId, String)> = Vec::with_capacity(attributes.len());
    for (name, value) in attributes {
        let (aid, is_xlink) = match name.as_str() {
            "xlink:href" => (AId::Href, true),
            name => match AId::from_str(name) {
                Some(aid) => (aid, false),
                None => continue,
            },
        };

        match list.iter_mut().find(|(n, _)| *n == aid) {
            // A plain `href` takes precedence over `xlink:href`.
            Some(prev) => {
                if !is_xlink {
                    prev.1 = value;
                }
            }
            None => list.push((aid, value)),
        }
    }

    list
}

fn append_text(parent: RawId, text: &str, doc: &mut RawDocument) -> Result<(), Error> {
    let text = if doc.is_space_preserved(parent) {
        text.chars()
            .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
            .collect()
    } else {
        collapse_spaces(text)
    };

    if text.is_empty() {
        return Ok(());
    }

    if doc.nodes.len() >= MAX_NODES {
        return Err(Error::ElementsLimitReached);
    }

    doc.append(Some(parent), RawKind::Text(text), Vec::new());
    Ok(())
}

/// Removes new lines, converts tabs into spaces and merges consecutive spaces.
fn collapse_spaces(text: &str) -> String {
    let mut s = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\r' => {}
            ' ' | '\t' => {
                if !s.ends_with(' ') {
                    s.push(' ');
                }
            }
            _ => s.push(c),
        }
    }

    s
}

/// Returns a CSS link from an `xml-stylesheet` instruction.
fn parse_style_sheet_pi(value: &str) -> Option<&str> {
    match pseudo_attribute(value, "type") {
        None | Some("text/css") => {}
        Some(_) => return None,
    }

    pseudo_attribute(value, "href")
}

fn pseudo_attribute<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = text;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }

        let end = after[1..].find(quote)? + 1;
        if key == name {
            return Some(&after[1..end]);
        }

        rest = &after[end + 1..];
    }

    None
}
