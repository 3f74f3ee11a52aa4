// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use super::{AId, EId, RawDocument, RawId, RawKind};
use crate::tree::Units;

/// A lightweight handle to a raw tree element.
#[derive(Clone, Copy)]
pub(crate) struct SvgNode<'a> {
    pub doc: &'a RawDocument,
    pub id: RawId,
}

impl<'a> SvgNode<'a> {
    #[inline]
    pub fn new(doc: &'a RawDocument, id: RawId) -> Self {
        SvgNode { doc, id }
    }

    #[inline]
    pub fn tag_name(&self) -> Option<EId> {
        self.doc.element(self.id)
    }

    #[inline]
    pub fn text(&self) -> Option<&'a str> {
        match self.doc.nodes[self.id].kind {
            RawKind::Text(ref text) => Some(text),
            RawKind::Element(_) => None,
        }
    }

    #[inline]
    pub fn has_attribute(&self, aid: AId) -> bool {
        self.doc.has_attribute(self.id, aid)
    }

    /// Returns a parsed attribute value.
    ///
    /// Logs a warning when the value is malformed.
    pub fn attribute<T: FromValue<'a>>(&self, aid: AId) -> Option<T> {
        let value = self.doc.attribute(self.id, aid)?;
        match T::parse(aid, value) {
            Some(v) => Some(v),
            None => {
                log::warn!("Failed to parse {} value: '{}'.", aid, value);
                None
            }
        }
    }

    /// Same as `attribute`, but doesn't show a warning.
    pub fn try_attribute<T: FromValue<'a>>(&self, aid: AId) -> Option<T> {
        let value = self.doc.attribute(self.id, aid)?;
        T::parse(aid, value)
    }

    pub fn parent_element(&self) -> Option<Self> {
        self.doc
            .parent_element(self.id)
            .map(|id| SvgNode::new(self.doc, id))
    }

    pub fn children(&self) -> impl Iterator<Item = SvgNode<'a>> + 'a {
        let doc = self.doc;
        doc.nodes[self.id]
            .children
            .iter()
            .map(move |id| SvgNode::new(doc, *id))
    }

    pub fn element_children(&self) -> impl Iterator<Item = (EId, SvgNode<'a>)> + 'a {
        self.children()
            .filter_map(|n| n.tag_name().map(|eid| (eid, n)))
    }

    /// Returns an element ID or an empty string.
    pub fn element_id(&self) -> &'a str {
        self.doc.attribute(self.id, AId::Id).unwrap_or("")
    }
}

/// A trait for parsing attribute values.
pub(crate) trait FromValue<'a>: Sized {
    /// Parses an attribute value.
    ///
    /// When `None` is returned, the attribute value will be logged as a parsing failure.
    fn parse(aid: AId, value: &'a str) -> Option<Self>;
}

impl<'a> FromValue<'a> for &'a str {
    fn parse(_: AId, value: &'a str) -> Option<Self> {
        Some(value)
    }
}

impl FromValue<'_> for f32 {
    fn parse(_: AId, value: &str) -> Option<Self> {
        vgtypes::Number::from_str(value).ok().map(|v| v.0 as f32)
    }
}

impl FromValue<'_> for f64 {
    fn parse(_: AId, value: &str) -> Option<Self> {
        vgtypes::Number::from_str(value).ok().map(|v| v.0)
    }
}

impl FromValue<'_> for vgtypes::Length {
    fn parse(_: AId, value: &str) -> Option<Self> {
        vgtypes::Length::from_str(value).ok()
    }
}

impl FromValue<'_> for vgtypes::Color {
    fn parse(_: AId, value: &str) -> Option<Self> {
        vgtypes::Color::from_str(value).ok()
    }
}

impl FromValue<'_> for vgtypes::ViewBox {
    fn parse(_: AId, value: &str) -> Option<Self> {
        vgtypes::ViewBox::from_str(value).ok()
    }
}

impl FromValue<'_> for vgtypes::AspectRatio {
    fn parse(_: AId, value: &str) -> Option<Self> {
        vgtypes::AspectRatio::from_str(value).ok()
    }
}

impl<'a> FromValue<'a> for vgtypes::Paint<'a> {
    fn parse(_: AId, value: &'a str) -> Option<Self> {
        vgtypes::Paint::from_str(value).ok()
    }
}

/// A malformed list keeps the transforms parsed before the error.
impl FromValue<'_> for tiny_skia::Transform {
    fn parse(aid: AId, value: &str) -> Option<Self> {
        let ts = match vgtypes::Transform::from_str(value) {
            Ok(ts) => ts,
            Err(_) => {
                log::warn!("Failed to parse {} value: '{}'.", aid, value);
                vgtypes::Transform::parse_lossy(value)
            }
        };

        Some(convert_transform(ts))
    }
}

impl FromValue<'_> for Units {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "userSpaceOnUse" => Some(Units::UserSpaceOnUse),
            "objectBoundingBox" => Some(Units::ObjectBoundingBox),
            _ => None,
        }
    }
}

impl FromValue<'_> for Vec<f32> {
    fn parse(_: AId, value: &str) -> Option<Self> {
        let mut list = Vec::new();
        for n in vgtypes::NumberListParser::from(value) {
            list.push(n.ok()? as f32);
        }

        Some(list)
    }
}

pub(crate) fn convert_transform(ts: vgtypes::Transform) -> tiny_skia::Transform {
    let ts = tiny_skia::Transform::from_row(
        ts.a as f32,
        ts.b as f32,
        ts.c as f32,
        ts.d as f32,
        ts.e as f32,
        ts.f as f32,
    );

    if ts.is_finite() {
        ts
    } else {
        tiny_skia::Transform::default()
    }
}
