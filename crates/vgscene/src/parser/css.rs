// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use simplecss::Declaration;

use super::{AId, Options, RawDocument, RawId};

/// Resolves style sheets and `style` attributes into plain attributes.
///
/// Precedence, lowest first: presentation attributes, CSS rules in sheet order,
/// the `style` attribute. A value of `inherit` removes the attribute,
/// so it will be inherited during rendering.
pub(crate) fn cascade(doc: &mut RawDocument, opt: &Options) {
    let mut external = Vec::new();
    for link in &doc.style_sheet_links {
        let path = opt.resolve_path(std::path::Path::new(link));
        match std::fs::read_to_string(&path) {
            Ok(text) => external.push(text),
            Err(_) => log::warn!("Failed to load a style sheet from '{}'.", path.display()),
        }
    }

    let style_text = std::mem::take(&mut doc.style_text);

    let mut sheet = simplecss::StyleSheet::new();
    for text in &external {
        sheet.parse_more(text);
    }
    sheet.parse_more(&style_text);
    if let Some(ref text) = opt.style_sheet {
        sheet.parse_more(text);
    }

    for id in 0..doc.nodes.len() {
        if doc.element(id).is_none() {
            continue;
        }

        let mut declarations = Vec::new();
        for rule in &sheet.rules {
            if rule.selector.matches(&XmlNode { doc: &*doc, id }) {
                for declaration in &rule.declarations {
                    push_declaration(declaration, &mut declarations);
                }
            }
        }

        if let Some(value) = doc.attribute(id, AId::Style) {
            for declaration in simplecss::DeclarationTokenizer::from(value) {
                push_declaration(&declaration, &mut declarations);
            }
        }

        let attrs = &mut doc.nodes[id].attrs;
        for (aid, value) in declarations {
            match attrs.iter_mut().find(|(name, _)| *name == aid) {
                Some(attr) => attr.1 = value,
                None => attrs.push((aid, value)),
            }
        }

        attrs.retain(|(aid, value)| {
            *aid != AId::Style && !(aid.is_presentation() && value.trim() == "inherit")
        });
    }
}

fn push_declaration(declaration: &Declaration, list: &mut Vec<(AId, String)>) {
    let value = declaration.value.to_string();
    if declaration.name == "marker" {
        list.push((AId::MarkerStart, value.clone()));
        list.push((AId::MarkerMid, value.clone()));
        list.push((AId::MarkerEnd, value));
    } else if let Some(aid) = AId::from_str(declaration.name) {
        // Parse only the presentation attributes.
        if aid.is_presentation() {
            list.push((aid, value));
        }
    }
}

struct XmlNode<'a> {
    doc: &'a RawDocument,
    id: RawId,
}

impl simplecss::Element for XmlNode<'_> {
    fn parent_element(&self) -> Option<Self> {
        self.doc.parent_element(self.id).map(|id| XmlNode { doc: self.doc, id })
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.doc
            .prev_sibling_element(self.id)
            .map(|id| XmlNode { doc: self.doc, id })
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        match (self.doc.element(self.id), super::EId::from_str(local_name)) {
            (Some(a), Some(b)) => a == b && b != super::EId::FeUnsupported,
            _ => false,
        }
    }

    fn attribute_matches(&self, local_name: &str, operator: simplecss::AttributeOperator) -> bool {
        let aid = match AId::from_str(local_name) {
            Some(aid) => aid,
            None => return false,
        };

        match self.doc.attribute(self.id, aid) {
            Some(value) => operator.matches(value),
            None => false,
        }
    }

    fn pseudo_class_matches(&self, class: simplecss::PseudoClass) -> bool {
        match class {
            simplecss::PseudoClass::FirstChild => self.prev_sibling_element().is_none(),
            // A static document has no dynamic states.
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlEvent;

    fn parse(text: &str, opt: &Options) -> RawDocument {
        let mut source = crate::xml::RoxmlSource::parse(text).unwrap();
        let mut doc = super::super::builder::build(&mut source).unwrap();
        cascade(&mut doc, opt);
        doc
    }

    #[test]
    fn precedence() {
        let doc = parse(
            "<svg>
                <style>rect { fill: green; stroke: blue } #r { stroke: yellow }</style>
                <rect id='r' fill='red' style='stroke-width: 3; stroke: black'/>
            </svg>",
            &Options::default(),
        );

        assert_eq!(doc.attribute(1, AId::Fill), Some("green"));
        assert_eq!(doc.attribute(1, AId::Stroke), Some("black"));
        assert_eq!(doc.attribute(1, AId::StrokeWidth), Some("3"));
        assert_eq!(doc.attribute(1, AId::Style), None);
    }

    #[test]
    fn class_selector() {
        let doc = parse(
            "<svg><style>.a { opacity: 0.5 }</style><g class='b a'/><g class='b'/></svg>",
            &Options::default(),
        );

        assert_eq!(doc.attribute(1, AId::Opacity), Some("0.5"));
        assert_eq!(doc.attribute(2, AId::Opacity), None);
    }

    #[test]
    fn inherit_removes_attribute() {
        let doc = parse(
            "<svg><rect fill='red' style='fill:inherit'/></svg>",
            &Options::default(),
        );

        assert_eq!(doc.attribute(1, AId::Fill), None);
    }

    #[test]
    fn marker_shorthand_and_non_presentation() {
        let doc = parse(
            "<svg><path style='marker: url(#m); width: 10'/></svg>",
            &Options::default(),
        );

        assert_eq!(doc.attribute(1, AId::MarkerStart), Some("url(#m)"));
        assert_eq!(doc.attribute(1, AId::MarkerMid), Some("url(#m)"));
        assert_eq!(doc.attribute(1, AId::MarkerEnd), Some("url(#m)"));
        assert_eq!(doc.attribute(1, AId::Width), None);
    }

    #[test]
    fn user_style_sheet_wins() {
        let opt = Options {
            style_sheet: Some("rect { fill: blue }".to_string()),
            ..Options::default()
        };
        let doc = parse("<svg><style>rect { fill: green }</style><rect/></svg>", &opt);

        assert_eq!(doc.attribute(1, AId::Fill), Some("blue"));
    }

    #[test]
    fn descendant_selector() {
        let events = vec![
            XmlEvent::StartElement {
                name: "svg".to_string(),
                attributes: vec![],
            },
            XmlEvent::StartElement {
                name: "g".to_string(),
                attributes: vec![("id".to_string(), "g1".to_string())],
            },
            XmlEvent::StartElement {
                name: "rect".to_string(),
                attributes: vec![],
            },
            XmlEvent::EndElement,
            XmlEvent::EndElement,
            XmlEvent::StartElement {
                name: "rect".to_string(),
                attributes: vec![],
            },
            XmlEvent::EndElement,
            XmlEvent::EndElement,
        ];

        let mut doc = super::super::builder::build(&mut events.into_iter()).unwrap();
        let opt = Options {
            style_sheet: Some("#g1 rect { fill: red }".to_string()),
            ..Options::default()
        };
        cascade(&mut doc, &opt);

        assert_eq!(doc.attribute(2, AId::Fill), Some("red"));
        assert_eq!(doc.attribute(3, AId::Fill), None);
    }
}
