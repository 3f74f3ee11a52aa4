// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A pull interface over an XML tokenizer.
//!
//! The document builder only needs a flat stream of events,
//! so any XML reader can be plugged in by implementing [`XmlEventSource`].
//! A [`roxmltree`]-backed source is provided.

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NAMESPACE_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// An XML event.
///
/// Element and attribute names are qualified names as written in the source,
/// like `xlink:href`. Namespaces are not resolved.
#[derive(Clone, PartialEq, Debug)]
pub enum XmlEvent {
    /// An element start tag.
    StartElement {
        /// Element's qualified name.
        name: String,
        /// Element's attributes in the source order.
        attributes: Vec<(String, String)>,
    },
    /// An element end tag.
    EndElement,
    /// Character data with entities already expanded.
    Text(String),
    /// A processing instruction, like `<?xml-stylesheet ...?>`.
    ProcessingInstruction {
        /// Instruction's target, like `xml-stylesheet`.
        target: String,
        /// Instruction's content.
        value: Option<String>,
    },
}

/// A source of XML events.
///
/// The source's position is the resumption point: the builder pulls
/// events until the root element is closed or the source is exhausted.
pub trait XmlEventSource {
    /// Returns the next event or `None` at the end of the input.
    fn next_event(&mut self) -> Option<XmlEvent>;
}

impl<I: Iterator<Item = XmlEvent>> XmlEventSource for I {
    #[inline]
    fn next_event(&mut self) -> Option<XmlEvent> {
        self.next()
    }
}

/// An [`XmlEventSource`] backed by [`roxmltree`].
///
/// The whole document is parsed and validated upfront.
#[derive(Debug)]
pub struct RoxmlSource {
    events: std::vec::IntoIter<XmlEvent>,
}

impl RoxmlSource {
    /// Parses an XML text.
    ///
    /// DTD entities are allowed.
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let opt = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };

        let doc = roxmltree::Document::parse_with_options(text, opt)?;

        let mut events = Vec::new();
        // Nodes left to visit. `None` closes the innermost open element.
        let mut stack: Vec<Option<roxmltree::Node>> = Vec::new();
        push_children(&mut stack, doc.root());

        while let Some(item) = stack.pop() {
            let node = match item {
                Some(node) => node,
                None => {
                    events.push(XmlEvent::EndElement);
                    continue;
                }
            };

            match node.node_type() {
                roxmltree::NodeType::Element => {
                    let attributes = node
                        .attributes()
                        .map(|attr| (attribute_name(node, &attr), attr.value().to_string()))
                        .collect();

                    events.push(XmlEvent::StartElement {
                        name: element_name(text, node),
                        attributes,
                    });

                    stack.push(None);
                    push_children(&mut stack, node);
                }
                roxmltree::NodeType::Text => {
                    if let Some(text) = node.text() {
                        events.push(XmlEvent::Text(text.to_string()));
                    }
                }
                roxmltree::NodeType::PI => {
                    if let Some(pi) = node.pi() {
                        events.push(XmlEvent::ProcessingInstruction {
                            target: pi.target.to_string(),
                            value: pi.value.map(|v| v.to_string()),
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(RoxmlSource {
            events: events.into_iter(),
        })
    }
}

impl Iterator for RoxmlSource {
    type Item = XmlEvent;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.events.next()
    }
}

/// Schedules node's children, so the first one is popped first.
fn push_children<'a, 'input>(
    stack: &mut Vec<Option<roxmltree::Node<'a, 'input>>>,
    node: roxmltree::Node<'a, 'input>,
) {
    let children: Vec<_> = node.children().collect();
    stack.extend(children.into_iter().rev().map(Some));
}

/// Returns a tag name as it was written in the source.
fn element_name(text: &str, node: roxmltree::Node) -> String {
    let local = node.tag_name().name();

    // Elements coming from entities point into the DTD, so check the result.
    let range = node.range();
    if let Some(tail) = text.get(range.start + 1..range.end) {
        let name = tail
            .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .next()
            .unwrap_or_default();
        if name.ends_with(local) && !name.is_empty() {
            return name.to_string();
        }
    }

    let prefix = node
        .tag_name()
        .namespace()
        .and_then(|ns| node.lookup_prefix(ns));
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

fn attribute_name(node: roxmltree::Node, attr: &roxmltree::Attribute) -> String {
    match attr.namespace() {
        None => attr.name().to_string(),
        Some(XLINK_NS) => format!("xlink:{}", attr.name()),
        Some(XML_NAMESPACE_NS) => format!("xml:{}", attr.name()),
        Some(ns) => match node.lookup_prefix(ns) {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, attr.name()),
            _ => attr.name().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(text: &str) -> Vec<XmlEvent> {
        RoxmlSource::parse(text).unwrap().collect()
    }

    #[test]
    fn flat_events() {
        let list = events("<svg xmlns='http://www.w3.org/2000/svg'><rect width='5'/>text</svg>");
        assert_eq!(
            list,
            vec![
                XmlEvent::StartElement {
                    name: "svg".to_string(),
                    attributes: vec![],
                },
                XmlEvent::StartElement {
                    name: "rect".to_string(),
                    attributes: vec![("width".to_string(), "5".to_string())],
                },
                XmlEvent::EndElement,
                XmlEvent::Text("text".to_string()),
                XmlEvent::EndElement,
            ]
        );
    }

    #[test]
    fn prefixed_names_are_kept() {
        let list = events(
            "<svg:svg xmlns:svg='http://www.w3.org/2000/svg' \
             xmlns:xlink='http://www.w3.org/1999/xlink'><svg:use xlink:href='#a'/></svg:svg>",
        );
        assert_eq!(
            list[1],
            XmlEvent::StartElement {
                name: "svg:use".to_string(),
                attributes: vec![("xlink:href".to_string(), "#a".to_string())],
            }
        );
    }

    #[test]
    fn nested_elements_are_closed_in_order() {
        let list = events("<svg><g><g/></g><rect/></svg>");
        let names: Vec<&str> = list
            .iter()
            .map(|e| match e {
                XmlEvent::StartElement { name, .. } => name.as_str(),
                XmlEvent::EndElement => "/",
                _ => "?",
            })
            .collect();
        assert_eq!(names, ["svg", "g", "g", "/", "/", "rect", "/", "/"]);
    }

    #[test]
    fn processing_instruction() {
        let list = events("<?xml-stylesheet type='text/css' href='a.css'?><svg/>");
        assert_eq!(
            list[0],
            XmlEvent::ProcessingInstruction {
                target: "xml-stylesheet".to_string(),
                value: Some("type='text/css' href='a.css'".to_string()),
            }
        );
    }
}
