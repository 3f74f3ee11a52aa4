// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Links resolving.
//!
//! Runs once, after all nodes were converted.
//! Cycles are detected before anything is bound, so a rejected document
//! never has partially resolved links.

use std::collections::HashMap;
use std::rc::Rc;

use crate::parser::{finish_gradient, Error};
use crate::tree::{
    Document, GradientDef, NodeId, NodeKind, Paint, PaintFallback, PaintStyle, PrimitiveKind,
};

pub(crate) fn resolve(doc: &mut Document) -> Result<(), Error> {
    resolve_gradients(doc)?;
    check_cycles(doc)?;
    resolve_paints(doc);
    resolve_use_targets(doc);
    resolve_filter_support(doc);
    validate_links(doc);
    Ok(())
}

fn resolve_gradients(doc: &mut Document) -> Result<(), Error> {
    let defs = std::mem::take(&mut doc.gradient_defs);

    let mut by_id: HashMap<&str, &GradientDef> = HashMap::new();
    for def in &defs {
        by_id.entry(def.id.as_str()).or_insert(def);
    }

    for def in &defs {
        let mut resolved = def.clone();
        let mut visited = vec![def.id.as_str()];
        let mut link = def.href.as_deref();
        while let Some(href) = link {
            if visited.contains(&href) {
                log::warn!("Gradient '{}' has a recursive 'xlink:href'.", def.id);
                return Err(Error::RecursiveReference(href.to_string()));
            }

            let parent = match by_id.get(href) {
                Some(parent) => *parent,
                None => {
                    log::warn!("Gradient '{}' links to an unknown gradient '{}'.", def.id, href);
                    break;
                }
            };

            inherit_gradient(&mut resolved, parent);
            visited.push(href);
            link = parent.href.as_deref();
        }

        let gradient = finish_gradient(&resolved, &doc.options);
        doc.paint_styles
            .entry(def.id.clone())
            .or_insert_with(|| PaintStyle::Gradient(Rc::new(gradient)));
    }

    Ok(())
}

/// Copies unset attributes from a linked gradient.
///
/// Geometry is copied only between gradients of the same type.
fn inherit_gradient(def: &mut GradientDef, parent: &GradientDef) {
    macro_rules! inherit {
        ($($name:ident),+) => {
            $(
                if def.$name.is_none() {
                    def.$name = parent.$name.clone();
                }
            )+
        };
    }

    inherit!(units, transform, spread);

    if def.linear == parent.linear {
        inherit!(x1, y1, x2, y2, cx, cy, r, fx, fy);
    }

    if def.stops.is_empty() {
        def.stops = parent.stops.clone();
    }
}

/// Returns a pattern node referenced by a paint.
fn pattern_link(doc: &Document, paint: Option<&Paint>) -> Option<NodeId> {
    match paint? {
        Paint::Server { id, .. } => match doc.paint_styles.get(id) {
            Some(PaintStyle::Pattern(node)) => Some(*node),
            _ => None,
        },
        _ => None,
    }
}

/// Returns all outgoing edges of a node: children, a `use` target
/// and pattern paints.
fn edges(doc: &Document, id: NodeId) -> Vec<NodeId> {
    let node = doc.node(id);
    let mut list = node.children.clone();

    if let NodeKind::Use { ref href, .. } = node.kind {
        list.extend(doc.element_by_id(href));
    }

    list.extend(pattern_link(doc, node.style.fill.paint.as_ref()));
    list.extend(pattern_link(doc, node.style.stroke.paint.as_ref()));
    list
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Checks reference edges for cycles using an iterative DFS.
fn check_cycles(doc: &Document) -> Result<(), Error> {
    let mut marks = vec![Mark::New; doc.nodes_count()];
    // A node with its outgoing edges and the next edge to visit.
    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = Vec::new();

    let root = doc.root();
    marks[root.index()] = Mark::Active;
    stack.push((root, edges(doc, root), 0));

    while let Some((id, list, next)) = stack.last_mut() {
        let id = *id;
        match list.get(*next).copied() {
            Some(to) => {
                *next += 1;
                match marks[to.index()] {
                    Mark::Active => {
                        let link = &doc.node(to).attrs.id;
                        log::warn!("Element '{}' is referenced recursively.", link);
                        return Err(Error::RecursiveReference(link.clone()));
                    }
                    Mark::New => {
                        marks[to.index()] = Mark::Active;
                        let to_edges = edges(doc, to);
                        stack.push((to, to_edges, 0));
                    }
                    Mark::Done => {}
                }
            }
            None => {
                marks[id.index()] = Mark::Done;
                stack.pop();
            }
        }
    }

    Ok(())
}

fn resolve_paint(doc: &Document, paint: &mut Option<Paint>) {
    let (id, fallback) = match paint {
        Some(Paint::Server { id, fallback }) => (id, *fallback),
        _ => return,
    };

    let resolved = match doc.paint_styles.get(id.as_str()) {
        Some(style) => Paint::Style(style.clone()),
        None => {
            log::warn!("Paint server '{}' was not found.", id);
            match fallback {
                Some(PaintFallback::Color(c)) => Paint::Color(c),
                Some(PaintFallback::CurrentColor) => Paint::CurrentColor,
                Some(PaintFallback::None) | None => Paint::None,
            }
        }
    };

    *paint = Some(resolved);
}

fn resolve_paints(doc: &mut Document) {
    for idx in 0..doc.nodes_count() {
        let id = NodeId::new(idx);
        let mut fill = doc.node_mut(id).style.fill.paint.take();
        let mut stroke = doc.node_mut(id).style.stroke.paint.take();
        resolve_paint(doc, &mut fill);
        resolve_paint(doc, &mut stroke);

        let style = &mut doc.node_mut(id).style;
        style.fill.paint = fill;
        style.stroke.paint = stroke;
    }
}

fn resolve_use_targets(doc: &mut Document) {
    for idx in 0..doc.nodes_count() {
        let id = NodeId::new(idx);
        let href = match doc.node(id).kind {
            NodeKind::Use { ref href, .. } => href.clone(),
            _ => continue,
        };

        let link = match doc.element_by_id(&href) {
            Some(link) => link,
            None => {
                log::warn!("'use' links to an unknown element '{}'.", href);
                continue;
            }
        };

        if doc.ancestors(id).any(|n| n == link) {
            log::warn!("'use' links to its own ancestor '{}'.", href);
        }

        if let NodeKind::Use { ref mut target, .. } = doc.node_mut(id).kind {
            *target = Some(link);
        }
    }
}

fn resolve_filter_support(doc: &mut Document) {
    for idx in 0..doc.nodes_count() {
        let id = NodeId::new(idx);
        if !matches!(doc.node(id).kind, NodeKind::Filter { .. }) {
            continue;
        }

        let is_supported = doc.node(id).children.iter().all(|child| {
            match doc.node(*child).kind {
                NodeKind::FilterPrimitive { ref kind, .. } => *kind != PrimitiveKind::Unsupported,
                _ => false,
            }
        });

        if !is_supported {
            log::warn!("Filter '{}' has unsupported primitives.", doc.node(id).attrs.id);
        }

        if let NodeKind::Filter {
            ref mut supported, ..
        } = doc.node_mut(id).kind
        {
            *supported = is_supported;
        }
    }
}

/// Drops mask, filter and marker links to missing or mismatched elements.
fn validate_links(doc: &mut Document) {
    fn check(doc: &Document, link: &mut Option<String>, name: &str, f: fn(&NodeKind) -> bool) {
        let valid = match link.as_deref() {
            Some(id) => doc.element_by_id(id).map_or(false, |n| f(&doc.node(n).kind)),
            None => return,
        };

        if !valid {
            log::warn!("A {} '{}' was not found.", name, link.as_deref().unwrap_or_default());
            *link = None;
        }
    }

    for idx in 0..doc.nodes_count() {
        let id = NodeId::new(idx);
        let mut attrs = std::mem::take(&mut doc.node_mut(id).attrs);
        check(doc, &mut attrs.mask, "mask", |k| matches!(k, NodeKind::Mask { .. }));
        check(doc, &mut attrs.filter, "filter", |k| matches!(k, NodeKind::Filter { .. }));
        let is_marker = |k: &NodeKind| matches!(k, NodeKind::Marker { .. });
        check(doc, &mut attrs.marker_start, "marker", is_marker);
        check(doc, &mut attrs.marker_mid, "marker", is_marker);
        check(doc, &mut attrs.marker_end, "marker", is_marker);
        doc.node_mut(id).attrs = attrs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{GradientKind, Units};
    use crate::Options;

    fn parse(text: &str) -> Result<Document, Error> {
        Document::from_str(text, &Options::default())
    }

    macro_rules! test_recursive {
        ($name:ident, $text:expr) => {
            #[test]
            fn $name() {
                assert!(matches!(parse($text), Err(Error::RecursiveReference(_))));
            }
        };
    }

    test_recursive!(use_self,
        "<svg xmlns='http://www.w3.org/2000/svg'><g id='a'><use href='#a'/></g></svg>");

    test_recursive!(use_chain,
        "<svg xmlns='http://www.w3.org/2000/svg'>\
            <g id='a'><use href='#b'/></g><g id='b'><use href='#a'/></g>\
        </svg>");

    test_recursive!(pattern_self_fill,
        "<svg xmlns='http://www.w3.org/2000/svg'>\
            <pattern id='p' width='10' height='10'><rect width='5' height='5' fill='url(#p)'/></pattern>\
        </svg>");

    test_recursive!(pattern_via_use,
        "<svg xmlns='http://www.w3.org/2000/svg'>\
            <rect id='r' width='5' height='5' stroke='url(#p)'/>\
            <pattern id='p' width='10' height='10'><use href='#r'/></pattern>\
        </svg>");

    test_recursive!(gradient_loop,
        "<svg xmlns='http://www.w3.org/2000/svg'>\
            <linearGradient id='a' href='#b'/><linearGradient id='b' href='#a'/>\
        </svg>");

    #[test]
    fn use_fan_out_is_not_a_cycle() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect id='r' width='5' height='5'/>\
                <g id='a'><use href='#r'/><use href='#r'/></g>\
                <use href='#a'/><use href='#a'/>\
            </svg>",
        )
        .unwrap();

        let use_id = doc.descendants(doc.root()).into_iter().find(|n| {
            matches!(doc.node(*n).kind(), NodeKind::Use { ref href, .. } if href == "a")
        });
        match doc.node(use_id.unwrap()).kind() {
            NodeKind::Use { target, .. } => assert_eq!(*target, doc.element_by_id("a")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn gradient_href() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <linearGradient id='base' gradientUnits='userSpaceOnUse' x2='50'>\
                    <stop offset='0' stop-color='red'/><stop offset='1' stop-color='blue'/>\
                </linearGradient>\
                <linearGradient id='lg' href='#base' x1='5'/>\
                <radialGradient id='rg' href='#lg'/>\
            </svg>",
        )
        .unwrap();

        match doc.paint_style("lg") {
            Some(PaintStyle::Gradient(g)) => {
                assert_eq!(g.units, Units::UserSpaceOnUse);
                assert_eq!(g.stops.len(), 2);
                assert_eq!(g.kind, GradientKind::Linear { x1: 5.0, y1: 0.0, x2: 50.0, y2: 0.0 });
            }
            _ => panic!("not a gradient"),
        }

        match doc.paint_style("rg") {
            Some(PaintStyle::Gradient(g)) => {
                assert_eq!(g.stops.len(), 2);
                assert!(matches!(g.kind, GradientKind::Radial { .. }));
            }
            _ => panic!("not a gradient"),
        }
    }

    #[test]
    fn missing_paint_server() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect id='a' width='5' height='5' fill='url(#none) #00ff00' stroke='url(#none)'/>\
            </svg>",
        )
        .unwrap();

        let style = doc.node(doc.element_by_id("a").unwrap()).style();
        assert!(matches!(style.fill.paint, Some(Paint::Color(c)) if c.green == 255));
        assert!(matches!(style.stroke.paint, Some(Paint::None)));
    }

    #[test]
    fn unsupported_filter() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <filter id='f1'><feGaussianBlur stdDeviation='2'/></filter>\
                <filter id='f2'><feTurbulence/></filter>\
            </svg>",
        )
        .unwrap();

        let supported = |id: &str| match doc.node(doc.element_by_id(id).unwrap()).kind() {
            NodeKind::Filter { supported, .. } => *supported,
            _ => unreachable!(),
        };
        assert!(supported("f1"));
        assert!(!supported("f2"));
    }

    #[test]
    fn invalid_links_are_dropped() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect id='m' width='5' height='5'/>\
                <rect id='a' width='5' height='5' mask='url(#m)' filter='url(#x)'/>\
            </svg>",
        )
        .unwrap();

        let attrs = doc.node(doc.element_by_id("a").unwrap()).attributes();
        assert_eq!(attrs.mask, None);
        assert_eq!(attrs.filter, None);
    }
}
