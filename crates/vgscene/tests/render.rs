use once_cell::sync::Lazy;
use vgscene::tiny_skia;

static OPTIONS: Lazy<vgscene::Options> = Lazy::new(|| vgscene::Options {
    languages: vec!["en".to_string(), "de".to_string()],
    ..vgscene::Options::default()
});

fn load(body: &str) -> vgscene::Document {
    let text = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' \
              xmlns:xlink='http://www.w3.org/1999/xlink' \
              width='100' height='100'>{}</svg>",
        body
    );
    vgscene::Document::from_str(&text, &OPTIONS).unwrap()
}

fn render_doc(doc: &vgscene::Document, elapsed: f64) -> tiny_skia::Pixmap {
    let mut canvas = vgscene::PixmapCanvas::new(100, 100).unwrap();
    doc.render(&mut canvas, None, elapsed);
    canvas.into_pixmap()
}

fn render(body: &str) -> tiny_skia::Pixmap {
    render_doc(&load(body), 0.0)
}

fn rgba(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
    let c = pixmap.pixel(x, y).unwrap().demultiply();
    (c.red(), c.green(), c.blue(), c.alpha())
}

const RED: (u8, u8, u8, u8) = (255, 0, 0, 255);
const BLUE: (u8, u8, u8, u8) = (0, 0, 255, 255);
const NONE: (u8, u8, u8, u8) = (0, 0, 0, 0);

#[test]
fn solid_rect() {
    let pixmap = render("<rect width='100' height='100' fill='red'/>");
    for (x, y) in [(0, 0), (50, 50), (99, 99), (0, 99)] {
        assert_eq!(rgba(&pixmap, x, y), RED);
    }
}

#[test]
fn opacity_over_white() {
    let doc = load("<rect width='100' height='100' fill='red' opacity='0.5'/>");
    let mut pixmap = tiny_skia::Pixmap::new(100, 100).unwrap();
    pixmap.fill(tiny_skia::Color::WHITE);
    let mut canvas = vgscene::PixmapCanvas::from_pixmap(pixmap);
    doc.render(&mut canvas, None, 0.0);

    let (r, g, b, a) = rgba(canvas.pixmap(), 50, 50);
    assert_eq!((r, a), (255, 255));
    assert!((126..=129).contains(&g), "{}", g);
    assert!((126..=129).contains(&b), "{}", b);
}

#[test]
fn view_box_scaling() {
    let text = "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100' \
                viewBox='0 0 10 10'><rect x='5' width='5' height='10' fill='blue'/></svg>";
    let doc = vgscene::Document::from_str(text, &OPTIONS).unwrap();
    let pixmap = render_doc(&doc, 0.0);
    assert_eq!(rgba(&pixmap, 25, 50), NONE);
    assert_eq!(rgba(&pixmap, 75, 50), BLUE);
}

#[test]
fn render_into_target() {
    let doc = load("<rect width='100' height='100' fill='red'/>");
    let mut canvas = vgscene::PixmapCanvas::new(100, 100).unwrap();
    let target = tiny_skia::Rect::from_xywh(50.0, 0.0, 50.0, 50.0);
    doc.render(&mut canvas, target, 0.0);

    let pixmap = canvas.into_pixmap();
    assert_eq!(rgba(&pixmap, 75, 25), RED);
    assert_eq!(rgba(&pixmap, 25, 25), NONE);
    assert_eq!(rgba(&pixmap, 75, 75), NONE);
}

#[test]
fn white_mask_keeps_content() {
    let pixmap = render(
        "<mask id='m' maskUnits='userSpaceOnUse' x='0' y='0' width='100' height='100'>\
            <rect width='100' height='100' fill='white'/>\
        </mask>\
        <rect width='100' height='100' fill='red' mask='url(#m)'/>",
    );
    assert_eq!(rgba(&pixmap, 50, 50), RED);
}

#[test]
fn black_mask_clears_content() {
    let pixmap = render(
        "<mask id='m' maskUnits='userSpaceOnUse' x='0' y='0' width='100' height='100'>\
            <rect width='100' height='100' fill='black'/>\
        </mask>\
        <rect width='100' height='100' fill='red' mask='url(#m)'/>",
    );
    assert_eq!(rgba(&pixmap, 50, 50), NONE);
}

#[test]
fn mask_region_clips() {
    let pixmap = render(
        "<mask id='m' maskUnits='userSpaceOnUse' x='0' y='0' width='50' height='100'>\
            <rect width='100' height='100' fill='white'/>\
        </mask>\
        <rect width='100' height='100' fill='red' mask='url(#m)'/>",
    );
    assert_eq!(rgba(&pixmap, 25, 50), RED);
    assert_eq!(rgba(&pixmap, 75, 50), NONE);
}

#[test]
fn flood_filter() {
    let pixmap = render(
        "<filter id='f'><feFlood flood-color='blue'/></filter>\
        <rect x='20' y='20' width='60' height='60' fill='red' filter='url(#f)'/>",
    );
    // The default filter region is 10% larger than the element.
    assert_eq!(rgba(&pixmap, 16, 16), BLUE);
    assert_eq!(rgba(&pixmap, 50, 50), BLUE);
    assert_eq!(rgba(&pixmap, 5, 5), NONE);
}

#[test]
fn oversized_filter_is_ignored() {
    let opt = vgscene::Options {
        max_layer_size: 10,
        ..vgscene::Options::default()
    };
    let text = "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
                <filter id='f'><feFlood flood-color='blue'/></filter>\
                <rect width='100' height='100' fill='red' filter='url(#f)'/></svg>";
    let doc = vgscene::Document::from_str(text, &opt).unwrap();
    let pixmap = render_doc(&doc, 0.0);
    assert_eq!(rgba(&pixmap, 50, 50), RED);
}

#[test]
fn linear_gradient() {
    let pixmap = render(
        "<linearGradient id='lg'>\
            <stop offset='0' stop-color='red'/>\
            <stop offset='1' stop-color='blue'/>\
        </linearGradient>\
        <rect width='100' height='100' fill='url(#lg)'/>",
    );
    let (r1, _, b1, _) = rgba(&pixmap, 2, 50);
    let (r2, _, b2, _) = rgba(&pixmap, 97, 50);
    assert!(r1 > 240 && b1 < 15);
    assert!(r2 < 15 && b2 > 240);
}

#[test]
fn paint_server_fallback() {
    let pixmap = render("<rect width='100' height='100' fill='url(#missing) blue'/>");
    assert_eq!(rgba(&pixmap, 50, 50), BLUE);
}

#[test]
fn use_element() {
    let pixmap = render(
        "<defs><rect id='r' width='50' height='50' fill='blue'/></defs>\
        <use xlink:href='#r' x='50' y='50'/>",
    );
    assert_eq!(rgba(&pixmap, 75, 75), BLUE);
    assert_eq!(rgba(&pixmap, 25, 25), NONE);
}

#[test]
fn use_fan_out_terminates() {
    let mut body = String::from("<defs><g id='g0'><rect width='1' height='1'/></g>");
    for i in 1..24 {
        body.push_str(&format!(
            "<g id='g{i}'><use xlink:href='#g{p}'/><use xlink:href='#g{p}'/></g>",
            i = i,
            p = i - 1
        ));
    }
    body.push_str("</defs><use xlink:href='#g23'/>");

    let pixmap = render(&body);
    assert_eq!(rgba(&pixmap, 50, 50), NONE);
}

#[test]
fn switch_picks_language() {
    let pixmap = render(
        "<switch>\
            <rect width='100' height='100' fill='blue' systemLanguage='fr'/>\
            <rect width='100' height='100' fill='red' systemLanguage='de'/>\
            <rect width='100' height='100' fill='blue'/>\
        </switch>",
    );
    assert_eq!(rgba(&pixmap, 50, 50), RED);
}

#[test]
fn hidden_elements() {
    let pixmap = render(
        "<rect width='100' height='100' fill='red' visibility='hidden'/>\
        <g display='none'><rect width='100' height='100' fill='red'/></g>",
    );
    assert_eq!(rgba(&pixmap, 50, 50), NONE);
}

#[test]
fn set_animation() {
    let doc = load(
        "<rect width='100' height='100' fill='red'>\
            <set attributeName='fill' to='blue' begin='2s'/>\
        </rect>",
    );
    assert_eq!(rgba(&render_doc(&doc, 0.0), 50, 50), RED);
    assert_eq!(rgba(&render_doc(&doc, 3.0), 50, 50), BLUE);
}

#[test]
fn element_bounds() {
    let doc = load(
        "<g transform='translate(10 20)'>\
            <rect id='r' x='5' y='5' width='10' height='10' transform='scale(2)'/>\
        </g>",
    );

    assert_eq!(
        doc.bounds_on_element("r"),
        tiny_skia::Rect::from_xywh(10.0, 10.0, 20.0, 20.0)
    );
    assert_eq!(
        doc.transform_for_element("r"),
        Some(tiny_skia::Transform::from_translate(10.0, 20.0))
    );
    assert_eq!(doc.bounds_on_element("missing"), None);
}

#[test]
fn render_single_element() {
    let doc = load(
        "<rect width='100' height='100' fill='red'/>\
        <rect id='r' x='40' y='40' width='20' height='20' fill='blue'/>",
    );

    let mut canvas = vgscene::PixmapCanvas::new(10, 10).unwrap();
    assert!(doc.render_element("r", &mut canvas, None, 0.0));
    assert_eq!(rgba(canvas.pixmap(), 0, 0), BLUE);
    assert_eq!(rgba(canvas.pixmap(), 9, 9), BLUE);

    assert!(!doc.render_element("missing", &mut canvas, None, 0.0));
}

fn assert_near(actual: (u8, u8, u8, u8), expected: (u8, u8, u8, u8)) {
    let near = |a: u8, b: u8| (a as i32 - b as i32).abs() <= 2;
    assert!(
        near(actual.0, expected.0)
            && near(actual.1, expected.1)
            && near(actual.2, expected.2)
            && near(actual.3, expected.3),
        "{:?} != {:?}",
        actual,
        expected
    );
}

#[test]
fn fill_and_stroke_opacity_are_separate() {
    let pixmap = render(
        "<rect x='20' y='20' width='60' height='60' \
               fill='red' fill-opacity='0.5' \
               stroke='blue' stroke-opacity='0.5' stroke-width='20'/>",
    );
    // Fill only.
    assert_near(rgba(&pixmap, 50, 50), (255, 0, 0, 128));
    // Stroke only.
    assert_near(rgba(&pixmap, 15, 50), (0, 0, 255, 128));
    // The stroke is blended over the fill, not drawn as a single layer.
    assert_near(rgba(&pixmap, 25, 50), (85, 0, 170, 191));
}

#[test]
fn markers_on_all_vertices() {
    let pixmap = render(
        "<defs>\
            <marker id='m' markerWidth='10' markerHeight='10' refX='5' refY='5' orient='auto'>\
                <rect x='5' width='5' height='10' fill='blue'/>\
            </marker>\
        </defs>\
        <path d='M 10 50 L 50 50 L 90 50' fill='none' \
              marker-start='url(#m)' marker-mid='url(#m)' marker-end='url(#m)'/>",
    );
    for x in [12, 52, 92] {
        assert_eq!(rgba(&pixmap, x, 50), BLUE);
        assert_eq!(rgba(&pixmap, x - 5, 50), NONE);
    }
}

#[test]
fn marker_start_reversed() {
    let pixmap = render(
        "<defs>\
            <marker id='m' markerWidth='10' markerHeight='10' refX='5' refY='5' \
                    orient='auto-start-reverse'>\
                <rect x='5' width='5' height='10' fill='blue'/>\
            </marker>\
        </defs>\
        <path d='M 10 50 L 50 50 L 90 50' fill='none' \
              marker-start='url(#m)' marker-mid='url(#m)' marker-end='url(#m)'/>",
    );
    // The start marker points backwards.
    assert_eq!(rgba(&pixmap, 7, 50), BLUE);
    assert_eq!(rgba(&pixmap, 12, 50), NONE);

    assert_eq!(rgba(&pixmap, 52, 50), BLUE);
    assert_eq!(rgba(&pixmap, 92, 50), BLUE);
}

#[test]
fn nested_mask_replaces_outer() {
    let pixmap = render(
        "<mask id='inner' maskUnits='userSpaceOnUse' x='0' y='0' width='100' height='100'>\
            <rect width='100' height='100' fill='black'/>\
        </mask>\
        <mask id='outer' maskUnits='userSpaceOnUse' x='0' y='0' width='100' height='100' \
              mask='url(#inner)'>\
            <rect width='100' height='100' fill='white'/>\
        </mask>\
        <rect width='100' height='100' fill='red' mask='url(#outer)'/>",
    );
    assert_eq!(rgba(&pixmap, 50, 50), NONE);
}

#[test]
fn filter_with_mask() {
    let pixmap = render(
        "<filter id='f'><feFlood flood-color='blue'/></filter>\
        <mask id='m' maskUnits='userSpaceOnUse' x='0' y='0' width='50' height='100'>\
            <rect width='100' height='100' fill='white'/>\
        </mask>\
        <rect width='100' height='100' fill='red' filter='url(#f)' mask='url(#m)'/>",
    );
    assert_eq!(rgba(&pixmap, 25, 50), BLUE);
    assert_eq!(rgba(&pixmap, 75, 50), NONE);
}

/// Runs `f` on a thread with a stack large enough for the maximum nesting
/// in a debug build.
fn with_large_stack<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

fn nested_groups(depth: usize, content: &str) -> String {
    format!("{}{}{}", "<g>".repeat(depth), content, "</g>".repeat(depth))
}

#[test]
fn deep_groups_are_cut_off() {
    with_large_stack(|| {
        let rect = "<rect width='100' height='100' fill='blue'/>";
        assert_eq!(rgba(&render(&nested_groups(1000, rect)), 50, 50), BLUE);
        assert_eq!(rgba(&render(&nested_groups(1500, rect)), 50, 50), NONE);
    });
}

#[test]
fn chained_deep_use_terminates() {
    with_large_stack(|| {
        let count = 300;
        let mut body = String::from("<defs>");
        for i in 0..count {
            let content = if i + 1 < count {
                format!("<use xlink:href='#c{}'/>", i + 1)
            } else {
                "<rect width='100' height='100' fill='blue'/>".to_string()
            };
            body.push_str(&format!("<g id='c{}'>{}</g>", i, nested_groups(500, &content)));
        }
        body.push_str("</defs><use xlink:href='#c0'/>");

        let doc = load(&body);
        assert_eq!(rgba(&render_doc(&doc, 0.0), 50, 50), NONE);
        assert_eq!(doc.bounds_on_element("c0"), None);
    });
}

#[test]
fn circle_and_polygon() {
    let pixmap = render(
        "<circle cx='25' cy='25' r='20' fill='blue'/>\
        <polygon points='50,50 100,50 100,100 50,100' fill='red'/>",
    );
    assert_eq!(rgba(&pixmap, 25, 25), BLUE);
    assert_eq!(rgba(&pixmap, 3, 3), NONE);
    assert_eq!(rgba(&pixmap, 75, 75), RED);
}
