use vgscene::tiny_skia::Size;
use vgscene::tree::{Color, NodeKind, Paint};
use vgscene::{Document, Error, Options};

fn parse(text: &str) -> Result<Document, Error> {
    Document::from_str(text, &Options::default())
}

#[test]
fn size_detection_1() {
    let doc = parse("<svg viewBox='0 0 10 20' xmlns='http://www.w3.org/2000/svg'/>").unwrap();
    assert_eq!(doc.size(), Size::from_wh(10.0, 20.0).unwrap());
}

#[test]
fn size_detection_2() {
    let doc = parse(
        "<svg width='30' height='40' viewBox='0 0 10 20' xmlns='http://www.w3.org/2000/svg'/>",
    )
    .unwrap();
    assert_eq!(doc.size(), Size::from_wh(30.0, 40.0).unwrap());
}

#[test]
fn size_detection_3() {
    let doc = parse(
        "<svg width='50%' height='100%' viewBox='0 0 10 20' xmlns='http://www.w3.org/2000/svg'/>",
    )
    .unwrap();
    assert_eq!(doc.size(), Size::from_wh(5.0, 20.0).unwrap());
}

#[test]
fn size_without_view_box() {
    let doc = parse("<svg xmlns='http://www.w3.org/2000/svg'/>").unwrap();
    assert_eq!(doc.size(), Options::default().default_size);
}

#[test]
fn not_an_svg() {
    assert!(matches!(parse("plain text"), Err(Error::UnsupportedFormat)));
    assert!(matches!(
        parse("<?xml version='1.0'?><html/>"),
        Err(Error::NotAnSvg)
    ));
}

#[test]
fn malformed_xml() {
    assert!(matches!(
        parse("<svg xmlns='http://www.w3.org/2000/svg'><rect></svg>"),
        Err(Error::ParsingFailed(_))
    ));
}

#[test]
fn svgz() {
    use std::io::Write;

    let text = "<svg xmlns='http://www.w3.org/2000/svg' width='7' height='8'/>";
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    let data = encoder.finish().unwrap();

    let doc = Document::from_data(&data, &Options::default()).unwrap();
    assert_eq!(doc.size(), Size::from_wh(7.0, 8.0).unwrap());

    assert!(matches!(
        Document::from_data(&[0x1f, 0x8b, 0, 1, 2], &Options::default()),
        Err(Error::MalformedGZip)
    ));
}

#[test]
fn recursive_use() {
    let res = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>
            <g id='g1'>
                <use xlink:href='#g2'/>
            </g>
            <g id='g2'>
                <use xlink:href='#g1'/>
            </g>
        </svg>",
    );
    assert!(matches!(res, Err(Error::RecursiveReference(_))));
}

#[test]
fn element_lookup() {
    let doc = parse(
        "<svg xmlns='http://www.w3.org/2000/svg'>
            <rect id='r1' width='10' height='10'/>
            <circle id='c1' r='5'/>
        </svg>",
    )
    .unwrap();

    assert!(doc.element_exists("r1"));
    assert!(!doc.element_exists("r2"));

    let id = doc.element_by_id("c1").unwrap();
    assert!(matches!(doc.node(id).kind(), NodeKind::Circle { r, .. } if *r == 5.0));
    assert_eq!(doc.node(id).parent(), doc.root_element());
}

#[test]
fn css_overrides_attributes() {
    let doc = parse(
        "<svg xmlns='http://www.w3.org/2000/svg'>
            <style>rect { fill: blue } #special { fill: green }</style>
            <rect id='r1' fill='red' width='10' height='10'/>
            <rect id='special' width='10' height='10'/>
        </svg>",
    )
    .unwrap();

    let fill = |id: &str| doc.node(doc.element_by_id(id).unwrap()).style().fill.paint.clone();
    assert!(matches!(fill("r1"), Some(Paint::Color(c)) if c == Color::new_rgb(0, 0, 255)));
    assert!(matches!(fill("special"), Some(Paint::Color(c)) if c == Color::new_rgb(0, 128, 0)));
}

#[test]
fn user_style_sheet() {
    let opt = Options {
        style_sheet: Some("rect { fill: blue }".to_string()),
        ..Options::default()
    };
    let doc = Document::from_str(
        "<svg xmlns='http://www.w3.org/2000/svg'>
            <rect id='r1' width='10' height='10'/>
        </svg>",
        &opt,
    )
    .unwrap();

    let id = doc.element_by_id("r1").unwrap();
    assert!(matches!(
        doc.node(id).style().fill.paint,
        Some(Paint::Color(c)) if c == Color::new_rgb(0, 0, 255)
    ));
}

#[test]
fn unknown_elements_are_skipped() {
    let doc = parse(
        "<svg xmlns='http://www.w3.org/2000/svg'>
            <unknown><rect id='r1' width='10' height='10'/></unknown>
            <rect id='r2' width='10' height='10'/>
        </svg>",
    )
    .unwrap();

    assert!(!doc.element_exists("r1"));
    assert!(doc.element_exists("r2"));
}
