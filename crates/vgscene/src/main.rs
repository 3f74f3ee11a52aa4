// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use vgscene::tiny_skia::{self, IntSize};
use vgscene::vgtypes::{Color, LengthUnit};

const HELP: &str = "\
vgscene renders SVG Tiny 1.2 documents to PNG.

USAGE:
  vgscene [OPTIONS] <in-svg> <out-png>
  vgscene [OPTIONS] - <out-png>          # read the document from stdin
  vgscene --query-all <in-svg>

  vgscene -w 512 icon.svg icon.png
  vgscene --time 1.5 animated.svg frame.png

OPTIONS:
  -w, --width PX                Scales the image to a width
  -h, --height PX               Scales the image to a height
  -z, --zoom FACTOR             Scales the image by a factor
      --background COLOR        Fills the image before rendering, like 'white' or '#fff8'
      --time SECONDS            Animation time of the frame [default: 0]
      --languages LIST          Comma-separated user languages for 'systemLanguage'
                                [default: en]
      --default-unit UNIT       Unit of unitless root sizes: px, pt, pc, mm, cm or in
                                [default: px]
      --resources-dir DIR       Base directory of relative image links
                                [default: the input file directory]
      --keep-aspect-ratio       Keeps the aspect ratio of an implicit view box
                                when scaling to a size
      --export-id ID            Renders a single element
      --query-all               Prints the ids and bounds of all elements
      --perf                    Prints timings
      --quiet                   Disables warnings
  -V, --version                 Prints the version
      --help                    Prints this help
";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}.", e);
        std::process::exit(1);
    }
}

#[derive(Debug)]
enum Input {
    Stdin,
    File(PathBuf),
}

/// How the output image size is derived from the document size.
#[derive(Clone, Copy, Debug)]
enum Fit {
    Original,
    Width(u32),
    Height(u32),
    Size(u32, u32),
    Zoom(f32),
}

impl Fit {
    fn apply(self, size: IntSize) -> Option<IntSize> {
        match self {
            Fit::Original => Some(size),
            Fit::Width(w) => size.scale_to_width(w),
            Fit::Height(h) => size.scale_to_height(h),
            Fit::Size(w, h) => IntSize::from_wh(w, h).map(|target| size.scale_to(target)),
            Fit::Zoom(k) => size.scale_by(k),
        }
    }
}

#[derive(Debug)]
struct Cli {
    input: Input,
    output: Option<PathBuf>,
    fit: Fit,
    background: Option<Color>,
    time: f64,
    export_id: Option<String>,
    query_all: bool,
    perf: bool,
    quiet: bool,
    opt: vgscene::Options,
}

fn parse_cli() -> Result<Cli, String> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains("--help") {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if args.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    let e = |e: pico_args::Error| e.to_string();
    let width = args.opt_value_from_fn(["-w", "--width"], positive::<u32>).map_err(e)?;
    let height = args.opt_value_from_fn(["-h", "--height"], positive::<u32>).map_err(e)?;
    let zoom = args.opt_value_from_fn(["-z", "--zoom"], positive::<f32>).map_err(e)?;
    let background: Option<Color> = args.opt_value_from_str("--background").map_err(e)?;
    let time = args.opt_value_from_fn("--time", parse_time).map_err(e)?;
    let languages = args.opt_value_from_fn("--languages", parse_languages).map_err(e)?;
    let default_unit = args.opt_value_from_fn("--default-unit", parse_unit).map_err(e)?;
    let resources_dir: Option<PathBuf> = args.opt_value_from_str("--resources-dir").map_err(e)?;
    let keep_aspect_ratio = args.contains("--keep-aspect-ratio");
    let export_id: Option<String> = args.opt_value_from_str("--export-id").map_err(e)?;
    let query_all = args.contains("--query-all");
    let perf = args.contains("--perf");
    let quiet = args.contains("--quiet");
    let input: String = args.free_from_str().map_err(e)?;
    let output: Option<PathBuf> = args.opt_free_from_str().map_err(e)?;

    if output.is_none() && !query_all {
        return Err("<out-png> must be set".to_string());
    }

    let input = if input == "-" {
        Input::Stdin
    } else {
        Input::File(PathBuf::from(input))
    };

    let mut opt = vgscene::Options {
        keep_aspect_ratio,
        ..vgscene::Options::default()
    };

    opt.resources_dir = match (resources_dir, &input) {
        (Some(dir), _) => Some(dir),
        (None, Input::File(path)) => std::fs::canonicalize(path)
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf())),
        (None, Input::Stdin) => {
            eprintln!("Warning: relative links cannot be resolved without --resources-dir.");
            None
        }
    };

    if let Some(languages) = languages {
        opt.languages = languages;
    }

    if let Some(unit) = default_unit {
        opt.default_unit = unit;
    }

    // The requested size doubles as the size of a document without one.
    let fit = match (width, height, zoom) {
        (Some(w), Some(h), _) => Fit::Size(w, h),
        (Some(w), None, _) => Fit::Width(w),
        (None, Some(h), _) => Fit::Height(h),
        (None, None, Some(k)) => Fit::Zoom(k),
        (None, None, None) => Fit::Original,
    };

    let fallback = opt.default_size;
    let default_size = tiny_skia::Size::from_wh(
        width.map_or(fallback.width(), |w| w as f32),
        height.map_or(fallback.height(), |h| h as f32),
    );
    if let Some(size) = default_size {
        opt.default_size = size;
    }

    Ok(Cli {
        input,
        output,
        fit,
        background,
        time: time.unwrap_or(0.0),
        export_id,
        query_all,
        perf,
        quiet,
        opt,
    })
}

fn positive<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match s.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        Ok(_) => Err(format!("'{}' must be positive", s)),
        Err(_) => Err(format!("'{}' is not a number", s)),
    }
}

fn parse_time(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(format!("'{}' is not a valid time", s)),
    }
}

fn parse_unit(s: &str) -> Result<LengthUnit, String> {
    let unit = match s {
        "px" => LengthUnit::Px,
        "pt" => LengthUnit::Pt,
        "pc" => LengthUnit::Pc,
        "mm" => LengthUnit::Mm,
        "cm" => LengthUnit::Cm,
        "in" => LengthUnit::In,
        _ => return Err(format!("'{}' is not a supported unit", s)),
    };

    Ok(unit)
}

fn parse_languages(s: &str) -> Result<Vec<String>, String> {
    let list: Vec<String> = s
        .split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(String::from)
        .collect();

    if list.is_empty() {
        Err("the languages list is empty".to_string())
    } else {
        Ok(list)
    }
}

fn measure<T>(enabled: bool, stage: &str, f: impl FnOnce() -> T) -> T {
    let start = std::time::Instant::now();
    let result = f();
    if enabled {
        println!("{}: {:.2}ms", stage, start.elapsed().as_secs_f64() * 1000.0);
    }

    result
}

fn run() -> Result<(), String> {
    let cli = parse_cli().map_err(|e| {
        println!("{}", HELP);
        e
    })?;

    // Warnings would be mixed into the query output.
    if !cli.quiet && !cli.query_all && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Warn);
    }

    let data = measure(cli.perf, "Reading", || read_input(&cli.input))?;
    let doc = measure(cli.perf, "Parsing", || {
        vgscene::Document::from_data(&data, &cli.opt).map_err(|e| e.to_string())
    })?;

    if cli.query_all {
        return print_bounds(&doc);
    }

    let pixmap = measure(cli.perf, "Rendering", || render(&cli, &doc))?;
    let output = cli.output.as_ref().ok_or("<out-png> must be set")?;
    measure(cli.perf, "Saving", || {
        pixmap.save_png(output).map_err(|e| e.to_string())
    })
}

fn read_input(input: &Input) -> Result<Vec<u8>, String> {
    match input {
        Input::File(path) => std::fs::read(path)
            .map_err(|e| format!("failed to read '{}': {}", path.display(), e)),
        Input::Stdin => {
            use std::io::Read;

            let mut data = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut data)
                .map_err(|e| format!("failed to read stdin: {}", e))?;
            Ok(data)
        }
    }
}

/// Element bounds in canvas coordinates.
fn canvas_bounds(doc: &vgscene::Document, id: &str) -> Option<tiny_skia::Rect> {
    let bbox = doc.bounds_on_element(id)?;
    bbox.transform(doc.transform_for_element(id)?)
}

fn print_bounds(doc: &vgscene::Document) -> Result<(), String> {
    let round = |v: f32| (v * 1000.0).round() / 1000.0;

    let mut found = false;
    for node in doc.descendants(doc.root()) {
        let id = &doc.node(node).attributes().id;
        if id.is_empty() {
            continue;
        }

        if let Some(r) = canvas_bounds(doc, id) {
            found = true;
            println!(
                "{},{},{},{},{}",
                id,
                round(r.x()),
                round(r.y()),
                round(r.width()),
                round(r.height())
            );
        }
    }

    if found {
        Ok(())
    } else {
        Err("the document has no elements with an id and bounds".to_string())
    }
}

fn render(cli: &Cli, doc: &vgscene::Document) -> Result<tiny_skia::Pixmap, String> {
    let size = match cli.export_id {
        Some(ref id) if !doc.element_exists(id) => {
            return Err(format!("the document has no '{}' element", id));
        }
        Some(ref id) => canvas_bounds(doc, id)
            .and_then(|r| r.to_non_zero_rect())
            .ok_or_else(|| format!("'{}' has no bounds", id))?
            .size(),
        None => doc.size(),
    };

    let size = cli
        .fit
        .apply(size.to_int_size())
        .ok_or("the output image would be empty")?;

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or("failed to allocate the output image")?;
    if let Some(c) = cli.background {
        pixmap.fill(tiny_skia::Color::from_rgba8(c.red, c.green, c.blue, c.alpha));
    }

    let mut canvas = vgscene::PixmapCanvas::from_pixmap(pixmap);
    match cli.export_id {
        Some(ref id) => {
            if !doc.render_element(id, &mut canvas, None, cli.time) {
                return Err(format!("failed to render '{}'", id));
            }
        }
        None => doc.render(&mut canvas, None, cli.time),
    }

    Ok(canvas.into_pixmap())
}

static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let target = match record.target() {
            "" => record.module_path().unwrap_or_default(),
            target => target,
        };

        let level = match record.level() {
            log::Level::Error => "Error",
            log::Level::Warn => "Warning",
            log::Level::Info => "Info",
            log::Level::Debug => "Debug",
            log::Level::Trace => "Trace",
        };

        eprintln!(
            "{} (in {}:{}): {}",
            level,
            target,
            record.line().unwrap_or(0),
            record.args()
        );
    }

    fn flush(&self) {}
}
