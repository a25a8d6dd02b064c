use crate::figure::{
    Annotation, Arrow, ArrowStyle, Artist, Axes, Circle, Coords, Dash, Fill, FillBetween, Figure, HAlign,
    Legend, LegendEntry, LegendHandle, LegendLoc, Line, Marker, MarkerKind, Orientation, Placement, Rect,
    RefLine, Scale, Text, TextBox, VAlign, Wedge,
};
use crate::text_metrics::line_width;
use crate::theme::Style;
use crate::ticks::{self, AxisTicks, Tick, TickLabel};
use std::path::Path;
use thiserror::Error;

/// Text line pitch relative to the font size.
const LINE_SPACING: f32 = 1.2;
const ASCENT: f32 = 0.78;
const DESCENT: f32 = 0.22;
const LABEL_PAD: f32 = 4.0;
const TITLE_PAD: f32 = 6.0;
const ARROW_SHRINK: f32 = 2.0;
const SUPERSCRIPT_SCALE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum RenderError {
    #[cfg(feature = "png")]
    #[error("invalid SVG: {0}")]
    Svg(#[from] usvg::Error),
    #[error("resolution must be a positive number, got {0} dpi")]
    InvalidDpi(f32),
    #[error("cannot allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// SVG document whose user units are points, cropped to its content.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSvg {
    pub svg: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl Frame {
    fn right(&self) -> f32 {
        self.left + self.width
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }

    fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    fn include_point(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn include(&mut self, other: Bounds) {
        if other.is_empty() {
            return;
        }
        self.include_point(other.min_x, other.min_y);
        self.include_point(other.max_x, other.max_y);
    }

    fn grow(mut self, amount: f32) -> Self {
        if !self.is_empty() {
            self.min_x -= amount;
            self.min_y -= amount;
            self.max_x += amount;
            self.max_y += amount;
        }
        self
    }

    fn clip(self, frame: Frame) -> Self {
        let clipped = Self {
            min_x: self.min_x.max(frame.left),
            min_y: self.min_y.max(frame.top),
            max_x: self.max_x.min(frame.right()),
            max_y: self.max_y.min(frame.bottom()),
        };
        if clipped.is_empty() { Self::empty() } else { clipped }
    }

    fn of_points(points: &[(f32, f32)]) -> Self {
        let mut bounds = Self::empty();
        for (x, y) in points {
            bounds.include_point(*x, *y);
        }
        bounds
    }

    fn of_frame(frame: Frame) -> Self {
        Self {
            min_x: frame.left,
            min_y: frame.top,
            max_x: frame.right(),
            max_y: frame.bottom(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisMap {
    lo: f32,
    hi: f32,
    scale: Scale,
}

impl AxisMap {
    fn transform(&self, value: f32) -> f32 {
        match self.scale {
            Scale::Linear => value,
            Scale::Log => value.max(f32::MIN_POSITIVE).log10(),
        }
    }

    fn fraction(&self, value: f32) -> f32 {
        let lo = self.transform(self.lo);
        let span = self.transform(self.hi) - lo;
        if span.abs() <= f32::EPSILON {
            return 0.5;
        }
        (self.transform(value) - lo) / span
    }

    fn contains(&self, value: f32) -> bool {
        let fraction = self.fraction(value);
        (-1e-4..=1.0 + 1e-4).contains(&fraction)
    }
}

/// Maps data and axes coordinates of one axes to canvas points.
struct View {
    frame: Frame,
    x: AxisMap,
    y: AxisMap,
}

impl View {
    fn new(ax: &Axes, outer: Frame) -> Self {
        let (xlim, ylim) = resolve_limits(ax);
        let x = AxisMap {
            lo: xlim.0,
            hi: xlim.1,
            scale: ax.xscale,
        };
        let y = AxisMap {
            lo: ylim.0,
            hi: ylim.1,
            scale: ax.yscale,
        };
        let mut frame = outer;
        if ax.aspect_equal && ax.xscale == Scale::Linear && ax.yscale == Scale::Linear {
            let dx = (xlim.1 - xlim.0).abs().max(f32::EPSILON);
            let dy = (ylim.1 - ylim.0).abs().max(f32::EPSILON);
            let unit = (outer.width / dx).min(outer.height / dy);
            frame.width = dx * unit;
            frame.height = dy * unit;
            frame.left = outer.left + (outer.width - frame.width) / 2.0;
            frame.top = outer.top + (outer.height - frame.height) / 2.0;
        }
        Self { frame, x, y }
    }

    fn px(&self, x: f32) -> f32 {
        self.frame.left + self.x.fraction(x) * self.frame.width
    }

    fn py(&self, y: f32) -> f32 {
        self.frame.bottom() - self.y.fraction(y) * self.frame.height
    }

    fn data(&self, x: f32, y: f32) -> (f32, f32) {
        (self.px(x), self.py(y))
    }

    fn point(&self, coords: Coords, x: f32, y: f32, figure: (f32, f32)) -> (f32, f32) {
        match coords {
            Coords::Data => self.data(x, y),
            Coords::Axes => (
                self.frame.left + x * self.frame.width,
                self.frame.bottom() - y * self.frame.height,
            ),
            Coords::Figure => figure_point(x, y, figure),
        }
    }
}

fn figure_point(x: f32, y: f32, figure: (f32, f32)) -> (f32, f32) {
    (x * figure.0, figure.1 - y * figure.1)
}

struct SubplotParams {
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    wspace: f32,
    hspace: f32,
}

const DEFAULT_SUBPLOT: SubplotParams = SubplotParams {
    left: 0.125,
    right: 0.9,
    bottom: 0.11,
    top: 0.88,
    wspace: 0.2,
    hspace: 0.2,
};

const TIGHT_SUBPLOT: SubplotParams = SubplotParams {
    left: 0.1,
    right: 0.97,
    bottom: 0.14,
    top: 0.92,
    wspace: 0.35,
    hspace: 0.35,
};

fn axes_frame(fig: &Figure, ax: &Axes) -> Frame {
    let (fw, fh) = fig.size_points();
    match ax.placement {
        Placement::Rect([left, bottom, width, height]) => Frame {
            left: left * fw,
            top: fh * (1.0 - bottom - height),
            width: width * fw,
            height: height * fh,
        },
        Placement::Grid { row, col } => {
            let params = if fig.tight { &TIGHT_SUBPLOT } else { &DEFAULT_SUBPLOT };
            let cols = fig.cols as f32;
            let rows = fig.rows as f32;
            let cell_w = (params.right - params.left) * fw / (cols + params.wspace * (cols - 1.0));
            let cell_h = (params.top - params.bottom) * fh / (rows + params.hspace * (rows - 1.0));
            Frame {
                left: params.left * fw + col as f32 * cell_w * (1.0 + params.wspace),
                top: (1.0 - params.top) * fh + row as f32 * cell_h * (1.0 + params.hspace),
                width: cell_w,
                height: cell_h,
            }
        }
    }
}

fn resolve_limits(ax: &Axes) -> ((f32, f32), (f32, f32)) {
    let extent = ax.data_extent();
    let x = ax
        .xlim
        .unwrap_or_else(|| autoscale(extent.map(|e| e.0), ax.xscale, false));
    let y = ax
        .ylim
        .unwrap_or_else(|| autoscale(extent.map(|e| e.1), ax.yscale, ax.sticky_zero_y));
    (x, y)
}

/// Data range padded by 5 % on each side. Bars keep their zero baseline.
fn autoscale(range: Option<(f32, f32)>, scale: Scale, sticky_zero: bool) -> (f32, f32) {
    let Some((lo, hi)) = range else {
        return match scale {
            Scale::Linear => (0.0, 1.0),
            Scale::Log => (1.0, 10.0),
        };
    };
    match scale {
        Scale::Linear => {
            let (lo, hi) = if (hi - lo).abs() <= f32::EPSILON {
                (lo - 0.5, hi + 0.5)
            } else {
                (lo, hi)
            };
            let margin = (hi - lo) * 0.05;
            let lower = if sticky_zero && lo == 0.0 { 0.0 } else { lo - margin };
            (lower, hi + margin)
        }
        Scale::Log => {
            let (a, b) = (lo.log10(), hi.log10());
            let margin = ((b - a) * 0.05).max(0.05);
            (10f32.powf(a - margin), 10f32.powf(b + margin))
        }
    }
}

struct Canvas<'a> {
    style: &'a Style,
    figure: (f32, f32),
    body: String,
    defs: String,
    bounds: Bounds,
}

impl<'a> Canvas<'a> {
    fn new(style: &'a Style, figure: (f32, f32)) -> Self {
        Self {
            style,
            figure,
            body: String::new(),
            defs: String::new(),
            bounds: Bounds::empty(),
        }
    }

    fn color(&self, color: &str) -> String {
        self.style.resolve_color(color).to_string()
    }
}

/// Renders `fig` to an SVG document cropped to the drawn content plus
/// `pad_inches` of margin.
pub fn render_svg(fig: &Figure, pad_inches: f32) -> RenderedSvg {
    let style = fig.style();
    let figure = fig.size_points();
    let mut canvas = Canvas::new(style, figure);

    for (idx, ax) in fig.axes.iter().enumerate() {
        let outer = axes_frame(fig, ax);
        let view = View::new(ax, outer);
        draw_axes(&mut canvas, ax, &view, idx);
    }

    for text in &fig.texts {
        let anchor = figure_point(text.x, text.y, figure);
        draw_text_artist(&mut canvas, anchor, text);
    }

    let content = if canvas.bounds.is_empty() {
        Bounds::of_frame(Frame {
            left: 0.0,
            top: 0.0,
            width: figure.0,
            height: figure.1,
        })
    } else {
        canvas.bounds
    };
    let crop = content.grow(pad_inches.max(0.0) * 72.0);
    let (x, y) = (crop.min_x, crop.min_y);
    let width = crop.max_x - crop.min_x;
    let height = crop.max_y - crop.min_y;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{x:.2} {y:.2} {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\"/>",
        style.background
    ));
    if !canvas.defs.is_empty() {
        svg.push_str("<defs>");
        svg.push_str(&canvas.defs);
        svg.push_str("</defs>");
    }
    svg.push_str(&canvas.body);
    svg.push_str("</svg>");

    RenderedSvg { svg, width, height }
}

fn draw_axes(canvas: &mut Canvas, ax: &Axes, view: &View, idx: usize) {
    let style = canvas.style;
    let frame = view.frame;
    let clip_id = format!("clip-{idx}");
    canvas.defs.push_str(&format!(
        "<clipPath id=\"{clip_id}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"/></clipPath>",
        frame.left, frame.top, frame.width, frame.height
    ));

    let xticks = axis_ticks(ax.xticks.as_deref(), &view.x, frame.width, style.xtick_size, 5.0, style.minor_ticks);
    let yticks = axis_ticks(ax.yticks.as_deref(), &view.y, frame.height, style.ytick_size, 2.5, style.minor_ticks);

    if ax.axis_visible
        && let Some(grid) = &ax.grid
    {
        let alpha = grid.alpha.unwrap_or(style.grid_alpha);
        let grid_line = |canvas: &mut Canvas, from: (f32, f32), to: (f32, f32)| {
            canvas.body.push_str(&format!(
                "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-opacity=\"{alpha:.2}\" fill=\"none\"/>",
                from.0, from.1, to.0, to.1, style.grid_color, style.grid_line_width
            ));
        };
        if matches!(grid.axis, crate::figure::GridAxis::Both | crate::figure::GridAxis::X) {
            for value in grid_values(&xticks, grid.minor) {
                let x = view.px(value);
                grid_line(canvas, (x, frame.top), (x, frame.bottom()));
            }
        }
        if matches!(grid.axis, crate::figure::GridAxis::Both | crate::figure::GridAxis::Y) {
            for value in grid_values(&yticks, grid.minor) {
                let y = view.py(value);
                grid_line(canvas, (frame.left, y), (frame.right(), y));
            }
        }
    }

    let mut order: Vec<&Artist> = ax.artists.iter().collect();
    order.sort_by(|a, b| a.z().total_cmp(&b.z()));
    for artist in order {
        draw_artist(canvas, artist, view, &clip_id);
    }

    if ax.axis_visible {
        draw_decorations(canvas, ax, view, &xticks, &yticks);
    }

    if let Some(title) = &ax.title {
        let text = Text::new(0.0, 0.0, &title.text)
            .size(title.size.unwrap_or(style.title_size))
            .ha(HAlign::Center)
            .va(VAlign::Bottom);
        draw_text_artist(canvas, (frame.center_x(), frame.top - TITLE_PAD), &text);
    }

    if let Some(legend) = &ax.legend {
        let entries = legend
            .entries
            .clone()
            .unwrap_or_else(|| collect_legend_entries(ax));
        draw_legend(canvas, legend, &entries, frame);
    }
}

fn axis_ticks(
    custom: Option<&[(f32, String)]>,
    map: &AxisMap,
    length: f32,
    font_size: f32,
    spacing: f32,
    minor: bool,
) -> AxisTicks {
    let mut ticks = match custom {
        Some(custom) => AxisTicks {
            major: custom
                .iter()
                .map(|(value, label)| Tick {
                    value: *value,
                    label: TickLabel::Plain(label.clone()),
                })
                .collect(),
            minor: Vec::new(),
        },
        None => match map.scale {
            Scale::Linear => ticks::linear_ticks(
                map.lo,
                map.hi,
                ticks::max_bins(length, font_size, spacing),
                minor,
            ),
            Scale::Log => ticks::log_ticks(map.lo.min(map.hi), map.lo.max(map.hi), minor),
        },
    };
    ticks.major.retain(|tick| map.contains(tick.value));
    ticks.minor.retain(|value| map.contains(*value));
    ticks
}

fn grid_values(ticks: &AxisTicks, minor: bool) -> Vec<f32> {
    let mut values: Vec<f32> = ticks.major.iter().map(|tick| tick.value).collect();
    if minor {
        values.extend(ticks.minor.iter().copied());
    }
    values
}

fn draw_artist(canvas: &mut Canvas, artist: &Artist, view: &View, clip_id: &str) {
    match artist {
        Artist::Line(line) => draw_line(canvas, line, view, clip_id),
        Artist::Fill(fill) => draw_fill(canvas, fill, view, clip_id),
        Artist::FillBetween(band) => draw_fill_between(canvas, band, view, clip_id),
        Artist::Rect(rect) => draw_rect(canvas, rect, view, clip_id),
        Artist::Circle(circle) => draw_circle(canvas, circle, view, clip_id),
        Artist::Wedge(wedge) => draw_wedge(canvas, wedge, view, clip_id),
        Artist::RefLine(line) => draw_ref_line(canvas, line, view, clip_id),
        Artist::Text(text) => {
            let anchor = view.point(text.coords, text.x, text.y, canvas.figure);
            draw_text_artist(canvas, anchor, text);
        }
        Artist::Annotation(note) => draw_annotation(canvas, note, view),
    }
}

fn dash_array(dash: Dash, width: f32) -> Option<String> {
    let scale = width.max(0.5);
    let pattern: &[f32] = match dash {
        Dash::Solid | Dash::Hidden => return None,
        Dash::Dashed => &[3.7, 1.6],
        Dash::Dotted => &[1.0, 1.65],
        Dash::DashDot => &[6.4, 1.6, 1.0, 1.6],
    };
    Some(
        pattern
            .iter()
            .map(|value| format!("{:.2}", value * scale))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn draw_line(canvas: &mut Canvas, line: &Line, view: &View, clip_id: &str) {
    let width = line.width.unwrap_or(canvas.style.line_width);
    let color = canvas.color(&line.color);
    let points: Vec<(f32, f32)> = line
        .xs
        .iter()
        .zip(line.ys.iter())
        .map(|(x, y)| view.data(*x, *y))
        .collect();

    if line.dash != Dash::Hidden && points.len() >= 2 {
        let dash = dash_array(line.dash, width)
            .map(|pattern| format!(" stroke-dasharray=\"{pattern}\""))
            .unwrap_or_default();
        let cap = if line.round_cap { "round" } else { "butt" };
        canvas.body.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width:.2}\" stroke-opacity=\"{:.2}\" stroke-linejoin=\"round\" stroke-linecap=\"{cap}\"{dash} clip-path=\"url(#{clip_id})\"/>",
            points_to_path(&points),
            line.alpha
        ));
        canvas
            .bounds
            .include(Bounds::of_points(&points).grow(width / 2.0).clip(view.frame));
    }

    if let Some(marker) = &line.marker {
        for point in &points {
            let extent = draw_marker(canvas, marker, *point, &color, line.alpha, Some(clip_id));
            canvas.bounds.include(extent.clip(view.frame));
        }
    }
}

fn draw_marker(
    canvas: &mut Canvas,
    marker: &Marker,
    (x, y): (f32, f32),
    line_color: &str,
    alpha: f32,
    clip_id: Option<&str>,
) -> Bounds {
    let fill = marker
        .fill
        .as_deref()
        .map(|color| canvas.color(color))
        .unwrap_or_else(|| line_color.to_string());
    let edge = marker
        .edge_color
        .as_deref()
        .map(|color| canvas.color(color))
        .unwrap_or_else(|| fill.clone());
    let edge_width = marker.edge_width.unwrap_or(1.0);
    let clip = clip_id
        .map(|id| format!(" clip-path=\"url(#{id})\""))
        .unwrap_or_default();
    let paint = format!(
        "fill=\"{fill}\" fill-opacity=\"{alpha:.2}\" stroke=\"{edge}\" stroke-width=\"{edge_width:.2}\" stroke-opacity=\"{alpha:.2}\"{clip}"
    );
    let r = marker.size / 2.0;
    let element = match marker.kind {
        MarkerKind::Circle => format!("<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{r:.2}\" {paint}/>"),
        MarkerKind::Point => format!("<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{:.2}\" {paint}/>", r / 2.0),
        MarkerKind::Square => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {paint}/>",
            x - r,
            y - r,
            marker.size,
            marker.size
        ),
        MarkerKind::Star => {
            let inner = r * 0.381_966;
            let points: Vec<(f32, f32)> = (0..10)
                .map(|idx| {
                    let radius = if idx % 2 == 0 { r } else { inner };
                    let angle = (-90.0 + idx as f32 * 36.0).to_radians();
                    (x + radius * angle.cos(), y + radius * angle.sin())
                })
                .collect();
            format!("<path d=\"{} Z\" {paint}/>", points_to_path(&points))
        }
        MarkerKind::TriangleDown => {
            let points = [(x, y + r), (x - r, y - r), (x + r, y - r)];
            format!("<path d=\"{} Z\" {paint}/>", points_to_path(&points))
        }
        MarkerKind::Tick => format!(
            "<path d=\"M {x:.2} {:.2} L {x:.2} {:.2}\" fill=\"none\" stroke=\"{edge}\" stroke-width=\"{edge_width:.2}\" stroke-opacity=\"{alpha:.2}\"{clip}/>",
            y - r,
            y + r
        ),
    };
    canvas.body.push_str(&element);
    Bounds::of_points(&[(x - r, y - r), (x + r, y + r)]).grow(edge_width / 2.0)
}

fn draw_fill(canvas: &mut Canvas, fill: &Fill, view: &View, clip_id: &str) {
    let points: Vec<(f32, f32)> = fill
        .xs
        .iter()
        .zip(fill.ys.iter())
        .map(|(x, y)| view.data(*x, *y))
        .collect();
    if points.len() < 3 {
        return;
    }
    let color = canvas.color(&fill.color);
    canvas.body.push_str(&format!(
        "<path d=\"{} Z\" fill=\"{color}\" fill-opacity=\"{:.2}\" stroke=\"none\" clip-path=\"url(#{clip_id})\"/>",
        points_to_path(&points),
        fill.alpha
    ));
    canvas.bounds.include(Bounds::of_points(&points).clip(view.frame));
}

fn draw_fill_between(canvas: &mut Canvas, band: &FillBetween, view: &View, clip_id: &str) {
    let count = band.xs.len().min(band.lower.len()).min(band.upper.len());
    if count < 2 {
        return;
    }
    let mut points: Vec<(f32, f32)> = (0..count).map(|idx| view.data(band.xs[idx], band.upper[idx])).collect();
    points.extend((0..count).rev().map(|idx| view.data(band.xs[idx], band.lower[idx])));
    let color = canvas.color(&band.color);
    canvas.body.push_str(&format!(
        "<path d=\"{} Z\" fill=\"{color}\" fill-opacity=\"{:.2}\" stroke=\"none\" clip-path=\"url(#{clip_id})\"/>",
        points_to_path(&points),
        band.alpha
    ));
    canvas.bounds.include(Bounds::of_points(&points).clip(view.frame));
}

fn fill_and_edge(canvas: &Canvas, fill: Option<&str>, edge: Option<&str>, line_width: Option<f32>, alpha: f32) -> (String, f32) {
    let fill = match fill {
        Some(color) => format!("fill=\"{}\" fill-opacity=\"{alpha:.2}\"", canvas.color(color)),
        None => "fill=\"none\"".to_string(),
    };
    let (stroke, width) = match edge {
        Some(color) => {
            let width = line_width.unwrap_or(canvas.style.axes_line_width);
            (
                format!(" stroke=\"{}\" stroke-width=\"{width:.2}\"", canvas.color(color)),
                width,
            )
        }
        None => (" stroke=\"none\"".to_string(), 0.0),
    };
    (format!("{fill}{stroke}"), width)
}

fn draw_rect(canvas: &mut Canvas, rect: &Rect, view: &View, clip_id: &str) {
    let (x0, y0) = view.data(rect.x - rect.pad, rect.y - rect.pad);
    let (x1, y1) = view.data(rect.x + rect.width + rect.pad, rect.y + rect.height + rect.pad);
    let left = x0.min(x1);
    let top = y0.min(y1);
    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();
    let radius = if rect.corner_radius > 0.0 {
        let rx = (view.px(rect.x + rect.corner_radius) - view.px(rect.x)).abs();
        let ry = (view.py(rect.y + rect.corner_radius) - view.py(rect.y)).abs();
        rx.min(ry)
    } else {
        0.0
    };
    let (paint, stroke_width) = fill_and_edge(
        canvas,
        rect.fill.as_deref(),
        rect.edge.as_deref(),
        rect.line_width,
        rect.alpha,
    );
    canvas.body.push_str(&format!(
        "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{radius:.2}\" ry=\"{radius:.2}\" {paint} clip-path=\"url(#{clip_id})\"/>",
    ));
    canvas.bounds.include(
        Bounds::of_points(&[(left, top), (left + width, top + height)])
            .grow(stroke_width / 2.0)
            .clip(view.frame),
    );
}

fn draw_circle(canvas: &mut Canvas, circle: &Circle, view: &View, clip_id: &str) {
    let (cx, cy) = view.data(circle.center.0, circle.center.1);
    let rx = (view.px(circle.center.0 + circle.radius) - cx).abs();
    let ry = (view.py(circle.center.1 + circle.radius) - cy).abs();
    let (paint, stroke_width) = fill_and_edge(
        canvas,
        circle.fill.as_deref(),
        circle.edge.as_deref(),
        circle.line_width,
        1.0,
    );
    canvas.body.push_str(&format!(
        "<ellipse cx=\"{cx:.2}\" cy=\"{cy:.2}\" rx=\"{rx:.2}\" ry=\"{ry:.2}\" {paint} clip-path=\"url(#{clip_id})\"/>",
    ));
    canvas.bounds.include(
        Bounds::of_points(&[(cx - rx, cy - ry), (cx + rx, cy + ry)])
            .grow(stroke_width / 2.0)
            .clip(view.frame),
    );
}

fn draw_wedge(canvas: &mut Canvas, wedge: &Wedge, view: &View, clip_id: &str) {
    let (cx, cy) = view.data(wedge.center.0, wedge.center.1);
    let at = |degrees: f32| {
        let theta = degrees.to_radians();
        view.data(
            wedge.center.0 + wedge.radius * theta.cos(),
            wedge.center.1 + wedge.radius * theta.sin(),
        )
    };
    let rx = (view.px(wedge.center.0 + wedge.radius) - cx).abs();
    let ry = (view.py(wedge.center.1 + wedge.radius) - cy).abs();
    let span = (wedge.theta2 - wedge.theta1).clamp(0.0, 360.0);
    let d = if span >= 359.999 {
        let (sx, sy) = at(wedge.theta1);
        let (mx, my) = at(wedge.theta1 + 180.0);
        format!(
            "M {sx:.2} {sy:.2} A {rx:.2} {ry:.2} 0 1 0 {mx:.2} {my:.2} A {rx:.2} {ry:.2} 0 1 0 {sx:.2} {sy:.2} Z"
        )
    } else {
        let (sx, sy) = at(wedge.theta1);
        let (ex, ey) = at(wedge.theta2);
        let large = if span > 180.0 { 1 } else { 0 };
        format!(
            "M {cx:.2} {cy:.2} L {sx:.2} {sy:.2} A {rx:.2} {ry:.2} 0 {large} 0 {ex:.2} {ey:.2} Z"
        )
    };
    let (paint, stroke_width) = fill_and_edge(
        canvas,
        Some(wedge.fill.as_str()),
        wedge.edge.as_deref(),
        wedge.line_width,
        1.0,
    );
    canvas
        .body
        .push_str(&format!("<path d=\"{d}\" {paint} clip-path=\"url(#{clip_id})\"/>"));
    canvas.bounds.include(
        Bounds::of_points(&[(cx - rx, cy - ry), (cx + rx, cy + ry)])
            .grow(stroke_width / 2.0)
            .clip(view.frame),
    );
}

fn draw_ref_line(canvas: &mut Canvas, line: &RefLine, view: &View, clip_id: &str) {
    let frame = view.frame;
    let (from, to) = match line.orientation {
        Orientation::Horizontal => {
            let y = view.py(line.value);
            ((frame.left, y), (frame.right(), y))
        }
        Orientation::Vertical => {
            let x = view.px(line.value);
            ((x, frame.top), (x, frame.bottom()))
        }
    };
    let width = line.width.unwrap_or(canvas.style.line_width);
    let dash = dash_array(line.dash, width)
        .map(|pattern| format!(" stroke-dasharray=\"{pattern}\""))
        .unwrap_or_default();
    let color = canvas.color(&line.color);
    canvas.body.push_str(&format!(
        "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width:.2}\" stroke-opacity=\"{:.2}\"{dash} clip-path=\"url(#{clip_id})\"/>",
        from.0,
        from.1,
        to.0,
        to.1,
        line.alpha
    ));
    canvas
        .bounds
        .include(Bounds::of_points(&[from, to]).grow(width / 2.0).clip(frame));
}

struct TextLayout {
    lines: Vec<String>,
    size: f32,
    width: f32,
    height: f32,
}

impl TextLayout {
    fn new(content: &str, size: f32, family: &str, bold: bool) -> Self {
        let lines: Vec<String> = content.split('\n').map(|line| line.to_string()).collect();
        let width = lines
            .iter()
            .map(|line| line_width(line, size, family, bold))
            .fold(0.0f32, f32::max);
        let height = size * (ASCENT + DESCENT) + (lines.len().saturating_sub(1)) as f32 * size * LINE_SPACING;
        Self {
            lines,
            size,
            width,
            height,
        }
    }

    /// Top-left corner of the block relative to the anchor point.
    fn origin(&self, ha: HAlign, va: VAlign) -> (f32, f32) {
        let left = match ha {
            HAlign::Left => 0.0,
            HAlign::Center => -self.width / 2.0,
            HAlign::Right => -self.width,
        };
        let top = match va {
            VAlign::Top => 0.0,
            VAlign::Center => -self.height / 2.0,
            VAlign::Bottom => -self.height,
            VAlign::Baseline => {
                -(self.size * ASCENT + (self.lines.len().saturating_sub(1)) as f32 * self.size * LINE_SPACING)
            }
        };
        (left, top)
    }
}

fn rotate(point: (f32, f32), degrees: f32) -> (f32, f32) {
    if degrees == 0.0 {
        return point;
    }
    let theta = (-degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    (point.0 * cos - point.1 * sin, point.0 * sin + point.1 * cos)
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn font_attributes(style: &Style, size: f32, bold: bool, italic: bool) -> String {
    let mut attrs = format!(
        "font-family=\"{}\" font-size=\"{size:.2}\"",
        escape_xml(&style.font_family)
    );
    if bold {
        attrs.push_str(" font-weight=\"bold\"");
    }
    if italic {
        attrs.push_str(" font-style=\"italic\"");
    }
    attrs
}

/// Draws a text artist at `anchor` (canvas points) and returns the screen
/// bounds of the block including its background box.
fn draw_text_artist(canvas: &mut Canvas, anchor: (f32, f32), text: &Text) -> Bounds {
    if text.is_blank() {
        return Bounds::empty();
    }
    let style = canvas.style;
    let size = text.size.unwrap_or(style.font_size);
    let layout = TextLayout::new(&text.content, size, &style.font_family, text.bold);
    let (left, top) = layout.origin(text.ha, text.va);
    let color = text
        .color
        .as_deref()
        .map(|color| canvas.color(color))
        .unwrap_or_else(|| style.text_color.clone());

    let rotation = if text.rotation == 0.0 {
        String::new()
    } else {
        format!(" rotate({:.2})", -text.rotation)
    };
    canvas.body.push_str(&format!(
        "<g transform=\"translate({:.2} {:.2}){rotation}\">",
        anchor.0, anchor.1
    ));

    let mut local = Bounds::of_points(&[(left, top), (left + layout.width, top + layout.height)]);
    if let Some(bbox) = &text.bbox {
        local = draw_text_box(canvas, bbox, &layout, left, top);
    }

    let anchor_name = match text.ha {
        HAlign::Left => "start",
        HAlign::Center => "middle",
        HAlign::Right => "end",
    };
    let font = font_attributes(style, size, text.bold, text.italic);
    for (idx, line) in layout.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = top + size * ASCENT + idx as f32 * size * LINE_SPACING;
        canvas.body.push_str(&format!(
            "<text x=\"0\" y=\"{baseline:.2}\" text-anchor=\"{anchor_name}\" {font} fill=\"{color}\" fill-opacity=\"{:.2}\">{}</text>",
            text.alpha,
            escape_xml(line)
        ));
    }
    canvas.body.push_str("</g>");

    let corners = [
        (local.min_x, local.min_y),
        (local.max_x, local.min_y),
        (local.max_x, local.max_y),
        (local.min_x, local.max_y),
    ];
    let screen: Vec<(f32, f32)> = corners
        .iter()
        .map(|corner| {
            let (x, y) = rotate(*corner, text.rotation);
            (anchor.0 + x, anchor.1 + y)
        })
        .collect();
    let bounds = Bounds::of_points(&screen);
    canvas.bounds.include(bounds);
    bounds
}

fn draw_text_box(canvas: &mut Canvas, bbox: &TextBox, layout: &TextLayout, left: f32, top: f32) -> Bounds {
    let pad = bbox.pad * layout.size;
    let (x, y) = (left - pad, top - pad);
    let (width, height) = (layout.width + 2.0 * pad, layout.height + 2.0 * pad);
    let radius = if bbox.rounded { pad } else { 0.0 };
    let (paint, stroke_width) = fill_and_edge(canvas, Some(bbox.fill.as_str()), bbox.edge.as_deref(), Some(1.0), bbox.alpha);
    canvas.body.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{radius:.2}\" ry=\"{radius:.2}\" {paint}/>",
    ));
    Bounds::of_points(&[(x, y), (x + width, y + height)]).grow(stroke_width / 2.0)
}

fn draw_annotation(canvas: &mut Canvas, note: &Annotation, view: &View) {
    let anchor = view.point(note.label.coords, note.label.x, note.label.y, canvas.figure);
    let target = view.data(note.xy.0, note.xy.1);
    let text_bounds = draw_text_artist(canvas, anchor, &note.label);
    let Some(arrow) = &note.arrow else {
        return;
    };
    let start = if text_bounds.is_empty() {
        anchor
    } else {
        exit_point(anchor, target, text_bounds.grow(ARROW_SHRINK))
    };
    draw_arrow(canvas, start, target, arrow);
}

/// Where the segment from `from` (inside `bounds`) to `to` leaves `bounds`.
fn exit_point(from: (f32, f32), to: (f32, f32), bounds: Bounds) -> (f32, f32) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let mut t_exit = 1.0f32;
    if dx > 0.0 {
        t_exit = t_exit.min((bounds.max_x - from.0) / dx);
    } else if dx < 0.0 {
        t_exit = t_exit.min((bounds.min_x - from.0) / dx);
    }
    if dy > 0.0 {
        t_exit = t_exit.min((bounds.max_y - from.1) / dy);
    } else if dy < 0.0 {
        t_exit = t_exit.min((bounds.min_y - from.1) / dy);
    }
    let t = t_exit.clamp(0.0, 1.0);
    (from.0 + dx * t, from.1 + dy * t)
}

fn draw_arrow(canvas: &mut Canvas, from: (f32, f32), to: (f32, f32), arrow: &Arrow) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = (dx * dx + dy * dy).sqrt();
    if length <= 2.0 * ARROW_SHRINK {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let start = (from.0 + ux * ARROW_SHRINK, from.1 + uy * ARROW_SHRINK);
    let end = (to.0 - ux * ARROW_SHRINK, to.1 - uy * ARROW_SHRINK);
    let color = canvas.color(&arrow.color);
    let width = arrow.width;
    let stroke = format!(
        "fill=\"none\" stroke=\"{color}\" stroke-width=\"{width:.2}\" stroke-linejoin=\"miter\" stroke-linecap=\"butt\""
    );
    canvas
        .body
        .push_str(&format!("<path d=\"{}\" {stroke}/>", points_to_path(&[start, end])));
    let mut bounds = Bounds::of_points(&[start, end]).grow(width / 2.0);

    let head_length = 3.0 + 2.0 * width;
    let head_half = head_length * 0.5;
    let mut head = |tip: (f32, f32), dir: (f32, f32)| {
        let base = (tip.0 - dir.0 * head_length, tip.1 - dir.1 * head_length);
        let normal = (-dir.1 * head_half, dir.0 * head_half);
        let wing_a = (base.0 + normal.0, base.1 + normal.1);
        let wing_b = (base.0 - normal.0, base.1 - normal.1);
        canvas
            .body
            .push_str(&format!("<path d=\"{}\" {stroke}/>", points_to_path(&[wing_a, tip, wing_b])));
        bounds.include(Bounds::of_points(&[wing_a, tip, wing_b]).grow(width / 2.0));
    };
    match arrow.style {
        ArrowStyle::Forward => head(end, (ux, uy)),
        ArrowStyle::Both => {
            head(end, (ux, uy));
            head(start, (-ux, -uy));
        }
        ArrowStyle::Plain => {}
    }
    canvas.bounds.include(bounds);
}

fn tick_label_width(label: &TickLabel, size: f32, family: &str) -> f32 {
    match label {
        TickLabel::Plain(text) => line_width(text, size, family, false),
        TickLabel::Power(exp) => {
            line_width("10", size, family, false)
                + line_width(&ticks::superscript_exponent(*exp), size * SUPERSCRIPT_SCALE, family, false)
        }
    }
}

fn draw_tick_label(canvas: &mut Canvas, label: &TickLabel, anchor: (f32, f32), size: f32, ha: HAlign, va: VAlign) {
    let style = canvas.style;
    match label {
        TickLabel::Plain(text) => {
            let artist = Text::new(0.0, 0.0, text).size(size).ha(ha).va(va);
            draw_text_artist(canvas, anchor, &artist);
        }
        TickLabel::Power(exp) => {
            let width = tick_label_width(label, size, &style.font_family);
            let height = size * (ASCENT + DESCENT);
            let left = match ha {
                HAlign::Left => anchor.0,
                HAlign::Center => anchor.0 - width / 2.0,
                HAlign::Right => anchor.0 - width,
            };
            let top = match va {
                VAlign::Top => anchor.1,
                VAlign::Center => anchor.1 - height / 2.0,
                VAlign::Bottom => anchor.1 - height,
                VAlign::Baseline => anchor.1 - size * ASCENT,
            };
            let baseline = top + size * ASCENT;
            let font = font_attributes(style, size, false, false);
            canvas.body.push_str(&format!(
                "<text x=\"{left:.2}\" y=\"{baseline:.2}\" {font} fill=\"{}\">10<tspan dy=\"{:.2}\" font-size=\"{:.2}\">{}</tspan></text>",
                style.text_color,
                -size * 0.4,
                size * SUPERSCRIPT_SCALE,
                ticks::superscript_exponent(*exp)
            ));
            canvas
                .bounds
                .include(Bounds::of_points(&[(left, top - size * 0.4), (left + width, top + height)]));
        }
    }
}

fn draw_decorations(canvas: &mut Canvas, ax: &Axes, view: &View, xticks: &AxisTicks, yticks: &AxisTicks) {
    let style = canvas.style;
    let frame = view.frame;

    canvas.body.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
        frame.left, frame.top, frame.width, frame.height, style.text_color, style.axes_line_width
    ));
    canvas
        .bounds
        .include(Bounds::of_frame(frame).grow(style.axes_line_width / 2.0));

    // Inward ticks point into the frame; outward ticks push labels away.
    let inward = if style.ticks_inward { 1.0 } else { -1.0 };
    let mut marks = String::new();
    let tick = |marks: &mut String, from: (f32, f32), to: (f32, f32), width: f32| {
        marks.push_str(&format!(
            "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" stroke=\"{}\" stroke-width=\"{width:.2}\" fill=\"none\"/>",
            from.0, from.1, to.0, to.1, style.text_color
        ));
    };
    let x_sets = [
        (xticks.major.iter().map(|t| t.value).collect::<Vec<_>>(), style.major_tick_size, style.major_tick_width),
        (xticks.minor.clone(), style.minor_tick_size, style.minor_tick_width),
    ];
    for (values, length, width) in &x_sets {
        for value in values {
            let x = view.px(*value);
            tick(&mut marks, (x, frame.bottom()), (x, frame.bottom() - inward * length), *width);
            if style.mirror_ticks {
                tick(&mut marks, (x, frame.top), (x, frame.top + inward * length), *width);
            }
        }
    }
    let y_sets = [
        (yticks.major.iter().map(|t| t.value).collect::<Vec<_>>(), style.major_tick_size, style.major_tick_width),
        (yticks.minor.clone(), style.minor_tick_size, style.minor_tick_width),
    ];
    for (values, length, width) in &y_sets {
        for value in values {
            let y = view.py(*value);
            tick(&mut marks, (frame.left, y), (frame.left + inward * length, y), *width);
            if style.mirror_ticks {
                tick(&mut marks, (frame.right(), y), (frame.right() - inward * length, y), *width);
            }
        }
    }
    canvas.body.push_str(&marks);
    let outward = if style.ticks_inward { 0.0 } else { style.major_tick_size };
    canvas
        .bounds
        .include(Bounds::of_frame(frame).grow(outward));

    let label_offset = outward + style.tick_pad;
    let x_label_top = frame.bottom() + label_offset;
    for major in &xticks.major {
        draw_tick_label(
            canvas,
            &major.label,
            (view.px(major.value), x_label_top),
            style.xtick_size,
            HAlign::Center,
            VAlign::Top,
        );
    }
    let mut y_label_width = 0.0f32;
    for major in &yticks.major {
        y_label_width = y_label_width.max(tick_label_width(&major.label, style.ytick_size, &style.font_family));
        draw_tick_label(
            canvas,
            &major.label,
            (frame.left - label_offset, view.py(major.value)),
            style.ytick_size,
            HAlign::Right,
            VAlign::Center,
        );
    }

    if let Some(label) = &ax.xlabel {
        let tick_height = if xticks.major.is_empty() {
            0.0
        } else {
            style.xtick_size * (ASCENT + DESCENT)
        };
        let text = Text::new(0.0, 0.0, &label.text)
            .size(label.size.unwrap_or(style.label_size))
            .ha(HAlign::Center)
            .va(VAlign::Top);
        let anchor = (frame.center_x(), x_label_top + tick_height + LABEL_PAD);
        draw_text_artist(canvas, anchor, &text);
    }
    if let Some(label) = &ax.ylabel {
        let text = Text::new(0.0, 0.0, &label.text)
            .size(label.size.unwrap_or(style.label_size))
            .ha(HAlign::Center)
            .va(VAlign::Bottom)
            .rotation(90.0);
        let x = frame.left - label_offset - y_label_width - LABEL_PAD;
        draw_text_artist(canvas, (x, frame.top + frame.height / 2.0), &text);
    }
}

/// Legend entries from labelled artists: lines first, then patches, then
/// filled bands, each group in drawing order.
fn collect_legend_entries(ax: &Axes) -> Vec<LegendEntry> {
    let mut ranked: Vec<(u8, LegendEntry)> = ax
        .artists
        .iter()
        .filter_map(|artist| match artist {
            Artist::Line(line) => line.label.as_ref().map(|label| {
                let handle = LegendHandle::Line {
                    color: line.color.clone(),
                    width: line.width,
                    dash: line.dash,
                    marker: line.marker.clone(),
                };
                (0, LegendEntry { label: label.clone(), handle })
            }),
            Artist::RefLine(line) => line.label.as_ref().map(|label| {
                let handle = LegendHandle::Line {
                    color: line.color.clone(),
                    width: line.width,
                    dash: line.dash,
                    marker: None,
                };
                (0, LegendEntry { label: label.clone(), handle })
            }),
            Artist::Rect(rect) => rect.label.as_ref().map(|label| {
                let handle = LegendHandle::Patch {
                    color: rect.fill.clone().unwrap_or_else(|| "none".to_string()),
                    alpha: rect.alpha,
                    edge: rect.edge.clone(),
                };
                (1, LegendEntry { label: label.clone(), handle })
            }),
            Artist::FillBetween(band) => band.label.as_ref().map(|label| {
                let handle = LegendHandle::Patch {
                    color: band.color.clone(),
                    alpha: band.alpha,
                    edge: None,
                };
                (2, LegendEntry { label: label.clone(), handle })
            }),
            _ => None,
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, entry)| entry).collect()
}

fn draw_legend(canvas: &mut Canvas, legend: &Legend, entries: &[LegendEntry], frame: Frame) {
    if entries.is_empty() {
        return;
    }
    let style = canvas.style;
    let size = legend.size.unwrap_or(style.legend_size);
    let handle_length = 2.0 * size;
    let pad = 0.4 * size;
    let text_pad = 0.8 * size;
    let row_height = size;
    let spacing = 0.5 * size;
    let margin = 0.5 * size;

    let label_width = entries
        .iter()
        .map(|entry| line_width(&entry.label, size, &style.font_family, false))
        .fold(0.0f32, f32::max);
    let width = 2.0 * pad + handle_length + text_pad + label_width;
    let count = entries.len() as f32;
    let height = 2.0 * pad + count * row_height + (count - 1.0) * spacing;

    let left = match legend.loc {
        LegendLoc::UpperLeft | LegendLoc::LowerLeft => frame.left + margin,
        LegendLoc::UpperRight | LegendLoc::LowerRight => frame.right() - margin - width,
    };
    let top = match legend.loc {
        LegendLoc::UpperLeft | LegendLoc::UpperRight => frame.top + margin,
        LegendLoc::LowerLeft | LegendLoc::LowerRight => frame.bottom() - margin - height,
    };

    if legend.frame.unwrap_or(style.legend_frame) {
        let edge = canvas.color(legend.edge_color.as_deref().unwrap_or("#cccccc"));
        let radius = if legend.rounded { 0.2 * size } else { 0.0 };
        canvas.body.push_str(&format!(
            "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{radius:.2}\" ry=\"{radius:.2}\" fill=\"{}\" fill-opacity=\"0.80\" stroke=\"{edge}\" stroke-width=\"{:.2}\"/>",
            style.background,
            style.axes_line_width
        ));
    }
    canvas
        .bounds
        .include(Bounds::of_points(&[(left, top), (left + width, top + height)]));

    let handle_x = left + pad;
    for (idx, entry) in entries.iter().enumerate() {
        let center_y = top + pad + idx as f32 * (row_height + spacing) + row_height / 2.0;
        match &entry.handle {
            LegendHandle::Line {
                color,
                width,
                dash,
                marker,
            } => {
                let color = canvas.color(color);
                let stroke_width = width.unwrap_or(style.line_width);
                if *dash != Dash::Hidden {
                    let pattern = dash_array(*dash, stroke_width)
                        .map(|pattern| format!(" stroke-dasharray=\"{pattern}\""))
                        .unwrap_or_default();
                    canvas.body.push_str(&format!(
                        "<path d=\"M {handle_x:.2} {center_y:.2} L {:.2} {center_y:.2}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{stroke_width:.2}\"{pattern}/>",
                        handle_x + handle_length
                    ));
                }
                if let Some(marker) = marker {
                    draw_marker(
                        canvas,
                        marker,
                        (handle_x + handle_length / 2.0, center_y),
                        &color,
                        1.0,
                        None,
                    );
                }
            }
            LegendHandle::Patch { color, alpha, edge } => {
                let patch_height = 0.7 * size;
                let (paint, _) = fill_and_edge(canvas, Some(color.as_str()), edge.as_deref(), Some(0.5), *alpha);
                canvas.body.push_str(&format!(
                    "<rect x=\"{handle_x:.2}\" y=\"{:.2}\" width=\"{handle_length:.2}\" height=\"{patch_height:.2}\" {paint}/>",
                    center_y - patch_height / 2.0
                ));
            }
        }
        let label = Text::new(0.0, 0.0, &entry.label)
            .size(size)
            .ha(HAlign::Left)
            .va(VAlign::Center);
        draw_text_artist(canvas, (handle_x + handle_length + text_pad, center_y), &label);
    }
}

pub fn write_output_svg(svg: &str, output: &Path) -> std::io::Result<()> {
    std::fs::write(output, svg)
}

#[cfg(feature = "png")]
static FONT_DB: once_cell::sync::Lazy<std::sync::Arc<usvg::fontdb::Database>> = once_cell::sync::Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    std::sync::Arc::new(db)
});

/// Rasterizes an SVG produced by [`render_svg`] at `dpi` pixels per inch.
#[cfg(feature = "png")]
pub fn rasterize_png(svg: &str, dpi: f32) -> Result<Vec<u8>, RenderError> {
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(RenderError::InvalidDpi(dpi));
    }
    let opt = usvg::Options {
        fontdb: FONT_DB.clone(),
        ..usvg::Options::default()
    };

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let scale = dpi / 72.0;
    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    let mut pixmap =
        resvg::tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    pixmap
        .encode_png()
        .map_err(|err| RenderError::Encode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Grid, Legend, LegendLoc};
    use crate::theme::setup_style;

    fn sample_figure() -> Figure {
        let style = setup_style();
        let mut fig = Figure::new(&style);
        let mut ax = Axes::new();
        ax.add(Line::new(vec![0.0, 10.0, 20.0], vec![0.0, 30.0, 60.0]).label("Mean"));
        ax.add(RefLine::horizontal(40.0).color("C3").dash(Dash::Dashed));
        ax.add(Text::new(5.0, 50.0, "Fish & <chips>"));
        ax.set_xlim(0.0, 45.0).set_ylim(0.0, 280.0);
        ax.set_xlabel("Days at sea").set_ylabel("Error");
        ax.grid(Grid::major().alpha(0.3));
        ax.legend(Legend::new(LegendLoc::UpperLeft).framed("black"));
        fig.add(ax);
        fig
    }

    #[test]
    fn render_svg_basic() {
        let rendered = render_svg(&sample_figure(), 0.1);
        assert!(rendered.svg.starts_with("<svg"));
        assert!(rendered.svg.ends_with("</svg>"));
        assert!(rendered.svg.contains("Days at sea"));
        assert!(rendered.svg.contains("Fish &amp; &lt;chips&gt;"));
        assert!(rendered.svg.contains("clip-0"));
        assert!(rendered.svg.contains("#FF2C00"));
        assert!(rendered.width > 0.0 && rendered.height > 0.0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let fig = sample_figure();
        assert_eq!(render_svg(&fig, 0.1), render_svg(&fig, 0.1));
    }

    #[test]
    fn tight_crop_shrinks_sparse_figures() {
        let style = setup_style();
        let mut fig = Figure::new(&style);
        let mut ax = Axes::new();
        ax.add(Text::new(0.5, 0.5, "x").centered());
        ax.set_xlim(0.0, 1.0).set_ylim(0.0, 1.0).axis_off();
        fig.add(ax);
        let rendered = render_svg(&fig, 0.1);
        let (full_w, full_h) = fig.size_points();
        assert!(rendered.width < full_w / 2.0);
        assert!(rendered.height < full_h / 2.0);
        assert!(rendered.width >= 14.4);
    }

    #[test]
    fn empty_figure_keeps_canvas_size() {
        let fig = Figure::new(&setup_style());
        let rendered = render_svg(&fig, 0.0);
        assert_eq!((rendered.width, rendered.height), fig.size_points());
    }

    #[test]
    fn autoscale_pads_and_sticks_to_zero() {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-5;
        let (lo, hi) = autoscale(Some((0.0, 4.0)), Scale::Linear, true);
        assert!(lo == 0.0 && close(hi, 4.2));
        let (lo, hi) = autoscale(Some((0.0, 4.0)), Scale::Linear, false);
        assert!(close(lo, -0.2) && close(hi, 4.2));
        assert_eq!(autoscale(None, Scale::Linear, false), (0.0, 1.0));
        let (lo, hi) = autoscale(Some((3.0, 3.0)), Scale::Linear, false);
        assert!(close(lo, 2.45) && close(hi, 3.55));
    }

    #[test]
    fn equal_aspect_shrinks_frame() {
        let mut ax = Axes::new();
        ax.set_xlim(0.0, 1.0).set_ylim(0.0, 2.0).set_aspect_equal();
        let view = View::new(
            &ax,
            Frame {
                left: 0.0,
                top: 0.0,
                width: 200.0,
                height: 100.0,
            },
        );
        assert_eq!(view.frame.height, 100.0);
        assert_eq!(view.frame.width, 50.0);
        assert_eq!(view.frame.left, 75.0);
    }

    #[test]
    fn log_axis_maps_decades_evenly() {
        let map = AxisMap {
            lo: 1e-2,
            hi: 1e2,
            scale: Scale::Log,
        };
        assert!((map.fraction(1.0) - 0.5).abs() < 1e-5);
        assert!((map.fraction(10.0) - 0.75).abs() < 1e-5);
        assert!(map.contains(100.0));
        assert!(!map.contains(1000.0));
    }

    #[test]
    fn arrow_starts_outside_label_box() {
        let bounds = Bounds::of_points(&[(-10.0, -5.0), (10.0, 5.0)]);
        let exit = exit_point((0.0, 0.0), (40.0, 0.0), bounds);
        assert_eq!(exit, (10.0, 0.0));
        let exit = exit_point((0.0, 0.0), (0.0, -20.0), bounds);
        assert_eq!(exit, (0.0, -5.0));
    }

    #[cfg(feature = "png")]
    #[test]
    fn rasterize_rejects_bad_dpi() {
        let svg = render_svg(&sample_figure(), 0.1).svg;
        for dpi in [f32::NAN, f32::INFINITY, 0.0, -72.0] {
            assert!(matches!(rasterize_png(&svg, dpi), Err(RenderError::InvalidDpi(_))));
        }
    }

    #[test]
    fn rotated_text_swaps_extent() {
        let style = setup_style();
        let mut canvas = Canvas::new(&style, (432.0, 288.0));
        let text = Text::new(0.0, 0.0, "Position error").rotation(90.0);
        let bounds = draw_text_artist(&mut canvas, (100.0, 100.0), &text);
        assert!(bounds.max_y - bounds.min_y > bounds.max_x - bounds.min_x);
        assert!(canvas.body.contains("rotate(-90.00)"));
    }
}
