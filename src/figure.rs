//! In-memory figure model: a canvas of axes and the artists drawn on them.
//!
//! Artists are plain values built with chained setters and moved into an
//! [`Axes`]. Anything left unset (line widths, font sizes, colours) is filled
//! in from the figure's [`Style`] when the figure is rendered.

use crate::theme::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dash {
    Solid,
    Dashed,
    Dotted,
    DashDot,
    /// No connecting line; markers only.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Circle,
    Point,
    Star,
    TriangleDown,
    Tick,
    Square,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub size: f32,
    pub fill: Option<String>,
    pub edge_color: Option<String>,
    pub edge_width: Option<f32>,
}

impl Marker {
    pub fn new(kind: MarkerKind, size: f32) -> Self {
        Self {
            kind,
            size,
            fill: None,
            edge_color: None,
            edge_width: None,
        }
    }
}

/// Which coordinate system a position is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coords {
    Data,
    /// `(0, 0)` is the lower-left corner of the axes, `(1, 1)` the upper-right.
    Axes,
    /// Fractions of the whole figure canvas.
    Figure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
    Baseline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
    pub color: String,
    pub width: Option<f32>,
    pub dash: Dash,
    pub alpha: f32,
    pub marker: Option<Marker>,
    pub label: Option<String>,
    pub round_cap: bool,
    pub z: f32,
}

impl Line {
    pub fn new(xs: impl Into<Vec<f32>>, ys: impl Into<Vec<f32>>) -> Self {
        Self {
            xs: xs.into(),
            ys: ys.into(),
            color: "C0".to_string(),
            width: None,
            dash: Dash::Solid,
            alpha: 1.0,
            marker: None,
            label: None,
            round_cap: false,
            z: 2.0,
        }
    }

    pub fn segment(from: (f32, f32), to: (f32, f32)) -> Self {
        Self::new(vec![from.0, to.0], vec![from.1, to.1])
    }

    /// A single marker with no connecting line.
    pub fn point(x: f32, y: f32, kind: MarkerKind, size: f32) -> Self {
        Self::new(vec![x], vec![y]).dash(Dash::Hidden).marker(kind, size)
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn dash(mut self, dash: Dash) -> Self {
        self.dash = dash;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn marker(mut self, kind: MarkerKind, size: f32) -> Self {
        self.marker = Some(Marker::new(kind, size));
        self
    }

    pub fn marker_fill(mut self, color: &str) -> Self {
        if let Some(marker) = self.marker.as_mut() {
            marker.fill = Some(color.to_string());
        }
        self
    }

    pub fn marker_edge(mut self, color: &str, width: f32) -> Self {
        if let Some(marker) = self.marker.as_mut() {
            marker.edge_color = Some(color.to_string());
            marker.edge_width = Some(width);
        }
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn round_cap(mut self) -> Self {
        self.round_cap = true;
        self
    }

    pub fn z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }
}

/// Closed polygon filled with a flat colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
    pub color: String,
    pub alpha: f32,
    pub z: f32,
}

impl Fill {
    pub fn new(xs: impl Into<Vec<f32>>, ys: impl Into<Vec<f32>>) -> Self {
        Self {
            xs: xs.into(),
            ys: ys.into(),
            color: "C0".to_string(),
            alpha: 1.0,
            z: 1.0,
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Band between two curves sampled at the same x positions.
#[derive(Debug, Clone, PartialEq)]
pub struct FillBetween {
    pub xs: Vec<f32>,
    pub lower: Vec<f32>,
    pub upper: Vec<f32>,
    pub color: String,
    pub alpha: f32,
    pub label: Option<String>,
    pub z: f32,
}

impl FillBetween {
    pub fn new(xs: impl Into<Vec<f32>>, lower: impl Into<Vec<f32>>, upper: impl Into<Vec<f32>>) -> Self {
        Self {
            xs: xs.into(),
            lower: lower.into(),
            upper: upper.into(),
            color: "C0".to_string(),
            alpha: 1.0,
            label: None,
            z: 1.0,
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Axis-aligned rectangle in data coordinates, optionally with rounded
/// corners. `pad` grows the rectangle on every side before rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Option<String>,
    pub edge: Option<String>,
    pub line_width: Option<f32>,
    pub alpha: f32,
    pub pad: f32,
    pub corner_radius: f32,
    pub label: Option<String>,
    pub z: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: Some("C0".to_string()),
            edge: None,
            line_width: None,
            alpha: 1.0,
            pad: 0.0,
            corner_radius: 0.0,
            label: None,
            z: 1.0,
        }
    }

    pub fn fill(mut self, color: &str) -> Self {
        self.fill = Some(color.to_string());
        self
    }

    pub fn no_fill(mut self) -> Self {
        self.fill = None;
        self
    }

    pub fn edge(mut self, color: &str, width: f32) -> Self {
        self.edge = Some(color.to_string());
        self.line_width = Some(width);
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn rounded(mut self, pad: f32, radius: f32) -> Self {
        self.pad = pad;
        self.corner_radius = radius;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }
}

/// Circle with its radius in data units (an ellipse on unequal axes).
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: (f32, f32),
    pub radius: f32,
    pub fill: Option<String>,
    pub edge: Option<String>,
    pub line_width: Option<f32>,
    pub z: f32,
}

impl Circle {
    pub fn new(center: (f32, f32), radius: f32) -> Self {
        Self {
            center,
            radius,
            fill: None,
            edge: Some("C0".to_string()),
            line_width: None,
            z: 1.0,
        }
    }

    pub fn fill(mut self, color: &str) -> Self {
        self.fill = Some(color.to_string());
        self
    }

    pub fn edge(mut self, color: &str, width: f32) -> Self {
        self.edge = Some(color.to_string());
        self.line_width = Some(width);
        self
    }
}

/// Pie slice from `theta1` to `theta2`, degrees counter-clockwise from +x.
#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub center: (f32, f32),
    pub radius: f32,
    pub theta1: f32,
    pub theta2: f32,
    pub fill: String,
    pub edge: Option<String>,
    pub line_width: Option<f32>,
    pub z: f32,
}

impl Wedge {
    pub fn new(center: (f32, f32), radius: f32, theta1: f32, theta2: f32) -> Self {
        Self {
            center,
            radius,
            theta1,
            theta2,
            fill: "C0".to_string(),
            edge: None,
            line_width: None,
            z: 1.0,
        }
    }

    pub fn fill(mut self, color: &str) -> Self {
        self.fill = color.to_string();
        self
    }

    pub fn edge(mut self, color: &str, width: f32) -> Self {
        self.edge = Some(color.to_string());
        self.line_width = Some(width);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Line spanning the whole axes at a fixed data value.
#[derive(Debug, Clone, PartialEq)]
pub struct RefLine {
    pub orientation: Orientation,
    pub value: f32,
    pub color: String,
    pub width: Option<f32>,
    pub dash: Dash,
    pub alpha: f32,
    pub label: Option<String>,
    pub z: f32,
}

impl RefLine {
    pub fn horizontal(y: f32) -> Self {
        Self::new(Orientation::Horizontal, y)
    }

    pub fn vertical(x: f32) -> Self {
        Self::new(Orientation::Vertical, x)
    }

    fn new(orientation: Orientation, value: f32) -> Self {
        Self {
            orientation,
            value,
            color: "C0".to_string(),
            width: None,
            dash: Dash::Solid,
            alpha: 1.0,
            label: None,
            z: 2.0,
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn dash(mut self, dash: Dash) -> Self {
        self.dash = dash;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Background box drawn behind a text block. `pad` is in units of the font size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub fill: String,
    pub edge: Option<String>,
    pub pad: f32,
    pub rounded: bool,
    pub alpha: f32,
}

impl TextBox {
    pub fn round(fill: &str, edge: &str, pad: f32) -> Self {
        Self {
            fill: fill.to_string(),
            edge: Some(edge.to_string()),
            pad,
            rounded: true,
            alpha: 1.0,
        }
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Possibly multi-line text anchored at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub x: f32,
    pub y: f32,
    pub coords: Coords,
    pub content: String,
    pub size: Option<f32>,
    pub color: Option<String>,
    pub ha: HAlign,
    pub va: VAlign,
    pub bold: bool,
    pub italic: bool,
    pub alpha: f32,
    pub rotation: f32,
    pub bbox: Option<TextBox>,
    pub z: f32,
}

impl Text {
    pub fn new(x: f32, y: f32, content: &str) -> Self {
        Self {
            x,
            y,
            coords: Coords::Data,
            content: content.to_string(),
            size: None,
            color: None,
            ha: HAlign::Left,
            va: VAlign::Baseline,
            bold: false,
            italic: false,
            alpha: 1.0,
            rotation: 0.0,
            bbox: None,
            z: 3.0,
        }
    }

    pub fn coords(mut self, coords: Coords) -> Self {
        self.coords = coords;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn ha(mut self, ha: HAlign) -> Self {
        self.ha = ha;
        self
    }

    pub fn va(mut self, va: VAlign) -> Self {
        self.va = va;
        self
    }

    pub fn centered(self) -> Self {
        self.ha(HAlign::Center).va(VAlign::Center)
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn boxed(mut self, bbox: TextBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowStyle {
    /// `->`
    Forward,
    /// `<->`
    Both,
    /// `-`
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub style: ArrowStyle,
    pub color: String,
    pub width: f32,
}

impl Arrow {
    pub fn new(style: ArrowStyle, color: &str, width: f32) -> Self {
        Self {
            style,
            color: color.to_string(),
            width,
        }
    }
}

/// Text placed at `label.x, label.y` with an optional arrow pointing at `xy`.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub xy: (f32, f32),
    pub label: Text,
    pub arrow: Option<Arrow>,
}

impl Annotation {
    pub fn new(label: Text, xy: (f32, f32)) -> Self {
        Self {
            xy,
            label,
            arrow: None,
        }
    }

    /// Bare arrow from `from` to `to`.
    pub fn arrow(from: (f32, f32), to: (f32, f32), arrow: Arrow) -> Self {
        Self {
            xy: to,
            label: Text::new(from.0, from.1, ""),
            arrow: Some(arrow),
        }
    }

    pub fn with_arrow(mut self, arrow: Arrow) -> Self {
        self.arrow = Some(arrow);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Artist {
    Line(Line),
    Fill(Fill),
    FillBetween(FillBetween),
    Rect(Rect),
    Circle(Circle),
    Wedge(Wedge),
    RefLine(RefLine),
    Text(Text),
    Annotation(Annotation),
}

impl Artist {
    pub fn z(&self) -> f32 {
        match self {
            Artist::Line(line) => line.z,
            Artist::Fill(fill) => fill.z,
            Artist::FillBetween(band) => band.z,
            Artist::Rect(rect) => rect.z,
            Artist::Circle(circle) => circle.z,
            Artist::Wedge(wedge) => wedge.z,
            Artist::RefLine(line) => line.z,
            Artist::Text(text) => text.z,
            Artist::Annotation(note) => note.label.z,
        }
    }

    /// Data-space points that should be visible when the axes autoscale.
    fn data_points(&self) -> Vec<(f32, f32)> {
        match self {
            Artist::Line(line) => line.xs.iter().copied().zip(line.ys.iter().copied()).collect(),
            Artist::Fill(fill) => fill.xs.iter().copied().zip(fill.ys.iter().copied()).collect(),
            Artist::FillBetween(band) => band
                .xs
                .iter()
                .zip(band.lower.iter().zip(band.upper.iter()))
                .flat_map(|(x, (lo, hi))| [(*x, *lo), (*x, *hi)])
                .collect(),
            Artist::Rect(rect) => vec![
                (rect.x - rect.pad, rect.y - rect.pad),
                (rect.x + rect.width + rect.pad, rect.y + rect.height + rect.pad),
            ],
            Artist::Circle(circle) => vec![
                (circle.center.0 - circle.radius, circle.center.1 - circle.radius),
                (circle.center.0 + circle.radius, circle.center.1 + circle.radius),
            ],
            Artist::Wedge(wedge) => vec![
                (wedge.center.0 - wedge.radius, wedge.center.1 - wedge.radius),
                (wedge.center.0 + wedge.radius, wedge.center.1 + wedge.radius),
            ],
            Artist::RefLine(_) | Artist::Text(_) | Artist::Annotation(_) => Vec::new(),
        }
    }
}

macro_rules! impl_into_artist {
    ($($variant:ident),* $(,)?) => {
        $(impl From<$variant> for Artist {
            fn from(value: $variant) -> Self {
                Artist::$variant(value)
            }
        })*
    };
}

impl_into_artist!(Line, Fill, FillBetween, Rect, Circle, Wedge, RefLine, Text, Annotation);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    Both,
    X,
    Y,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub axis: GridAxis,
    pub minor: bool,
    pub alpha: Option<f32>,
}

impl Grid {
    pub fn major() -> Self {
        Self {
            axis: GridAxis::Both,
            minor: false,
            alpha: None,
        }
    }

    pub fn axis(mut self, axis: GridAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_minor(mut self) -> Self {
        self.minor = true;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendLoc {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegendHandle {
    Line {
        color: String,
        width: Option<f32>,
        dash: Dash,
        marker: Option<Marker>,
    },
    Patch {
        color: String,
        alpha: f32,
        edge: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub handle: LegendHandle,
}

impl LegendEntry {
    pub fn patch(color: &str, label: &str) -> Self {
        Self {
            label: label.to_string(),
            handle: LegendHandle::Patch {
                color: color.to_string(),
                alpha: 1.0,
                edge: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub loc: LegendLoc,
    pub size: Option<f32>,
    pub frame: Option<bool>,
    pub edge_color: Option<String>,
    pub rounded: bool,
    pub entries: Option<Vec<LegendEntry>>,
}

impl Legend {
    pub fn new(loc: LegendLoc) -> Self {
        Self {
            loc,
            size: None,
            frame: None,
            edge_color: None,
            rounded: true,
            entries: None,
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    /// Square-cornered frame with the given edge colour.
    pub fn framed(mut self, edge: &str) -> Self {
        self.frame = Some(true);
        self.edge_color = Some(edge.to_string());
        self.rounded = false;
        self
    }

    pub fn entries(mut self, entries: Vec<LegendEntry>) -> Self {
        self.entries = Some(entries);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub text: String,
    pub size: Option<f32>,
}

/// Styling shared by a group of bars.
#[derive(Debug, Clone, PartialEq)]
pub struct BarStyle {
    pub colors: Vec<String>,
    pub edge: Option<String>,
    pub line_width: f32,
    pub label: Option<String>,
}

impl BarStyle {
    pub fn colors(colors: &[&str]) -> Self {
        Self {
            colors: colors.iter().map(|color| color.to_string()).collect(),
            edge: None,
            line_width: 0.5,
            label: None,
        }
    }

    pub fn edge(mut self, color: &str, width: f32) -> Self {
        self.edge = Some(color.to_string());
        self.line_width = width;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Position of one drawn bar, for value labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub center: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f32,
    pub color: String,
}

impl PieSlice {
    pub fn new(label: &str, value: f32, color: &str) -> Self {
        Self {
            label: label.to_string(),
            value,
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieOptions {
    pub label_distance: f32,
    pub pct_distance: f32,
    pub label_size: Option<f32>,
    pub pct_size: Option<f32>,
    pub pct_color: Option<String>,
}

impl Default for PieOptions {
    fn default() -> Self {
        Self {
            label_distance: 1.1,
            pct_distance: 0.6,
            label_size: None,
            pct_size: None,
            pct_color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Grid { row: usize, col: usize },
    /// `[left, bottom, width, height]` as figure fractions.
    Rect([f32; 4]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub artists: Vec<Artist>,
    pub xlim: Option<(f32, f32)>,
    pub ylim: Option<(f32, f32)>,
    pub xscale: Scale,
    pub yscale: Scale,
    pub aspect_equal: bool,
    pub axis_visible: bool,
    pub xlabel: Option<AxisLabel>,
    pub ylabel: Option<AxisLabel>,
    pub title: Option<AxisLabel>,
    pub grid: Option<Grid>,
    pub xticks: Option<Vec<(f32, String)>>,
    pub yticks: Option<Vec<(f32, String)>>,
    pub legend: Option<Legend>,
    pub sticky_zero_y: bool,
    pub placement: Placement,
}

impl Default for Axes {
    fn default() -> Self {
        Self::new()
    }
}

impl Axes {
    pub fn new() -> Self {
        Self {
            artists: Vec::new(),
            xlim: None,
            ylim: None,
            xscale: Scale::Linear,
            yscale: Scale::Linear,
            aspect_equal: false,
            axis_visible: true,
            xlabel: None,
            ylabel: None,
            title: None,
            grid: None,
            xticks: None,
            yticks: None,
            legend: None,
            sticky_zero_y: false,
            placement: Placement::Grid { row: 0, col: 0 },
        }
    }

    pub fn add(&mut self, artist: impl Into<Artist>) -> &mut Self {
        self.artists.push(artist.into());
        self
    }

    pub fn set_xlim(&mut self, lo: f32, hi: f32) -> &mut Self {
        self.xlim = Some((lo, hi));
        self
    }

    pub fn set_ylim(&mut self, lo: f32, hi: f32) -> &mut Self {
        self.ylim = Some((lo, hi));
        self
    }

    pub fn set_xscale(&mut self, scale: Scale) -> &mut Self {
        self.xscale = scale;
        self
    }

    pub fn set_yscale(&mut self, scale: Scale) -> &mut Self {
        self.yscale = scale;
        self
    }

    pub fn set_aspect_equal(&mut self) -> &mut Self {
        self.aspect_equal = true;
        self
    }

    /// Hides spines, ticks and axis labels; artists are still clipped to the frame.
    pub fn axis_off(&mut self) -> &mut Self {
        self.axis_visible = false;
        self
    }

    pub fn set_xlabel(&mut self, text: &str) -> &mut Self {
        self.xlabel = Some(AxisLabel {
            text: text.to_string(),
            size: None,
        });
        self
    }

    pub fn set_ylabel(&mut self, text: &str) -> &mut Self {
        self.ylabel = Some(AxisLabel {
            text: text.to_string(),
            size: None,
        });
        self
    }

    pub fn set_title(&mut self, text: &str, size: Option<f32>) -> &mut Self {
        self.title = Some(AxisLabel {
            text: text.to_string(),
            size,
        });
        self
    }

    pub fn set_label_sizes(&mut self, size: f32) -> &mut Self {
        for label in [self.xlabel.as_mut(), self.ylabel.as_mut()].into_iter().flatten() {
            label.size = Some(size);
        }
        self
    }

    pub fn grid(&mut self, grid: Grid) -> &mut Self {
        self.grid = Some(grid);
        self
    }

    pub fn set_xticks(&mut self, positions: &[f32], labels: &[&str]) -> &mut Self {
        self.xticks = Some(
            positions
                .iter()
                .zip(labels.iter())
                .map(|(pos, label)| (*pos, label.to_string()))
                .collect(),
        );
        self
    }

    pub fn legend(&mut self, legend: Legend) -> &mut Self {
        self.legend = Some(legend);
        self
    }

    /// Vertical bars of `width` centred on `positions`. Colours cycle through
    /// `style.colors`; only the first bar carries the legend label.
    pub fn bar(&mut self, positions: &[f32], heights: &[f32], width: f32, style: &BarStyle) -> Vec<BarGeometry> {
        let mut bars = Vec::new();
        for (idx, (center, height)) in positions.iter().zip(heights.iter()).enumerate() {
            let color = if style.colors.is_empty() {
                "C0"
            } else {
                style.colors[idx % style.colors.len()].as_str()
            };
            let mut rect = Rect::new(center - width / 2.0, 0.0, width, *height).fill(color);
            if let Some(edge) = style.edge.as_deref() {
                rect = rect.edge(edge, style.line_width);
            }
            if idx == 0
                && let Some(label) = style.label.as_deref()
            {
                rect = rect.label(label);
            }
            self.artists.push(Artist::Rect(rect));
            bars.push(BarGeometry {
                center: *center,
                width,
                height: *height,
            });
        }
        self.sticky_zero_y = true;
        bars
    }

    /// Pie chart of unit radius centred on the origin, starting at 3 o'clock
    /// and running counter-clockwise. `autopct` receives each slice's share in
    /// percent and returns the text drawn inside the wedge.
    pub fn pie(&mut self, slices: &[PieSlice], options: &PieOptions, autopct: Option<&dyn Fn(f32) -> String>) {
        let total: f32 = slices.iter().map(|slice| slice.value.max(0.0)).sum();
        if total <= 0.0 {
            return;
        }
        let mut angle = 0.0f32;
        for slice in slices {
            let share = slice.value.max(0.0) / total;
            let span = share * 360.0;
            self.artists
                .push(Artist::Wedge(Wedge::new((0.0, 0.0), 1.0, angle, angle + span).fill(&slice.color)));

            let mid = (angle + span / 2.0).to_radians();
            let (cos, sin) = (mid.cos(), mid.sin());
            let mut label = Text::new(cos * options.label_distance, sin * options.label_distance, &slice.label)
                .ha(if cos >= 0.0 { HAlign::Left } else { HAlign::Right })
                .va(VAlign::Center);
            if let Some(size) = options.label_size {
                label = label.size(size);
            }
            self.artists.push(Artist::Text(label));

            if let Some(format) = autopct {
                let mut pct = Text::new(cos * options.pct_distance, sin * options.pct_distance, &format(share * 100.0))
                    .centered();
                if let Some(size) = options.pct_size.or(options.label_size) {
                    pct = pct.size(size);
                }
                if let Some(color) = options.pct_color.as_deref() {
                    pct = pct.color(color);
                }
                self.artists.push(Artist::Text(pct));
            }
            angle += span;
        }
        self.set_aspect_equal();
        self.set_xlim(-1.25, 1.25);
        self.set_ylim(-1.25, 1.25);
        self.axis_off();
    }

    /// Data extent covered by the artists, if any carry data points.
    pub fn data_extent(&self) -> Option<((f32, f32), (f32, f32))> {
        let mut points = self
            .artists
            .iter()
            .flat_map(|artist| artist.data_points())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .filter(|(x, y)| {
                (self.xscale == Scale::Linear || *x > 0.0) && (self.yscale == Scale::Linear || *y > 0.0)
            });
        let (x0, y0) = points.next()?;
        let mut extent = ((x0, x0), (y0, y0));
        for (x, y) in points {
            extent.0.0 = extent.0.0.min(x);
            extent.0.1 = extent.0.1.max(x);
            extent.1.0 = extent.1.0.min(y);
            extent.1.1 = extent.1.1.max(y);
        }
        Some(extent)
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.xlabel.is_none() && self.ylabel.is_none() && self.title.is_none()
    }
}

/// A drawable canvas: one or more axes plus free-standing figure text.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    style: Style,
    pub width_in: f32,
    pub height_in: f32,
    pub axes: Vec<Axes>,
    pub texts: Vec<Text>,
    pub rows: usize,
    pub cols: usize,
    pub tight: bool,
    next_slot: usize,
}

impl Figure {
    pub fn new(style: &Style) -> Self {
        Self {
            style: style.clone(),
            width_in: style.figure_size.0,
            height_in: style.figure_size.1,
            axes: Vec::new(),
            texts: Vec::new(),
            rows: 1,
            cols: 1,
            tight: false,
            next_slot: 0,
        }
    }

    pub fn with_size(mut self, width_in: f32, height_in: f32) -> Self {
        self.width_in = width_in;
        self.height_in = height_in;
        self
    }

    pub fn with_grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
        self
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Size of the canvas in points.
    pub fn size_points(&self) -> (f32, f32) {
        (self.width_in * 72.0, self.height_in * 72.0)
    }

    /// Places `axes` in the next free grid cell, row by row. Adding more axes
    /// than the grid has cells is a programming error; release builds stack
    /// the extra axes on the last row and log a warning.
    pub fn add(&mut self, mut axes: Axes) {
        let slot = self.next_slot;
        let cells = self.rows * self.cols;
        debug_assert!(
            slot < cells,
            "axes {} does not fit a {}x{} grid",
            slot + 1,
            self.rows,
            self.cols
        );
        if slot >= cells {
            tracing::warn!(slot, rows = self.rows, cols = self.cols, "axes overflow the subplot grid");
        }
        self.next_slot += 1;
        axes.placement = Placement::Grid {
            row: (slot / self.cols).min(self.rows - 1),
            col: slot % self.cols,
        };
        self.axes.push(axes);
    }

    pub fn add_inset(&mut self, mut axes: Axes, rect: [f32; 4]) {
        axes.placement = Placement::Rect(rect);
        self.axes.push(axes);
    }

    /// Text positioned in figure fractions.
    pub fn text(&mut self, text: Text) {
        self.texts.push(text.coords(Coords::Figure));
    }

    /// Shrinks the margins around grid axes to fit their decorations.
    pub fn tight_layout(&mut self) {
        self.tight = true;
    }

    pub fn is_empty(&self) -> bool {
        self.axes.iter().all(Axes::is_empty) && self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::setup_style;

    #[test]
    fn figure_takes_style_size() {
        let style = setup_style();
        let fig = Figure::new(&style);
        assert_eq!(fig.size_points(), (432.0, 288.0));
        assert_eq!(fig.clone().with_size(5.0, 5.0).size_points(), (360.0, 360.0));
        assert!(fig.is_empty());
    }

    #[test]
    fn grid_slots_fill_row_by_row() {
        let mut fig = Figure::new(&setup_style()).with_grid(1, 2);
        fig.add(Axes::new());
        fig.add(Axes::new());
        fig.add_inset(Axes::new(), [0.1, 0.1, 0.2, 0.2]);
        assert_eq!(fig.axes[0].placement, Placement::Grid { row: 0, col: 0 });
        assert_eq!(fig.axes[1].placement, Placement::Grid { row: 0, col: 1 });
        assert_eq!(fig.axes[2].placement, Placement::Rect([0.1, 0.1, 0.2, 0.2]));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "does not fit a 1x2 grid")]
    fn extra_grid_axes_are_rejected() {
        let mut fig = Figure::new(&setup_style()).with_grid(1, 2);
        fig.add(Axes::new());
        fig.add(Axes::new());
        fig.add(Axes::new());
    }

    #[test]
    fn extent_covers_lines_and_bands() {
        let mut ax = Axes::new();
        ax.add(Line::new(vec![0.0, 10.0], vec![1.0, 5.0]));
        ax.add(FillBetween::new(vec![2.0, 4.0], vec![-3.0, 0.0], vec![8.0, 9.0]));
        ax.add(Text::new(100.0, 100.0, "ignored"));
        assert_eq!(ax.data_extent(), Some(((0.0, 10.0), (-3.0, 9.0))));
    }

    #[test]
    fn log_axes_ignore_non_positive_points() {
        let mut ax = Axes::new();
        ax.set_yscale(Scale::Log);
        ax.add(Line::new(vec![1.0, 2.0, 3.0], vec![0.0, 0.1, 100.0]));
        assert_eq!(ax.data_extent(), Some(((2.0, 3.0), (0.1, 100.0))));
    }

    #[test]
    fn bar_labels_only_first_rect() {
        let mut ax = Axes::new();
        let bars = ax.bar(
            &[0.0, 1.0, 2.0],
            &[4.0, 2.5, 2.0],
            0.35,
            &BarStyle::colors(&["#1f77b4"]).edge("black", 0.5).label("Time"),
        );
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].height, 2.5);
        let labelled = ax
            .artists
            .iter()
            .filter(|artist| matches!(artist, Artist::Rect(rect) if rect.label.is_some()))
            .count();
        assert_eq!(labelled, 1);
        assert!(ax.sticky_zero_y);
    }

    #[test]
    fn pie_wedges_cover_full_turn() {
        let mut ax = Axes::new();
        let slices = [
            PieSlice::new("a", 1.0, "red"),
            PieSlice::new("b", 3.0, "blue"),
        ];
        let format: &dyn Fn(f32) -> String = &|pct: f32| format!("{pct:.0}%");
        ax.pie(&slices, &PieOptions::default(), Some(format));
        let wedges: Vec<&Wedge> = ax
            .artists
            .iter()
            .filter_map(|artist| match artist {
                Artist::Wedge(wedge) => Some(wedge),
                _ => None,
            })
            .collect();
        assert_eq!(wedges.len(), 2);
        assert_eq!(wedges[0].theta1, 0.0);
        assert!((wedges[0].theta2 - 90.0).abs() < 1e-4);
        assert!((wedges[1].theta2 - 360.0).abs() < 1e-3);
        let texts: Vec<&str> = ax
            .artists
            .iter()
            .filter_map(|artist| match artist {
                Artist::Text(text) => Some(text.content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["a", "25%", "b", "75%"]);
        assert!(ax.aspect_equal && !ax.axis_visible);
    }
}
