//! Chapter 1: The Deadly Ignorance of Position.

use super::{Chapter, FigureEntry};
use crate::figure::{
    Annotation, Arrow, ArrowStyle, Axes, Dash, Fill, FillBetween, Figure, Grid, HAlign, Legend, LegendLoc, Line,
    MarkerKind, RefLine, Text, TextBox, VAlign,
};
use crate::series::{arc, circle, interp_all, linspace, radians};
use crate::theme::Style;
use std::f32::consts::FRAC_PI_2;

pub(super) const CHAPTER: Chapter = Chapter {
    number: 1,
    title: "The Deadly Ignorance of Position",
    figures: &[
        FigureEntry {
            name: "latitude-geometry",
            build: latitude_geometry,
        },
        FigureEntry {
            name: "dead-reckoning-error",
            build: dead_reckoning_error,
        },
    ],
};

/// Cross-section of the Earth showing why the altitude of the celestial pole
/// equals the observer's latitude.
fn latitude_geometry(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(5.0, 5.0);
    let mut ax = Axes::new();

    let lat = radians(45.0);
    let (earth_x, earth_y) = circle((0.0, 0.0), 1.0, 100);
    ax.add(Line::new(earth_x.clone(), earth_y.clone()).color("black").width(1.5));
    ax.add(Fill::new(earth_x, earth_y).color("#e8e8e8").alpha(0.5));

    let observer = (lat.cos(), lat.sin());
    ax.add(Line::point(observer.0, observer.1, MarkerKind::Circle, 6.0).color("black").z(5.0));
    ax.add(Annotation::new(
        Text::new(observer.0 + 0.15, observer.1 + 0.15, "Observer").size(9.0),
        observer,
    ));

    ax.add(Annotation::arrow(
        (0.0, -1.2),
        (0.0, 1.6),
        Arrow::new(ArrowStyle::Forward, "#555555", 1.2),
    ));
    ax.add(Text::new(0.08, 1.5, "Earth's axis").size(8.0).color("#555555"));

    // The pole direction is parallel to the Earth's axis from any observer.
    let pole_end = (observer.0, observer.1 + 0.9);
    ax.add(Annotation::arrow(
        observer,
        pole_end,
        Arrow::new(ArrowStyle::Forward, "#1a1a1a", 1.5),
    ));
    ax.add(
        Text::new(pole_end.0 + 0.08, pole_end.1 - 0.05, "To celestial\npole")
            .size(8.0)
            .va(VAlign::Top),
    );

    // Horizon is tangent to the surface: perpendicular to the radius.
    let horizon_length = 0.8;
    let tangent = (-lat.sin(), lat.cos());
    let h1 = (observer.0 - horizon_length * tangent.0, observer.1 - horizon_length * tangent.1);
    let h2 = (observer.0 + horizon_length * tangent.0, observer.1 + horizon_length * tangent.1);
    ax.add(Line::segment(h1, h2).color("black").width(1.2));
    ax.add(Text::new(h2.0 + 0.05, h2.1, "Horizon").size(8.0).va(VAlign::Center));

    let (arc_x, arc_y) = arc((0.0, 0.0), 0.3, 0.0, lat, 30);
    ax.add(Line::new(arc_x, arc_y).color("black").width(1.0));
    ax.add(Text::new(0.38, 0.12, "φ").size(11.0).italic().centered());

    ax.add(
        Line::segment((0.0, 0.0), observer)
            .color("black")
            .dash(Dash::Dashed)
            .width(0.8)
            .alpha(0.6),
    );

    // Altitude of the pole, measured at the observer from the horizon.
    let pole_angle = FRAC_PI_2;
    let horizon_angle = FRAC_PI_2 + lat;
    let (alt_x, alt_y) = arc(observer, 0.25, pole_angle, horizon_angle, 30);
    ax.add(Line::new(alt_x, alt_y).color("black").width(1.0));
    let label_angle = (pole_angle + horizon_angle) / 2.0;
    ax.add(
        Text::new(
            observer.0 + 0.35 * label_angle.cos(),
            observer.1 + 0.35 * label_angle.sin(),
            "h",
        )
        .size(11.0)
        .italic()
        .centered(),
    );

    ax.add(
        Line::segment((-1.3, 0.0), (1.3, 0.0))
            .color("black")
            .dash(Dash::Dotted)
            .width(0.8)
            .alpha(0.5),
    );
    ax.add(
        Text::new(1.25, -0.1, "Equator")
            .size(8.0)
            .ha(HAlign::Right)
            .va(VAlign::Top)
            .alpha(0.7),
    );
    ax.add(Line::point(0.0, 0.0, MarkerKind::Point, 3.0).color("black"));

    ax.add(
        Text::new(0.0, -1.55, "h = φ  (pole altitude = latitude)")
            .size(10.0)
            .ha(HAlign::Center)
            .va(VAlign::Top)
            .boxed(TextBox::round("white", "#cccccc", 0.3)),
    );

    ax.set_xlim(-1.5, 1.8).set_ylim(-1.7, 1.8).set_aspect_equal().axis_off();
    fig.add(ax);
    fig
}

/// Days at sea against typical position error, 17th and 18th century records.
const VOYAGE_DAYS: [f32; 6] = [0.0, 5.0, 10.0, 20.0, 30.0, 40.0];
const ERROR_MIN_NM: [f32; 6] = [0.0, 10.0, 30.0, 60.0, 100.0, 150.0];
const ERROR_MAX_NM: [f32; 6] = [0.0, 20.0, 50.0, 100.0, 150.0, 250.0];
/// One degree of longitude near 51°N, rounded.
const DANGER_THRESHOLD_NM: f32 = 40.0;

/// Growth of dead-reckoning position error over a transatlantic voyage.
fn dead_reckoning_error(style: &Style) -> Figure {
    let mut fig = Figure::new(style);
    let mut ax = Axes::new();

    let error_mid: Vec<f32> = ERROR_MIN_NM
        .iter()
        .zip(ERROR_MAX_NM.iter())
        .map(|(lo, hi)| (lo + hi) / 2.0)
        .collect();
    let days = linspace(0.0, 45.0, 100);
    let lower = interp_all(&days, &VOYAGE_DAYS, &ERROR_MIN_NM);
    let upper = interp_all(&days, &VOYAGE_DAYS, &ERROR_MAX_NM);
    let mid = interp_all(&days, &VOYAGE_DAYS, &error_mid);

    ax.add(
        FillBetween::new(days.clone(), lower, upper)
            .color("C0")
            .alpha(0.3)
            .label("Typical error range"),
    );
    ax.add(Line::new(days, mid).color("C0").width(1.5).label("Mean estimated error"));
    ax.add(
        RefLine::horizontal(DANGER_THRESHOLD_NM)
            .color("C3")
            .dash(Dash::Dashed)
            .width(1.2)
            .label(&format!("Critical threshold ({DANGER_THRESHOLD_NM} nm)")),
    );

    ax.add(
        RefLine::vertical(40.0)
            .color("gray")
            .dash(Dash::Dotted)
            .width(0.8)
            .alpha(0.7),
    );
    ax.add(
        Text::new(40.0, 20.0, "Typical Atlantic\ncrossing")
            .size(8.0)
            .ha(HAlign::Center)
            .color("gray"),
    );

    ax.set_xlabel("Days at sea")
        .set_ylabel("Position error (nautical miles)")
        .set_xlim(0.0, 45.0)
        .set_ylim(0.0, 280.0)
        .legend(Legend::new(LegendLoc::UpperLeft).framed("black"))
        .grid(Grid::major().alpha(0.3));

    fig.add(ax);
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Artist;
    use crate::theme::setup_style;

    #[test]
    fn latitude_geometry_is_square_and_bare() {
        let fig = latitude_geometry(&setup_style());
        assert_eq!(fig.size_points(), (360.0, 360.0));
        let ax = &fig.axes[0];
        assert!(ax.aspect_equal);
        assert!(!ax.axis_visible);
        assert!(ax.artists.iter().any(|artist| matches!(
            artist,
            Artist::Text(text) if text.content.starts_with("h = φ")
        )));
    }

    #[test]
    fn threshold_label_prints_whole_miles() {
        let fig = dead_reckoning_error(&setup_style());
        let labels: Vec<&str> = fig.axes[0]
            .artists
            .iter()
            .filter_map(|artist| match artist {
                Artist::RefLine(line) => line.label.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["Critical threshold (40 nm)"]);
    }
}
