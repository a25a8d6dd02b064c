//! Chapter 13: The Airy Transit Circle.

use super::{Chapter, FigureEntry};
use crate::figure::{
    Annotation, Arrow, ArrowStyle, Axes, Circle, Dash, Fill, Figure, Grid, HAlign, Legend, LegendLoc, Line,
    MarkerKind, PieOptions, PieSlice, Rect, RefLine, Scale, Text, TextBox, VAlign,
};
use crate::series::radians;
use crate::theme::Style;

pub(super) const CHAPTER: Chapter = Chapter {
    number: 13,
    title: "The Airy Transit Circle",
    figures: &[
        FigureEntry {
            name: "transit-circle-schematic",
            build: transit_circle_schematic,
        },
        FigureEntry {
            name: "personal-equation",
            build: personal_equation,
        },
        FigureEntry {
            name: "precision-evolution",
            build: precision_evolution,
        },
        FigureEntry {
            name: "prime-meridian-offset",
            build: prime_meridian_offset,
        },
        FigureEntry {
            name: "error-budget",
            build: error_budget,
        },
        FigureEntry {
            name: "observation-reduction",
            build: observation_reduction,
        },
    ],
};

const BROWN: &str = "#8B4513";
const NOTE_EDGE: &str = "#cccccc";

fn note_box() -> TextBox {
    TextBox::round("white", NOTE_EDGE, 0.3)
}

/// Telescope, pivot axis, graduated circle and reading microscope, with the
/// eyepiece reticule as an inset.
fn transit_circle_schematic(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(7.0, 6.0);
    let mut ax = Axes::new();

    let axis_y = 2.5;
    ax.add(Line::segment((-3.0, axis_y), (3.0, axis_y)).color("black").width(8.0));
    ax.add(
        Text::new(3.2, axis_y, "Pivot axis\n(E-W)")
            .size(8.0)
            .va(VAlign::Center),
    );

    // V-bearings under each end of the axis.
    for x in [-2.5f32, 2.5] {
        ax.add(
            Line::new(vec![x - 0.2, x, x + 0.2], vec![axis_y - 0.3, axis_y - 0.1, axis_y - 0.3])
                .color("black")
                .width(2.0),
        );
        ax.add(
            Fill::new(
                vec![x - 0.2, x, x + 0.2, x + 0.2, x - 0.2],
                vec![axis_y - 0.3, axis_y - 0.1, axis_y - 0.3, axis_y - 0.5, axis_y - 0.5],
            )
            .color("gray")
            .alpha(0.5),
        );
    }

    // Tube tilted 30° from the vertical so its parts stay visible.
    let tilt = radians(30.0);
    let tube_length = 3.0;
    let tube_end = (tube_length * tilt.sin(), axis_y - tube_length * tilt.cos());
    ax.add(
        Line::segment((0.0, axis_y), tube_end)
            .color(BROWN)
            .width(15.0)
            .round_cap(),
    );

    ax.add(
        Line::segment((tube_end.0 - 0.3, tube_end.1 - 0.1), (tube_end.0 + 0.3, tube_end.1 + 0.1))
            .color("blue")
            .width(4.0),
    );
    ax.add(Text::new(tube_end.0 + 0.5, tube_end.1, "Objective\nlens").size(7.0));

    let eye = (-0.3 * tilt.sin(), axis_y + 0.3 * tilt.cos());
    ax.add(Line::segment((eye.0 - 0.2, eye.1), (eye.0 + 0.2, eye.1)).color("black").width(4.0));
    ax.add(Text::new(eye.0 - 0.5, eye.1 + 0.2, "Eyepiece").size(7.0).ha(HAlign::Right));

    let circle_x = 2.0;
    ax.add(Circle::new((circle_x, axis_y), 1.2).edge("#1f77b4", 2.0));
    for angle in (0..360).step_by(15) {
        let theta = radians(angle as f32);
        let (cos, sin) = (theta.cos(), theta.sin());
        ax.add(
            Line::segment(
                (circle_x + 1.1 * cos, axis_y + 1.1 * sin),
                (circle_x + 1.3 * cos, axis_y + 1.3 * sin),
            )
            .color("black")
            .width(0.5),
        );
    }
    ax.add(
        Text::new(circle_x, axis_y + 1.7, "Graduated\ncircle")
            .size(8.0)
            .ha(HAlign::Center)
            .color("#1f77b4"),
    );

    ax.add(
        Line::segment((circle_x + 0.8, axis_y + 0.8), (circle_x + 1.5, axis_y + 1.3))
            .color("black")
            .width(2.0),
    );
    ax.add(Line::point(circle_x + 1.5, axis_y + 1.3, MarkerKind::Circle, 6.0).color("black"));
    ax.add(Text::new(circle_x + 1.7, axis_y + 1.3, "Reading\nmicroscope").size(7.0));

    let star_distance = 2.5;
    let star = (
        tube_end.0 + star_distance * tilt.sin(),
        tube_end.1 - star_distance * tilt.cos(),
    );
    ax.add(Annotation::arrow(
        star,
        (tube_end.0 + 0.2, tube_end.1 - 0.2),
        Arrow::new(ArrowStyle::Forward, "gold", 2.0),
    ));
    ax.add(
        Line::point(star.0, star.1, MarkerKind::Star, 15.0)
            .color("gold")
            .marker_edge("black", 0.5),
    );
    ax.add(Text::new(star.0 + 0.3, star.1, "Starlight").size(8.0).color("#B8860B"));

    ax.add(
        Line::segment((0.0, -1.0), (0.0, 5.0))
            .color("green")
            .dash(Dash::Dashed)
            .width(1.0)
            .alpha(0.5),
    );
    ax.add(Text::new(0.1, 4.5, "Meridian\nplane").size(8.0).color("green"));

    // Striding level resting on the axis, with its bubble.
    ax.add(Rect::new(-0.8, axis_y + 0.1, 1.6, 0.3).fill("#87CEEB").edge("black", 1.0));
    ax.add(Line::point(0.0, axis_y + 0.25, MarkerKind::Circle, 4.0).color("white"));
    ax.add(Text::new(0.0, axis_y + 0.6, "Level").size(7.0).ha(HAlign::Center));

    ax.set_xlim(-4.0, 5.0).set_ylim(-2.0, 5.5).set_aspect_equal().axis_off();
    fig.add(ax);

    let mut reticule = Axes::new();
    for x in [-0.6, -0.3, 0.0, 0.3, 0.6] {
        reticule.add(RefLine::vertical(x).color("black").width(0.5));
    }
    reticule.add(RefLine::horizontal(0.0).color("black").width(0.5));
    reticule.add(Line::point(0.1, 0.1, MarkerKind::Star, 8.0).color("gold"));
    reticule
        .set_xlim(-1.0, 1.0)
        .set_ylim(-1.0, 1.0)
        .set_aspect_equal()
        .set_title("Reticule", Some(8.0))
        .axis_off();
    fig.add_inset(reticule, [0.08, 0.12, 0.22, 0.22]);

    fig
}

/// Observer, recorded time, colour, offset label.
const OBSERVERS: [(&str, f32, f32, &str, &str); 3] = [
    ("Airy", 2.7, 1.5, "#1f77b4", "-0.32s (early)"),
    ("Assistant", 3.4, 2.0, "#ff7f0e", "+0.18s (late)"),
    ("Mean", 3.05, 2.5, "#2ca02c", "Corrected"),
];
const TRUE_TRANSIT: f32 = 3.0;

/// Systematic timing bias of individual observers against the true transit.
fn personal_equation(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(7.0, 4.0);
    let mut ax = Axes::new();

    ax.add(RefLine::horizontal(0.5).color("black").width(2.0));
    ax.add(
        Line::point(TRUE_TRANSIT, 0.5, MarkerKind::Tick, 20.0)
            .color("black")
            .marker_edge("black", 2.0),
    );
    ax.add(
        Text::new(TRUE_TRANSIT, 0.2, "True transit\ntime")
            .size(9.0)
            .ha(HAlign::Center),
    );

    for (name, time, height, color, note) in OBSERVERS {
        ax.add(Line::point(time, 0.5, MarkerKind::TriangleDown, 12.0).color(color));
        ax.add(
            Line::segment((time, 0.5), (time, height))
                .color(color)
                .dash(Dash::Dashed)
                .width(1.0)
                .alpha(0.5),
        );
        ax.add(
            Text::new(time, height + 0.1, &format!("{name}\n{note}"))
                .size(8.0)
                .ha(HAlign::Center)
                .color(color)
                .bold(),
        );
    }

    ax.add(Annotation::arrow(
        (2.7, 1.3),
        (TRUE_TRANSIT, 1.3),
        Arrow::new(ArrowStyle::Forward, "#1f77b4", 1.5),
    ));
    ax.add(Annotation::arrow(
        (3.4, 1.8),
        (TRUE_TRANSIT, 1.8),
        Arrow::new(ArrowStyle::Forward, "#ff7f0e", 1.5),
    ));
    ax.add(Text::new(2.85, 1.4, "+0.32s").size(7.0).ha(HAlign::Center).color("#1f77b4"));
    ax.add(Text::new(3.2, 1.9, "-0.18s").size(7.0).ha(HAlign::Center).color("#ff7f0e"));

    ax.add(Text::new(1.0, 0.5, "Time").size(9.0).ha(HAlign::Right).va(VAlign::Center));
    for t in [2.0, 2.5, 3.0, 3.5, 4.0] {
        ax.add(Line::point(t, 0.45, MarkerKind::Tick, 8.0).color("gray"));
    }

    ax.add(
        Text::new(
            TRUE_TRANSIT,
            -0.3,
            "Personal equation: systematic observer timing bias\nMust be measured and corrected for each observer",
        )
        .size(9.0)
        .ha(HAlign::Center)
        .boxed(note_box()),
    );

    ax.set_xlim(0.5, 5.0).set_ylim(-0.8, 3.0).axis_off();
    fig.add(ax);
    fig
}

/// Instrument, epoch, typical error in arcseconds, label offset (years, factor).
const INSTRUMENTS: [(&str, f32, f32, (f32, f32)); 7] = [
    ("Tycho's quadrant", 1600.0, 90.0, (10.0, 1.3)),
    ("Flamsteed's mural arc", 1700.0, 15.0, (10.0, 1.3)),
    ("Bradley's zenith sector", 1750.0, 2.5, (10.0, 1.3)),
    ("Airy's transit circle", 1850.0, 0.35, (10.0, 1.3)),
    ("Photographic astrometry", 1900.0, 0.1, (-80.0, 1.3)),
    ("CCD astrometry", 2000.0, 0.01, (10.0, 0.7)),
    ("Gaia satellite", 2020.0, 0.00001, (10.0, 1.3)),
];
const AIRY_INDEX: usize = 3;

/// Four centuries of positional accuracy on a log scale, Tycho to Gaia.
fn precision_evolution(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(7.0, 4.5);
    let mut ax = Axes::new();
    ax.set_yscale(Scale::Log);

    let years: Vec<f32> = INSTRUMENTS.iter().map(|i| i.1).collect();
    let errors: Vec<f32> = INSTRUMENTS.iter().map(|i| i.2).collect();
    ax.add(
        Line::new(years, errors)
            .color("blue")
            .width(2.0)
            .marker(MarkerKind::Circle, 8.0),
    );

    for (name, year, error, (dx, factor)) in INSTRUMENTS {
        let ha = if dx > 0.0 { HAlign::Left } else { HAlign::Right };
        ax.add(Annotation::new(
            Text::new(year + dx, error * factor, name).size(7.0).ha(ha),
            (year, error),
        ));
    }

    let (_, airy_year, airy_error, _) = INSTRUMENTS[AIRY_INDEX];
    ax.add(
        Line::point(airy_year, airy_error, MarkerKind::Circle, 12.0)
            .color("red")
            .z(5.0),
    );
    ax.add(
        Annotation::new(
            Text::new(1870.0, 2.0, "Airy Transit Circle").size(9.0).bold().color("red"),
            (airy_year, airy_error),
        )
        .with_arrow(Arrow::new(ArrowStyle::Forward, "red", 1.5)),
    );

    ax.add(
        RefLine::horizontal(1.0)
            .color("gray")
            .dash(Dash::Dashed)
            .width(0.5)
            .alpha(0.5),
    );
    ax.add(Text::new(1560.0, 1.2, "1 arcsec").size(7.0).color("gray"));

    ax.set_xlabel("Year")
        .set_ylabel("Typical Error (arcseconds)")
        .set_label_sizes(10.0)
        .set_xlim(1550.0, 2050.0)
        .set_ylim(1e-6, 200.0)
        .grid(Grid::major().with_minor().alpha(0.3));

    fig.add(ax);
    fig.tight_layout();
    fig
}

/// Display scale for the 102 m separation of the two meridians.
const MERIDIAN_OFFSET: f32 = 102.0 * 0.5;

/// Plan view of Greenwich: Airy's meridian against the WGS84 zero meridian.
fn prime_meridian_offset(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(6.0, 5.0);
    let mut ax = Axes::new();

    ax.add(
        Rect::new(-50.0, -30.0, 100.0, 60.0)
            .fill("#d4c4a8")
            .edge("black", 1.5),
    );
    ax.add(Text::new(0.0, 0.0, "Greenwich\nObservatory").size(9.0).centered());

    ax.add(
        RefLine::vertical(0.0)
            .color(BROWN)
            .width(4.0)
            .label("Airy Meridian (1884)"),
    );
    ax.add(
        Text::new(-5.0, 60.0, "Airy's\nTransit Circle\nMeridian")
            .size(8.0)
            .ha(HAlign::Right)
            .color(BROWN)
            .bold(),
    );

    ax.add(
        RefLine::vertical(MERIDIAN_OFFSET)
            .color("#1f77b4")
            .width(4.0)
            .dash(Dash::Dashed)
            .label("WGS84 Meridian"),
    );
    ax.add(
        Text::new(MERIDIAN_OFFSET + 5.0, 60.0, "WGS84\nMeridian\n(GPS)")
            .size(8.0)
            .color("#1f77b4")
            .bold(),
    );

    ax.add(Annotation::arrow(
        (0.0, -50.0),
        (MERIDIAN_OFFSET, -50.0),
        Arrow::new(ArrowStyle::Both, "green", 2.0),
    ));
    ax.add(
        Text::new(MERIDIAN_OFFSET / 2.0, -55.0, "102 meters")
            .size(10.0)
            .ha(HAlign::Center)
            .color("green")
            .bold(),
    );

    let compass = (-70.0, 50.0);
    ax.add(Annotation::arrow(
        compass,
        (compass.0, compass.1 + 15.0),
        Arrow::new(ArrowStyle::Forward, "black", 1.5),
    ));
    ax.add(
        Text::new(compass.0, compass.1 + 18.0, "N")
            .size(9.0)
            .ha(HAlign::Center)
            .bold(),
    );
    ax.add(Annotation::arrow(
        compass,
        (compass.0 + 10.0, compass.1),
        Arrow::new(ArrowStyle::Forward, "black", 1.0),
    ));
    ax.add(Text::new(compass.0 + 13.0, compass.1, "E").size(8.0));

    for y in [-20.0, -10.0, 0.0, 10.0] {
        ax.add(Line::point(0.0, y, MarkerKind::Circle, 4.0).color("#ff7f0e"));
    }
    ax.add(Text::new(15.0, -20.0, "Tourists on\nbrass line").size(7.0).color("#ff7f0e"));

    ax.add(
        Text::new(
            0.0,
            -68.0,
            "The historic Prime Meridian and modern GPS reference differ\ndue to improved measurement of Earth's gravitational field",
        )
        .size(8.0)
        .ha(HAlign::Center)
        .boxed(note_box()),
    );

    ax.set_xlim(-100.0, 100.0)
        .set_ylim(-70.0, 80.0)
        .set_aspect_equal()
        .axis_off()
        .legend(Legend::new(LegendLoc::LowerRight).size(8.0));
    fig.add(ax);
    fig
}

/// Error source, typical magnitude in arcseconds, colour.
const ERROR_SOURCES: [(&str, f32, &str); 7] = [
    ("Personal equation\n(after correction)", 0.15, "#1f77b4"),
    ("Refraction\nuncertainty", 0.3, "#ff7f0e"),
    ("Graduation errors", 0.25, "#2ca02c"),
    ("Flexure", 0.15, "#d62728"),
    ("Pivot irregularity", 0.1, "#9467bd"),
    ("Thermal drift", 0.1, "#8c564b"),
    ("Atmospheric\nturbulence", 0.35, "#e377c2"),
];

/// Root-sum-square of independent error magnitudes.
fn combined_error(magnitudes: impl IntoIterator<Item = f32>) -> f32 {
    magnitudes.into_iter().map(|m| m * m).sum::<f32>().sqrt()
}

/// Share of the total variance per error source; wedges are labelled with
/// the equivalent magnitude.
fn error_budget(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(6.0, 5.0);
    let mut ax = Axes::new();

    // Variances add, so wedges are sized by the squared magnitudes.
    let slices: Vec<PieSlice> = ERROR_SOURCES
        .iter()
        .map(|(label, magnitude, color)| PieSlice::new(label, magnitude * magnitude, color))
        .collect();
    let total_variance: f32 = slices.iter().map(|slice| slice.value).sum();
    let magnitude_label: &dyn Fn(f32) -> String =
        &|pct: f32| format!("{:.2}\"", (pct / 100.0 * total_variance).sqrt());
    let options = PieOptions {
        label_distance: 1.15,
        pct_distance: 0.7,
        label_size: Some(8.0),
        pct_size: Some(7.0),
        pct_color: Some("white".to_string()),
    };
    ax.pie(&slices, &options, Some(magnitude_label));
    ax.set_title("Error Budget (typical magnitudes in arcseconds)", Some(10.0));

    let total = combined_error(ERROR_SOURCES.iter().map(|source| source.1));
    ax.add(
        Text::new(0.0, -1.4, &format!("Combined error (RSS): {total:.2} arcseconds"))
            .size(9.0)
            .ha(HAlign::Center)
            .boxed(note_box()),
    );

    fig.add(ax);
    fig
}

const REDUCTION_STEPS: [(&str, f32, &str); 5] = [
    ("Raw observation:\nClock time + altitude", 4.0, "#e6f3ff"),
    ("Personal equation\ncorrection", 3.0, "#fff2e6"),
    ("Refraction\ncorrection", 2.0, "#ffe6e6"),
    ("Sidereal time\nconversion", 1.0, "#e6ffe6"),
    ("Final coordinates:\nRA and Dec", 0.0, "#f0e6ff"),
];
const FORMULAS: [(f32, &str); 3] = [
    (3.0, "t(corr) = t(obs) + PE"),
    (2.0, "h(true) = h(obs) − R"),
    (1.0, "α = α₀ + 1.0027 × t"),
];

/// Flow of a transit observation from raw clock reading to catalogue position.
fn observation_reduction(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(7.0, 5.0);
    let mut ax = Axes::new();

    let (box_width, box_height) = (2.2, 0.6);
    for (label, y, color) in REDUCTION_STEPS {
        ax.add(
            Rect::new(-box_width / 2.0, y - box_height / 2.0, box_width, box_height)
                .fill(color)
                .edge("black", 1.0)
                .rounded(0.05, 0.1),
        );
        ax.add(Text::new(0.0, y, label).size(9.0).centered());
    }

    for pair in REDUCTION_STEPS.windows(2) {
        let from = pair[0].1 - box_height / 2.0;
        let to = pair[1].1 + box_height / 2.0;
        ax.add(Annotation::arrow(
            (0.0, from),
            (0.0, to),
            Arrow::new(ArrowStyle::Forward, "black", 1.2),
        ));
    }

    for (y, formula) in FORMULAS {
        ax.add(
            Text::new(1.5, y, formula)
                .size(9.0)
                .italic()
                .va(VAlign::Center)
                .boxed(TextBox::round("white", NOTE_EDGE, 0.2).alpha(0.8)),
        );
    }

    ax.set_xlim(-2.5, 3.5).set_ylim(-0.8, 4.8).axis_off();
    fig.add(ax);
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Artist, Placement};
    use crate::theme::setup_style;

    #[test]
    fn combined_error_is_root_sum_square() {
        let total = combined_error(ERROR_SOURCES.iter().map(|source| source.1));
        assert!((total - 0.5831).abs() < 1e-3, "{total}");
        assert_eq!(combined_error([3.0, 4.0]), 5.0);
    }

    #[test]
    fn schematic_has_reticule_inset() {
        let fig = transit_circle_schematic(&setup_style());
        assert_eq!(fig.axes.len(), 2);
        assert_eq!(fig.axes[1].placement, Placement::Rect([0.08, 0.12, 0.22, 0.22]));
        assert_eq!(
            fig.axes[1].title.as_ref().map(|title| title.text.as_str()),
            Some("Reticule")
        );
    }

    #[test]
    fn error_budget_labels_magnitudes() {
        let fig = error_budget(&setup_style());
        let texts: Vec<&str> = fig.axes[0]
            .artists
            .iter()
            .filter_map(|artist| match artist {
                Artist::Text(text) => Some(text.content.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"0.35\""));
        assert!(texts.contains(&"Combined error (RSS): 0.58 arcseconds"));
    }

    #[test]
    fn precision_chart_is_logarithmic() {
        let fig = precision_evolution(&setup_style());
        let ax = &fig.axes[0];
        assert_eq!(ax.yscale, Scale::Log);
        assert_eq!(ax.ylim, Some((1e-6, 200.0)));
        assert!(ax.grid.as_ref().is_some_and(|grid| grid.minor));
    }

    #[test]
    fn reduction_has_arrow_between_each_step() {
        let fig = observation_reduction(&setup_style());
        let arrows = fig.axes[0]
            .artists
            .iter()
            .filter(|artist| matches!(artist, Artist::Annotation(note) if note.arrow.is_some()))
            .count();
        assert_eq!(arrows, REDUCTION_STEPS.len() - 1);
    }
}
