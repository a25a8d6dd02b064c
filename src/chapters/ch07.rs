//! Chapter 7: The Longitude Act and Its Incentives.

use super::{Chapter, FigureEntry};
use crate::figure::{
    Axes, BarStyle, Coords, Figure, Grid, GridAxis, HAlign, Legend, LegendEntry, LegendLoc, Line, MarkerKind, Text,
    VAlign,
};
use crate::series::thousands;
use crate::theme::Style;

pub(super) const CHAPTER: Chapter = Chapter {
    number: 7,
    title: "The Longitude Act and Its Incentives",
    figures: &[
        FigureEntry {
            name: "prize-thresholds",
            build: prize_thresholds,
        },
        FigureEntry {
            name: "board-timeline",
            build: board_timeline,
        },
        FigureEntry {
            name: "competing-methods",
            build: competing_methods,
        },
    ],
};

const BLUE: &str = "#1f77b4";
const ORANGE: &str = "#ff7f0e";
const GREEN: &str = "#2ca02c";
const RED: &str = "#d62728";

/// Accuracy tiers of the 1714 Act, nautical miles.
const ACCURACY_NM: [u32; 3] = [60, 40, 30];
const PRIZE_POUNDS: [u64; 3] = [10_000, 15_000, 20_000];
/// Equivalent clock error at the equator: 60 nm is one degree, four minutes of time.
const TIME_ERROR_MIN: [f32; 3] = [4.0, 2.67, 2.0];
const ANGULAR_ERROR_DEG: [f32; 3] = [1.0, 0.67, 0.5];

fn accuracy_labels() -> Vec<String> {
    ACCURACY_NM.iter().map(|nm| format!("{nm} nm")).collect()
}

/// Prize amounts per accuracy tier, next to what each tier means physically.
fn prize_thresholds(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(7.0, 4.0).with_grid(1, 2);
    let labels = accuracy_labels();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    let positions = [0.0, 1.0, 2.0];

    let mut prizes = Axes::new();
    let heights: Vec<f32> = PRIZE_POUNDS.iter().map(|p| *p as f32).collect();
    let bars = prizes.bar(
        &positions,
        &heights,
        0.8,
        &BarStyle::colors(&[ORANGE, GREEN, BLUE]).edge("black", 0.5),
    );
    prizes
        .set_xticks(&positions, &labels)
        .set_xlabel("Accuracy requirement (nautical miles)")
        .set_ylabel("Prize amount (pounds)")
        .set_title("Longitude Act Prizes", Some(10.0))
        .set_ylim(0.0, 25_000.0)
        .grid(Grid::major().axis(GridAxis::Y).alpha(0.3));
    for (bar, prize) in bars.iter().zip(PRIZE_POUNDS) {
        prizes.add(
            Text::new(bar.center, bar.height + 500.0, &thousands(prize))
                .ha(HAlign::Center)
                .size(9.0)
                .bold(),
        );
    }
    fig.add(prizes);

    let mut meaning = Axes::new();
    let width = 0.35;
    let left: Vec<f32> = positions.iter().map(|x| x - width / 2.0).collect();
    let right: Vec<f32> = positions.iter().map(|x| x + width / 2.0).collect();
    meaning.bar(
        &left,
        &TIME_ERROR_MIN,
        width,
        &BarStyle::colors(&[BLUE]).edge("black", 0.5).label("Time error (min)"),
    );
    meaning.bar(
        &right,
        &ANGULAR_ERROR_DEG,
        width,
        &BarStyle::colors(&[ORANGE]).edge("black", 0.5).label("Angular error (deg)"),
    );
    meaning
        .set_xticks(&positions, &labels)
        .set_xlabel("Accuracy requirement")
        .set_ylabel("Equivalent error")
        .set_title("Physical Meaning", Some(10.0))
        .legend(Legend::new(LegendLoc::UpperRight).size(8.0))
        .grid(Grid::major().axis(GridAxis::Y).alpha(0.3));
    fig.add(meaning);

    fig.text(
        Text::new(
            0.5,
            0.02,
            "30 nm accuracy requires clock error < 0.5 seconds/day over 6 weeks",
        )
        .ha(HAlign::Center)
        .size(8.0)
        .italic(),
    );
    fig.tight_layout();
    fig
}

#[derive(Clone, Copy)]
enum Track {
    Policy,
    Harrison,
    Lunar,
}

impl Track {
    fn color(self) -> &'static str {
        match self {
            Track::Policy => GREEN,
            Track::Harrison => BLUE,
            Track::Lunar => ORANGE,
        }
    }
}

const BOARD_EVENTS: [(f32, &str, Track); 9] = [
    (1714.0, "Longitude Act\npasses", Track::Policy),
    (1730.0, "H1 completed", Track::Harrison),
    (1736.0, "H1 sea trial", Track::Harrison),
    (1761.0, "H4 Jamaica trial\n(5.1s error)", Track::Harrison),
    (1765.0, "Maskelyne becomes\nAstronomer Royal", Track::Lunar),
    (1767.0, "Nautical Almanac\nfirst published", Track::Lunar),
    (1772.0, "H5 tested before\nKing George III", Track::Harrison),
    (1773.0, "Harrison awarded\nfinal payment", Track::Policy),
    (1828.0, "Board dissolved", Track::Policy),
];

/// Key Board of Longitude decisions, labels alternating above and below the line.
fn board_timeline(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(8.0, 5.0);
    let mut ax = Axes::new();

    let first = BOARD_EVENTS.iter().map(|e| e.0).fold(f32::INFINITY, f32::min);
    let last = BOARD_EVENTS.iter().map(|e| e.0).fold(f32::NEG_INFINITY, f32::max);
    ax.add(Line::segment((first - 5.0, 0.0), (last + 5.0, 0.0)).color("black").width(2.0));

    for (idx, (year, label, track)) in BOARD_EVENTS.iter().enumerate() {
        let offset = if idx % 2 == 0 { 0.5 } else { -0.5 };
        let color = track.color();
        ax.add(Line::segment((*year, 0.0), (*year, offset * 0.8)).color(color).width(1.5));
        ax.add(Line::point(*year, 0.0, MarkerKind::Circle, 8.0).color(color));
        ax.add(
            Text::new(*year, offset, label)
                .size(8.0)
                .ha(HAlign::Center)
                .va(if offset > 0.0 { VAlign::Bottom } else { VAlign::Top })
                .color(color)
                .bold(),
        );
    }

    for year in (1720..1830).step_by(20) {
        ax.add(
            Text::new(year as f32, -0.12, &year.to_string())
                .size(8.0)
                .ha(HAlign::Center)
                .va(VAlign::Top)
                .color("gray"),
        );
    }

    ax.legend(
        Legend::new(LegendLoc::LowerRight).size(8.0).entries(vec![
            LegendEntry::patch(GREEN, "Policy/Board"),
            LegendEntry::patch(BLUE, "Harrison chronometers"),
            LegendEntry::patch(ORANGE, "Lunar distance method"),
        ]),
    );
    ax.set_xlim(1705.0, 1835.0).set_ylim(-1.0, 1.0).axis_off();
    fig.add(ax);
    fig
}

const CRITERIA: [&str; 4] = ["Theory", "Practicality", "Cost", "Skill\nrequired"];

/// Ratings from 1 to 5, higher is better on every criterion.
const METHOD_RATINGS: [(&str, [f32; 4]); 4] = [
    ("Lunar Distance", [5.0, 3.0, 5.0, 2.0]),
    ("Jupiter Moons", [5.0, 1.0, 3.0, 3.0]),
    ("Magnetic\nVariation", [2.0, 4.0, 5.0, 4.0]),
    ("Chronometer", [4.0, 5.0, 1.0, 5.0]),
];

/// Grouped ratings of the four proposed longitude methods.
fn competing_methods(style: &Style) -> Figure {
    let mut fig = Figure::new(style).with_size(7.0, 5.0);
    let mut ax = Axes::new();

    let width = 0.2;
    let colors = [BLUE, ORANGE, GREEN, RED];
    for (idx, (method, ratings)) in METHOD_RATINGS.iter().enumerate() {
        let positions: Vec<f32> = (0..CRITERIA.len())
            .map(|criterion| criterion as f32 + width * idx as f32)
            .collect();
        ax.bar(
            &positions,
            ratings,
            width,
            &BarStyle::colors(&[colors[idx]]).edge("black", 0.5).label(method),
        );
    }

    let centers: Vec<f32> = (0..CRITERIA.len()).map(|idx| idx as f32 + width * 1.5).collect();
    ax.set_xticks(&centers, &CRITERIA)
        .set_ylabel("Rating (higher = better)")
        .set_ylim(0.0, 6.0)
        .legend(Legend::new(LegendLoc::UpperRight).size(8.0))
        .grid(Grid::major().axis(GridAxis::Y).alpha(0.3));
    ax.add(
        Text::new(
            0.5,
            -0.12,
            "Each method had distinct trade-offs; none was obviously superior",
        )
        .coords(Coords::Axes)
        .ha(HAlign::Center)
        .size(8.0)
        .italic(),
    );

    fig.add(ax);
    fig.tight_layout();
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Artist;
    use crate::theme::setup_style;

    fn texts(ax: &Axes) -> Vec<String> {
        ax.artists
            .iter()
            .filter_map(|artist| match artist {
                Artist::Text(text) => Some(text.content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn prize_labels_use_thousands_separators() {
        let fig = prize_thresholds(&setup_style());
        assert_eq!(fig.axes.len(), 2);
        assert_eq!(texts(&fig.axes[0]), vec!["10,000", "15,000", "20,000"]);
        assert_eq!(
            fig.axes[0].xticks.as_ref().map(|ticks| ticks[2].1.clone()),
            Some("30 nm".to_string())
        );
        assert!(fig.tight);
        assert_eq!(fig.texts.len(), 1);
    }

    #[test]
    fn timeline_alternates_label_sides() {
        let fig = board_timeline(&setup_style());
        let events: Vec<VAlign> = fig.axes[0]
            .artists
            .iter()
            .filter_map(|artist| match artist {
                Artist::Text(text) if text.bold => Some(text.va),
                _ => None,
            })
            .collect();
        assert_eq!(events.len(), BOARD_EVENTS.len());
        assert_eq!(events[0], VAlign::Bottom);
        assert_eq!(events[1], VAlign::Top);
        let years: Vec<String> = texts(&fig.axes[0])
            .into_iter()
            .filter(|text| text.len() == 4 && text.parse::<u32>().is_ok())
            .collect();
        assert_eq!(years, vec!["1720", "1740", "1760", "1780", "1800", "1820"]);
    }

    #[test]
    fn methods_get_one_bar_per_criterion() {
        let fig = competing_methods(&setup_style());
        let bars = fig.axes[0]
            .artists
            .iter()
            .filter(|artist| matches!(artist, Artist::Rect(_)))
            .count();
        assert_eq!(bars, METHOD_RATINGS.len() * CRITERIA.len());
    }
}
