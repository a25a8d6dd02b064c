//! Tick placement and tick label formatting for linear and log axes.

#[derive(Debug, Clone, PartialEq)]
pub enum TickLabel {
    Plain(String),
    /// `10^exponent`, drawn with a superscript.
    Power(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f32,
    pub label: TickLabel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisTicks {
    pub major: Vec<Tick>,
    pub minor: Vec<f32>,
}

const NICE_MANTISSAS: [f32; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Bins that fit along an axis of `length` points without crowding labels of
/// `font_size`. `spacing` is the number of font sizes reserved per label.
pub fn max_bins(length: f32, font_size: f32, spacing: f32) -> usize {
    let per_label = (font_size * spacing).max(1.0);
    ((length / per_label).floor() as usize).clamp(3, 9)
}

/// The smallest "nice" step that splits `[lo, hi]` into at most `max_bins`
/// intervals.
pub fn nice_step(lo: f32, hi: f32, max_bins: usize) -> f32 {
    let range = (hi - lo).abs();
    if range <= f32::EPSILON || max_bins == 0 {
        return 1.0;
    }
    let raw = range / max_bins as f32;
    let magnitude = 10f32.powi(raw.log10().floor() as i32);
    for mantissa in NICE_MANTISSAS {
        let step = mantissa * magnitude;
        if range / step <= max_bins as f32 + 1e-4 {
            return step;
        }
    }
    10.0 * magnitude
}

pub fn linear_ticks(lo: f32, hi: f32, max_bins: usize, minor: bool) -> AxisTicks {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let step = nice_step(lo, hi, max_bins);
    let major_values = multiples_within(lo, hi, step);
    let major = major_values
        .iter()
        .map(|value| Tick {
            value: *value,
            label: TickLabel::Plain(format_tick(*value, step)),
        })
        .collect();

    let mut minor_values = Vec::new();
    if minor {
        let divisions = if matches!(mantissa(step), 1 | 5 | 10) { 5.0 } else { 4.0 };
        let minor_step = step / divisions;
        for value in multiples_within(lo, hi, minor_step) {
            let ratio = value / step;
            if (ratio - ratio.round()).abs() > 1e-3 {
                minor_values.push(value);
            }
        }
    }

    AxisTicks {
        major,
        minor: minor_values,
    }
}

pub fn log_ticks(lo: f32, hi: f32, minor: bool) -> AxisTicks {
    let lo = lo.max(f32::MIN_POSITIVE);
    let hi = hi.max(lo);
    let lo_exp = lo.log10();
    let hi_exp = hi.log10();

    let first = (lo_exp - 1e-4).ceil() as i32;
    let last = (hi_exp + 1e-4).floor() as i32;
    let major = (first..=last)
        .map(|exp| Tick {
            value: 10f32.powi(exp),
            label: TickLabel::Power(exp),
        })
        .collect();

    let mut minor_values = Vec::new();
    if minor {
        for exp in (lo_exp.floor() as i32)..=(hi_exp.ceil() as i32) {
            let base = 10f32.powi(exp);
            for factor in 2..=9 {
                let value = factor as f32 * base;
                if value >= lo && value <= hi {
                    minor_values.push(value);
                }
            }
        }
    }

    AxisTicks {
        major,
        minor: minor_values,
    }
}

/// Formats a tick value using just enough decimals to show `step`.
pub fn format_tick(value: f32, step: f32) -> String {
    let mut decimals = 0usize;
    let mut scaled = step.abs();
    while decimals < 6 && (scaled - scaled.round()).abs() > 1e-3 * scaled.max(1.0) {
        decimals += 1;
        scaled *= 10.0;
    }
    let text = format!("{:.*}", decimals, value);
    let text = if text.trim_start_matches('-').chars().all(|ch| ch == '0' || ch == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    };
    text.replace('-', "\u{2212}")
}

pub fn superscript_exponent(exp: i32) -> String {
    exp.to_string().replace('-', "\u{2212}")
}

fn multiples_within(lo: f32, hi: f32, step: f32) -> Vec<f32> {
    if step <= 0.0 {
        return Vec::new();
    }
    let first = (lo / step - 1e-4).ceil() as i64;
    let last = (hi / step + 1e-4).floor() as i64;
    (first..=last).map(|k| k as f32 * step).collect()
}

fn mantissa(step: f32) -> u32 {
    if step <= 0.0 {
        return 1;
    }
    let magnitude = 10f32.powi(step.log10().floor() as i32);
    (step / magnitude).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(ticks: &AxisTicks) -> Vec<String> {
        ticks
            .major
            .iter()
            .map(|tick| match &tick.label {
                TickLabel::Plain(text) => text.clone(),
                TickLabel::Power(exp) => format!("1e{exp}"),
            })
            .collect()
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() <= expected.abs() * 1e-5,
            "{actual} != {expected}"
        );
    }

    #[test]
    fn picks_nice_steps() {
        assert_close(nice_step(0.0, 45.0, 9), 5.0);
        assert_close(nice_step(0.0, 280.0, 9), 50.0);
        assert_close(nice_step(0.0, 25000.0, 6), 5000.0);
        assert_close(nice_step(0.0, 6.0, 9), 1.0);
        assert_close(nice_step(0.0, 1.0, 4), 0.25);
    }

    #[test]
    fn linear_ticks_cover_range() {
        let ticks = linear_ticks(0.0, 280.0, 9, false);
        assert_eq!(labels(&ticks), vec!["0", "50", "100", "150", "200", "250"]);
        assert!(ticks.minor.is_empty());
    }

    #[test]
    fn minor_ticks_skip_majors() {
        let ticks = linear_ticks(0.0, 10.0, 5, true);
        assert_eq!(labels(&ticks), vec!["0", "2", "4", "6", "8", "10"]);
        assert_eq!(ticks.minor.len(), 15);
        assert!(ticks.minor.iter().all(|v| (v / 2.0 - (v / 2.0).round()).abs() > 1e-3));
    }

    #[test]
    fn formats_fractional_and_negative_values() {
        assert_eq!(format_tick(2.5, 2.5), "2.5");
        assert_eq!(format_tick(0.5, 0.25), "0.50");
        assert_eq!(format_tick(-1.0, 0.5), "\u{2212}1.0");
        assert_eq!(format_tick(-0.0, 1.0), "0");
        assert_eq!(format_tick(1700.0, 100.0), "1700");
    }

    #[test]
    fn log_ticks_per_decade() {
        let ticks = log_ticks(1e-6, 200.0, true);
        assert_eq!(ticks.major.len(), 9);
        assert_eq!(ticks.major[0].label, TickLabel::Power(-6));
        assert_eq!(ticks.major[8].label, TickLabel::Power(2));
        assert!(ticks.minor.contains(&200.0));
        assert!(!ticks.minor.iter().any(|v| *v > 200.0));
    }

    #[test]
    fn bins_scale_with_axis_length() {
        assert_eq!(max_bins(30.0, 9.0, 5.0), 3);
        assert_eq!(max_bins(335.0, 9.0, 5.0), 7);
        assert_eq!(max_bins(2000.0, 9.0, 5.0), 9);
    }
}
