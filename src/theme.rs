use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StyleError {
    #[error("unknown base theme `{0}` (expected `science` or `plain`)")]
    UnknownTheme(String),
}

/// Rendering defaults shared by every figure of a run.
///
/// Sizes are in points (1/72 inch) unless noted; the figure size is in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    pub figure_size: (f32, f32),
    pub dpi: f32,
    pub font_family: String,
    pub font_size: f32,
    pub label_size: f32,
    pub title_size: f32,
    pub legend_size: f32,
    pub xtick_size: f32,
    pub ytick_size: f32,
    pub line_width: f32,
    pub axes_line_width: f32,
    pub grid_line_width: f32,
    pub grid_alpha: f32,
    pub grid_color: String,
    pub text_color: String,
    pub background: String,
    pub marker_size: f32,
    pub color_cycle: Vec<String>,
    pub ticks_inward: bool,
    pub mirror_ticks: bool,
    pub minor_ticks: bool,
    pub major_tick_size: f32,
    pub minor_tick_size: f32,
    pub major_tick_width: f32,
    pub minor_tick_width: f32,
    pub tick_pad: f32,
    pub legend_frame: bool,
}

impl Style {
    /// Journal-like theme: inward ticks on all four sides, minor ticks, serif text.
    pub fn science() -> Self {
        Self {
            name: "science".to_string(),
            figure_size: (3.5, 2.625),
            dpi: 600.0,
            font_family: "'DejaVu Serif', 'Times New Roman', Times, serif".to_string(),
            font_size: 8.0,
            label_size: 8.0,
            title_size: 8.0,
            legend_size: 8.0,
            xtick_size: 8.0,
            ytick_size: 8.0,
            line_width: 1.0,
            axes_line_width: 0.5,
            grid_line_width: 0.5,
            grid_alpha: 1.0,
            grid_color: "#b0b0b0".to_string(),
            text_color: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
            marker_size: 6.0,
            color_cycle: [
                "#0C5DA5", "#00B945", "#FF9500", "#FF2C00", "#845B97", "#474747", "#9e9e9e",
            ]
            .iter()
            .map(|value| value.to_string())
            .collect(),
            ticks_inward: true,
            mirror_ticks: true,
            minor_ticks: true,
            major_tick_size: 3.0,
            minor_tick_size: 1.5,
            major_tick_width: 0.5,
            minor_tick_width: 0.5,
            tick_pad: 3.5,
            legend_frame: false,
        }
    }

    /// Plotting-library defaults: outward ticks on the bottom and left only.
    pub fn plain() -> Self {
        Self {
            name: "plain".to_string(),
            figure_size: (6.4, 4.8),
            dpi: 100.0,
            font_family: "'DejaVu Sans', Arial, Helvetica, sans-serif".to_string(),
            font_size: 10.0,
            label_size: 10.0,
            title_size: 12.0,
            legend_size: 10.0,
            xtick_size: 10.0,
            ytick_size: 10.0,
            line_width: 1.5,
            axes_line_width: 0.8,
            grid_line_width: 0.8,
            grid_alpha: 1.0,
            grid_color: "#b0b0b0".to_string(),
            text_color: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
            marker_size: 6.0,
            color_cycle: [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf",
            ]
            .iter()
            .map(|value| value.to_string())
            .collect(),
            ticks_inward: false,
            mirror_ticks: false,
            minor_ticks: false,
            major_tick_size: 3.5,
            minor_tick_size: 2.0,
            major_tick_width: 0.8,
            minor_tick_width: 0.6,
            tick_pad: 3.5,
            legend_frame: true,
        }
    }

    pub fn named(name: &str) -> Result<Self, StyleError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "science" => Ok(Self::science()),
            "plain" | "default" => Ok(Self::plain()),
            other => Err(StyleError::UnknownTheme(other.to_string())),
        }
    }

    /// Book-wide overrides layered on top of a base theme.
    pub fn with_book_overrides(self) -> Self {
        Self {
            figure_size: (6.0, 4.0),
            dpi: 300.0,
            font_size: 10.0,
            label_size: 11.0,
            title_size: 12.0,
            legend_size: 9.0,
            xtick_size: 9.0,
            ytick_size: 9.0,
            line_width: 1.5,
            axes_line_width: 0.8,
            grid_line_width: 0.5,
            grid_alpha: 0.3,
            ..self
        }
    }

    pub fn book() -> Self {
        Self::science().with_book_overrides()
    }

    pub fn cycle_color(&self, index: usize) -> &str {
        if self.color_cycle.is_empty() {
            return self.text_color.as_str();
        }
        self.color_cycle[index % self.color_cycle.len()].as_str()
    }

    /// Maps `C<n>` cycle references to concrete colours; other values pass through.
    pub fn resolve_color<'a>(&'a self, color: &'a str) -> &'a str {
        if let Some(index) = color
            .strip_prefix('C')
            .and_then(|rest| rest.parse::<usize>().ok())
        {
            return self.cycle_color(index);
        }
        color
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::book()
    }
}

/// Returns the style every figure of the book is drawn with.
pub fn setup_style() -> Style {
    Style::book()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_style_is_idempotent() {
        let once = setup_style();
        for _ in 0..5 {
            assert_eq!(setup_style(), once);
        }
    }

    #[test]
    fn book_overrides_replace_base_sizes() {
        let style = setup_style();
        assert_eq!(style.name, "science");
        assert_eq!(style.figure_size, (6.0, 4.0));
        assert_eq!(style.dpi, 300.0);
        assert_eq!(style.label_size, 11.0);
        assert_eq!(style.axes_line_width, 0.8);
        assert!(style.font_family.ends_with("serif"));
        assert!(style.ticks_inward);
    }

    #[test]
    fn reapplying_overrides_changes_nothing() {
        let style = setup_style();
        assert_eq!(style.clone().with_book_overrides(), style);
    }

    #[test]
    fn unknown_theme_fails() {
        assert_eq!(
            Style::named("seaborn"),
            Err(StyleError::UnknownTheme("seaborn".to_string()))
        );
        assert!(Style::named("Science").is_ok());
    }

    #[test]
    fn resolves_cycle_colors() {
        let style = Style::science();
        assert_eq!(style.resolve_color("C0"), "#0C5DA5");
        assert_eq!(style.resolve_color("C3"), "#FF2C00");
        assert_eq!(style.resolve_color("C7"), "#0C5DA5");
        assert_eq!(style.resolve_color("gold"), "gold");
        assert_eq!(style.resolve_color("Crimson"), "Crimson");
    }
}
