use crate::theme::{Style, setup_style};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "src/figures/generated";
pub const DEFAULT_PAD_INCHES: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

/// Where and how emitted figures are written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub dpi: f32,
    pub pad_inches: f32,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dpi: 300.0,
            pad_inches: DEFAULT_PAD_INCHES,
            format: OutputFormat::Png,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub style: Style,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        let style = setup_style();
        let output = OutputConfig {
            dpi: style.dpi,
            ..Default::default()
        };
        Self { style, output }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    style: Option<StyleOverrides>,
    output: Option<OutputFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StyleOverrides {
    figure_size: Option<[f32; 2]>,
    dpi: Option<f32>,
    font_family: Option<String>,
    font_size: Option<f32>,
    label_size: Option<f32>,
    title_size: Option<f32>,
    legend_size: Option<f32>,
    tick_size: Option<f32>,
    line_width: Option<f32>,
    axes_line_width: Option<f32>,
    grid_line_width: Option<f32>,
    grid_alpha: Option<f32>,
    color_cycle: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct OutputFile {
    dir: Option<PathBuf>,
    dpi: Option<f32>,
    pad_inches: Option<f32>,
    format: Option<OutputFormat>,
}

/// Loads the run configuration. Without a path the book defaults are used.
/// Files are read as JSON first and as JSON5 when that fails, so
/// hand-written files may carry comments and trailing commas.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let parsed = parse_config(&contents)
        .with_context(|| format!("invalid config file {}", path.display()))?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.style = Style::named(theme_name)?.with_book_overrides();
    }

    if let Some(vars) = parsed.style {
        apply_style_overrides(&mut config.style, vars);
    }
    config.output.dpi = config.style.dpi;

    if let Some(output) = parsed.output {
        if let Some(dir) = output.dir {
            config.output.dir = dir;
        }
        if let Some(dpi) = output.dpi {
            config.output.dpi = dpi;
        }
        if let Some(pad) = output.pad_inches {
            config.output.pad_inches = pad;
        }
        if let Some(format) = output.format {
            config.output.format = format;
        }
    }

    validate_style(&config.style)?;
    ensure_positive("output.dpi", config.output.dpi)?;
    if !config.output.pad_inches.is_finite() || config.output.pad_inches < 0.0 {
        anyhow::bail!("output.padInches must be a non-negative number, got {}", config.output.pad_inches);
    }

    Ok(config)
}

fn ensure_positive(key: &str, value: f32) -> anyhow::Result<()> {
    if !value.is_finite() || value <= 0.0 {
        anyhow::bail!("{key} must be a positive number, got {value}");
    }
    Ok(())
}

fn validate_style(style: &Style) -> anyhow::Result<()> {
    ensure_positive("style.figureSize[0]", style.figure_size.0)?;
    ensure_positive("style.figureSize[1]", style.figure_size.1)?;
    ensure_positive("style.dpi", style.dpi)?;
    for (key, value) in [
        ("style.fontSize", style.font_size),
        ("style.labelSize", style.label_size),
        ("style.titleSize", style.title_size),
        ("style.legendSize", style.legend_size),
        ("style.tickSize", style.xtick_size),
        ("style.tickSize", style.ytick_size),
        ("style.lineWidth", style.line_width),
        ("style.axesLineWidth", style.axes_line_width),
        ("style.gridLineWidth", style.grid_line_width),
    ] {
        ensure_positive(key, value)?;
    }
    if !(0.0..=1.0).contains(&style.grid_alpha) {
        anyhow::bail!("style.gridAlpha must lie in [0, 1], got {}", style.grid_alpha);
    }
    Ok(())
}

fn parse_config(contents: &str) -> anyhow::Result<ConfigFile> {
    if let Ok(parsed) = serde_json::from_str::<ConfigFile>(contents) {
        return Ok(parsed);
    }
    Ok(json5::from_str::<ConfigFile>(contents)?)
}

fn apply_style_overrides(style: &mut Style, vars: StyleOverrides) {
    if let Some([width, height]) = vars.figure_size {
        style.figure_size = (width, height);
    }
    if let Some(v) = vars.dpi {
        style.dpi = v;
    }
    if let Some(v) = vars.font_family {
        style.font_family = v;
    }
    if let Some(v) = vars.font_size {
        style.font_size = v;
    }
    if let Some(v) = vars.label_size {
        style.label_size = v;
    }
    if let Some(v) = vars.title_size {
        style.title_size = v;
    }
    if let Some(v) = vars.legend_size {
        style.legend_size = v;
    }
    if let Some(v) = vars.tick_size {
        style.xtick_size = v;
        style.ytick_size = v;
    }
    if let Some(v) = vars.line_width {
        style.line_width = v;
    }
    if let Some(v) = vars.axes_line_width {
        style.axes_line_width = v;
    }
    if let Some(v) = vars.grid_line_width {
        style.grid_line_width = v;
    }
    if let Some(v) = vars.grid_alpha {
        style.grid_alpha = v;
    }
    if let Some(v) = vars.color_cycle
        && !v.is_empty()
    {
        style.color_cycle = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("celfig-config-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.style, setup_style());
        assert_eq!(config.output.dir, PathBuf::from("src/figures/generated"));
        assert_eq!(config.output.dpi, 300.0);
        assert_eq!(config.output.pad_inches, 0.1);
        assert_eq!(config.output.format, OutputFormat::Png);
    }

    #[test]
    fn json_overrides_style_and_output() {
        let path = write_temp(
            "overrides.json",
            r##"{
                "theme": "plain",
                "style": { "fontSize": 12, "tickSize": 8, "colorCycle": ["#000000"] },
                "output": { "dir": "out/figs", "format": "svg", "padInches": 0.2 }
            }"##,
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.style.name, "plain");
        assert_eq!(config.style.font_size, 12.0);
        assert_eq!(config.style.xtick_size, 8.0);
        assert_eq!(config.style.ytick_size, 8.0);
        assert_eq!(config.style.label_size, 11.0);
        assert_eq!(config.style.resolve_color("C3"), "#000000");
        assert_eq!(config.output.dir, PathBuf::from("out/figs"));
        assert_eq!(config.output.format, OutputFormat::Svg);
        assert_eq!(config.output.pad_inches, 0.2);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn style_dpi_feeds_output_unless_overridden() {
        let path = write_temp("dpi.json", r#"{ "style": { "dpi": 150 } }"#);
        assert_eq!(load_config(Some(&path)).unwrap().output.dpi, 150.0);
        let path2 = write_temp("dpi2.json", r#"{ "style": { "dpi": 150 }, "output": { "dpi": 72 } }"#);
        assert_eq!(load_config(Some(&path2)).unwrap().output.dpi, 72.0);
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path2);
    }

    #[test]
    fn json5_fallback_accepts_comments() {
        let path = write_temp(
            "relaxed.json5",
            "{\n  // book proofs\n  output: { dpi: 600, },\n}\n",
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output.dpi, 600.0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let path = write_temp("theme.json", r#"{ "theme": "seaborn" }"#);
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("seaborn"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rejects_bad_values_and_missing_files() {
        let path = write_temp("bad.json", r#"{ "output": { "dpi": 0 } }"#);
        assert!(load_config(Some(&path)).is_err());
        let _ = std::fs::remove_file(path);
        assert!(load_config(Some(Path::new("/nonexistent/celfig.json"))).is_err());
    }

    #[test]
    fn rejects_non_finite_numbers() {
        for (tag, contents) in [
            ("nan-dpi", "{ output: { dpi: NaN } }"),
            ("inf-dpi", "{ output: { dpi: Infinity } }"),
            ("nan-pad", "{ output: { padInches: NaN } }"),
            ("nan-style-dpi", "{ style: { dpi: NaN } }"),
            ("nan-size", "{ style: { figureSize: [NaN, 4] } }"),
            ("nan-font", "{ style: { fontSize: NaN } }"),
            ("zero-width", "{ style: { lineWidth: 0 } }"),
            ("alpha", "{ style: { gridAlpha: 1.5 } }"),
        ] {
            let path = write_temp(&format!("{tag}.json5"), contents);
            let result = load_config(Some(&path));
            let _ = std::fs::remove_file(&path);
            assert!(result.is_err(), "{tag} was accepted");
        }
    }
}
