use crate::config::{OutputConfig, OutputFormat};
use crate::figure::Figure;
use crate::render::{RenderError, render_svg, write_output_svg};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("figure name must not be empty")]
    EmptyName,
    #[error("figure name `{0}` must be a plain file stem")]
    InvalidName(String),
    #[error("chapter number must be positive")]
    InvalidChapter,
    #[error("figure `{0}` has nothing to draw")]
    EmptyFigure(String),
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot report progress: {0}")]
    Progress(#[source] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("PNG output requires the `png` feature; use SVG output instead")]
    PngUnavailable,
}

/// `ch{chapter:02}-{name}.{ext}`. Chapters of three or more digits print in full.
pub fn figure_filename(chapter: u32, name: &str, format: OutputFormat) -> String {
    format!("ch{chapter:02}-{name}.{}", format.extension())
}

/// Writes finished figures into one output directory.
#[derive(Debug, Clone)]
pub struct FigureEmitter {
    config: OutputConfig,
}

impl FigureEmitter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn format(&self) -> OutputFormat {
        self.config.format
    }

    pub fn path_for(&self, chapter: u32, name: &str) -> PathBuf {
        self.config
            .dir
            .join(figure_filename(chapter, name, self.config.format))
    }

    /// Renders `figure` with a tight bounding box, writes it under the output
    /// directory (created on demand) and prints `Generated: <filename>` to
    /// stdout. An existing file of the same name is overwritten.
    pub fn emit(&self, figure: Figure, name: &str, chapter: u32) -> Result<PathBuf, EmitError> {
        self.emit_to(figure, name, chapter, &mut std::io::stdout().lock())
    }

    /// Like [`emit`](Self::emit), with the `Generated:` line going to `progress`.
    pub fn emit_to<W: Write + ?Sized>(
        &self,
        figure: Figure,
        name: &str,
        chapter: u32,
        progress: &mut W,
    ) -> Result<PathBuf, EmitError> {
        validate_name(name)?;
        if chapter == 0 {
            return Err(EmitError::InvalidChapter);
        }
        if figure.is_empty() {
            return Err(EmitError::EmptyFigure(name.to_string()));
        }

        let dir = &self.config.dir;
        std::fs::create_dir_all(dir).map_err(|source| EmitError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let filename = figure_filename(chapter, name, self.config.format);
        let path = dir.join(&filename);
        let rendered = render_svg(&figure, self.config.pad_inches);
        drop(figure);

        let bytes = match self.config.format {
            OutputFormat::Svg => {
                write_output_svg(&rendered.svg, &path).map_err(|source| EmitError::Write {
                    path: path.clone(),
                    source,
                })?;
                rendered.svg.len()
            }
            OutputFormat::Png => {
                let png = encode_png(&rendered.svg, self.config.dpi)?;
                std::fs::write(&path, &png).map_err(|source| EmitError::Write {
                    path: path.clone(),
                    source,
                })?;
                png.len()
            }
        };

        tracing::debug!(
            file = %filename,
            width_pt = rendered.width,
            height_pt = rendered.height,
            bytes,
            "wrote figure"
        );
        writeln!(progress, "Generated: {filename}").map_err(EmitError::Progress)?;
        Ok(path)
    }
}

fn validate_name(name: &str) -> Result<(), EmitError> {
    if name.trim().is_empty() {
        return Err(EmitError::EmptyName);
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(EmitError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(feature = "png")]
fn encode_png(svg: &str, dpi: f32) -> Result<Vec<u8>, EmitError> {
    Ok(crate::render::rasterize_png(svg, dpi)?)
}

#[cfg(not(feature = "png"))]
fn encode_png(_svg: &str, _dpi: f32) -> Result<Vec<u8>, EmitError> {
    Err(EmitError::PngUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Axes, Line};
    use crate::theme::setup_style;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("celfig-emit-{}-{tag}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn svg_emitter(dir: &Path) -> FigureEmitter {
        FigureEmitter::new(&OutputConfig {
            dir: dir.to_path_buf(),
            format: OutputFormat::Svg,
            ..Default::default()
        })
    }

    fn simple_figure() -> Figure {
        let mut fig = Figure::new(&setup_style());
        let mut ax = Axes::new();
        ax.add(Line::new(vec![0.0, 1.0], vec![0.0, 1.0]));
        fig.add(ax);
        fig
    }

    #[test]
    fn filenames_zero_pad_chapter() {
        assert_eq!(
            figure_filename(1, "latitude-geometry", OutputFormat::Png),
            "ch01-latitude-geometry.png"
        );
        assert_eq!(
            figure_filename(13, "error-budget", OutputFormat::Png),
            "ch13-error-budget.png"
        );
        assert_eq!(figure_filename(100, "x", OutputFormat::Svg), "ch100-x.svg");
    }

    #[test]
    fn creates_missing_directories() {
        let root = scratch_dir("nested");
        let dir = root.join("a").join("b");
        let path = svg_emitter(&dir).emit(simple_figure(), "demo", 1).unwrap();
        assert_eq!(path, dir.join("ch01-demo.svg"));
        assert!(path.is_file());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn rerun_overwrites_with_identical_bytes() {
        let dir = scratch_dir("rerun");
        let emitter = svg_emitter(&dir);
        let path = emitter.emit(simple_figure(), "demo", 2).unwrap();
        let first = std::fs::read(&path).unwrap();
        let again = emitter.emit(simple_figure(), "demo", 2).unwrap();
        assert_eq!(path, again);
        assert_eq!(first, std::fs::read(&again).unwrap());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn reports_each_written_file() {
        let dir = scratch_dir("progress");
        let emitter = svg_emitter(&dir);
        let mut progress = Vec::new();
        emitter.emit_to(simple_figure(), "first", 3, &mut progress).unwrap();
        emitter.emit_to(simple_figure(), "second", 3, &mut progress).unwrap();
        assert_eq!(
            String::from_utf8(progress).unwrap(),
            "Generated: ch03-first.svg\nGenerated: ch03-second.svg\n"
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn failed_emit_reports_nothing() {
        let dir = scratch_dir("silent");
        let mut progress = Vec::new();
        assert!(svg_emitter(&dir).emit_to(simple_figure(), "", 1, &mut progress).is_err());
        assert!(progress.is_empty());
    }

    #[test]
    fn rejects_invalid_inputs() {
        let dir = scratch_dir("invalid");
        let emitter = svg_emitter(&dir);
        assert!(matches!(emitter.emit(simple_figure(), "", 1), Err(EmitError::EmptyName)));
        assert!(matches!(
            emitter.emit(simple_figure(), "../escape", 1),
            Err(EmitError::InvalidName(_))
        ));
        assert!(matches!(emitter.emit(simple_figure(), "demo", 0), Err(EmitError::InvalidChapter)));
        assert!(matches!(
            emitter.emit(Figure::new(&setup_style()), "blank", 1),
            Err(EmitError::EmptyFigure(_))
        ));
        assert!(!dir.exists());
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let root = scratch_dir("blocked");
        std::fs::create_dir_all(&root).unwrap();
        let blocker = root.join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = svg_emitter(&blocker.join("sub")).emit(simple_figure(), "demo", 1).unwrap_err();
        assert!(matches!(err, EmitError::CreateDir { .. }));
        let _ = std::fs::remove_dir_all(root);
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_output_has_signature() {
        let dir = scratch_dir("png");
        let emitter = FigureEmitter::new(&OutputConfig {
            dir: dir.clone(),
            dpi: 72.0,
            ..Default::default()
        });
        let path = emitter.emit(simple_figure(), "demo", 1).unwrap();
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("png"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let _ = std::fs::remove_dir_all(dir);
    }
}
