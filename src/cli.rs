use crate::chapters::{Chapter, chapters, find_chapter};
use crate::config::{OutputFormat, load_config};
use crate::emit::FigureEmitter;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "celfig", version, about = "Generate the book's chapter figures")]
pub struct Args {
    /// Output directory, created if missing
    #[arg(short = 'o', long = "outDir", env = "CELFIG_OUTPUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Chapter to generate; repeat for several. Defaults to every chapter.
    #[arg(short = 'n', long = "chapter")]
    pub chapters: Vec<u32>,

    /// Raster resolution for PNG output
    #[arg(long = "dpi")]
    pub dpi: Option<f32>,

    /// List chapters and their figures without rendering
    #[arg(long = "list")]
    pub list: bool,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.list {
        for chapter in chapters() {
            println!("{:>2}  {}", chapter.number, chapter.title);
            for name in chapter.figure_names() {
                println!("      {name}");
            }
        }
        return Ok(());
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = args.out_dir {
        config.output.dir = dir;
    }
    if let Some(format) = args.output_format {
        config.output.format = format;
    }
    if let Some(dpi) = args.dpi {
        if !dpi.is_finite() || dpi <= 0.0 {
            anyhow::bail!("--dpi must be positive, got {dpi}");
        }
        config.output.dpi = dpi;
    }

    let selected = select_chapters(&args.chapters)?;
    let emitter = FigureEmitter::new(&config.output);
    for chapter in selected {
        chapter
            .generate(&config.style, &emitter)
            .with_context(|| format!("chapter {} failed", chapter.number))?;
    }
    Ok(())
}

/// Logs go to stderr; stdout carries only the `Generated:` lines.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "celestial_figures=warn".into()))
        .try_init();
}

/// Requested chapters in the order given, or every chapter when none is named.
fn select_chapters(requested: &[u32]) -> Result<Vec<&'static Chapter>> {
    if requested.is_empty() {
        return Ok(chapters().iter().collect());
    }
    requested
        .iter()
        .map(|number| {
            find_chapter(*number).ok_or_else(|| {
                let known: Vec<String> = chapters().iter().map(|c| c.number.to_string()).collect();
                anyhow::anyhow!("no figures for chapter {number} (available: {})", known.join(", "))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_flags() {
        let args = Args::try_parse_from([
            "celfig",
            "--outDir",
            "out",
            "--outputFormat",
            "svg",
            "-n",
            "1",
            "--chapter",
            "13",
            "--dpi",
            "150",
        ])
        .unwrap();
        assert_eq!(args.out_dir, Some(PathBuf::from("out")));
        assert_eq!(args.output_format, Some(OutputFormat::Svg));
        assert_eq!(args.chapters, vec![1, 13]);
        assert_eq!(args.dpi, Some(150.0));
        assert!(!args.list);
    }

    #[test]
    fn no_chapter_selects_all() {
        let all = select_chapters(&[]).unwrap();
        assert_eq!(all.len(), chapters().len());
        let picked = select_chapters(&[13, 1]).unwrap();
        assert_eq!(picked.iter().map(|c| c.number).collect::<Vec<_>>(), vec![13, 1]);
        let err = select_chapters(&[2]).unwrap_err().to_string();
        assert!(err.contains("chapter 2"));
    }
}
