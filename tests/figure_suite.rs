use std::path::PathBuf;

use celestial_figures::chapters::{chapters, find_chapter};
use celestial_figures::config::{OutputConfig, OutputFormat};
use celestial_figures::render::render_svg;
use celestial_figures::{FigureEmitter, figure_filename, setup_style};

fn assert_valid_svg(svg: &str, figure: &str) {
    assert!(svg.starts_with("<svg"), "{figure}: missing <svg tag");
    assert!(svg.trim_end().ends_with("</svg>"), "{figure}: missing </svg tag");
    for bad in ["NaN", "=\"inf", "=\"-inf", " inf ", " -inf "] {
        assert!(!svg.contains(bad), "{figure}: non-finite coordinate");
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("celfig-suite-{}-{tag}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn render_every_chapter_figure() {
    let style = setup_style();
    let mut rendered = 0;
    for chapter in chapters() {
        for entry in chapter.figures {
            let label = figure_filename(chapter.number, entry.name, OutputFormat::Svg);
            let figure = (entry.build)(&style);
            let out = render_svg(&figure, 0.1);
            assert_valid_svg(&out.svg, &label);
            assert!(out.width > 0.0 && out.height > 0.0, "{label}: empty canvas");
            // Tight cropping never grows far past the requested figure size.
            let (w, h) = figure.size_points();
            assert!(out.width <= w * 2.0, "{label}: width {} vs {w}", out.width);
            assert!(out.height <= h * 2.0, "{label}: height {} vs {h}", out.height);
            rendered += 1;
        }
    }
    assert_eq!(rendered, 11);
}

struct ChapterRun {
    written: Vec<String>,
    on_disk: Vec<String>,
    progress: String,
}

fn run_chapter_one(tag: &str, format: OutputFormat) -> ChapterRun {
    let dir = scratch_dir(tag);
    let out_dir = dir.join("generated");
    let emitter = FigureEmitter::new(&OutputConfig {
        dir: out_dir.clone(),
        format,
        ..Default::default()
    });
    let chapter = find_chapter(1).expect("chapter 1 registered");
    let mut progress = Vec::new();
    let written = chapter
        .generate_to(&setup_style(), &emitter, &mut progress)
        .expect("chapter 1 emits");

    let written = written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    let mut on_disk: Vec<String> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    on_disk.sort();
    let _ = std::fs::remove_dir_all(dir);
    ChapterRun {
        written,
        on_disk,
        progress: String::from_utf8(progress).unwrap(),
    }
}

#[test]
fn chapter_one_writes_its_figures_in_order() {
    let run = run_chapter_one("ch01-svg", OutputFormat::Svg);
    assert_eq!(
        run.written,
        vec!["ch01-latitude-geometry.svg", "ch01-dead-reckoning-error.svg"]
    );
    assert_eq!(
        run.on_disk,
        vec!["ch01-dead-reckoning-error.svg", "ch01-latitude-geometry.svg"]
    );
    assert_eq!(
        run.progress,
        "Generated: ch01-latitude-geometry.svg\nGenerated: ch01-dead-reckoning-error.svg\n"
    );
}

#[cfg(feature = "png")]
#[test]
fn chapter_one_writes_png_by_default() {
    assert_eq!(OutputConfig::default().format, OutputFormat::Png);
    let run = run_chapter_one("ch01-png", OutputConfig::default().format);
    assert_eq!(
        run.written,
        vec!["ch01-latitude-geometry.png", "ch01-dead-reckoning-error.png"]
    );
    assert_eq!(
        run.on_disk,
        vec!["ch01-dead-reckoning-error.png", "ch01-latitude-geometry.png"]
    );
    let lines: Vec<&str> = run.progress.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Generated: ch01-latitude-geometry.png",
            "Generated: ch01-dead-reckoning-error.png",
        ]
    );
}

#[test]
fn chapters_render_identically_across_runs() {
    let style = setup_style();
    let chapter = find_chapter(13).expect("chapter 13 registered");
    for entry in chapter.figures {
        let first = render_svg(&(entry.build)(&style), 0.1);
        let second = render_svg(&(entry.build)(&setup_style()), 0.1);
        assert_eq!(first.svg, second.svg, "{} differs between runs", entry.name);
    }
}

#[test]
fn setup_style_is_idempotent() {
    let once = setup_style();
    for _ in 0..3 {
        assert_eq!(setup_style(), once);
    }
    assert_eq!(once.figure_size, (6.0, 4.0));
    assert_eq!(once.dpi, 300.0);
    assert!(once.font_family.ends_with("serif"));
}
