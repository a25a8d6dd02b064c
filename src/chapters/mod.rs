//! Per-chapter figure routines and the registry the CLI runs them from.

mod ch01;
mod ch07;
mod ch13;

use crate::emit::{EmitError, FigureEmitter};
use crate::figure::Figure;
use crate::theme::Style;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

/// One named figure routine. `build` draws the figure and hands ownership
/// back to the caller.
#[derive(Clone, Copy)]
pub struct FigureEntry {
    pub name: &'static str,
    pub build: fn(&Style) -> Figure,
}

impl fmt::Debug for FigureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FigureEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Chapter {
    pub number: u32,
    pub title: &'static str,
    pub figures: &'static [FigureEntry],
}

static CHAPTERS: [Chapter; 3] = [ch01::CHAPTER, ch07::CHAPTER, ch13::CHAPTER];

/// All chapters in book order.
pub fn chapters() -> &'static [Chapter] {
    &CHAPTERS
}

pub fn find_chapter(number: u32) -> Option<&'static Chapter> {
    CHAPTERS.iter().find(|chapter| chapter.number == number)
}

impl Chapter {
    pub fn figure_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.figures.iter().map(|entry| entry.name)
    }

    /// Builds and emits every figure of the chapter in order, reporting each
    /// file on stdout. The first failure stops the chapter.
    pub fn generate(&self, style: &Style, emitter: &FigureEmitter) -> Result<Vec<PathBuf>, EmitError> {
        self.generate_to(style, emitter, &mut std::io::stdout().lock())
    }

    pub fn generate_to<W: Write + ?Sized>(
        &self,
        style: &Style,
        emitter: &FigureEmitter,
        progress: &mut W,
    ) -> Result<Vec<PathBuf>, EmitError> {
        tracing::info!(chapter = self.number, title = self.title, figures = self.figures.len(), "generating chapter");
        let mut written = Vec::with_capacity(self.figures.len());
        for entry in self.figures {
            let figure = (entry.build)(style);
            written.push(emitter.emit_to(figure, entry.name, self.number, &mut *progress)?);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapters_are_ordered_and_unique() {
        let numbers: Vec<u32> = chapters().iter().map(|chapter| chapter.number).collect();
        assert_eq!(numbers, vec![1, 7, 13]);
        for chapter in chapters() {
            let mut names: Vec<&str> = chapter.figure_names().collect();
            let count = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), count, "duplicate figure in chapter {}", chapter.number);
        }
    }

    #[test]
    fn figure_order_matches_book() {
        let names = |number| find_chapter(number).map(|chapter| chapter.figure_names().collect::<Vec<_>>());
        assert_eq!(names(1), Some(vec!["latitude-geometry", "dead-reckoning-error"]));
        assert_eq!(
            names(7),
            Some(vec!["prize-thresholds", "board-timeline", "competing-methods"])
        );
        assert_eq!(
            names(13),
            Some(vec![
                "transit-circle-schematic",
                "personal-equation",
                "precision-evolution",
                "prime-meridian-offset",
                "error-budget",
                "observation-reduction",
            ])
        );
        assert!(find_chapter(2).is_none());
    }

    #[test]
    fn debug_lists_figure_names() {
        let shown = format!("{:?}", find_chapter(1));
        assert!(shown.contains("number: 1"));
        assert!(shown.contains("latitude-geometry"));
    }
}
