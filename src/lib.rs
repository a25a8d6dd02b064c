pub mod chapters;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod emit;
pub mod figure;
pub mod render;
pub mod series;
pub mod text_metrics;
pub mod theme;
pub mod ticks;

pub use emit::{EmitError, FigureEmitter, figure_filename};
pub use figure::Figure;
pub use theme::{Style, setup_style};

#[cfg(feature = "cli")]
pub use cli::run;
