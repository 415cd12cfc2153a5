//! Display backends.
//!
//! | Backend | Output | Accent ink |
//! |---------|--------|------------|
//! | [`PixelPanel`] | a [`PanelDriver`](crate::traits::PanelDriver) | when the driver supports it |
//! | [`DesktopPreview`] | PNG file at `preview_path` (`desktop` feature) | yes |
//! | [`TerminalText`] | half-block text on stdout | ANSI colour |
//!
//! Every backend implements [`DisplaySink`](crate::traits::DisplaySink) and
//! lays out the same screen from [`layout`].

pub mod canvas;
pub mod layout;
mod raster;
mod terminal;

use std::path::PathBuf;

use crate::config::{BaseColor, DisplayModel};

pub use canvas::{ink_color, Canvas, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use raster::{
    DesktopPreview, FrameOutput, PanelOutput, PixelPanel, PngOutput, RasterSink, PREVIEW_BORDER,
};
pub use terminal::TerminalText;

/// Validated display settings.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayObject {
    /// Backend to build.
    pub model: DisplayModel,
    /// Accent colour of the panel.
    pub base_color: BaseColor,
    /// Where the desktop preview writes its PNG.
    pub preview_path: PathBuf,
}
