//! Trait definitions for data sources, display sinks and collaborators.
//!
//! This module defines the core abstractions that let rs-inky:
//! - Swap weather and train providers by configuration
//! - Render the same screen on a panel, a PNG preview or a terminal
//! - Test everything without network or hardware
//!
//! # Submodules
//!
//! - `weather`: [`WeatherSource`], [`IconType`], temperature scales
//! - `train`: [`TrainSource`], [`TrainRecord`], line formatting
//! - `display`: [`DisplaySink`] draw/commit contract
//! - `network`: [`HttpClient`] used by every provider
//! - `hardware`: [`Clock`] and [`PanelDriver`]

pub mod display;
pub mod hardware;
pub mod network;
pub mod train;
pub mod weather;

pub use display::*;
pub use hardware::*;
pub use network::*;
pub use train::*;
pub use weather::*;
