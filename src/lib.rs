//! # rs-inky
//!
//! Weather, train departure and goodnight status screens for small e-ink
//! panels, with a PNG preview and a terminal renderer for desktop use.
//!
//! ## Features
//!
//! - **Interchangeable providers**: OpenWeatherMap for weather; Huxley2 (JSON)
//!   or National Rail OpenLDBWS (SOAP) for departures
//! - **Three display backends**: physical panel, desktop PNG preview, terminal text
//! - **Composed weather glyphs**: nine icons built from circles, polygons and arcs
//! - **Tolerant train boards**: upstream failures become a one-line notice
//!   instead of an aborted render
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without network or
//! hardware:
//!
//! - `traits` - Source, sink, network and hardware abstractions
//! - `weather`, `train` - Providers and their canonical inputs
//! - `display` - Panel, preview and terminal sinks
//! - `icons` - Glyph composition
//! - `factory`, `dispatch` - Validation and runtime backend selection
//! - `orchestrator` - One render session
//! - `hal` - Concrete collaborators (mocks for testing, reqwest, SSD1306)
//!
//! ## Example
//!
//! ```rust
//! use rs_inky::{
//!     display_data, DisplayOption, Session,
//!     hal::{MockClock, MockDisplay, MockTrain, MockWeather},
//!     telemetry::Telemetry,
//!     traits::Clock,
//! };
//!
//! let mut display = MockDisplay::new();
//! let weather = MockWeather::new();
//! let trains = MockTrain::with_services(&[("Brighton", "12:20")], 3);
//! let session = Session::new(MockClock::at(2024, 10, 14, 7, 45).now(), &Telemetry::silent());
//!
//! display_data(DisplayOption::Train, &mut display, &weather, &trains, &session).unwrap();
//! assert_eq!(display.commit_count, 1);
//! assert_eq!(display.train_lines.len(), 1);
//! ```

#![warn(missing_docs)]

/// Application wiring: configuration in, one committed screen out.
pub mod app;
/// Shared configuration system (TOML file plus environment overrides).
pub mod config;
/// Enum dispatch over the concrete providers and sinks.
pub mod dispatch;
/// Display backends and the drawing surface they share.
pub mod display;
/// Error taxonomy.
pub mod error;
/// Canonical object validation and backend construction.
pub mod factory;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Weather glyph composition.
pub mod icons;
/// Render session driver.
pub mod orchestrator;
/// Explicit logging handle.
pub mod telemetry;
/// Core traits for sources, sinks, network and hardware.
pub mod traits;
/// Departure board providers.
pub mod train;
/// Weather providers.
pub mod weather;

// Re-exports for convenience
pub use app::{run, Runtime};
pub use config::{BaseColor, Config, DisplayModel, Secret, TrainModel, WeatherModel};
pub use dispatch::{AnyDisplay, AnyTrainSource, AnyWeatherSource};
pub use display::{DesktopPreview, DisplayObject, PixelPanel, TerminalText};
pub use error::{Error, Result, UpstreamKind};
pub use orchestrator::{display_data, DisplayOption, Session};
pub use train::TrainObject;
pub use traits::{
    // Hardware
    Clock,
    // Sources and sinks
    Departures,
    DisplaySink,
    // Network
    HttpClient,
    HttpMethod,
    HttpRequest,
    HttpResponse,
    IconType,
    PanelDriver,
    ScaleType,
    SystemClock,
    Temperature,
    TrainFault,
    TrainRecord,
    TrainSource,
    WeatherSource,
};
pub use weather::WeatherObject;
