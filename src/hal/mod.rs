//! Hardware and transport implementations.
//!
//! Concrete implementations of the traits defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: test doubles for every trait, no network or hardware
//! - `reqwest_client`: blocking HTTP over rustls (requires `http` feature)
//! - `ssd1306`: 128x64 OLED over Linux I2C (requires `panel` feature)

pub mod mock;

#[cfg(feature = "http")]
pub mod reqwest_client;

#[cfg(feature = "panel")]
pub mod ssd1306;

pub use mock::*;

#[cfg(feature = "http")]
pub use reqwest_client::ReqwestClient;

#[cfg(feature = "panel")]
pub use self::ssd1306::Ssd1306Panel;
