//! SSD1306 OLED panel on a Raspberry Pi.
//!
//! The 400x300 frame is scaled down to the 128x64 panel by nearest
//! neighbour sampling. Anything that is not white lights a pixel; the panel
//! has no accent ink.
//!
//! This is the only concrete [`PanelDriver`], and it reports
//! `supports_accent() == false`, so a red or yellow `base_color` only shows
//! in the desktop preview and the terminal. A tri-colour e-ink panel would
//! be another `PanelDriver` returning `true`.
//!
//! # Wiring
//!
//! - SDA → GPIO2 (pin 3)
//! - SCL → GPIO3 (pin 5)
//! - VCC → 3.3V
//! - GND → GND

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use linux_embedded_hal::I2cdev;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use crate::display::{ink_color, Canvas};
use crate::error::{Error, Result};
use crate::icons::Ink;
use crate::traits::PanelDriver;

const BACKEND: &str = "ssd1306";

type DisplayDriver =
    Ssd1306<I2CInterface<I2cdev>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

fn render_err(err: impl core::fmt::Debug) -> Error {
    Error::Render {
        backend: BACKEND,
        reason: format!("{err:?}"),
    }
}

/// 128x64 monochrome OLED.
pub struct Ssd1306Panel {
    display: DisplayDriver,
}

impl Ssd1306Panel {
    /// Open the panel on `bus` and initialise it.
    pub fn open(bus: &str) -> Result<Self> {
        let i2c = I2cdev::new(bus).map_err(|e| Error::UnavailableBackend {
            backend: BACKEND,
            reason: e.to_string(),
        })?;
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(render_err)?;
        Ok(Self { display })
    }
}

/// Pixels of the scaled frame that are lit, row-major over `target`.
pub fn downscale(frame: &Canvas, target: Size) -> impl Iterator<Item = Pixel<BinaryColor>> + '_ {
    let white = ink_color(Ink::White);
    let (fw, fh) = (frame.width(), frame.height());
    (0..target.height).flat_map(move |y| {
        (0..target.width).filter_map(move |x| {
            let source = Point::new(
                (x * fw / target.width) as i32,
                (y * fh / target.height) as i32,
            );
            match frame.pixel(source) {
                Some(color) if color != white => {
                    Some(Pixel(Point::new(x as i32, y as i32), BinaryColor::On))
                }
                _ => None,
            }
        })
    })
}

impl PanelDriver for Ssd1306Panel {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn supports_accent(&self) -> bool {
        false
    }

    fn show(&mut self, frame: &Canvas) -> Result<()> {
        let size = self.display.bounding_box().size;
        self.display.clear(BinaryColor::Off).map_err(render_err)?;
        self.display
            .draw_iter(downscale(frame, size))
            .map_err(render_err)?;
        self.display.flush().map_err(render_err)
    }
}
