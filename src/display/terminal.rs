//! Text backend.
//!
//! Lays out the same content as the raster sinks, one block under the
//! other. Glyphs are painted onto a scratch [`Canvas`] from the same
//! composer instructions and turned into half-block characters, two pixel
//! rows per text row. Accent cells are coloured with `crossterm` on commit.

use std::io::{self, Write};

use chrono::{NaiveDate, NaiveDateTime};
use crossterm::style::{Color, Stylize};
use embedded_graphics::prelude::{Point, Size};

use crate::display::layout::{self, ForecastText, SlotText};
use crate::display::{ink_color, Canvas, DisplayObject};
use crate::error::{Error, Result};
use crate::icons::{closed_eye, compose, Accent, IconSize, Ink, Shape, EYE_GLYPH};
use crate::telemetry::Telemetry;
use crate::traits::{DisplaySink, IconType, TrainSource, WeatherSource, GOODNIGHT_LABEL};

const BACKEND: &str = "terminal_text";

/// Columns between the date and the right edge of the time.
const HEADER_WIDTH: usize = 60;

/// Columns per forecast slot.
const SLOT_WIDTH: usize = 20;

// ============================================================================
// Cells
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    ch: char,
    accent: bool,
}

type Row = Vec<Cell>;

fn text_row(text: &str) -> Row {
    text.chars().map(|ch| Cell { ch, accent: false }).collect()
}

fn padded(mut row: Row, width: usize) -> Row {
    row.resize(width.max(row.len()), Cell { ch: ' ', accent: false });
    row
}

fn plain(row: &[Cell]) -> String {
    let line: String = row.iter().map(|c| c.ch).collect();
    line.trim_end().to_string()
}

struct Sample {
    inked: bool,
    accent: bool,
}

fn sample(canvas: &Canvas, x: u32, y: u32, step: u32) -> Sample {
    let (white, red, yellow) = (
        ink_color(Ink::White),
        ink_color(Ink::Red),
        ink_color(Ink::Yellow),
    );
    let (mut total, mut inked, mut accent) = (0u32, 0u32, false);
    for dy in 0..step {
        for dx in 0..step {
            let point = Point::new((x + dx) as i32, (y + dy) as i32);
            if let Some(color) = canvas.pixel(point) {
                total += 1;
                if color != white {
                    inked += 1;
                    accent |= color == red || color == yellow;
                }
            }
        }
    }
    Sample {
        inked: total > 0 && inked * 2 >= total,
        accent,
    }
}

/// Paint `shapes` (anchored at the origin) and downsample into half-blocks,
/// `step` pixels per half cell.
fn rasterize(shapes: &[Shape], size: Size, step: u32) -> Vec<Row> {
    let mut canvas = Canvas::new(size);
    canvas.paint(shapes);

    let cols = size.width.div_ceil(step);
    let rows = size.height.div_ceil(step * 2);
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| {
                    let top = sample(&canvas, c * step, r * 2 * step, step);
                    let bottom = sample(&canvas, c * step, r * 2 * step + step, step);
                    let ch = match (top.inked, bottom.inked) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    };
                    Cell {
                        ch,
                        accent: (top.inked && top.accent) || (bottom.inked && bottom.accent),
                    }
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// Terminal Sink
// ============================================================================

/// Text sink writing to a terminal or any other writer.
pub struct TerminalText {
    accent: Accent,
    date: Option<String>,
    time: Option<String>,
    icon: Vec<Row>,
    forecast: Vec<String>,
    slots: Vec<Vec<Row>>,
    trains: Vec<String>,
    goodnight: Vec<Row>,
    out: Box<dyn Write + Send>,
    telemetry: Telemetry,
    committed: bool,
}

impl TerminalText {
    /// Print to standard output on commit.
    pub fn new(object: &DisplayObject, telemetry: &Telemetry) -> Self {
        Self::with_writer(object, Box::new(io::stdout()), telemetry)
    }

    /// Print to `out` on commit.
    pub fn with_writer(
        object: &DisplayObject,
        out: Box<dyn Write + Send>,
        telemetry: &Telemetry,
    ) -> Self {
        Self {
            accent: Accent::from(object.base_color),
            date: None,
            time: None,
            icon: Vec::new(),
            forecast: Vec::new(),
            slots: Vec::new(),
            trains: Vec::new(),
            goodnight: Vec::new(),
            out,
            telemetry: telemetry.scoped("rs_inky::display"),
            committed: false,
        }
    }

    fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();

        if self.date.is_some() || self.time.is_some() {
            let date = self.date.as_deref().unwrap_or("");
            let time = self.time.as_deref().unwrap_or("");
            let gap = HEADER_WIDTH.saturating_sub(date.chars().count() + time.chars().count());
            rows.push(text_row(&format!("{date}{}{time}", " ".repeat(gap.max(1)))));
        }

        let icon_width = self.icon.first().map_or(0, Vec::len);
        for i in 0..self.icon.len().max(self.forecast.len()) {
            let mut row = padded(self.icon.get(i).cloned().unwrap_or_default(), icon_width);
            if let Some(line) = self.forecast.get(i) {
                if icon_width > 0 {
                    row.extend(text_row("  "));
                }
                row.extend(text_row(line));
            }
            rows.push(row);
        }

        let slot_height = self.slots.iter().map(Vec::len).max().unwrap_or(0);
        for i in 0..slot_height {
            let mut row = Row::new();
            for slot in &self.slots {
                row.extend(padded(slot.get(i).cloned().unwrap_or_default(), SLOT_WIDTH));
            }
            rows.push(row);
        }

        rows.extend(self.trains.iter().map(|l| text_row(l)));
        rows.extend(self.goodnight.iter().cloned());
        rows
    }

    /// The screen as plain text, trailing spaces trimmed.
    pub fn lines(&self) -> Vec<String> {
        self.rows().iter().map(|r| plain(r)).collect()
    }

    fn write_row(&mut self, row: &[Cell]) -> io::Result<()> {
        let color = match self.accent {
            Accent::Monochrome => None,
            Accent::Red => Some(Color::Red),
            Accent::Yellow => Some(Color::Yellow),
        };
        let end = row.len() - row.iter().rev().take_while(|c| c.ch == ' ').count();
        let mut start = 0;
        while start < end {
            let accent = row[start].accent;
            let run = row[start..end]
                .iter()
                .take_while(|c| c.accent == accent)
                .count();
            let text: String = row[start..start + run].iter().map(|c| c.ch).collect();
            match color {
                Some(color) if accent => write!(self.out, "{}", text.with(color))?,
                _ => write!(self.out, "{text}")?,
            }
            start += run;
        }
        writeln!(self.out)
    }
}

impl DisplaySink for TerminalText {
    fn draw_date(&mut self, now: NaiveDateTime) -> Result<()> {
        self.date = Some(layout::date_text(now));
        Ok(())
    }

    fn draw_time(&mut self, now: NaiveDateTime) -> Result<()> {
        self.time = Some(layout::time_text(now));
        Ok(())
    }

    fn draw_weather_icon(&mut self, icon: IconType) -> Result<()> {
        let shapes = compose(icon, Point::zero(), IconSize::Large, self.accent);
        self.icon = rasterize(&shapes, IconSize::Large.extent(), 2);
        Ok(())
    }

    fn draw_weather_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        disp_tomorrow: bool,
    ) -> Result<()> {
        let text = ForecastText::read(weather, disp_tomorrow)?;
        let mut lines = vec![
            format!("{}  {}", text.temperature, text.condition),
            text.range,
            text.description,
        ];
        lines.extend(text.tomorrow);
        self.forecast = lines;
        Ok(())
    }

    fn draw_mini_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        slot: usize,
        day: usize,
        today: NaiveDate,
    ) -> Result<()> {
        let text = SlotText::read(weather, day, today)?;
        let shapes = compose(text.icon, Point::zero(), IconSize::Small, self.accent);
        let mut column = vec![text_row(&text.label)];
        column.extend(rasterize(&shapes, IconSize::Small.extent(), 2));
        column.push(text_row(&text.temperature));

        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, Vec::new());
        }
        self.slots[slot] = column;
        Ok(())
    }

    fn draw_train_times(&mut self, trains: &dyn TrainSource) -> Result<()> {
        self.trains = layout::train_lines(trains);
        Ok(())
    }

    fn draw_goodnight(&mut self) -> Result<()> {
        let eye = closed_eye(Point::zero(), self.accent);
        let mut rows = rasterize(&eye, EYE_GLYPH, 4);
        let width = rows.first().map_or(0, Vec::len);
        let indent = width.saturating_sub(GOODNIGHT_LABEL.chars().count()) / 2;
        rows.push(text_row(&format!("{}{GOODNIGHT_LABEL}", " ".repeat(indent))));
        self.goodnight = rows;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let render_err = |e: io::Error| Error::Render {
            backend: BACKEND,
            reason: e.to_string(),
        };
        if self.committed {
            return Err(Error::Render {
                backend: BACKEND,
                reason: "screen already printed".into(),
            });
        }
        let rows = self.rows();
        for row in &rows {
            self.write_row(row).map_err(render_err)?;
        }
        self.out.flush().map_err(render_err)?;
        self.committed = true;
        self.telemetry
            .info(format_args!("{BACKEND} printed {} lines", rows.len()));
        Ok(())
    }
}
