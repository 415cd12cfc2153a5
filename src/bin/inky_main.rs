//! Command line front end.
//!
//! Renders one screen and exits. Exit status is 1 on any error, with a
//! single `error: ...` line on stderr.
//!
//! ```bash
//! rs-inky weather --config inky.toml
//! rs-inky train --display terminal
//! RUST_LOG=debug rs-inky night --display desktop
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use rs_inky::config::{BaseColor, Config, DisplayModel};
use rs_inky::hal::ReqwestClient;
use rs_inky::telemetry::Telemetry;
use rs_inky::{run, DisplayOption, Runtime, SystemClock};

/// Draw a weather, train or goodnight screen
#[derive(Parser, Debug)]
#[command(name = "rs-inky", version)]
#[command(about = "Render a status screen to an e-ink panel, a PNG preview or the terminal")]
struct Args {
    /// Screen to draw: weather, train or night
    #[arg(value_parser = parse_option)]
    option: DisplayOption,

    /// TOML configuration file (environment variables override it)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Display backend: panel, desktop or terminal
    #[arg(long, short, value_parser = parse_display)]
    display: Option<DisplayModel>,

    /// Accent colour of the panel: black, red or yellow
    #[arg(long, value_parser = parse_color)]
    color: Option<BaseColor>,
}

fn parse_option(s: &str) -> Result<DisplayOption, String> {
    s.parse().map_err(|e: rs_inky::Error| e.to_string())
}

fn parse_display(s: &str) -> Result<DisplayModel, String> {
    s.parse().map_err(|e: rs_inky::Error| e.to_string())
}

fn parse_color(s: &str) -> Result<BaseColor, String> {
    s.parse().map_err(|e: rs_inky::Error| e.to_string())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    let mut config = config.with_env()?;
    if let Some(model) = args.display {
        config.display.model = model;
    }
    if let Some(color) = args.color {
        config.display.base_color = color;
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let logger = env_logger::Builder::from_env(Env::default().default_filter_or("info")).build();
    let telemetry = Telemetry::new(logger);

    let result = (|| -> anyhow::Result<()> {
        let config = load_config(&args)?;
        let client = ReqwestClient::new().context("building HTTP client")?;
        let runtime = Runtime::new(Arc::new(client), Box::new(SystemClock), telemetry.clone());
        run(args.option, &config, &runtime)?;
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            telemetry.flush();
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
