use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use eventmap_shared::Coordinate;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "eventmap-page",
    about = "Render events as colored location markers on a Leaflet map page"
)]
pub struct GlobalCli {
    /// JSON array of events; `-` reads stdin.
    #[arg(long, default_value = "-")]
    pub events: String,

    /// Write the page here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "map")]
    pub container: String,

    /// Initial center as `lng,lat`.
    #[arg(long, value_parser = parse_center, allow_hyphen_values = true)]
    pub center: Option<Coordinate>,

    #[arg(long)]
    pub zoom: Option<i32>,

    /// Tile URL template; overrides the config.
    #[arg(long)]
    pub tiles: Option<String>,

    /// Seed for reproducible marker colors.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = "Events")]
    pub title: String,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
}

pub fn parse_center(raw: &str) -> Result<Coordinate, String> {
    let (lng, lat) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lng,lat`, got {raw:?}"))?;
    let longitude = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude {lng:?}: {e}"))?;
    let latitude = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude {lat:?}: {e}"))?;

    let center = Coordinate::new(longitude, latitude);
    if !center.is_finite() {
        return Err(format!("center must be finite, got {raw:?}"));
    }
    Ok(center)
}

/// Maps `-v`/`-q` counts onto a filter
/// directive. Quiet wins over verbose.
#[must_use]
pub fn log_level(verbose: u8, quiet: u8) -> &'static str {
    match (quiet, verbose) {
        | (2.., _) => "error",
        | (1, _) | (0, 0) => "warn",
        | (0, 1) => "info",
        | (0, 2) => "debug",
        | (0, _) => "trace",
    }
}

/// Logs go to stderr so the page can stream to stdout.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level(verbose, quiet)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_center_with_spaces() {
        let center = parse_center("-97.74, 30.27").expect("center");
        assert_eq!(center, Coordinate::new(-97.74, 30.27));
    }

    #[test]
    fn rejects_malformed_center() {
        assert!(parse_center("30.27").is_err());
        assert!(parse_center("east,30").is_err());
        assert!(parse_center("NaN,1").is_err());
    }

    #[test]
    fn cli_accepts_negative_center() {
        let cli = GlobalCli::try_parse_from([
            "eventmap-page",
            "--center",
            "-0.09,51.505",
            "-vv",
        ])
        .expect("parse args");
        assert_eq!(cli.center, Some(Coordinate::new(-0.09, 51.505)));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.events, "-");
    }

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(log_level(0, 0), "warn");
        assert_eq!(log_level(1, 0), "info");
        assert_eq!(log_level(2, 0), "debug");
        assert_eq!(log_level(5, 0), "trace");
        assert_eq!(log_level(3, 1), "warn");
        assert_eq!(log_level(3, 2), "error");
    }

    #[test]
    fn repeated_init_is_tolerated() {
        init_tracing(0, 2).expect("first init");
        init_tracing(3, 0).expect("second init");
    }
}
