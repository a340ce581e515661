pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod event_time;
pub mod leaflet;
pub mod marker;
pub mod memory;
pub mod popup;
pub mod presenter;
pub mod surface;

use std::ffi::OsString;
use std::fs;
use std::io::{
  self,
  Read,
  Write
};

use anyhow::Context;
use clap::Parser;
pub use eventmap_shared::{
  Coordinate,
  CoordinateKey,
  EventDto
};
use tracing::{
  debug,
  info
};

use crate::color::ColorAssignment;
use crate::leaflet::LeafletSurface;
use crate::presenter::LocationMarkerPresenter;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting eventmap page renderer"
  );

  let cfg = config::PresenterConfig::load(
    cli.config.as_deref()
  )?;

  let events = read_events(&cli.events)
    .with_context(|| {
      format!(
        "failed to load events from {}",
        cli.events
      )
    })?;
  debug!(
    count = events.len(),
    "events loaded"
  );

  let center = cli
    .center
    .or_else(|| {
      events
        .iter()
        .map(EventDto::coordinate)
        .find(Coordinate::is_finite)
    })
    .unwrap_or(Coordinate::new(0.0, 0.0));
  let zoom =
    cli.zoom.unwrap_or(cfg.default_zoom);
  let tiles = cli
    .tiles
    .clone()
    .unwrap_or_else(|| cfg.tile_url.clone());
  let colors = match cli.seed {
    | Some(seed) => {
      ColorAssignment::seeded(seed)
    }
    | None => ColorAssignment::new()
  };

  let mut presenter =
    LocationMarkerPresenter::new(
      LeafletSurface::new([
        cli.container.as_str()
      ]),
      cfg
    )
    .with_color_assignment(colors);

  presenter
    .initialize(
      &cli.container,
      center,
      zoom,
      &tiles
    )
    .context("failed to set up map")?;
  let placed = presenter
    .render_events(&events)
    .context("failed to render events")?;

  let page = presenter
    .surface()
    .render_document(&cli.title)
    .context("failed to render page")?;

  match &cli.output {
    | Some(path) => {
      fs::write(path, &page)
        .with_context(|| {
          format!(
            "failed to write {}",
            path.display()
          )
        })?;
      info!(
        output = %path.display(),
        markers = placed,
        "page written"
      );
    }
    | None => {
      io::stdout()
        .lock()
        .write_all(page.as_bytes())
        .context(
          "failed to write page to \
           stdout"
        )?;
    }
  }

  info!("done");
  Ok(())
}

fn read_events(
  source: &str
) -> anyhow::Result<Vec<EventDto>> {
  let raw = if source == "-" {
    let mut buf = String::new();
    io::stdin()
      .read_to_string(&mut buf)
      .context("failed to read stdin")?;
    buf
  } else {
    fs::read_to_string(source)?
  };

  serde_json::from_str(&raw)
    .context("events must be a JSON array")
}
