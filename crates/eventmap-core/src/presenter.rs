use std::collections::BTreeMap;

use eventmap_shared::{
  Coordinate,
  CoordinateKey,
  EventDto
};
use tracing::{
  debug,
  info,
  warn
};

use crate::color::{
  Color,
  ColorAssignment
};
use crate::config::PresenterConfig;
use crate::error::{
  PresenterError,
  PresenterResult,
  SurfaceError
};
use crate::event_time::EventTimeFormatter;
use crate::marker::{
  IconSpec,
  Marker
};
use crate::popup::{
  PopupContent,
  PopupEntry
};
use crate::surface::{
  LayerId,
  MapSurface
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
enum PresenterState {
  Uninitialized,
  Ready { markers: LayerId }
}

/// Events sharing one coordinate key.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationGroup {
  pub location: Coordinate,
  pub events:   Vec<EventDto>
}

/// Groups events by coordinate key.
/// Locations keep first-seen order and
/// events keep input order.
#[must_use]
pub fn group_events_by_location(
  events: &[EventDto]
) -> Vec<LocationGroup> {
  let mut index: BTreeMap<
    CoordinateKey,
    usize
  > = BTreeMap::new();
  let mut groups: Vec<LocationGroup> =
    Vec::new();

  for event in events {
    let location = event.coordinate();
    let slot = *index
      .entry(location.key())
      .or_insert_with(|| {
        groups.push(LocationGroup {
          location,
          events: Vec::new()
        });
        groups.len() - 1
      });
    groups[slot].events.push(event.clone());
  }

  groups
}

/// Places per-location markers for
/// event lists on a [`MapSurface`].
///
/// The presenter owns its color map and
/// its marker layer; two presenters never
/// share either.
#[derive(Debug)]
pub struct LocationMarkerPresenter<S> {
  surface:   S,
  config:    PresenterConfig,
  colors:    ColorAssignment,
  formatter: EventTimeFormatter,
  state:     PresenterState
}

impl<S: MapSurface> LocationMarkerPresenter<S> {
  #[must_use]
  pub fn new(
    surface: S,
    config: PresenterConfig
  ) -> Self {
    let formatter = EventTimeFormatter::new(
      config.display_timezone()
    );
    Self {
      surface,
      config,
      colors: ColorAssignment::new(),
      formatter,
      state: PresenterState::Uninitialized
    }
  }

  /// Swaps in a caller-supplied color
  /// map, e.g. a seeded one.
  #[must_use]
  pub fn with_color_assignment(
    mut self,
    colors: ColorAssignment
  ) -> Self {
    self.colors = colors;
    self
  }

  #[must_use]
  pub fn is_ready(&self) -> bool {
    matches!(
      self.state,
      PresenterState::Ready { .. }
    )
  }

  #[must_use]
  pub fn colors(&self) -> &ColorAssignment {
    &self.colors
  }

  #[must_use]
  pub fn config(&self) -> &PresenterConfig {
    &self.config
  }

  #[must_use]
  pub fn surface(&self) -> &S {
    &self.surface
  }

  #[must_use]
  pub fn into_surface(self) -> S {
    self.surface
  }

  /// The layer group holding this
  /// presenter's markers, once ready.
  #[must_use]
  pub fn marker_layer(&self) -> Option<LayerId> {
    match self.state {
      | PresenterState::Ready { markers } => {
        Some(markers)
      }
      | PresenterState::Uninitialized => None
    }
  }

  #[tracing::instrument(
    skip(self, tile_source_url),
    fields(container = container_id)
  )]
  pub fn initialize(
    &mut self,
    container_id: &str,
    initial_view: Coordinate,
    zoom_level: i32,
    tile_source_url: &str
  ) -> PresenterResult<()> {
    if self.is_ready() {
      return Err(
        PresenterError::Initialization(
          "map container is already \
           initialized"
            .to_string()
        )
      );
    }

    let tiles =
      self.config.tile_source(tile_source_url);
    tiles.validate().map_err(init_error)?;

    self
      .surface
      .create_surface(
        container_id,
        initial_view,
        zoom_level
      )
      .map_err(init_error)?;
    self
      .surface
      .attach_tile_layer(&tiles)
      .map_err(init_error)?;
    let markers = self
      .surface
      .create_layer_group()
      .map_err(init_error)?;

    self.state =
      PresenterState::Ready { markers };
    info!(
      view = %initial_view.key(),
      zoom = zoom_level,
      timezone = %self.formatter.timezone(),
      "map initialized"
    );
    Ok(())
  }

  /// Colors every unseen event location
  /// and returns the cumulative map.
  pub fn assign_colors(
    &mut self,
    events: &[EventDto]
  ) -> PresenterResult<
    &BTreeMap<CoordinateKey, Color>
  > {
    self.ready("assign_colors")?;
    Ok(self.colors.assign(events))
  }

  pub fn clear_markers(
    &mut self
  ) -> PresenterResult<()> {
    let layer =
      self.ready("clear_markers")?;
    self.surface.clear_layer(layer)?;
    debug!("markers cleared");
    Ok(())
  }

  /// Adds one marker at `location` whose
  /// popup lists every event in `events`.
  /// Does not clear existing markers.
  pub fn add_location_marker(
    &mut self,
    location: Coordinate,
    events: &[EventDto]
  ) -> PresenterResult<()> {
    let layer =
      self.ready("add_location_marker")?;
    let color = self.color_for(&location);
    let entries = events
      .iter()
      .map(|event| {
        self.popup_entry(
          &event.name,
          &event.start_time,
          event.source_url(),
          &color
        )
      })
      .collect();
    let marker = self.compose_marker(
      location, color, entries
    );

    self
      .surface
      .add_marker_to_layer(layer, &marker)?;
    debug!(
      location = %location.key(),
      color = %marker.color,
      events = marker.event_count(),
      "location marker added"
    );
    Ok(())
  }

  /// One full render cycle: clear, color,
  /// group and place. Returns the number
  /// of markers placed.
  #[tracing::instrument(
    skip(self, events),
    fields(events = events.len())
  )]
  pub fn render_events(
    &mut self,
    events: &[EventDto]
  ) -> PresenterResult<usize> {
    self.clear_markers()?;
    self.assign_colors(events)?;

    let mut placed = 0;
    for group in
      group_events_by_location(events)
    {
      if !group.location.is_finite() {
        warn!(
          location = %group.location.key(),
          events = group.events.len(),
          "skipping events without a \
           placeable location"
        );
        continue;
      }
      self.add_location_marker(
        group.location,
        &group.events
      )?;
      placed += 1;
    }

    info!(
      markers = placed,
      colors = self.colors.len(),
      "render cycle complete"
    );
    Ok(placed)
  }

  #[must_use]
  pub fn format_event_time(
    &self,
    raw: &str
  ) -> String {
    self.formatter.format(raw)
  }

  pub fn set_view(
    &mut self,
    coords: Coordinate,
    zoom: i32
  ) -> PresenterResult<()> {
    self.ready("set_view")?;
    self.surface.set_view(coords, zoom)?;
    debug!(
      view = %coords.key(),
      zoom,
      "view recentered"
    );
    Ok(())
  }

  /// Builds a single-event marker without
  /// placing it anywhere.
  pub fn build_marker(
    &self,
    coords: Coordinate,
    color: &Color,
    title: &str,
    start_time: &str,
    source_url: Option<&str>
  ) -> PresenterResult<Marker> {
    self.ready("build_marker")?;
    let source_url = source_url
      .map(str::trim)
      .filter(|url| !url.is_empty());
    let entry = self.popup_entry(
      title, start_time, source_url, color
    );
    Ok(self.compose_marker(
      coords,
      color.clone(),
      vec![entry]
    ))
  }

  fn ready(
    &self,
    operation: &'static str
  ) -> PresenterResult<LayerId> {
    self.marker_layer().ok_or(
      PresenterError::NotInitialized {
        operation
      }
    )
  }

  fn color_for(
    &self,
    location: &Coordinate
  ) -> Color {
    if let Some(color) =
      self.colors.get(location)
    {
      return color.clone();
    }

    warn!(
      location = %location.key(),
      fallback = %self.config.fallback_color,
      "no color assigned to location; \
       using fallback"
    );
    self.config.fallback_color.clone()
  }

  fn popup_entry(
    &self,
    title: &str,
    start_time: &str,
    source_url: Option<&str>,
    accent: &Color
  ) -> PopupEntry {
    PopupEntry {
      title:      title.to_string(),
      when:       self
        .formatter
        .format(start_time),
      source_url: source_url
        .map(str::to_string),
      accent:     accent.clone()
    }
  }

  fn compose_marker(
    &self,
    position: Coordinate,
    color: Color,
    entries: Vec<PopupEntry>
  ) -> Marker {
    let icon = IconSpec::for_style(
      &self.config.marker,
      &color
    );
    let popup = PopupContent::new(entries);
    let popup_html =
      popup.to_html(&self.config.popup);
    Marker {
      position,
      color,
      icon,
      popup,
      popup_html
    }
  }
}

fn init_error(
  err: SurfaceError
) -> PresenterError {
  PresenterError::Initialization(
    err.to_string()
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::InMemorySurface;

  const TILES: &str =
    "https://tiles.example.com/{z}/{x}/{y}.png";

  fn event(
    name: &str,
    longitude: f64,
    latitude: f64
  ) -> EventDto {
    EventDto {
      name: name.to_string(),
      start_time: "2024-03-15T14:30:00Z"
        .to_string(),
      longitude,
      latitude,
      extracted_url: None
    }
  }

  fn presenter()
  -> LocationMarkerPresenter<InMemorySurface>
  {
    LocationMarkerPresenter::new(
      InMemorySurface::new()
        .with_container("map"),
      PresenterConfig::default()
    )
    .with_color_assignment(
      ColorAssignment::seeded(42)
    )
  }

  fn ready_presenter()
  -> LocationMarkerPresenter<InMemorySurface>
  {
    let mut presenter = presenter();
    presenter
      .initialize(
        "map",
        Coordinate::new(-0.09, 51.505),
        13,
        TILES
      )
      .expect("initialize");
    presenter
  }

  #[test]
  fn groups_keep_first_seen_order() {
    let events = vec![
      event("a", 1.0, 1.0),
      event("b", 2.0, 2.0),
      event("c", 1.0, 1.0),
    ];
    let groups =
      group_events_by_location(&events);
    assert_eq!(groups.len(), 2);
    assert_eq!(
      groups[0].location,
      Coordinate::new(1.0, 1.0)
    );
    assert_eq!(
      groups[0]
        .events
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>(),
      vec!["a", "c"]
    );
    assert_eq!(groups[1].events.len(), 1);
  }

  #[test]
  fn operations_before_initialize_fail() {
    let mut presenter = presenter();
    let events =
      vec![event("a", 1.0, 1.0)];

    assert_eq!(
      presenter
        .assign_colors(&events)
        .map(|colors| colors.len()),
      Err(PresenterError::NotInitialized {
        operation: "assign_colors"
      })
    );
    assert_eq!(
      presenter.clear_markers(),
      Err(PresenterError::NotInitialized {
        operation: "clear_markers"
      })
    );
    assert!(matches!(
      presenter.add_location_marker(
        Coordinate::new(1.0, 1.0),
        &events
      ),
      Err(PresenterError::NotInitialized {
        ..
      })
    ));
    assert!(matches!(
      presenter.set_view(
        Coordinate::new(1.0, 1.0),
        4
      ),
      Err(PresenterError::NotInitialized {
        ..
      })
    ));
    assert!(matches!(
      presenter.render_events(&events),
      Err(PresenterError::NotInitialized {
        ..
      })
    ));
    assert_eq!(
      presenter
        .build_marker(
          Coordinate::new(1.0, 1.0),
          &Color::from_rgb(0, 0, 0),
          "a",
          "2024-03-15T14:30:00Z",
          None
        )
        .map(|marker| marker.event_count()),
      Err(PresenterError::NotInitialized {
        operation: "build_marker"
      })
    );
    assert!(presenter.colors().is_empty());
    assert_eq!(
      presenter
        .format_event_time("garbage"),
      crate::event_time::INVALID_TIME
    );
  }

  #[test]
  fn unknown_container_is_initialization_error(
  ) {
    let mut presenter = presenter();
    let err = presenter
      .initialize(
        "missing",
        Coordinate::new(0.0, 0.0),
        13,
        TILES
      )
      .expect_err("missing container");
    assert!(matches!(
      err,
      PresenterError::Initialization(_)
    ));
    assert!(!presenter.is_ready());
  }

  #[test]
  fn bad_tile_template_leaves_surface_unmounted(
  ) {
    let mut presenter = presenter();
    let err = presenter
      .initialize(
        "map",
        Coordinate::new(0.0, 0.0),
        13,
        "https://tiles.example.com/static.png"
      )
      .expect_err("bad tiles");
    assert!(matches!(
      err,
      PresenterError::Initialization(_)
    ));
    assert!(
      presenter
        .surface()
        .mounted_container()
        .is_none()
    );
  }

  #[test]
  fn second_initialize_is_rejected() {
    let mut presenter = ready_presenter();
    assert!(matches!(
      presenter.initialize(
        "map",
        Coordinate::new(0.0, 0.0),
        13,
        TILES
      ),
      Err(PresenterError::Initialization(_))
    ));
    assert!(presenter.is_ready());
  }

  #[test]
  fn missing_color_uses_fallback() {
    let mut presenter = ready_presenter();
    presenter
      .add_location_marker(
        Coordinate::new(9.0, 9.0),
        &[event("a", 9.0, 9.0)]
      )
      .expect("add marker");

    let layer = presenter
      .marker_layer()
      .expect("ready layer");
    let markers =
      presenter.surface().markers(layer);
    assert_eq!(markers.len(), 1);
    assert_eq!(
      markers[0].color.as_str(),
      "#3388FF"
    );
    assert!(presenter.colors().is_empty());
  }

  #[test]
  fn clear_keeps_color_assignment() {
    let mut presenter = ready_presenter();
    let events =
      vec![event("a", 1.0, 1.0)];
    presenter
      .render_events(&events)
      .expect("render");
    presenter
      .clear_markers()
      .expect("clear");

    assert_eq!(
      presenter.surface().marker_count(),
      0
    );
    assert_eq!(presenter.colors().len(), 1);
  }

  #[test]
  fn build_marker_does_not_place() {
    let presenter = ready_presenter();
    let color = Color::parse("#00FF00")
      .expect("valid color");
    let marker = presenter
      .build_marker(
        Coordinate::new(3.0, 4.0),
        &color,
        "Gallery night",
        "2024-03-15T14:30:00Z",
        Some("https://example.com/g")
      )
      .expect("build marker");

    assert_eq!(marker.event_count(), 1);
    assert_eq!(marker.color, color);
    assert!(marker.popup_html.contains(
      "Gallery night"
    ));
    assert!(marker.popup_html.contains(
      "href=\"https://example.com/g\""
    ));
    assert_eq!(
      presenter.surface().marker_count(),
      0
    );
  }

  #[test]
  fn add_appends_without_clearing() {
    let mut presenter = ready_presenter();
    let here = Coordinate::new(1.0, 1.0);
    let events = vec![
      event("a", 1.0, 1.0),
      event("b", 1.0, 1.0),
    ];
    presenter
      .assign_colors(&events)
      .expect("assign");

    presenter
      .add_location_marker(here, &events)
      .expect("first add");
    presenter
      .add_location_marker(here, &events)
      .expect("second add");
    assert_eq!(
      presenter.surface().marker_count(),
      2
    );

    let placed = presenter
      .render_events(&events)
      .expect("render");
    assert_eq!(placed, 1);
    assert_eq!(
      presenter.surface().marker_count(),
      1
    );
  }

  #[test]
  fn initialize_mounts_tiles_and_one_layer() {
    let surface =
      ready_presenter().into_surface();
    assert_eq!(
      surface.mounted_container(),
      Some("map")
    );
    assert_eq!(surface.layer_count(), 1);
    assert_eq!(
      surface
        .tile_layers()
        .iter()
        .map(|tiles| {
          tiles.url_template.as_str()
        })
        .collect::<Vec<_>>(),
      vec![TILES]
    );
    assert_eq!(
      surface.view(),
      Some((
        Coordinate::new(-0.09, 51.505),
        13
      ))
    );
  }

  #[test]
  fn non_finite_locations_are_skipped() {
    let mut presenter = ready_presenter();
    let placed = presenter
      .render_events(&[
        event("ok", 1.0, 1.0),
        event("lost", f64::NAN, 1.0),
      ])
      .expect("render");
    assert_eq!(placed, 1);
    assert_eq!(
      presenter.surface().marker_count(),
      1
    );
  }
}
