use std::fmt;

use eventmap_shared::Coordinate;

use crate::error::SurfaceError;
use crate::marker::Marker;

pub const LEAFLET_MAX_ZOOM: u8 = 19;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
pub struct LayerId(pub usize);

impl fmt::Display for LayerId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Background tile layer. Only the URL
/// template shape is checked; fetching
/// belongs to the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
  pub url_template: String,
  pub attribution:  String,
  pub max_zoom:     Option<u8>
}

impl TileSource {
  #[must_use]
  pub fn new(
    url_template: impl Into<String>,
    attribution: impl Into<String>
  ) -> Self {
    Self {
      url_template: url_template.into(),
      attribution:  attribution.into(),
      max_zoom:     Some(LEAFLET_MAX_ZOOM)
    }
  }

  pub fn validate(
    &self
  ) -> Result<(), SurfaceError> {
    let template =
      self.url_template.trim();
    if template.is_empty() {
      return Err(
        SurfaceError::InvalidTileSource(
          "empty URL template"
            .to_string()
        )
      );
    }

    let missing = ["{z}", "{x}", "{y}"]
      .into_iter()
      .filter(|placeholder| {
        !template.contains(placeholder)
      })
      .collect::<Vec<_>>();
    if !missing.is_empty() {
      return Err(
        SurfaceError::InvalidTileSource(
          format!(
            "{template} lacks {}",
            missing.join(", ")
          )
        )
      );
    }

    Ok(())
  }
}

/// Capabilities the presenter needs from
/// a map rendering library.
///
/// One value is one map. Implementations
/// decide what "render" means: the
/// in-memory surface only records state,
/// the Leaflet surface emits a page.
pub trait MapSurface {
  fn create_surface(
    &mut self,
    container_id: &str,
    view: Coordinate,
    zoom: i32
  ) -> Result<(), SurfaceError>;

  fn attach_tile_layer(
    &mut self,
    tiles: &TileSource
  ) -> Result<(), SurfaceError>;

  fn create_layer_group(
    &mut self
  ) -> Result<LayerId, SurfaceError>;

  fn add_marker_to_layer(
    &mut self,
    layer: LayerId,
    marker: &Marker
  ) -> Result<(), SurfaceError>;

  fn clear_layer(
    &mut self,
    layer: LayerId
  ) -> Result<(), SurfaceError>;

  fn set_view(
    &mut self,
    view: Coordinate,
    zoom: i32
  ) -> Result<(), SurfaceError>;
}

pub(crate) fn ensure_placeable(
  position: &Coordinate
) -> Result<(), SurfaceError> {
  if position.is_finite() {
    Ok(())
  } else {
    Err(SurfaceError::InvalidCoordinate(
      position.key().to_string()
    ))
  }
}
