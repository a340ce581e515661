//! Error types for the marker
//! presenter and its surfaces.

use thiserror::Error;

use crate::surface::LayerId;

/// Failures reported by a
/// [`crate::surface::MapSurface`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
  #[error("map container '{0}' not found")]
  ContainerNotFound(String),

  #[error(
    "map container '{0}' is already \
     initialized"
  )]
  AlreadyMounted(String),

  #[error("map surface is not mounted")]
  NotMounted,

  #[error("invalid tile source: {0}")]
  InvalidTileSource(String),

  #[error("unknown layer group {0}")]
  UnknownLayer(LayerId),

  #[error(
    "coordinate {0} cannot be placed on \
     the map"
  )]
  InvalidCoordinate(String)
}

/// Failures reported by
/// [`crate::presenter::LocationMarkerPresenter`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PresenterError {
  #[error("map initialization failed: {0}")]
  Initialization(String),

  #[error(
    "{operation} called before the map \
     was initialized"
  )]
  NotInitialized {
    operation: &'static str
  },

  #[error(transparent)]
  Surface(#[from] SurfaceError)
}

pub type PresenterResult<T> =
  Result<T, PresenterError>;
