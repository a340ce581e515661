use std::collections::BTreeSet;

use eventmap_shared::Coordinate;

use crate::error::SurfaceError;
use crate::marker::Marker;
use crate::surface::{
  LayerId,
  MapSurface,
  TileSource,
  ensure_placeable
};

/// Map surface that keeps everything in
/// memory. Containers must be declared
/// before a map can mount on them.
#[derive(Debug, Clone, Default)]
pub struct InMemorySurface {
  containers:  BTreeSet<String>,
  mounted:     Option<String>,
  view:        Option<(Coordinate, i32)>,
  tile_layers: Vec<TileSource>,
  layers:      Vec<Vec<Marker>>
}

impl InMemorySurface {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_container(
    mut self,
    container_id: impl Into<String>
  ) -> Self {
    self
      .containers
      .insert(container_id.into());
    self
  }

  #[must_use]
  pub fn mounted_container(
    &self
  ) -> Option<&str> {
    self.mounted.as_deref()
  }

  #[must_use]
  pub fn view(
    &self
  ) -> Option<(Coordinate, i32)> {
    self.view
  }

  #[must_use]
  pub fn tile_layers(&self) -> &[TileSource] {
    &self.tile_layers
  }

  #[must_use]
  pub fn layer_count(&self) -> usize {
    self.layers.len()
  }

  #[must_use]
  pub fn markers(
    &self,
    layer: LayerId
  ) -> &[Marker] {
    self
      .layers
      .get(layer.0)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  #[must_use]
  pub fn marker_count(&self) -> usize {
    self.layers.iter().map(Vec::len).sum()
  }

  fn ensure_mounted(
    &self
  ) -> Result<(), SurfaceError> {
    if self.mounted.is_some() {
      Ok(())
    } else {
      Err(SurfaceError::NotMounted)
    }
  }

  fn layer_mut(
    &mut self,
    layer: LayerId
  ) -> Result<&mut Vec<Marker>, SurfaceError>
  {
    self
      .layers
      .get_mut(layer.0)
      .ok_or(SurfaceError::UnknownLayer(
        layer
      ))
  }
}

impl MapSurface for InMemorySurface {
  fn create_surface(
    &mut self,
    container_id: &str,
    view: Coordinate,
    zoom: i32
  ) -> Result<(), SurfaceError> {
    if let Some(existing) = &self.mounted
    {
      return Err(
        SurfaceError::AlreadyMounted(
          existing.clone()
        )
      );
    }
    if !self.containers.contains(container_id)
    {
      return Err(
        SurfaceError::ContainerNotFound(
          container_id.to_string()
        )
      );
    }
    ensure_placeable(&view)?;

    self.mounted =
      Some(container_id.to_string());
    self.view = Some((view, zoom));
    Ok(())
  }

  fn attach_tile_layer(
    &mut self,
    tiles: &TileSource
  ) -> Result<(), SurfaceError> {
    self.ensure_mounted()?;
    tiles.validate()?;
    self.tile_layers.push(tiles.clone());
    Ok(())
  }

  fn create_layer_group(
    &mut self
  ) -> Result<LayerId, SurfaceError> {
    self.ensure_mounted()?;
    self.layers.push(Vec::new());
    Ok(LayerId(self.layers.len() - 1))
  }

  fn add_marker_to_layer(
    &mut self,
    layer: LayerId,
    marker: &Marker
  ) -> Result<(), SurfaceError> {
    ensure_placeable(&marker.position)?;
    self
      .layer_mut(layer)?
      .push(marker.clone());
    Ok(())
  }

  fn clear_layer(
    &mut self,
    layer: LayerId
  ) -> Result<(), SurfaceError> {
    self.layer_mut(layer)?.clear();
    Ok(())
  }

  fn set_view(
    &mut self,
    view: Coordinate,
    zoom: i32
  ) -> Result<(), SurfaceError> {
    self.ensure_mounted()?;
    ensure_placeable(&view)?;
    self.view = Some((view, zoom));
    Ok(())
  }
}
