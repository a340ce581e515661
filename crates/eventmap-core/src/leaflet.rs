//! Leaflet-backed map surface.
//!
//! The surface keeps the map as state and
//! renders it on demand as a script or a
//! standalone page, so the output always
//! reflects the current marker set.

use std::collections::BTreeSet;

use eventmap_shared::Coordinate;
use serde_json::{
  Value,
  json
};

use crate::error::SurfaceError;
use crate::marker::Marker;
use crate::popup::escape_html;
use crate::surface::{
  LayerId,
  MapSurface,
  TileSource,
  ensure_placeable
};

pub const LEAFLET_VERSION: &str = "1.9.3";

#[derive(Debug, Clone, PartialEq)]
struct Mount {
  container: String,
  view:      Coordinate,
  zoom:      i32
}

#[derive(Debug, Clone, Default)]
pub struct LeafletSurface {
  containers:  BTreeSet<String>,
  mount:       Option<Mount>,
  tile_layers: Vec<TileSource>,
  layers:      Vec<Vec<String>>
}

impl LeafletSurface {
  /// `containers` are the element ids the
  /// page will provide.
  #[must_use]
  pub fn new<I, S>(containers: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>
  {
    Self {
      containers: containers
        .into_iter()
        .map(Into::into)
        .collect(),
      ..Self::default()
    }
  }

  #[must_use]
  pub fn marker_count(&self) -> usize {
    self.layers.iter().map(Vec::len).sum()
  }

  /// JavaScript that builds the map in
  /// its current state.
  pub fn script(
    &self
  ) -> Result<String, SurfaceError> {
    let mount = self
      .mount
      .as_ref()
      .ok_or(SurfaceError::NotMounted)?;

    let mut lines = Vec::new();
    lines.push(format!(
      "const map = L.map({}).setView({}, {});",
      json!(mount.container),
      lat_lng(&mount.view),
      mount.zoom
    ));

    for tiles in &self.tile_layers {
      let mut options = json!({
        "attribution": tiles.attribution
      });
      if let Some(max_zoom) = tiles.max_zoom
      {
        options["maxZoom"] = json!(max_zoom);
      }
      lines.push(format!(
        "L.tileLayer({}, {}).addTo(map);",
        json!(tiles.url_template),
        options
      ));
    }

    for (idx, markers) in
      self.layers.iter().enumerate()
    {
      lines.push(format!(
        "const {} = \
         L.layerGroup().addTo(map);",
        layer_var(LayerId(idx))
      ));
      lines.extend(markers.iter().cloned());
    }

    let mut script = lines.join("\n");
    script.push('\n');
    // Keep popup markup from closing the
    // surrounding <script> element.
    Ok(script.replace("</", "<\\/"))
  }

  /// Complete HTML page hosting the map
  /// in a full-viewport container.
  #[tracing::instrument(skip(self))]
  pub fn render_document(
    &self,
    title: &str
  ) -> Result<String, SurfaceError> {
    let script = self.script()?;
    let container = self
      .mount
      .as_ref()
      .map(|mount| {
        escape_html(&mount.container)
      })
      .unwrap_or_default();

    tracing::debug!(
      markers = self.marker_count(),
      bytes = script.len(),
      "rendered leaflet document"
    );

    Ok(format!(
      r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@{version}/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@{version}/dist/leaflet.js"></script>
    <style>
        html, body {{ margin: 0; padding: 0; }}
        .custom-div-icon, .custom-pin-icon {{ background: transparent; border: none; }}
    </style>
</head>
<body>
    <div id="{container}" style="height: 100vh; width: 100%;"></div>
    <script>
{script}    </script>
</body>
</html>
"#,
      title = escape_html(title),
      version = LEAFLET_VERSION,
      container = container,
      script = script
    ))
  }

  fn ensure_mounted(
    &self
  ) -> Result<(), SurfaceError> {
    match self.mount {
      | Some(_) => Ok(()),
      | None => Err(SurfaceError::NotMounted)
    }
  }
}

fn lat_lng(position: &Coordinate) -> Value {
  json!(position.lat_lng())
}

fn layer_var(layer: LayerId) -> String {
  format!("layer{}", layer.0)
}

fn marker_statement(
  layer: LayerId,
  marker: &Marker
) -> String {
  let icon = json!({
    "html": marker.icon.html,
    "className": marker.icon.class_name,
    "iconSize": marker.icon.size,
    "iconAnchor": marker.icon.anchor,
    "popupAnchor": marker.icon.popup_anchor
  });
  format!(
    "L.marker({}, {{ icon: L.divIcon({}) \
     }}).bindPopup({}).addTo({});",
    lat_lng(&marker.position),
    icon,
    json!(marker.popup_html),
    layer_var(layer)
  )
}

impl MapSurface for LeafletSurface {
  fn create_surface(
    &mut self,
    container_id: &str,
    view: Coordinate,
    zoom: i32
  ) -> Result<(), SurfaceError> {
    if let Some(mount) = &self.mount {
      return Err(
        SurfaceError::AlreadyMounted(
          mount.container.clone()
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

    self.mount = Some(Mount {
      container: container_id.to_string(),
      view,
      zoom
    });
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
    let statement =
      marker_statement(layer, marker);
    self
      .layers
      .get_mut(layer.0)
      .ok_or(SurfaceError::UnknownLayer(
        layer
      ))?
      .push(statement);
    Ok(())
  }

  fn clear_layer(
    &mut self,
    layer: LayerId
  ) -> Result<(), SurfaceError> {
    self
      .layers
      .get_mut(layer.0)
      .ok_or(SurfaceError::UnknownLayer(
        layer
      ))?
      .clear();
    Ok(())
  }

  fn set_view(
    &mut self,
    view: Coordinate,
    zoom: i32
  ) -> Result<(), SurfaceError> {
    ensure_placeable(&view)?;
    let mount = self
      .mount
      .as_mut()
      .ok_or(SurfaceError::NotMounted)?;
    mount.view = view;
    mount.zoom = zoom;
    Ok(())
  }
}
