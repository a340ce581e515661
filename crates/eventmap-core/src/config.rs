use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::color::Color;
use crate::marker::{
  MarkerTheme,
  marker_default_dot_size,
  marker_default_pin_size
};
use crate::popup::{
  PopupTheme,
  popup_default_border_width,
  popup_default_link_label
};
use crate::surface::{
  LEAFLET_MAX_ZOOM,
  TileSource
};

pub const CONFIG_ENV_VAR: &str =
  "EVENTMAP_CONFIG";
const CONFIG_DIR_NAME: &str = "eventmap";
const CONFIG_FILE_NAME: &str =
  "config.toml";

pub const DEFAULT_TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
pub const DEFAULT_TILE_ATTRIBUTION: &str =
  "© OpenStreetMap contributors, © CARTO";

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct PresenterConfig {
  #[serde(default)]
  pub version:          u32,
  #[serde(
    default = "config_default_zoom"
  )]
  pub default_zoom:     i32,
  #[serde(
    default = "config_default_tile_url"
  )]
  pub tile_url:         String,
  #[serde(
    default = "config_default_attribution"
  )]
  pub tile_attribution: String,
  #[serde(
    default = "config_default_max_zoom"
  )]
  pub max_zoom:         u8,
  pub timezone:         Option<String>,
  #[serde(
    default = "config_default_fallback_color"
  )]
  pub fallback_color:   Color,
  #[serde(default)]
  pub marker:           MarkerTheme,
  #[serde(default)]
  pub popup:            PopupTheme
}

fn config_default_zoom() -> i32 {
  13
}

fn config_default_tile_url() -> String {
  DEFAULT_TILE_URL.to_string()
}

fn config_default_attribution() -> String
{
  DEFAULT_TILE_ATTRIBUTION.to_string()
}

fn config_default_max_zoom() -> u8 {
  LEAFLET_MAX_ZOOM
}

/// Leaflet's stock marker blue.
fn config_default_fallback_color() -> Color
{
  Color::from_rgb(0x33, 0x88, 0xFF)
}

impl Default for PresenterConfig {
  fn default() -> Self {
    Self {
      version:          0,
      default_zoom:     13,
      tile_url:         DEFAULT_TILE_URL
        .to_string(),
      tile_attribution:
        DEFAULT_TILE_ATTRIBUTION
          .to_string(),
      max_zoom:         LEAFLET_MAX_ZOOM,
      timezone:         None,
      fallback_color:
        config_default_fallback_color(),
      marker:           MarkerTheme::default(),
      popup:            PopupTheme::default()
    }
  }
}

impl PresenterConfig {
  /// Loads from `path_override`, then
  /// `$EVENTMAP_CONFIG`, then the user
  /// config dir. A missing file means
  /// defaults.
  #[tracing::instrument(skip(
    path_override
  ))]
  pub fn load(
    path_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(path_override)
    else {
      warn!(
        "no config location available; \
         using defaults"
      );
      return Ok(Self::default());
    };

    if !path.exists() {
      if path_override.is_some() {
        anyhow::bail!(
          "config file {} does not exist",
          path.display()
        );
      }
      warn!(
        file = %path.display(),
        "config file not found; using \
         defaults"
      );
      return Ok(Self::default());
    }

    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let config = Self::from_toml_str(&raw)
      .with_context(|| {
        format!(
          "invalid config file {}",
          path.display()
        )
      })?;

    info!(
      file = %path.display(),
      version = config.version,
      marker_style = ?config.marker.style,
      popup_style = ?config.popup.style,
      "loaded presenter config"
    );
    Ok(config)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<Self>(raw)
        .context("failed to parse TOML")?;
    config.sanitize();
    Ok(config)
  }

  fn sanitize(&mut self) {
    if self.tile_url.trim().is_empty() {
      debug!(
        "blank tile_url; restoring default"
      );
      self.tile_url =
        config_default_tile_url();
    }
    if self.max_zoom == 0 {
      self.max_zoom = LEAFLET_MAX_ZOOM;
    }
    if self.default_zoom < 0 {
      self.default_zoom = 0;
    }
    if self.default_zoom
      > i32::from(self.max_zoom)
    {
      self.default_zoom =
        i32::from(self.max_zoom);
    }
    if self.marker.dot_size == 0 {
      self.marker.dot_size =
        marker_default_dot_size();
    }
    if self.marker.pin_size == 0 {
      self.marker.pin_size =
        marker_default_pin_size();
    }
    if self.popup.link_label.trim().is_empty()
    {
      self.popup.link_label =
        popup_default_link_label();
    }
    if self.popup.border_width == 0 {
      self.popup.border_width =
        popup_default_border_width();
    }
  }

  #[must_use]
  pub fn tile_source(
    &self,
    url_template: &str
  ) -> TileSource {
    TileSource {
      url_template: url_template
        .to_string(),
      attribution:  self
        .tile_attribution
        .clone(),
      max_zoom:     Some(self.max_zoom)
    }
  }

  /// Falls back to UTC when unset or not
  /// a known IANA name.
  #[must_use]
  pub fn display_timezone(&self) -> Tz {
    let Some(raw) = self
      .timezone
      .as_deref()
      .map(str::trim)
      .filter(|raw| !raw.is_empty())
    else {
      return chrono_tz::UTC;
    };

    match raw.parse::<Tz>() {
      | Ok(tz) => tz,
      | Err(error) => {
        warn!(
          timezone = raw,
          %error,
          "unknown timezone; using UTC"
        );
        chrono_tz::UTC
      }
    }
  }
}

fn resolve_config_path(
  path_override: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = path_override {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(trimmed));
    }
  }

  dirs::config_dir().map(|dir| {
    dir
      .join(CONFIG_DIR_NAME)
      .join(CONFIG_FILE_NAME)
  })
}
