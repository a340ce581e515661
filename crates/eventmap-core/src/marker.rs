use eventmap_shared::Coordinate;
use serde::{
  Deserialize,
  Serialize
};

use crate::color::Color;
use crate::popup::PopupContent;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
  /// Small filled circle.
  Dot,
  /// Teardrop pin anchored at its tip.
  #[default]
  Pin
}

impl MarkerStyle {
  #[must_use]
  pub fn as_class(self) -> &'static str {
    match self {
      | Self::Dot => "custom-div-icon",
      | Self::Pin => "custom-pin-icon"
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct MarkerTheme {
  #[serde(default)]
  pub style:        MarkerStyle,
  #[serde(
    default = "marker_default_dot_size"
  )]
  pub dot_size:     u32,
  #[serde(
    default = "marker_default_pin_size"
  )]
  pub pin_size:     u32,
  #[serde(
    default = "marker_default_border_color"
  )]
  pub border_color: Color
}

pub(crate) fn marker_default_dot_size()
-> u32 {
  12
}

pub(crate) fn marker_default_pin_size()
-> u32 {
  24
}

fn marker_default_border_color() -> Color
{
  Color::from_rgb(0xFF, 0xFF, 0xFF)
}

impl Default for MarkerTheme {
  fn default() -> Self {
    Self {
      style:        MarkerStyle::Pin,
      dot_size:     12,
      pin_size:     24,
      border_color:
        marker_default_border_color()
    }
  }
}

/// A `divIcon`-style icon: markup plus
/// pixel geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct IconSpec {
  pub html:         String,
  pub class_name:   &'static str,
  pub size:         [u32; 2],
  pub anchor:       [u32; 2],
  pub popup_anchor: [i64; 2]
}

impl IconSpec {
  #[must_use]
  pub fn for_style(
    theme: &MarkerTheme,
    fill: &Color
  ) -> Self {
    match theme.style {
      | MarkerStyle::Dot => {
        let size = theme.dot_size;
        Self {
          html: format!(
            "<div style=\"background-color: \
             {fill}; width: {size}px; \
             height: {size}px; \
             border-radius: 50%; border: \
             2px solid {};\"></div>",
            theme.border_color
          ),
          class_name: MarkerStyle::Dot
            .as_class(),
          size: [size, size],
          anchor: [size / 2, size / 2],
          popup_anchor: [0, 0]
        }
      }
      | MarkerStyle::Pin => {
        let size = theme.pin_size;
        Self {
          html: format!(
            "<div style=\"background-color: \
             {fill}; width: {size}px; \
             height: {size}px; \
             border-radius: 50% 50% 50% 0; \
             transform: rotate(-45deg); \
             border: 2px solid {}; \
             box-shadow: 0 1px 4px \
             rgba(0, 0, 0, 0.4);\"></div>",
            theme.border_color
          ),
          class_name: MarkerStyle::Pin
            .as_class(),
          size: [size, size],
          anchor: [size / 2, size],
          popup_anchor: [
            0,
            -i64::from(size)
          ]
        }
      }
    }
  }
}

/// A marker ready to hand to a map
/// surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
  pub position:   Coordinate,
  pub color:      Color,
  pub icon:       IconSpec,
  pub popup:      PopupContent,
  pub popup_html: String
}

impl Marker {
  #[must_use]
  pub fn event_count(&self) -> usize {
    self.popup.len()
  }
}
