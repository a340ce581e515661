use std::fmt;

use serde::{
  Deserialize,
  Deserializer,
  Serialize
};

/// A `(longitude, latitude)` pair.
///
/// Locations are compared through
/// [`Coordinate::key`], never through
/// float tolerance.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Coordinate {
  pub longitude: f64,
  pub latitude:  f64
}

impl Coordinate {
  #[must_use]
  pub fn new(
    longitude: f64,
    latitude: f64
  ) -> Self {
    Self {
      longitude,
      latitude
    }
  }

  #[must_use]
  pub fn key(&self) -> CoordinateKey {
    CoordinateKey(format!(
      "{},{}",
      key_component(self.longitude),
      key_component(self.latitude)
    ))
  }

  /// Position in the `[lat, lng]`
  /// order map surfaces expect.
  #[must_use]
  pub fn lat_lng(&self) -> [f64; 2] {
    [self.latitude, self.longitude]
  }

  #[must_use]
  pub fn is_finite(&self) -> bool {
    self.longitude.is_finite()
      && self.latitude.is_finite()
  }
}

fn key_component(value: f64) -> f64 {
  // -0.0 and 0.0 name the same spot.
  if value == 0.0 { 0.0 } else { value }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
pub struct CoordinateKey(String);

impl CoordinateKey {
  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CoordinateKey {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Event record supplied by the
/// caller. Never modified here.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct EventDto {
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub name:          String,
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub start_time:    String,
  pub longitude:     f64,
  pub latitude:      f64,
  #[serde(default)]
  pub extracted_url: Option<String>
}

/// Extractors emit `null` for text they
/// could not find; treat it as blank.
fn null_as_empty<'de, D>(
  deserializer: D
) -> Result<String, D::Error>
where
  D: Deserializer<'de>
{
  Option::<String>::deserialize(
    deserializer
  )
  .map(Option::unwrap_or_default)
}

impl EventDto {
  #[must_use]
  pub fn coordinate(&self) -> Coordinate {
    Coordinate::new(
      self.longitude,
      self.latitude
    )
  }

  #[must_use]
  pub fn source_url(&self) -> Option<&str> {
    self
      .extracted_url
      .as_deref()
      .map(str::trim)
      .filter(|url| !url.is_empty())
  }
}
