use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use eventmap_shared::{
  Coordinate,
  CoordinateKey,
  EventDto
};
use rand::rngs::StdRng;
use rand::{
  Rng,
  SeedableRng
};
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

const HEX_DIGITS: &[u8; 16] =
  b"0123456789ABCDEF";

fn hex_color_re()
-> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^#?(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$"
    )
    .ok()
  })
  .as_ref()
}

/// A `#RRGGBB` color, always stored
/// uppercase.
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
#[serde(
  try_from = "String",
  into = "String"
)]
pub struct Color(String);

impl Color {
  /// Accepts `#RGB` or `#RRGGBB`, with
  /// or without the leading `#`.
  pub fn parse(
    value: &str
  ) -> Result<Self, String> {
    let trimmed = value.trim();
    if !hex_color_re()
      .is_some_and(|re| re.is_match(trimmed))
    {
      return Err(format!(
        "invalid hex color: \
         {trimmed:?}"
      ));
    }

    let raw =
      trimmed.trim_start_matches('#');
    let mut normalized =
      String::with_capacity(7);
    normalized.push('#');
    if raw.len() == 3 {
      for ch in raw.chars() {
        normalized.push(ch);
        normalized.push(ch);
      }
    } else {
      normalized.push_str(raw);
    }

    Ok(Self(
      normalized.to_ascii_uppercase()
    ))
  }

  #[must_use]
  pub fn from_rgb(
    red: u8,
    green: u8,
    blue: u8
  ) -> Self {
    Self(format!(
      "#{red:02X}{green:02X}{blue:02X}"
    ))
  }

  /// Two hex digits per channel, each
  /// drawn uniformly from `0-9A-F`.
  pub fn random<R: Rng>(
    rng: &mut R
  ) -> Self {
    let mut color =
      String::with_capacity(7);
    color.push('#');
    for _ in 0..6 {
      let idx = rng.random_range(
        0..HEX_DIGITS.len()
      );
      color.push(char::from(
        HEX_DIGITS[idx]
      ));
    }
    Self(color)
  }

  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Color {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl TryFrom<String> for Color {
  type Error = String;

  fn try_from(
    value: String
  ) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<Color> for String {
  fn from(color: Color) -> Self {
    color.0
  }
}

/// Per-location colors. Entries are
/// only ever added.
#[derive(Debug, Clone)]
pub struct ColorAssignment {
  colors: BTreeMap<CoordinateKey, Color>,
  rng:    StdRng
}

impl Default for ColorAssignment {
  fn default() -> Self {
    Self::new()
  }
}

impl ColorAssignment {
  #[must_use]
  pub fn new() -> Self {
    Self {
      colors: BTreeMap::new(),
      rng:    StdRng::from_os_rng()
    }
  }

  /// Reproducible colors for the same
  /// seed and observation order.
  #[must_use]
  pub fn seeded(seed: u64) -> Self {
    Self {
      colors: BTreeMap::new(),
      rng:    StdRng::seed_from_u64(seed)
    }
  }

  #[tracing::instrument(
    skip(self, events),
    fields(events = events.len())
  )]
  pub fn assign(
    &mut self,
    events: &[EventDto]
  ) -> &BTreeMap<CoordinateKey, Color> {
    for event in events {
      self.assign_location(
        event.coordinate()
      );
    }
    &self.colors
  }

  /// Returns the location's color,
  /// generating one on first sight.
  pub fn assign_location(
    &mut self,
    location: Coordinate
  ) -> &Color {
    let key = location.key();
    let rng = &mut self.rng;
    self.colors.entry(key).or_insert_with_key(
      |key| {
        let color = Color::random(rng);
        tracing::trace!(
          location = %key,
          color = %color,
          "assigned location color"
        );
        color
      }
    )
  }

  #[must_use]
  pub fn get(
    &self,
    location: &Coordinate
  ) -> Option<&Color> {
    self.colors.get(&location.key())
  }

  #[must_use]
  pub fn as_map(
    &self
  ) -> &BTreeMap<CoordinateKey, Color> {
    &self.colors
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.colors.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.colors.is_empty()
  }
}
