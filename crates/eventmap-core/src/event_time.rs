use chrono::{
  DateTime,
  Duration,
  FixedOffset,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;

pub const INVALID_TIME: &str =
  "Invalid time";

const DISPLAY_FORMAT: &str =
  "%A, %B %-d, %Y at %-I:%M %p";

const OFFSET_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f%:z",
  "%Y-%m-%d %H:%M:%S%.f%:z",
  "%Y-%m-%dT%H:%M:%S%.f%z",
  "%Y-%m-%d %H:%M:%S%.f%z",
  "%Y-%m-%dT%H:%M%:z",
  "%Y-%m-%d %H:%M%:z"
];

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M"
];

/// Renders event start times as long
/// `en-US` strings in one display
/// timezone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTimeFormatter {
  timezone: Tz
}

impl Default for EventTimeFormatter {
  fn default() -> Self {
    Self::new(chrono_tz::UTC)
  }
}

impl EventTimeFormatter {
  #[must_use]
  pub fn new(timezone: Tz) -> Self {
    Self { timezone }
  }

  #[must_use]
  pub fn timezone(&self) -> Tz {
    self.timezone
  }

  /// Never fails: anything that does
  /// not parse yields [`INVALID_TIME`].
  #[must_use]
  pub fn format(&self, raw: &str) -> String {
    match self.parse(raw) {
      | Some(instant) => instant
        .with_timezone(&self.timezone)
        .format(DISPLAY_FORMAT)
        .to_string(),
      | None => {
        tracing::debug!(
          raw,
          "unparseable event time"
        );
        INVALID_TIME.to_string()
      }
    }
  }

  #[must_use]
  pub fn parse(
    &self,
    raw: &str
  ) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return None;
    }

    if let Ok(parsed) =
      DateTime::parse_from_rfc3339(trimmed)
    {
      return Some(parsed.to_utc());
    }

    if let Some(parsed) =
      parse_with_offset(trimmed)
    {
      return Some(parsed.to_utc());
    }

    if let Some(naive) =
      parse_naive(trimmed)
    {
      return self.localize(naive);
    }

    // Date-only strings are UTC
    // midnight.
    NaiveDate::parse_from_str(
      trimmed, "%Y-%m-%d"
    )
    .ok()
    .and_then(|date| {
      date.and_hms_opt(0, 0, 0)
    })
    .map(|naive| naive.and_utc())
  }

  fn localize(
    &self,
    naive: NaiveDateTime
  ) -> Option<DateTime<Utc>> {
    match self
      .timezone
      .from_local_datetime(&naive)
    {
      | LocalResult::Single(dt) => {
        Some(dt.with_timezone(&Utc))
      }
      | LocalResult::Ambiguous(
        earliest,
        _
      ) => Some(
        earliest.with_timezone(&Utc)
      ),
      | LocalResult::None => {
        // Skipped by a DST jump; land
        // on the far side of the gap.
        let shifted = naive
          .checked_add_signed(
            Duration::hours(1)
          )?;
        self
          .timezone
          .from_local_datetime(&shifted)
          .earliest()
          .map(|dt| {
            dt.with_timezone(&Utc)
          })
      }
    }
  }
}

fn parse_with_offset(
  raw: &str
) -> Option<DateTime<FixedOffset>> {
  let normalized = match raw
    .strip_suffix('Z')
    .or_else(|| raw.strip_suffix('z'))
  {
    | Some(rest) => format!("{rest}+00:00"),
    | None => raw.to_string()
  };

  OFFSET_FORMATS.iter().find_map(
    |format| {
      DateTime::parse_from_str(
        &normalized,
        format
      )
      .ok()
    }
  )
}

fn parse_naive(
  raw: &str
) -> Option<NaiveDateTime> {
  NAIVE_FORMATS.iter().find_map(
    |format| {
      NaiveDateTime::parse_from_str(
        raw, format
      )
      .ok()
    }
  )
}
