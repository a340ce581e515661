//! Popup content for location markers.
//!
//! Content is kept as a small tree of
//! [`PopupEntry`] values so it can be
//! inspected without parsing markup;
//! [`PopupContent::to_html`] renders it.

use serde::{
  Deserialize,
  Serialize
};

use crate::color::Color;

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
pub enum PopupStyle {
  /// Bold name over time, entries
  /// separated by rules.
  Plain,
  /// One bordered card per event.
  #[default]
  Card
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct PopupTheme {
  #[serde(default)]
  pub style:               PopupStyle,
  #[serde(default = "popup_true")]
  pub include_source_link: bool,
  #[serde(
    default = "popup_default_link_label"
  )]
  pub link_label:          String,
  #[serde(
    default = "popup_default_border_width"
  )]
  pub border_width:        u32
}

fn popup_true() -> bool {
  true
}

pub(crate) fn popup_default_link_label()
-> String {
  "View source".to_string()
}

pub(crate) fn popup_default_border_width()
-> u32 {
  4
}

impl Default for PopupTheme {
  fn default() -> Self {
    Self {
      style:               PopupStyle::Card,
      include_source_link: true,
      link_label:
        popup_default_link_label(),
      border_width:
        popup_default_border_width()
    }
  }
}

/// One event as shown inside a popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupEntry {
  pub title:      String,
  pub when:       String,
  pub source_url: Option<String>,
  pub accent:     Color
}

#[derive(
  Debug, Clone, Default, PartialEq,
)]
pub struct PopupContent {
  pub entries: Vec<PopupEntry>
}

impl PopupContent {
  #[must_use]
  pub fn new(
    entries: Vec<PopupEntry>
  ) -> Self {
    Self { entries }
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[must_use]
  pub fn to_html(
    &self,
    theme: &PopupTheme
  ) -> String {
    match theme.style {
      | PopupStyle::Plain => {
        self.plain_html(theme)
      }
      | PopupStyle::Card => {
        self.card_html(theme)
      }
    }
  }

  fn plain_html(
    &self,
    theme: &PopupTheme
  ) -> String {
    let body = self
      .entries
      .iter()
      .map(|entry| {
        let mut html = format!(
          "<div class=\"event-popup\">\
           <strong>{}</strong>\
           <div>{}</div>",
          escape_html(&entry.title),
          escape_html(&entry.when)
        );
        if let Some(link) =
          source_link(entry, theme)
        {
          html.push_str(&format!(
            "<div>{link}</div>"
          ));
        }
        html.push_str("</div>");
        html
      })
      .collect::<Vec<_>>()
      .join("<hr>");

    format!(
      "<div class=\"popup-content\">\
       {body}</div>"
    )
  }

  fn card_html(
    &self,
    theme: &PopupTheme
  ) -> String {
    let mut html = String::from(
      "<div class=\"popup-content \
       popup-cards\">"
    );
    for entry in &self.entries {
      html.push_str(&format!(
        "<div class=\"event-card\" \
         style=\"border-left: {}px solid \
         {}; padding: 6px 8px; \
         margin-bottom: 6px;\">\
         <div class=\"event-card-title\" \
         style=\"font-weight: \
         600;\">{}</div>\
         <div class=\"event-card-time\" \
         style=\"color: #555555; \
         font-size: 12px;\">{}</div>",
        theme.border_width,
        entry.accent,
        escape_html(&entry.title),
        escape_html(&entry.when)
      ));
      if let Some(link) =
        source_link(entry, theme)
      {
        html.push_str(&format!(
          "<div class=\"event-card-link\" \
           style=\"margin-top: \
           4px;\">{link}</div>"
        ));
      }
      html.push_str("</div>");
    }
    html.push_str("</div>");
    html
  }
}

fn source_link(
  entry: &PopupEntry,
  theme: &PopupTheme
) -> Option<String> {
  if !theme.include_source_link {
    return None;
  }
  let url = entry
    .source_url
    .as_deref()
    .filter(|url| is_linkable(url))?;
  Some(format!(
    "<a href=\"{}\" target=\"_blank\" \
     rel=\"noopener noreferrer\">{}</a>",
    escape_html(url),
    escape_html(&theme.link_label)
  ))
}

fn is_linkable(url: &str) -> bool {
  let lower = url.to_ascii_lowercase();
  lower.starts_with("http://")
    || lower.starts_with("https://")
}

/// Escapes text for element content and
/// double-quoted attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
  html_escape::encode_double_quoted_attribute(
    text
  )
  .into_owned()
}
