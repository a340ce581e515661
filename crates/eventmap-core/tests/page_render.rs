use std::ffi::OsString;
use std::fs;

use eventmap_core::config::PresenterConfig;
use eventmap_core::marker::MarkerStyle;
use tempfile::tempdir;

const EVENTS_JSON: &str = r#"[
  {"name": "Open mic", "start_time": "2024-03-15T14:30:00Z", "longitude": -97.74, "latitude": 30.27,
   "extracted_url": "https://example.com/open-mic"},
  {"name": "Trivia", "start_time": "2024-03-15 19:00:00+00:00", "longitude": -97.74, "latitude": 30.27},
  {"name": "Gallery", "start_time": "not a time", "longitude": -97.75, "latitude": 30.26}
]"#;

fn args(items: &[&str]) -> Vec<OsString> {
    std::iter::once("eventmap-page")
        .chain(items.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn renders_grouped_markers_to_file() {
    let temp = tempdir().expect("tempdir");
    let events = temp.path().join("events.json");
    let config = temp.path().join("config.toml");
    let output = temp.path().join("map.html");
    fs::write(&events, EVENTS_JSON).expect("write events");
    fs::write(&config, "[marker]\nstyle = \"dot\"\n").expect("write config");

    eventmap_core::run(args(&[
        "--events",
        events.to_str().expect("utf8 path"),
        "--config",
        config.to_str().expect("utf8 path"),
        "--output",
        output.to_str().expect("utf8 path"),
        "--seed",
        "11",
        "--title",
        "Austin tonight",
        "-qq",
    ]))
    .expect("run renderer");

    let html = fs::read_to_string(&output).expect("read page");
    assert!(html.contains("<title>Austin tonight</title>"));
    assert_eq!(html.matches("L.marker(").count(), 2);
    assert_eq!(html.matches("custom-div-icon\"").count(), 2);
    assert!(html.contains("setView([30.27,-97.74], 13)"));
    assert!(html.contains("Invalid time"));
    assert!(html.contains("https://example.com/open-mic"));
}

#[test]
fn same_seed_renders_identical_pages() {
    let temp = tempdir().expect("tempdir");
    let events = temp.path().join("events.json");
    let config = temp.path().join("config.toml");
    fs::write(&events, EVENTS_JSON).expect("write events");
    fs::write(&config, "").expect("write config");

    let render = |name: &str| {
        let output = temp.path().join(name);
        eventmap_core::run(args(&[
            "--events",
            events.to_str().expect("utf8 path"),
            "--config",
            config.to_str().expect("utf8 path"),
            "--output",
            output.to_str().expect("utf8 path"),
            "--seed",
            "5",
            "--center",
            "-0.09,51.505",
            "--zoom",
            "9",
            "-qq",
        ]))
        .expect("run renderer");
        fs::read_to_string(output).expect("read page")
    };

    let first = render("a.html");
    let second = render("b.html");
    assert_eq!(first, second);
    assert!(first.contains("setView([51.505,-0.09], 9)"));
}

#[test]
fn null_start_time_renders_sentinel() {
    let temp = tempdir().expect("tempdir");
    let events = temp.path().join("events.json");
    let config = temp.path().join("config.toml");
    let output = temp.path().join("map.html");
    fs::write(
        &events,
        r#"[
  {"name": "Mass", "start_time": null, "longitude": -6.26, "latitude": 53.35, "eircode": "D01 F5P2"},
  {"name": null, "start_time": "2024-03-15T14:30:00Z", "longitude": -6.25, "latitude": 53.34, "extracted_url": null}
]"#,
    )
    .expect("write events");
    fs::write(&config, "").expect("write config");

    eventmap_core::run(args(&[
        "--events",
        events.to_str().expect("utf8 path"),
        "--config",
        config.to_str().expect("utf8 path"),
        "--output",
        output.to_str().expect("utf8 path"),
        "--seed",
        "3",
        "-qq",
    ]))
    .expect("run renderer");

    let html = fs::read_to_string(&output).expect("read page");
    assert_eq!(html.matches("L.marker(").count(), 2);
    assert!(html.contains("Mass"));
    assert!(html.contains("Invalid time"));
    assert!(html.contains("Friday, March 15, 2024 at 2:30 PM"));
}

#[test]
fn malformed_events_are_reported() {
    let temp = tempdir().expect("tempdir");
    let events = temp.path().join("events.json");
    let config = temp.path().join("config.toml");
    fs::write(&events, "{\"name\": \"not a list\"}").expect("write events");
    fs::write(&config, "").expect("write config");

    let err = eventmap_core::run(args(&[
        "--events",
        events.to_str().expect("utf8 path"),
        "--config",
        config.to_str().expect("utf8 path"),
        "-qq",
    ]))
    .expect_err("invalid events");
    assert!(format!("{err:#}").contains("JSON array"));
}

#[test]
fn config_loads_from_explicit_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("eventmap.toml");
    fs::write(
        &path,
        "default_zoom = 10\ntimezone = \"Europe/Paris\"\n[marker]\nstyle = \"dot\"\n",
    )
    .expect("write config");

    let config = PresenterConfig::load(Some(&path)).expect("load config");
    assert_eq!(config.default_zoom, 10);
    assert_eq!(config.marker.style, MarkerStyle::Dot);
    assert_eq!(config.display_timezone(), chrono_tz::Europe::Paris);
}

#[test]
fn missing_explicit_config_is_an_error() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("absent.toml");
    let err = PresenterConfig::load(Some(&path)).expect_err("missing file");
    assert!(err.to_string().contains("does not exist"));
}
