// Tests for instance report generation

use fedindex_core::report::{
    HTML_REPORT_FILE, JSON_REPORT_FILE, ReportData, ReportFormat, build_report,
    generate_html_report, generate_json_report, generate_text_report, normalize_domain,
    save_report,
};
use fedindex_scanner::registry::{FailureKind, Outcome, SeenRegistry};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn registry_with(entries: &[(&str, Outcome)]) -> SeenRegistry {
    let mut registry = SeenRegistry::new();
    for (depth, (id, outcome)) in entries.iter().enumerate() {
        registry.insert_if_absent(id, depth);
        registry.resolve(id, outcome.clone());
    }
    registry
}

fn dead(reason: &str) -> Outcome {
    Outcome::Dead {
        kind: FailureKind::Transport,
        reason: reason.to_string(),
    }
}

// ============================================================================
// Normalization Tests
// ============================================================================

#[test]
fn test_normalize_strips_path_and_query() {
    assert_eq!(
        normalize_domain("https://a.example/actor/following?page=2#x"),
        "https://a.example"
    );
}

#[test]
fn test_normalize_root() {
    assert_eq!(normalize_domain("https://a.example"), "https://a.example");
    assert_eq!(normalize_domain("https://a.example/"), "https://a.example");
}

#[test]
fn test_normalize_keeps_non_default_port() {
    assert_eq!(
        normalize_domain("http://127.0.0.1:8080/board"),
        "http://127.0.0.1:8080"
    );
    assert_eq!(normalize_domain("https://a.example:443/x"), "https://a.example");
}

#[test]
fn test_normalize_lowercases_host() {
    assert_eq!(normalize_domain("https://A.Example/x"), "https://a.example");
}

#[test]
fn test_normalize_onion() {
    assert_eq!(
        normalize_domain("http://abcdefghij234567.onion/prog"),
        "http://abcdefghij234567.onion"
    );
}

#[test]
fn test_normalize_invalid_falls_back_to_trimmed_input() {
    assert_eq!(normalize_domain("  not a url/ "), "not a url");
}

#[test]
fn test_normalize_is_idempotent() {
    let samples = [
        "https://a.example/actor",
        "http://127.0.0.1:8080/board/",
        "https://A.Example:443",
        "http://abcdefghij234567.onion/prog?x=1",
        "not a url/",
        "  https://b.example  ",
        "",
    ];
    for sample in samples {
        let once = normalize_domain(sample);
        assert_eq!(normalize_domain(&once), once, "not idempotent for {:?}", sample);
    }
}

// ============================================================================
// Report Builder Tests
// ============================================================================

#[test]
fn test_build_report_partitions_alive_and_dead() {
    let registry = registry_with(&[
        ("https://a.example", Outcome::Alive),
        ("https://b.example", Outcome::Alive),
        ("https://c.example", dead("request to https://c.example/following timed out")),
    ]);

    let data = build_report(&registry);
    assert_eq!(
        data.alive,
        BTreeSet::from(["https://a.example".to_string(), "https://b.example".to_string()])
    );
    assert_eq!(data.dead.len(), 1);
    assert_eq!(
        data.dead["https://c.example"],
        "request to https://c.example/following timed out"
    );
}

#[test]
fn test_build_report_collapses_identifiers_of_same_domain() {
    let registry = registry_with(&[
        ("https://a.example", Outcome::Alive),
        ("https://a.example/board", Outcome::Alive),
        ("https://a.example/prog/", Outcome::Alive),
    ]);

    let data = build_report(&registry);
    assert_eq!(data.alive.len(), 1);
    assert!(data.dead.is_empty());
}

#[test]
fn test_alive_wins_over_dead_for_same_domain() {
    let registry = registry_with(&[
        ("https://a.example/board", dead("HTTP 404 from https://a.example/board/following")),
        ("https://a.example", Outcome::Alive),
    ]);

    let data = build_report(&registry);
    assert!(data.alive.contains("https://a.example"));
    assert!(!data.dead.contains_key("https://a.example"));
}

#[test]
fn test_dead_reason_comes_from_first_identifier() {
    let registry = registry_with(&[
        ("https://d.example/z", dead("second")),
        ("https://d.example/a", dead("first")),
    ]);

    let data = build_report(&registry);
    assert_eq!(data.dead["https://d.example"], "first");
}

#[test]
fn test_partition_is_complete_and_disjoint() {
    let registry = registry_with(&[
        ("https://a.example/x", Outcome::Alive),
        ("https://b.example", dead("refused")),
        ("https://b.example/y", Outcome::Alive),
        ("https://c.example", dead("refused")),
        ("http://abcdefghij234567.onion", dead("no proxy")),
    ]);

    let data = build_report(&registry);
    let dead: BTreeSet<String> = data.dead.keys().cloned().collect();
    assert!(data.alive.is_disjoint(&dead));

    let union: BTreeSet<String> = data.alive.union(&dead).cloned().collect();
    let expected: BTreeSet<String> = registry.iter().map(|(id, _)| normalize_domain(id)).collect();
    assert_eq!(union, expected);
}

#[test]
fn test_unresolved_entries_are_ignored() {
    let mut registry = SeenRegistry::new();
    registry.insert_if_absent("https://a.example", 0);

    let data = build_report(&registry);
    assert_eq!(data.total(), 0);
}

// ============================================================================
// Rendering Tests
// ============================================================================

fn sample_data() -> ReportData {
    let registry = registry_with(&[
        ("https://a.example", Outcome::Alive),
        ("https://b.example", dead("HTTP 502 from <proxy>")),
    ]);
    build_report(&registry)
}

#[test]
fn test_json_report_has_exactly_alive_and_dead() {
    let json = generate_json_report(&sample_data()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 2);
    assert_eq!(value["alive"], serde_json::json!(["https://a.example"]));
    assert_eq!(
        value["dead"],
        serde_json::json!({"https://b.example": "HTTP 502 from <proxy>"})
    );
}

#[test]
fn test_json_report_round_trips_into_report_data() {
    let data = sample_data();
    let json = generate_json_report(&data).unwrap();
    let parsed: ReportData = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, data);
}

#[test]
fn test_json_alive_is_sorted() {
    let registry = registry_with(&[
        ("https://c.example", Outcome::Alive),
        ("https://a.example", Outcome::Alive),
        ("https://b.example", Outcome::Alive),
    ]);
    let json = generate_json_report(&build_report(&registry)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value["alive"],
        serde_json::json!(["https://a.example", "https://b.example", "https://c.example"])
    );
}

#[test]
fn test_html_report_links_alive_and_lists_dead() {
    let html = generate_html_report(&sample_data());

    assert!(html.contains("Current known instances"));
    assert!(html.contains(r#"<li><a href="https://a.example">https://a.example</a></li>"#));
    assert!(html.contains("https://b.example"));
    assert!(html.contains("HTTP 502 from &lt;proxy&gt;"));
    assert!(!html.contains("<proxy>"));
    assert!(!html.contains(r#"<a href="https://b.example">"#));
}

#[test]
fn test_html_report_empty() {
    let html = generate_html_report(&ReportData::default());
    assert!(html.contains("Alive (0)"));
    assert!(html.contains("Dead (0)"));
}

#[test]
fn test_text_report_mentions_every_domain() {
    let text = generate_text_report(&sample_data());
    assert!(text.contains("https://a.example"));
    assert!(text.contains("https://b.example"));
    assert!(text.contains("HTTP 502 from <proxy>"));
    assert!(text.contains("Instances found: 2"));
}

// ============================================================================
// Report Format / Save Tests
// ============================================================================

#[test]
fn test_report_format_file_names() {
    assert_eq!(ReportFormat::Html.file_name(), HTML_REPORT_FILE);
    assert_eq!(ReportFormat::Json.file_name(), JSON_REPORT_FILE);
    assert_eq!(ReportFormat::ALL.len(), 2);
}

#[test]
fn test_report_format_render_matches_generators() {
    let data = sample_data();
    assert_eq!(
        ReportFormat::Json.render(&data).unwrap(),
        generate_json_report(&data).unwrap()
    );
    assert!(ReportFormat::Html.render(&data).unwrap().contains("https://a.example"));
}

#[test]
fn test_save_report_writes_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(JSON_REPORT_FILE);

    save_report("{\"alive\":[],\"dead\":{}}", &path).unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{\"alive\":[],\"dead\":{}}"
    );
}

#[test]
fn test_save_report_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join(HTML_REPORT_FILE);
    assert!(save_report("<html></html>", &path).is_err());
}
