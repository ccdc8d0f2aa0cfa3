// Instance index reports built from a finished crawl

use colored::Colorize;
use fedindex_scanner::registry::{Entry, Outcome, SeenRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

pub const HTML_REPORT_FILE: &str = "instance-index.html";
pub const JSON_REPORT_FILE: &str = "instance-index.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Json,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 2] = [ReportFormat::Html, ReportFormat::Json];

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Html => HTML_REPORT_FILE,
            ReportFormat::Json => JSON_REPORT_FILE,
        }
    }

    pub fn render(&self, data: &ReportData) -> Result<String, serde_json::Error> {
        match self {
            ReportFormat::Html => Ok(generate_html_report(data)),
            ReportFormat::Json => generate_json_report(data),
        }
    }
}

/// Alive domains and dead domains with their failure reason. Serializes to
/// exactly `{"alive": [...], "dead": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    pub alive: BTreeSet<String>,
    pub dead: BTreeMap<String, String>,
}

impl ReportData {
    pub fn total(&self) -> usize {
        self.alive.len() + self.dead.len()
    }
}

/// Reduce an identifier to `scheme://host[:port]`.
pub fn normalize_domain(id: &str) -> String {
    let trimmed = id.trim();
    match Url::parse(trimmed) {
        Ok(url) => match url.host_str() {
            Some(host) => {
                let mut domain = format!("{}://{}", url.scheme(), host);
                if let Some(port) = url.port() {
                    domain.push_str(&format!(":{}", port));
                }
                domain
            }
            None => trimmed.trim_end_matches('/').to_string(),
        },
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}

/// Partition the resolved registry entries into alive and dead domains.
///
/// A domain is alive if any identifier normalizing to it is alive. A dead
/// domain keeps the reason of its lexicographically first raw identifier.
pub fn build_report(registry: &SeenRegistry) -> ReportData {
    let mut entries: Vec<(&String, &Entry)> = registry.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let alive: BTreeSet<String> = entries
        .iter()
        .filter(|(_, entry)| entry.outcome.is_alive())
        .map(|(id, _)| normalize_domain(id))
        .collect();

    let mut dead = BTreeMap::new();
    for (id, entry) in entries {
        if let Outcome::Dead { ref reason, .. } = entry.outcome {
            let domain = normalize_domain(id);
            if !alive.contains(&domain) {
                dead.entry(domain).or_insert_with(|| reason.clone());
            }
        }
    }

    ReportData { alive, dead }
}

pub fn generate_html_report(data: &ReportData) -> String {
    let mut report = String::new();
    report.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    report.push_str("<meta charset=\"utf-8\">\n");
    report.push_str("<title>Current known instances</title>\n");
    report.push_str("</head>\n<body>\n");
    report.push_str("<div style=\"max-width: 800px; margin: 0 auto;\">\n");
    report.push_str("<h1 style=\"text-align: center;\">Current known instances</h1>\n");

    report.push_str(&format!("<h2>Alive ({})</h2>\n", data.alive.len()));
    report.push_str("<ul style=\"list-style-type: none;\">\n");
    for domain in &data.alive {
        let domain = escape_html(domain);
        report.push_str(&format!("<li><a href=\"{}\">{}</a></li>\n", domain, domain));
    }
    report.push_str("</ul>\n");

    report.push_str(&format!("<h2>Dead ({})</h2>\n", data.dead.len()));
    report.push_str("<ul style=\"list-style-type: none;\">\n");
    for (domain, reason) in &data.dead {
        report.push_str(&format!(
            "<li>{} <span style=\"color: #a00;\">{}</span></li>\n",
            escape_html(domain),
            escape_html(reason)
        ));
    }
    report.push_str("</ul>\n");

    report.push_str(&format!(
        "<p style=\"text-align: center; color: #888;\">Generated {}</p>\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str("</div>\n</body>\n</html>\n");
    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Terminal summary of the same data the files are written from.
pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Instances found: {}\n", data.total()));
    report.push_str(&format!(
        "  Alive: {}\n",
        data.alive.len().to_string().green()
    ));
    report.push_str(&format!("  Dead:  {}\n", data.dead.len().to_string().red()));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if !data.alive.is_empty() {
        report.push_str("## Alive\n");
        for domain in &data.alive {
            report.push_str(&format!("  {} {}\n", "✓".green(), domain));
        }
        report.push('\n');
    }

    if !data.dead.is_empty() {
        report.push_str("## Dead\n");
        for (domain, reason) in &data.dead {
            report.push_str(&format!(
                "  {} {} {}\n",
                "✗".red(),
                domain,
                reason.bright_black()
            ));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
