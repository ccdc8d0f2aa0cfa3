use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use fedindex_core::report::{ReportData, ReportFormat, build_report, generate_text_report, save_report};
use fedindex_scanner::transport::{DEFAULT_TOR_PROXY, TransportConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug};
use url::Url;

// Re-export crawl types and functions from fedindex-core
pub use fedindex_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};

/// Parse a seed as a URL, trying to add https:// if needed.
/// Trailing slashes are dropped so the seed matches how peers list it.
pub fn parse_seed_line(line: &str) -> Option<String> {
    let line = line.trim().trim_end_matches('/');
    if line.is_empty() {
        return None;
    }

    // Try to parse as-is
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    // Try adding https://
    let with_scheme = format!("https://{}", line);
    match Url::parse(&with_scheme) {
        Ok(url) if url.has_host() => Some(with_scheme),
        _ => None,
    }
}

/// Expand `~` in an output directory argument.
pub fn resolve_output_dir(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Build the immutable transport settings from the `crawl` arguments.
pub fn transport_config_from_args(args: &ArgMatches) -> TransportConfig {
    let proxy = args
        .get_one::<String>("proxy")
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .or_else(|| args.get_flag("tor").then(|| DEFAULT_TOR_PROXY.to_string()));

    let timeout = args.get_one::<u64>("timeout").copied().unwrap_or(15);

    TransportConfig {
        proxy,
        force_proxy: args.get_flag("force-proxy"),
        onion_routing: !args.get_flag("no-onion"),
        request_timeout: Duration::from_secs(timeout),
    }
}

pub fn crawl_options_from_args(
    args: &ArgMatches,
    show_progress_bars: bool,
) -> Result<CrawlOptions, String> {
    let raw = args
        .get_one::<String>("url")
        .ok_or_else(|| "--url is required".to_string())?;
    let seed = parse_seed_line(raw).ok_or_else(|| format!("Invalid seed URL '{}'", raw))?;

    let transport = transport_config_from_args(args);
    if transport.force_proxy && transport.proxy.is_none() {
        return Err("--force-proxy needs --proxy or --tor".to_string());
    }

    Ok(CrawlOptions {
        seed,
        transport,
        max_concurrency: args.get_one::<usize>("max-concurrent").copied(),
        show_progress_bars,
    })
}

/// Write every report format into `dir`, creating it if needed.
/// Returns the paths written, in format order.
pub fn write_reports(data: &ReportData, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(ReportFormat::ALL.len());
    for format in ReportFormat::ALL {
        let path = dir.join(format.file_name());
        let content = format
            .render(data)
            .with_context(|| format!("Failed to render {}", format.file_name()))?;
        save_report(&content, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    if let Err(e) = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        debug!("Keeping existing tracing subscriber: {}", e);
    }
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let verbose = sub_matches.get_flag("verbose");
    init_tracing(verbose);

    let options = crawl_options_from_args(sub_matches, !quiet).map_err(|e| anyhow!(e))?;
    let output_dir = resolve_output_dir(
        sub_matches
            .get_one::<String>("output-dir")
            .map(String::as_str)
            .unwrap_or("."),
    );

    if !quiet {
        println!("\n{} Crawling from {}", "→".blue(), options.seed.bright_white());
        println!(
            "{} Proxy: {}{}",
            "→".blue(),
            options.transport.proxy.as_deref().unwrap_or("none"),
            if options.transport.force_proxy { " (all traffic)" } else { "" }
        );
        println!(
            "{} Timeout: {}s, max concurrent: {}\n",
            "→".blue(),
            options.transport.request_timeout.as_secs(),
            options
                .max_concurrency
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
    }

    let progress_callback: Option<CrawlProgressCallback> = if verbose {
        Some(Arc::new(|line: String| eprintln!("{}", line)))
    } else {
        None
    };

    let registry = execute_crawl(options, progress_callback)
        .await
        .map_err(|e| anyhow!("Crawl failed: {}", e))?;

    let data = build_report(&registry);
    let written = write_reports(&data, &output_dir)?;

    if !quiet {
        println!();
        print!("{}", generate_text_report(&data));
        println!();
    }
    for path in written {
        println!("{} Wrote {}", "✓".green().bold(), path.display());
    }
    Ok(())
}
