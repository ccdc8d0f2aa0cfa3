use fedindex_scanner::registry::SeenRegistry;
use fedindex_scanner::result::InstanceResult;
use fedindex_scanner::transport::TransportConfig;
use fedindex_scanner::{Crawler, DiscoveryCallback, Outcome, ResultCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Options for configuring a crawl operation
#[derive(Debug)]
pub struct CrawlOptions {
    pub seed: String,
    pub transport: TransportConfig,
    /// Admission limit on concurrently crawled instances; `None` spawns a
    /// task for every instance as soon as it is found.
    pub max_concurrency: Option<usize>,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Execute a crawl with the given options
/// Returns the fully resolved seen registry
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<SeenRegistry, String> {
    let CrawlOptions {
        seed,
        transport,
        max_concurrency,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| e.to_string())?,
        );
        pb.set_message("Starting crawl...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(Arc::new(pb))
    } else {
        None
    };

    let discovered = Arc::new(AtomicUsize::new(0));
    let resolved = Arc::new(AtomicUsize::new(0));

    let discovery_callback: DiscoveryCallback = {
        let discovered = discovered.clone();
        let resolved = resolved.clone();
        let pb = progress_bar.clone();
        Arc::new(move |_id: String, _depth: usize| {
            let found = discovered.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(progress_message(found, resolved.load(Ordering::Relaxed)));
            }
        })
    };

    let result_callback: ResultCallback = {
        let discovered = discovered.clone();
        let resolved = resolved.clone();
        let pb = progress_bar.clone();
        let progress = progress_callback.clone();
        Arc::new(move |result: InstanceResult| {
            let done = resolved.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(progress_message(discovered.load(Ordering::Relaxed), done));
            }
            if let Some(ref callback) = progress {
                callback(describe_result(&result));
            }
        })
    };

    let mut crawler = Crawler::new(transport)
        .map_err(|e| e.to_string())?
        .with_discovery_callback(discovery_callback)
        .with_result_callback(result_callback);
    if let Some(limit) = max_concurrency {
        crawler = crawler.with_max_concurrency(limit);
    }

    let outcome = crawler.crawl(&seed).await;

    if let Some(ref pb) = progress_bar {
        match outcome {
            Ok(ref registry) => pb.finish_with_message(format!(
                "Crawl complete! {} instances seen, {} alive",
                registry.len(),
                registry.alive_count()
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    outcome.map_err(|e| e.to_string())
}

fn progress_message(discovered: usize, resolved: usize) -> String {
    format!(
        "Crawling... {} instances discovered, {} resolved",
        discovered, resolved
    )
}

/// One line describing a finished instance, for progress output.
pub fn describe_result(result: &InstanceResult) -> String {
    match result.outcome {
        Outcome::Alive => {
            let mut line = format!(
                "[+] {} alive (following {}, followers {}, {} new) in {:.2}s",
                result.id,
                result.following_count,
                result.followers_count,
                result.discovered,
                result.elapsed.as_secs_f64()
            );
            if let Some(ref err) = result.followers_error {
                line.push_str(&format!(" [followers: {}]", err));
            }
            line
        }
        Outcome::Dead { ref reason, .. } => format!("[!] {} dead: {}", result.id, reason),
        Outcome::Unresolved => format!("[?] {} unresolved", result.id),
    }
}
