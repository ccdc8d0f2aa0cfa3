use crate::error::{Result, ScanError};
use crate::fetch::{Relation, fetch_relations};
use crate::registry::{Outcome, SeenRegistry};
use crate::result::InstanceResult;
use crate::transport::{TransportConfig, TransportRouter};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use url::Url;

/// Called with `(identifier, depth)` each time a new instance is scheduled.
/// Runs while the registry lock is held, so keep it short.
pub type DiscoveryCallback = Arc<dyn Fn(String, usize) + Send + Sync>;
/// Called once per instance when its task finishes.
pub type ResultCallback = Arc<dyn Fn(InstanceResult) + Send + Sync>;

pub struct Crawler {
    router: Arc<TransportRouter>,
    max_concurrency: Option<usize>,
    discovery_callback: Option<DiscoveryCallback>,
    result_callback: Option<ResultCallback>,
}

/// State shared by every task of one crawl.
struct CrawlContext {
    router: Arc<TransportRouter>,
    registry: Mutex<SeenRegistry>,
    tracker: TaskTracker,
    limiter: Option<Arc<Semaphore>>,
    discovery_callback: Option<DiscoveryCallback>,
    result_callback: Option<ResultCallback>,
}

impl CrawlContext {
    fn report(&self, result: InstanceResult) {
        if let Some(ref callback) = self.result_callback {
            callback(result);
        }
    }
}

impl Crawler {
    pub fn new(config: TransportConfig) -> Result<Self> {
        Ok(Self::with_router(TransportRouter::new(&config)?))
    }

    pub fn with_router(router: TransportRouter) -> Self {
        Self {
            router: Arc::new(router),
            max_concurrency: None,
            discovery_callback: None,
            result_callback: None,
        }
    }

    /// Cap the number of instances fetched at the same time. Unbounded by
    /// default.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    pub fn with_discovery_callback(mut self, callback: DiscoveryCallback) -> Self {
        self.discovery_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn router(&self) -> &TransportRouter {
        &self.router
    }

    /// Walk the federation graph from `seed` until no new identifiers turn
    /// up, and return the registry with every entry resolved.
    pub async fn crawl(&self, seed: &str) -> Result<SeenRegistry> {
        let seed = seed.trim();
        Url::parse(seed).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))?;

        info!(
            "Starting crawl from {} (max concurrency: {})",
            seed,
            self.max_concurrency
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );

        let mut registry = SeenRegistry::new();
        registry.insert_if_absent(seed, 0);

        let ctx = Arc::new(CrawlContext {
            router: self.router.clone(),
            registry: Mutex::new(registry),
            tracker: TaskTracker::new(),
            limiter: self.max_concurrency.map(|n| Arc::new(Semaphore::new(n))),
            discovery_callback: self.discovery_callback.clone(),
            result_callback: self.result_callback.clone(),
        });

        if let Some(ref callback) = ctx.discovery_callback {
            callback(seed.to_string(), 0);
        }
        ctx.tracker.spawn(visit(ctx.clone(), seed.to_string(), 0));

        // Closing only means wait() may return once the count hits zero;
        // running tasks can still spawn children.
        ctx.tracker.close();
        ctx.tracker.wait().await;

        let mut registry = std::mem::take(&mut *ctx.registry.lock().await);
        let abandoned = registry.abandon_unresolved();
        if abandoned > 0 {
            warn!("{} instance(s) were left unresolved by failed tasks", abandoned);
        }

        info!(
            "Crawl complete. {} instances seen, {} alive",
            registry.len(),
            registry.alive_count()
        );
        Ok(registry)
    }
}

fn visit(ctx: Arc<CrawlContext>, id: String, depth: usize) -> BoxFuture<'static, ()> {
    async move {
        let _permit = match ctx.limiter {
            Some(ref limiter) => limiter.clone().acquire_owned().await.ok(),
            None => None,
        };

        let started = Instant::now();
        let mut result = InstanceResult::new(id.clone(), depth);
        debug!("[depth {}] Crawling {}", depth, id);

        let following = match fetch_relations(&ctx.router, &id, Relation::Following).await {
            Ok(ids) => ids,
            Err(e) => {
                info!("{} is dead: {}", id, e);
                let outcome = Outcome::dead(&e);
                ctx.registry.lock().await.resolve(&id, outcome.clone());
                ctx.report(result.with_outcome(outcome, started.elapsed()));
                return;
            }
        };
        result.following_count = following.len();

        let followers = match fetch_relations(&ctx.router, &id, Relation::Followers).await {
            Ok(ids) => ids,
            Err(e) => {
                info!("{} followers unavailable, keeping it alive: {}", id, e);
                result.followers_error = Some(e.to_string());
                Vec::new()
            }
        };
        result.followers_count = followers.len();

        {
            let mut registry = ctx.registry.lock().await;
            for candidate in following.iter().chain(followers.iter()) {
                let candidate = candidate.trim();
                if candidate.is_empty() {
                    continue;
                }
                if registry.insert_if_absent(candidate, depth + 1) {
                    debug!("  -> New instance {} (from {})", candidate, id);
                    result.discovered += 1;
                    if let Some(ref callback) = ctx.discovery_callback {
                        callback(candidate.to_string(), depth + 1);
                    }
                    ctx.tracker
                        .spawn(visit(ctx.clone(), candidate.to_string(), depth + 1));
                }
            }
            registry.resolve(&id, Outcome::Alive);
        }

        ctx.report(result.with_outcome(Outcome::Alive, started.elapsed()));
    }
    .boxed()
}
