//! The symbol router: resolution, per-symbol dispatch and shared state.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use futures::future::join_all;
use rand::Rng;
use router_cache::{DirectoryCache, ReplyCache, SeriesCache};
use router_core::{
    AssetClass, CryptoDataProvider, Directory, DirectorySource, EquityDataProvider, Quote,
    Result, RouterError, SeriesKind, Symbol, TrendingCoin,
};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::RouterConfig;
use crate::extract::SymbolExtractor;
use crate::reply::{self, Operation, Reply};
use crate::resolve::SymbolResolver;
use crate::scheduler::{JobGuard, JobOutcome};
use crate::trending::TrendingTracker;

/// Reply returned by [`SymbolRouter::trending_reply`] when nothing is trending.
pub const TRENDING_UNAVAILABLE: &str = "Trending data is not currently available.";

/// Reply cache key of the trending composite.
const TRENDING_KEY: &str = "trending";

/// Headlines per news reply.
const NEWS_LIMIT: usize = 5;

/// Routes symbol mentions to market data providers.
///
/// One router is built at startup and shared (usually behind an `Arc`) by every
/// concurrent message handler and the [`Scheduler`](crate::Scheduler). It owns
/// the directory snapshots, the trending tracker and all caches.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use router::{Operation, Scheduler, SymbolRouter};
///
/// #[tokio::main]
/// async fn main() -> router::Result<()> {
///     let router = Arc::new(
///         SymbolRouter::builder()
///             .with_yahoo()
///             .with_edgar("MyBot/1.0 (ops@example.com)")
///             .with_coingecko(None)
///             .build()?,
///     );
///     router.start().await?;
///     let _scheduler = Scheduler::start(Arc::clone(&router));
///
///     let symbols = router.resolve("is $tsla or $$btc the better bet?", 1.0).await;
///     for reply in router.dispatch(Operation::Price, &symbols).await {
///         println!("{}", reply.text().unwrap_or_default());
///     }
///     Ok(())
/// }
/// ```
pub struct SymbolRouter {
    config: RouterConfig,
    extractor: SymbolExtractor,
    resolver: SymbolResolver,
    equity: Arc<dyn EquityDataProvider>,
    crypto: Arc<dyn CryptoDataProvider>,
    sources: Vec<Arc<dyn DirectorySource>>,
    directories: DirectoryCache,
    series: SeriesCache,
    replies: ReplyCache,
    trending: TrendingTracker,
    refresh_guard: JobGuard,
    decay_guard: JobGuard,
}

impl fmt::Debug for SymbolRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolRouter")
            .field("equity", &self.equity.name())
            .field("crypto", &self.crypto.name())
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SymbolRouter {
    /// Starts building a router.
    #[must_use]
    pub fn builder() -> SymbolRouterBuilder {
        SymbolRouterBuilder::default()
    }

    /// The configuration the router was built with.
    #[must_use]
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The trending tracker fed by [`resolve`](Self::resolve).
    #[must_use]
    pub const fn trending_tracker(&self) -> &TrendingTracker {
        &self.trending
    }

    /// The directory snapshots used for resolution.
    #[must_use]
    pub const fn directories(&self) -> &DirectoryCache {
        &self.directories
    }

    /// Loads the directories for the first time.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DirectoryUnavailable`] when no asset class
    /// obtained a snapshot. A single missing class is logged and tolerated.
    pub async fn start(&self) -> Result<()> {
        self.refresh_directories().await;

        let mut loaded = 0;
        for class in AssetClass::ALL {
            if self.directories.is_loaded(class) {
                loaded += 1;
            } else {
                warn!(%class, "No directory snapshot, symbols of this class will not resolve");
            }
        }

        if loaded == 0 {
            return Err(RouterError::DirectoryUnavailable(
                "no directory source returned a snapshot".to_string(),
            ));
        }
        info!(classes = loaded, "Symbol router started");
        Ok(())
    }

    /// Extracts and resolves the symbols mentioned in `text`.
    ///
    /// Every resolved symbol's tag gains `weight` in the trending tracker. Pass
    /// zero for lookups that should not count as interest.
    #[instrument(skip(self, text))]
    pub async fn resolve(&self, text: &str, weight: f64) -> Vec<Symbol> {
        let candidates = self.extractor.extract(text);
        if candidates.is_empty() {
            return Vec::new();
        }

        let equities = self.directories.current(AssetClass::Equity).await;
        let coins = self.directories.current(AssetClass::Crypto).await;
        let symbols = self.resolver.resolve(&candidates, &equities, &coins);

        for symbol in &symbols {
            self.trending.record(symbol.tag(), weight).await;
        }
        debug!(resolved = symbols.len(), "Resolved symbols");
        symbols
    }

    /// Runs `op` for each symbol and returns one reply per symbol, in order.
    ///
    /// Symbols are served concurrently and each provider call is bounded by the
    /// configured timeout. A failing symbol yields [`Reply::Unavailable`] without
    /// affecting the others.
    #[instrument(skip(self, symbols), fields(count = symbols.len()))]
    pub async fn dispatch(&self, op: Operation, symbols: &[Symbol]) -> Vec<Reply> {
        if op == Operation::BatchPrice {
            return self.batch_price(symbols).await;
        }
        join_all(symbols.iter().map(|symbol| self.dispatch_one(op, symbol))).await
    }

    /// The `k` heaviest trending tags with their weights.
    pub async fn trending(&self, k: usize) -> Vec<(String, f64)> {
        self.trending.top_k(k).await
    }

    /// Composite trending text: the top tracked symbols followed by the crypto
    /// provider's trending list. Cached for the reply TTL.
    pub async fn trending_reply(&self) -> String {
        self.replies
            .get_or_compute(TRENDING_KEY, self.compose_trending())
            .await
            .unwrap_or_else(|| TRENDING_UNAVAILABLE.to_string())
    }

    /// Searches both directories for `query` and returns up to `matches` hits,
    /// shortest tag first, each with a cached price line when available.
    ///
    /// Search does not count towards trending.
    #[instrument(skip(self))]
    pub async fn inline_search(&self, query: &str, matches: usize) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() || matches == 0 {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for class in AssetClass::ALL {
            let directory = self.directories.current(class).await;
            hits.extend(directory.search(query).map(|record| {
                (
                    Symbol::new(class, &record.symbol, record),
                    directory.description(record),
                )
            }));
        }
        hits.sort_by_key(|(symbol, _)| symbol.tag().len());
        hits.truncate(matches);

        join_all(hits.into_iter().map(|(symbol, description)| async move {
            let price = self.cached_price(&symbol).await;
            SearchHit {
                symbol,
                description,
                price,
            }
        }))
        .await
    }

    /// A random directory entry with a buy-and-hold date 1 to 365 days out.
    ///
    /// Returns `None` while both directories are empty.
    pub async fn random_pick(&self) -> Option<String> {
        let snapshots = self.snapshots().await;
        pick_record(&snapshots, &mut rand::thread_rng(), Utc::now().date_naive())
    }

    /// [`random_pick`](Self::random_pick) with the generator and date supplied.
    pub async fn random_pick_with<R: Rng>(
        &self,
        rng: &mut R,
        today: NaiveDate,
    ) -> Option<String> {
        let snapshots = self.snapshots().await;
        pick_record(&snapshots, rng, today)
    }

    /// Pings each provider and reports directory state.
    pub async fn status(&self) -> RouterStatus {
        let (equity, crypto) = tokio::join!(
            self.bounded(self.equity.name(), self.equity.ping()),
            self.bounded(self.crypto.name(), self.crypto.ping()),
        );
        let providers = vec![
            ProviderStatus::new(self.equity.name(), equity),
            ProviderStatus::new(self.crypto.name(), crypto),
        ];

        let mut directories = Vec::with_capacity(AssetClass::ALL.len());
        for class in AssetClass::ALL {
            let snapshot = self.directories.current(class).await;
            let loaded = self.directories.is_loaded(class);
            directories.push(DirectoryStatus {
                class,
                records: snapshot.len(),
                fetched_at: loaded.then(|| snapshot.fetched_at()),
            });
        }

        RouterStatus {
            providers,
            directories,
            trending_tags: self.trending.len().await,
            cached_series: self.series.len().await,
        }
    }

    /// Reloads every directory source and clears the series cache.
    ///
    /// Sources that fail keep their previous snapshot.
    #[instrument(skip(self))]
    pub async fn refresh_directories(&self) -> JobOutcome {
        let Some(_permit) = self.refresh_guard.try_acquire() else {
            debug!("Directory refresh already running");
            return JobOutcome::Skipped;
        };

        let results = join_all(
            self.sources
                .iter()
                .map(|source| self.directories.refresh(source.as_ref())),
        )
        .await;
        let refreshed = results.iter().filter(|r| r.is_ok()).count();
        let cleared = self.series.clear().await;

        info!(
            sources = self.sources.len(),
            refreshed,
            cleared_series = cleared,
            "Directory refresh finished"
        );
        JobOutcome::Completed
    }

    /// Applies one decay tick to the trending tracker.
    #[instrument(skip(self))]
    pub async fn decay_trending(&self) -> JobOutcome {
        let Some(_permit) = self.decay_guard.try_acquire() else {
            debug!("Trending decay already running");
            return JobOutcome::Skipped;
        };

        let pruned = self
            .trending
            .decay(self.config.decay_factor, self.config.prune_floor)
            .await;
        info!(pruned, "Trending decay finished");
        JobOutcome::Completed
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    async fn dispatch_one(&self, op: Operation, symbol: &Symbol) -> Reply {
        if !op.applies_to(symbol.asset_class()) {
            return Reply::not_applicable(op, symbol);
        }

        let (provider, result) = match symbol {
            Symbol::Equity(_) => (
                self.equity.name(),
                self.bounded(self.equity.name(), self.equity_call(op, symbol))
                    .await,
            ),
            Symbol::Crypto(_) => (
                self.crypto.name(),
                self.bounded(self.crypto.name(), self.crypto_call(op, symbol))
                    .await,
            ),
        };

        result.unwrap_or_else(|e| {
            log_failure(provider, op, symbol, &e);
            Reply::unavailable(op, symbol)
        })
    }

    async fn equity_call(&self, op: Operation, symbol: &Symbol) -> Result<Reply> {
        let provider = &self.equity;
        let text = match op {
            Operation::Price | Operation::BatchPrice => {
                reply::price_text(symbol, &provider.quote(symbol).await?)
            }
            Operation::Spark => reply::spark_text(symbol, &provider.quote(symbol).await?),
            Operation::Dividend => reply::dividend_text(symbol, &provider.dividend(symbol).await?),
            Operation::News => reply::news_text(symbol, &provider.news(symbol, NEWS_LIMIT).await?),
            Operation::Info => reply::profile_text(symbol, &provider.profile(symbol).await?),
            Operation::Stat => reply::stats_text(symbol, &provider.key_stats(symbol).await?),
            Operation::Cap => {
                let market_cap = provider
                    .key_stats(symbol)
                    .await?
                    .market_cap
                    .ok_or_else(|| RouterError::NoData(format!("market cap for {symbol}")))?;
                reply::cap_text(symbol, market_cap)
            }
            Operation::Intraday => return self.cached_series(symbol, SeriesKind::Intraday).await,
            Operation::Chart => return self.cached_series(symbol, self.chart_kind()).await,
        };
        Ok(Reply::Text(text))
    }

    async fn crypto_call(&self, op: Operation, symbol: &Symbol) -> Result<Reply> {
        let provider = &self.crypto;
        let text = match op {
            Operation::Price | Operation::BatchPrice => {
                reply::price_text(symbol, &provider.quote(symbol).await?)
            }
            Operation::Spark => reply::spark_text(symbol, &provider.quote(symbol).await?),
            Operation::Dividend | Operation::News => {
                return Err(RouterError::NotSupported(format!("{op} for {symbol}")));
            }
            Operation::Info => reply::coin_info_text(symbol, &provider.details(symbol).await?),
            Operation::Stat => reply::coin_stats_text(symbol, &provider.details(symbol).await?),
            Operation::Cap => {
                let market_cap = provider
                    .quote(symbol)
                    .await?
                    .market_cap
                    .ok_or_else(|| RouterError::NoData(format!("market cap for {symbol}")))?;
                reply::cap_text(symbol, market_cap)
            }
            Operation::Intraday => return self.cached_series(symbol, SeriesKind::Intraday).await,
            Operation::Chart => return self.cached_series(symbol, self.chart_kind()).await,
        };
        Ok(Reply::Text(text))
    }

    /// Cached bars for a symbol, fetched from its class's provider on a miss.
    async fn cached_series(&self, symbol: &Symbol, kind: SeriesKind) -> Result<Reply> {
        let frame = match symbol {
            Symbol::Equity(_) => {
                self.series
                    .get_or_fetch(symbol, kind, || self.equity.bars(symbol, kind))
                    .await?
            }
            Symbol::Crypto(_) => {
                self.series
                    .get_or_fetch(symbol, kind, || self.crypto.bars(symbol, kind))
                    .await?
            }
        };
        Ok(Reply::Series(frame))
    }

    const fn chart_kind(&self) -> SeriesKind {
        SeriesKind::Daily {
            days: self.config.chart_days,
        }
    }

    /// One quote round trip per asset class for the whole batch.
    ///
    /// A class whose round trip fails or times out falls back to bounded
    /// single-symbol quotes, so one bad symbol cannot sink its neighbours.
    async fn batch_price(&self, symbols: &[Symbol]) -> Vec<Reply> {
        let (equities, coins): (Vec<Symbol>, Vec<Symbol>) = symbols
            .iter()
            .cloned()
            .partition(|s| s.asset_class() == AssetClass::Equity);

        let (equity_quotes, crypto_quotes) = tokio::join!(
            self.batch_quotes(self.equity.name(), equities.is_empty(), || {
                self.equity.quotes(&equities)
            }),
            self.batch_quotes(self.crypto.name(), coins.is_empty(), || {
                self.crypto.quotes(&coins)
            }),
        );

        join_all(symbols.iter().map(|symbol| {
            let quotes = match symbol {
                Symbol::Equity(_) => equity_quotes.as_ref(),
                Symbol::Crypto(_) => crypto_quotes.as_ref(),
            };
            async move {
                let Some(quotes) = quotes else {
                    return self.dispatch_one(Operation::BatchPrice, symbol).await;
                };
                match quotes.get(symbol.id()) {
                    Some(quote) => Reply::Text(reply::price_text(symbol, quote)),
                    None => {
                        debug!(symbol = %symbol, "No quote in batch");
                        Reply::unavailable(Operation::BatchPrice, symbol)
                    }
                }
            }
        }))
        .await
    }

    async fn batch_quotes<F, Fut>(
        &self,
        provider: &str,
        empty: bool,
        fetch: F,
    ) -> Option<HashMap<String, Quote>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<HashMap<String, Quote>>>,
    {
        if empty {
            return Some(HashMap::new());
        }
        match self.bounded(provider, fetch()).await {
            Ok(quotes) => Some(quotes),
            Err(e) => {
                warn!(provider, error = %e, "Batch quote failed, quoting symbols one by one");
                None
            }
        }
    }

    /// Runs a provider call under the configured timeout.
    async fn bounded<T>(&self, provider: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        let after = self.config.effective_provider_timeout();
        match timeout(after, call).await {
            Ok(result) => result,
            Err(_) => Err(RouterError::Timeout {
                provider: provider.to_string(),
                after,
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Composite replies
    // ------------------------------------------------------------------------

    async fn cached_price(&self, symbol: &Symbol) -> Option<String> {
        let key = format!("price:{}:{}", symbol.asset_class(), symbol.id());
        self.replies
            .get_or_compute(&key, async {
                match self.dispatch_one(Operation::Price, symbol).await {
                    Reply::Text(text) => Some(text),
                    _ => None,
                }
            })
            .await
    }

    async fn compose_trending(&self) -> Option<String> {
        let top = self.trending.top_k(self.config.trending_count).await;
        let mut symbols = Vec::with_capacity(top.len());
        for (tag, _) in &top {
            if let Some(symbol) = self.symbol_for_tag(tag).await {
                symbols.push(symbol);
            }
        }

        let (sparks, coins) = tokio::join!(
            self.dispatch(Operation::Spark, &symbols),
            self.bounded(self.crypto.name(), self.crypto.trending()),
        );

        let tracked: Vec<&str> = sparks
            .iter()
            .filter(|r| r.is_available())
            .filter_map(Reply::text)
            .collect();
        let coins = coins.unwrap_or_else(|e| {
            warn!(provider = self.crypto.name(), error = %e, "Trending list unavailable");
            Vec::new()
        });

        if tracked.is_empty() && coins.is_empty() {
            return None;
        }

        let mut sections = Vec::new();
        if !tracked.is_empty() {
            sections.push(format!("Trending symbols:\n{}", tracked.join("\n")));
        }
        if !coins.is_empty() {
            let lines: Vec<String> = coins.iter().map(trending_coin_line).collect();
            sections.push(format!(
                "Trending on {}:\n{}",
                self.crypto.name(),
                lines.join("\n")
            ));
        }
        Some(sections.join("\n\n"))
    }

    /// Current snapshot of every asset class, in dispatch order.
    async fn snapshots(&self) -> Vec<Arc<Directory>> {
        let mut snapshots = Vec::with_capacity(AssetClass::ALL.len());
        for class in AssetClass::ALL {
            snapshots.push(self.directories.current(class).await);
        }
        snapshots
    }

    /// Looks a tracker tag back up in the current directories.
    async fn symbol_for_tag(&self, tag: &str) -> Option<Symbol> {
        let (class, ticker) = match tag.strip_prefix(AssetClass::Crypto.marker()) {
            Some(ticker) => (AssetClass::Crypto, ticker),
            None => (AssetClass::Equity, tag.strip_prefix(AssetClass::Equity.marker())?),
        };
        let directory = self.directories.current(class).await;
        directory
            .find(ticker)
            .map(|record| Symbol::new(class, ticker, record))
    }
}

fn log_failure(provider: &str, op: Operation, symbol: &Symbol, e: &RouterError) {
    if e.is_no_data() {
        debug!(provider, op = %op, symbol = %symbol, error = %e, "Provider had no data");
    } else {
        warn!(provider, op = %op, symbol = %symbol, error = %e, "Provider call failed");
    }
}

fn pick_record<R: Rng>(
    snapshots: &[Arc<Directory>],
    rng: &mut R,
    today: NaiveDate,
) -> Option<String> {
    let total: usize = snapshots.iter().map(|d| d.len()).sum();
    if total == 0 {
        return None;
    }

    let mut idx = rng.gen_range(0..total);
    let (directory, record) = snapshots.iter().find_map(|d| {
        if idx < d.len() {
            Some((d, &d.records()[idx]))
        } else {
            idx -= d.len();
            None
        }
    })?;
    let hold = today.checked_add_days(Days::new(rng.gen_range(1..=365)))?;

    Some(format!(
        "{}\nBuy and hold until: {}",
        directory.description(record),
        hold.format("%b %d, %Y")
    ))
}

fn trending_coin_line(coin: &TrendingCoin) -> String {
    let tag = format!("{}{}", AssetClass::Crypto.marker(), coin.symbol.to_uppercase());
    match coin.change_percent {
        Some(change) => format!("{tag}: {} ({change:+.2}%)", coin.name),
        None => format!("{tag}: {}", coin.name),
    }
}

/// One inline search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched symbol.
    pub symbol: Symbol,
    /// Directory description line, e.g. `$$BTC: Bitcoin`.
    pub description: String,
    /// Price line, if the provider answered.
    pub price: Option<String>,
}

/// Health of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    /// Provider name.
    pub name: String,
    /// The ping error, or `None` when the provider answered.
    pub error: Option<String>,
}

impl ProviderStatus {
    fn new(name: &str, ping: Result<()>) -> Self {
        Self {
            name: name.to_string(),
            error: ping.err().map(|e| e.to_string()),
        }
    }

    /// Returns true when the provider answered its ping.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// State of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStatus {
    /// Asset class of the directory.
    pub class: AssetClass,
    /// Records in the current snapshot.
    pub records: usize,
    /// When the current snapshot was fetched, `None` if never loaded.
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Snapshot of router health returned by [`SymbolRouter::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterStatus {
    /// Provider health.
    pub providers: Vec<ProviderStatus>,
    /// Directory sizes and ages.
    pub directories: Vec<DirectoryStatus>,
    /// Tags currently tracked for trending.
    pub trending_tags: usize,
    /// Series held in the cache.
    pub cached_series: usize,
}

impl fmt::Display for RouterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.providers {
            match &p.error {
                None => writeln!(f, "{}: ok", p.name)?,
                Some(e) => writeln!(f, "{}: unavailable ({e})", p.name)?,
            }
        }
        for d in &self.directories {
            match d.fetched_at {
                Some(at) => writeln!(
                    f,
                    "{} directory: {} records, refreshed {}",
                    d.class,
                    d.records,
                    at.format("%Y-%m-%d %H:%M UTC")
                )?,
                None => writeln!(f, "{} directory: not loaded", d.class)?,
            }
        }
        write!(
            f,
            "{} trending tags, {} cached series",
            self.trending_tags, self.cached_series
        )
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SymbolRouter`].
#[derive(Default)]
pub struct SymbolRouterBuilder {
    config: RouterConfig,
    equity: Option<Arc<dyn EquityDataProvider>>,
    crypto: Option<Arc<dyn CryptoDataProvider>>,
    sources: Vec<Arc<dyn DirectorySource>>,
}

impl fmt::Debug for SymbolRouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolRouterBuilder")
            .field("equity", &self.equity.as_ref().map(|p| p.name()))
            .field("crypto", &self.crypto.as_ref().map(|p| p.name()))
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SymbolRouterBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the equity data provider.
    #[must_use]
    pub fn equity_provider(mut self, provider: Arc<dyn EquityDataProvider>) -> Self {
        self.equity = Some(provider);
        self
    }

    /// Sets the crypto data provider.
    #[must_use]
    pub fn crypto_provider(mut self, provider: Arc<dyn CryptoDataProvider>) -> Self {
        self.crypto = Some(provider);
        self
    }

    /// Adds a directory source.
    #[must_use]
    pub fn directory_source(mut self, source: Arc<dyn DirectorySource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Uses Yahoo Finance for equity data.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo(self) -> Self {
        self.equity_provider(Arc::new(router_yahoo::YahooProvider::new()))
    }

    /// Uses the SEC ticker list as the equity directory.
    ///
    /// The user agent must identify the application and a contact address.
    #[cfg(feature = "edgar")]
    #[must_use]
    pub fn with_edgar(self, user_agent: &str) -> Self {
        self.directory_source(Arc::new(router_edgar::EdgarDirectory::new(user_agent)))
    }

    /// Uses CoinGecko for crypto data and as the crypto directory.
    #[cfg(feature = "coingecko")]
    #[must_use]
    pub fn with_coingecko(self, api_key: Option<String>) -> Self {
        let provider = Arc::new(router_coingecko::CoinGeckoProvider::new(api_key));
        self.crypto_provider(Arc::clone(&provider) as Arc<dyn CryptoDataProvider>)
            .directory_source(provider)
    }

    /// Validates the configuration and builds the router.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidParameter`] if a provider is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<SymbolRouter> {
        self.config.validate()?;
        let equity = self.equity.ok_or_else(|| {
            RouterError::InvalidParameter("no equity data provider configured".to_string())
        })?;
        let crypto = self.crypto.ok_or_else(|| {
            RouterError::InvalidParameter("no crypto data provider configured".to_string())
        })?;

        let replies = ReplyCache::new(
            self.config.reply_capacity,
            self.config.reply_ttl,
            self.config.reply_max_age,
        );

        Ok(SymbolRouter {
            extractor: SymbolExtractor::new(),
            resolver: SymbolResolver::new(),
            equity,
            crypto,
            sources: self.sources,
            directories: DirectoryCache::new(),
            series: SeriesCache::new(),
            replies,
            trending: TrendingTracker::new(),
            refresh_guard: JobGuard::default(),
            decay_guard: JobGuard::default(),
            config: self.config,
        })
    }
}
