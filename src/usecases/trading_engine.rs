//! Trading Engine - Quote, Commit and Market Lifecycle
//!
//! Orchestrates the quote/commit flow:
//! 1. `quote` prices a request against a snapshot (advisory)
//! 2. `commit` takes the market lock, re-prices against live state,
//!    debits the wallet ledger, then applies the trade
//! 3. A `MARKET_UPDATE` goes out after the lock is released
//!
//! Quotes and price snapshots read the last committed record and never
//! queue behind a commit that is waiting on the ledger.
//!
//! Every commit runs under a timeout. The state mutation happens
//! synchronously after the debit resolves, so an expired commit has
//! never touched the market; its debit is voided by trade id.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::metrics::EngineMetrics;
use crate::config::AppConfig;
use crate::domain::error::{MarketError, PrecisionDriftError, PricingError, TradeRejection};
use crate::domain::market::{
  AccountId, MarketId, MarketStatus, PriceSnapshot, TradeEstimate, TradeRequest,
};
use crate::domain::precision::{self, PricingPolicy};
use crate::domain::quote::{Fill, Quote};
use crate::domain::update::MarketUpdate;
use crate::ports::update_publisher::UpdatePublisher;
use crate::ports::wallet_ledger::{LedgerError, WalletLedger};
use crate::usecases::drift_monitor::DriftMonitor;
use crate::usecases::market_registry::{MarketRecord, MarketRegistry};

/// Runtime knobs of the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
  /// Upper bound on lock wait plus ledger debit for one commit.
  pub commit_timeout: Duration,
  /// Rounding rules for every published figure.
  pub policy: PricingPolicy,
  /// Tolerance for client mirror estimates.
  pub drift_epsilon: f64,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self {
      commit_timeout: Duration::from_secs(2),
      policy: PricingPolicy::default(),
      drift_epsilon: 0.01,
    }
  }
}

impl EngineSettings {
  /// Settings described by a loaded configuration.
  pub const fn from_config(config: &AppConfig) -> Self {
    Self {
      commit_timeout: config.engine.commit_timeout(),
      policy: config.pricing.policy(),
      drift_epsilon: config.pricing.drift_epsilon,
    }
  }
}

/// Authoritative quote plus any divergence found in the client's mirror.
#[derive(Debug, Clone)]
pub struct MirroredQuote {
  pub quote: Quote,
  /// Empty when the mirror agreed within epsilon.
  pub drift: Vec<PrecisionDriftError>,
}

/// Net invested vs. committed debits for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
  pub market_id: MarketId,
  /// Curve collateral beyond the subsidy, rounded on its own.
  pub net_invested_minor_units: u64,
  /// Share truncation remainder kept by the market.
  pub retained_dust_minor_units: Decimal,
  pub total_debits_minor_units: u64,
  pub trade_count: u64,
  /// `net_invested + retained_dust - total_debits`, rounded once.
  pub gap_minor_units: i64,
}

impl ReconciliationReport {
  pub const fn is_balanced(&self) -> bool {
    self.gap_minor_units == 0
  }
}

/// The single pricing authority. Share it through `Arc`.
pub struct TradingEngine<L: WalletLedger, P: UpdatePublisher> {
  registry: MarketRegistry,
  ledger: Arc<L>,
  publisher: Arc<P>,
  settings: EngineSettings,
  drift_monitor: DriftMonitor,
  metrics: EngineMetrics,
}

impl<L: WalletLedger, P: UpdatePublisher> TradingEngine<L, P> {
  /// Create an engine with no markets.
  pub fn new(ledger: Arc<L>, publisher: Arc<P>, settings: EngineSettings) -> Result<Self> {
    let metrics = EngineMetrics::new().context("Failed to register engine metrics")?;
    Ok(Self {
      registry: MarketRegistry::new(),
      ledger,
      publisher,
      drift_monitor: DriftMonitor::new(settings.drift_epsilon),
      settings,
      metrics,
    })
  }

  /// Create an engine and open every configured market.
  pub async fn from_config(config: &AppConfig, ledger: Arc<L>, publisher: Arc<P>) -> Result<Self> {
    let engine = Self::new(ledger, publisher, EngineSettings::from_config(config))?;
    for market in &config.markets {
      let liquidity_b = precision::to_decimal("liquidity_b", market.liquidity_b)
        .with_context(|| format!("Market {} has unusable liquidity_b", market.id))?;
      engine
        .open_market(market.id.clone(), liquidity_b)
        .await
        .with_context(|| format!("Failed to open market {}", market.id))?;
    }
    info!(
      name = %config.engine.name,
      markets = config.markets.len(),
      "Trading engine ready"
    );
    Ok(engine)
  }

  pub const fn settings(&self) -> &EngineSettings {
    &self.settings
  }

  pub const fn metrics(&self) -> &EngineMetrics {
    &self.metrics
  }

  pub const fn registry(&self) -> &MarketRegistry {
    &self.registry
  }

  // ────────────────────────────────────────────
  // Market lifecycle
  // ────────────────────────────────────────────

  /// Open a fresh market and announce it at version 0.
  pub async fn open_market(
    &self,
    market_id: impl Into<MarketId>,
    liquidity_b: Decimal,
  ) -> Result<MarketRecord, MarketError> {
    let record = self.registry.open_market(market_id, liquidity_b).await?;
    let update = self.update_for(&record)?;
    self.publisher.publish(update);
    Ok(record)
  }

  /// OPEN -> CLOSED. The state is frozen from here on.
  pub async fn close_market(&self, market_id: &str) -> Result<MarketRecord, MarketError> {
    self.transition(market_id, MarketStatus::Closed).await
  }

  /// OPEN or CLOSED -> SETTLED.
  pub async fn settle_market(&self, market_id: &str) -> Result<MarketRecord, MarketError> {
    self.transition(market_id, MarketStatus::Settled).await
  }

  #[instrument(skip(self))]
  async fn transition(&self, market_id: &str, to: MarketStatus) -> Result<MarketRecord, MarketError> {
    let handle = self.registry.handle(market_id).await?;
    let (record, update) = {
      let mut record = handle.lock().await;
      if !record.status.can_transition_to(to) {
        warn!(from = %record.status, "Rejected market status transition");
        return Err(MarketError::InvalidTransition {
          market_id: market_id.to_string(),
          from: record.status,
          to,
        });
      }
      let mut next = record.clone();
      next.status = to;
      next.version += 1;
      let update = self.update_for(&next)?;
      handle.store(&mut record, next);
      (record.clone(), update)
    };

    info!(version = record.version, "Market status changed");
    self.publisher.publish(update);
    Ok(record)
  }

  /// Current rounded prices of both sides.
  pub async fn price_snapshot(&self, market_id: &str) -> Result<PriceSnapshot, MarketError> {
    let record = self.registry.snapshot(market_id).await?;
    record
      .state
      .price_snapshot(&self.settings.policy)
      .map_err(|source| MarketError::Configuration {
        market_id: market_id.to_string(),
        source,
      })
  }

  // ────────────────────────────────────────────
  // Quotes
  // ────────────────────────────────────────────

  /// Price `request` against the current snapshot. Advisory only.
  #[instrument(
    skip(self, request),
    fields(market_id = %request.market_id, side = %request.side, amount = request.amount_minor_units)
  )]
  pub async fn quote(&self, request: TradeRequest) -> Result<Quote, TradeRejection> {
    let record = self
      .registry
      .snapshot(&request.market_id)
      .await
      .map_err(|_| TradeRejection::MarketNotFound(request.market_id.clone()))?;
    record.ensure_open()?;

    let estimate = record
      .state
      .estimate_buy(request.side, request.amount_minor_units, &self.settings.policy)
      .inspect_err(|e| warn!(error = %e, "Quote rejected"))?;

    self
      .metrics
      .quotes
      .with_label_values(&[request.side.as_str()])
      .inc();
    if estimate.slippage_warning {
      self.metrics.slippage_warnings.inc();
    }
    debug!(
      shares = %estimate.shares,
      avg_price = %estimate.avg_price_minor_units,
      impact_pct = %estimate.price_impact_pct,
      version = record.version,
      "Quote computed"
    );

    Ok(Quote::new(request, estimate, record.version))
  }

  /// Quote `request` and compare the client's own estimate with it.
  ///
  /// Drift is logged and counted; the authoritative quote is returned
  /// either way.
  pub async fn quote_with_mirror(
    &self,
    request: TradeRequest,
    mirror: &TradeEstimate,
  ) -> Result<MirroredQuote, TradeRejection> {
    let quote = self.quote(request).await?;
    let drift = self
      .drift_monitor
      .compare(&quote.request.market_id, mirror, &quote.estimate);
    for d in &drift {
      warn!(
        market_id = %d.market_id,
        field = d.field,
        mirror = %d.mirror,
        authoritative = %d.authoritative,
        "Precision drift between client mirror and engine"
      );
      self.metrics.precision_drift.with_label_values(&[d.field]).inc();
    }
    Ok(MirroredQuote { quote, drift })
  }

  // ────────────────────────────────────────────
  // Commits
  // ────────────────────────────────────────────

  /// Commit a pending quote for `account`.
  ///
  /// The estimate is recomputed against live state under the market
  /// lock; the quote's own numbers are never applied. The quote ends up
  /// COMMITTED or REJECTED.
  #[instrument(skip(self, quote), fields(quote_id = %quote.id, market_id = %quote.request.market_id))]
  pub async fn commit(&self, quote: &mut Quote, account: &AccountId) -> Result<Fill, TradeRejection> {
    if !quote.is_pending() {
      return Err(TradeRejection::QuoteNotPending(quote.state()));
    }

    let outcome = self
      .run_commit(&quote.request, account, Some((quote.id, quote.snapshot_version)))
      .await;

    let transition = if outcome.is_ok() {
      quote.mark_committed()
    } else {
      quote.mark_rejected()
    };
    if let Err(err) = transition {
      warn!(error = %err, "Quote state transition refused");
    }
    outcome
  }

  /// Quote and commit in one step.
  #[instrument(
    skip(self, request),
    fields(market_id = %request.market_id, side = %request.side, amount = request.amount_minor_units)
  )]
  pub async fn execute(&self, request: TradeRequest, account: &AccountId) -> Result<Fill, TradeRejection> {
    self.run_commit(&request, account, None).await
  }

  async fn run_commit(
    &self,
    request: &TradeRequest,
    account: &AccountId,
    quote: Option<(Uuid, u64)>,
  ) -> Result<Fill, TradeRejection> {
    let started = Instant::now();
    let trade_id = Uuid::new_v4();

    let outcome = match tokio::time::timeout(
      self.settings.commit_timeout,
      self.commit_locked(trade_id, request, account, quote),
    )
    .await
    {
      Ok(outcome) => outcome,
      Err(_) => {
        self.void_debit(trade_id).await;
        Err(TradeRejection::Timeout {
          market_id: request.market_id.clone(),
          timeout_ms: u64::try_from(self.settings.commit_timeout.as_millis()).unwrap_or(u64::MAX),
        })
      }
    };

    #[allow(clippy::cast_precision_loss)]
    let elapsed_us = started.elapsed().as_micros() as f64;
    self
      .metrics
      .commit_latency_us
      .with_label_values(&[request.side.as_str()])
      .observe(elapsed_us);

    match outcome {
      Ok((fill, update)) => {
        self.metrics.commits.with_label_values(&["committed"]).inc();
        if fill.estimate.slippage_warning {
          self.metrics.slippage_warnings.inc();
        }
        info!(
          trade_id = %fill.trade_id,
          account = %account,
          shares = %fill.estimate.shares,
          avg_price = %fill.estimate.avg_price_minor_units,
          version = fill.version,
          requoted = fill.requoted,
          "Trade committed"
        );
        self.publisher.publish(update);
        Ok(fill)
      }
      Err(rejection) => {
        self
          .metrics
          .commits
          .with_label_values(&[rejection.reason()])
          .inc();
        warn!(
          trade_id = %trade_id,
          reason = rejection.reason(),
          error = %rejection,
          "Trade rejected"
        );
        Err(rejection)
      }
    }
  }

  /// Everything that must happen under the market lock.
  ///
  /// There is no await between the debit returning and the record being
  /// written, so dropping this future never leaves a half-applied trade.
  async fn commit_locked(
    &self,
    trade_id: Uuid,
    request: &TradeRequest,
    account: &AccountId,
    quote: Option<(Uuid, u64)>,
  ) -> Result<(Fill, MarketUpdate), TradeRejection> {
    let available = self.ledger.balance(account).await.map_err(ledger_rejection)?;
    if available < request.amount_minor_units {
      return Err(TradeRejection::InsufficientFunds {
        required: request.amount_minor_units,
        available,
      });
    }

    let handle = self
      .registry
      .handle(&request.market_id)
      .await
      .map_err(|_| TradeRejection::MarketNotFound(request.market_id.clone()))?;
    let mut record = handle.lock().await;
    record.ensure_open()?;

    let estimate = record.state.estimate_buy(
      request.side,
      request.amount_minor_units,
      &self.settings.policy,
    )?;

    let requoted = match quote {
      Some((_, quoted_version)) if quoted_version != record.version => {
        warn!(
          quoted_version,
          live_version = record.version,
          "Market moved since quote, recomputed against live state"
        );
        true
      }
      _ => false,
    };

    let mut next = record.clone();
    next.state.apply_buy(request.side, estimate.shares);
    next.version += 1;
    next.total_debits_minor_units = next
      .total_debits_minor_units
      .saturating_add(request.amount_minor_units);
    next.trade_count += 1;
    let dust = record
      .state
      .dust_minor_units(&next.state, request.amount_minor_units)
      .map_err(PricingError::from)?;
    next.retained_dust_minor_units += dust;
    let update = MarketUpdate::from_state(
      &next.id,
      &next.state,
      next.status,
      next.version,
      &self.settings.policy,
    )
    .map_err(PricingError::from)?;

    self
      .ledger
      .debit(account, &request.market_id, trade_id, request.amount_minor_units)
      .await
      .map_err(ledger_rejection)?;

    handle.store(&mut record, next);

    let fill = Fill {
      trade_id,
      quote_id: quote.map(|(id, _)| id),
      account: account.clone(),
      request: request.clone(),
      estimate,
      state_after: record.state.clone(),
      version: record.version,
      requoted,
      executed_at: Utc::now(),
    };
    Ok((fill, update))
  }

  /// Compensate a timed-out commit. Bounded by the commit timeout too.
  async fn void_debit(&self, trade_id: Uuid) {
    let timeout = self.settings.commit_timeout;
    match tokio::time::timeout(timeout, self.ledger.void(trade_id)).await {
      Ok(Ok(true)) => warn!(trade_id = %trade_id, "Voided debit of timed-out commit"),
      Ok(Ok(false)) => debug!(trade_id = %trade_id, "Timed-out commit had no debit to void"),
      Ok(Err(e)) => error!(
        trade_id = %trade_id,
        error = %e,
        "Failed to void debit of timed-out commit"
      ),
      Err(_) => error!(
        trade_id = %trade_id,
        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        "Void of timed-out commit did not complete, ledger may hold its debit"
      ),
    }
  }

  // ────────────────────────────────────────────
  // Accounting
  // ────────────────────────────────────────────

  /// Compare the curve's net invested amount with committed debits.
  #[instrument(skip(self))]
  pub async fn reconcile(&self, market_id: &str) -> Result<ReconciliationReport, MarketError> {
    let record = self.registry.snapshot(market_id).await?;
    let configuration = |source| MarketError::Configuration {
      market_id: market_id.to_string(),
      source,
    };
    let net_invested = record
      .state
      .net_invested_minor_units()
      .map_err(configuration)?;
    let accounted = record
      .state
      .accounted_minor_units(record.retained_dust_minor_units)
      .map_err(configuration)?;
    let debits = record.total_debits_minor_units;
    let gap = if accounted >= debits {
      i64::try_from(accounted - debits).unwrap_or(i64::MAX)
    } else {
      -i64::try_from(debits - accounted).unwrap_or(i64::MAX)
    };

    let report = ReconciliationReport {
      market_id: market_id.to_string(),
      net_invested_minor_units: net_invested,
      retained_dust_minor_units: record.retained_dust_minor_units,
      total_debits_minor_units: debits,
      trade_count: record.trade_count,
      gap_minor_units: gap,
    };

    if report.is_balanced() {
      debug!(net_invested, trades = record.trade_count, "Market reconciled");
    } else {
      self.metrics.reconciliation_gaps.inc();
      error!(
        net_invested,
        retained_dust = %record.retained_dust_minor_units,
        debits,
        gap,
        "Net invested does not match committed debits"
      );
    }
    Ok(report)
  }

  fn update_for(&self, record: &MarketRecord) -> Result<MarketUpdate, MarketError> {
    MarketUpdate::from_state(
      &record.id,
      &record.state,
      record.status,
      record.version,
      &self.settings.policy,
    )
    .map_err(|source| MarketError::Configuration {
      market_id: record.id.clone(),
      source,
    })
  }
}

fn ledger_rejection(err: LedgerError) -> TradeRejection {
  match err {
    LedgerError::InsufficientFunds {
      required, available, ..
    } => TradeRejection::InsufficientFunds { required, available },
    other => TradeRejection::Ledger(other.to_string()),
  }
}
