//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Discovering the public IPv4/IPv6 addresses via IpSource
//! - Reading the current zone records via DnsProvider
//! - Reconciling both into per-zone batches
//! - Applying the batches
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!                  │  DdnsEngine  │◄──── ticker / shutdown
//!                  └──────────────┘
//!                          │
//!        ┌─────────────────┼───────────────────┬──────────────────┐
//!        ▼                 ▼                   ▼                  ▼
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  IpSource   │   │ fetch_current│   │build_batches │   │   apply     │
//! │ (v4 ∥ v6)   │   │ (provider)   │   │ (reconcile)  │   │ (provider)  │
//! └─────────────┘   └──────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Fetch IPv4 and IPv6 concurrently, each bounded by half the cycle timeout
//! 2. Stop if neither address is known
//! 3. Read the provider's current records for every managed zone
//! 4. Build batches; stop if there is nothing to update
//! 5. Apply the batches in order
//!
//! Every failure is contained to its cycle and reported through logs and
//! [`EngineEvent::CycleFailed`]. The next cycle starts from scratch.

use crate::applier;
use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::model::{IpVersion, ObservedAddresses};
use crate::reader;
use crate::reconcile;
use crate::traits::{DnsProvider, IpSource};
use crate::zones::ZoneDirectory;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, error::Elapsed, timeout};
use tracing::{debug, error, info, warn};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of one successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Neither address family could be discovered
    NoAddresses,

    /// Every managed record already matches the observed addresses
    UpToDate,

    /// Batches were submitted to the provider
    Applied {
        batches: usize,
        changes: usize,
    },
}

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        zones: usize,
        records: usize,
    },

    /// A cycle finished without error
    CycleCompleted {
        outcome: CycleOutcome,
    },

    /// A cycle was aborted (provider failure or timeout)
    CycleFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run_until()`]
/// 3. Engine runs cycles on a fixed period until the shutdown signal fires
///
/// ## Timing
///
/// The first cycle fires `interval - timeout` after start, then every
/// `interval`. Each cycle is bounded by `timeout`. The shutdown signal
/// interrupts the wait between cycles immediately; a cycle already running
/// finishes (within its timeout) first.
pub struct DdnsEngine {
    /// Public address discovery
    ip_source: Box<dyn IpSource>,

    /// Hosted-zone API
    provider: Box<dyn DnsProvider>,

    /// Managed zones (read-only)
    zones: ZoneDirectory,

    /// Upper bound for one cycle
    cycle_timeout: Duration,

    /// Period between cycle starts
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            ip_source,
            provider,
            zones: config.zone_directory(),
            cycle_timeout: config.cycle_timeout(),
            interval: config.check_interval(),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Managed zones
    pub fn zones(&self) -> &ZoneDirectory {
        &self.zones
    }

    /// Run cycles until `shutdown` fires (or its sender is dropped)
    pub async fn run_until(&self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            zones: self.zones.zones().len(),
            records: self.zones.managed_records().count(),
        });

        let first_cycle = Instant::now() + self.interval.saturating_sub(self.cycle_timeout);
        let mut ticker = tokio::time::interval_at(first_cycle, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Engine running: cycle every {:?}, timeout {:?}",
            self.interval, self.cycle_timeout
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }

                _ = ticker.tick() => {
                    self.run_bounded_cycle().await;
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Run one fetch → reconcile → apply cycle
    ///
    /// This is not bounded by the cycle timeout; [`DdnsEngine::run_until`]
    /// applies it.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        debug!("Cycle starting, getting ips");

        let observed = self.observe().await;
        if observed.is_empty() {
            warn!("No public address discovered, skipping this cycle");
            return Ok(CycleOutcome::NoAddresses);
        }

        let current = reader::fetch_current(self.provider.as_ref(), &self.zones).await?;
        let batches = reconcile::build_batches(&observed, &current, &self.zones);

        if batches.is_empty() {
            info!("Nothing to update");
            return Ok(CycleOutcome::UpToDate);
        }

        applier::apply(self.provider.as_ref(), &self.zones, &batches).await?;

        let changes = batches.iter().map(|b| b.changes.len()).sum();
        info!("All changes were updated ({} batch(es))", batches.len());

        Ok(CycleOutcome::Applied {
            batches: batches.len(),
            changes,
        })
    }

    /// Discover both address families concurrently
    ///
    /// Each family gets half of the cycle timeout; a failure or an expired
    /// deadline leaves that slot empty.
    pub async fn observe(&self) -> ObservedAddresses {
        let fetch_timeout = self.cycle_timeout / 2;

        let (v4, v6) = tokio::join!(
            timeout(fetch_timeout, self.ip_source.ipv4()),
            timeout(fetch_timeout, self.ip_source.ipv6()),
        );

        ObservedAddresses::new(
            settle(IpVersion::V4, v4, fetch_timeout),
            settle(IpVersion::V6, v6, fetch_timeout),
        )
    }

    async fn run_bounded_cycle(&self) {
        let event = match timeout(self.cycle_timeout, self.run_cycle()).await {
            Ok(Ok(outcome)) => EngineEvent::CycleCompleted { outcome },
            Ok(Err(e)) => {
                error!("Unable to make changes, error: {}", e);
                EngineEvent::CycleFailed {
                    error: e.to_string(),
                }
            }
            Err(_) => {
                let e = Error::timeout(format!("cycle exceeded {:?}", self.cycle_timeout));
                error!("{}", e);
                EngineEvent::CycleFailed {
                    error: e.to_string(),
                }
            }
        };

        self.emit_event(event);
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("No event receiver, dropping event");
            }
        }
    }
}

/// Turn one fetch branch result into an optional address, logging failures
fn settle<T: Display>(
    version: IpVersion,
    result: std::result::Result<Result<T>, Elapsed>,
    limit: Duration,
) -> Option<T> {
    match result {
        Ok(Ok(ip)) => {
            debug!("Got {} information [{}]", version, ip);
            Some(ip)
        }
        Ok(Err(e)) => {
            warn!("Unable to get {}, err: {}", version, e);
            None
        }
        Err(_) => {
            warn!("Unable to get {}, no answer within {:?}", version, limit);
            None
        }
    }
}
