//! Upstream quota gate
//!
//! Tracks whether the extraction service is currently rate-limited. Two
//! backoff policies:
//! - **Daily:** total quota exhausted; blocked until the next local reset hour
//! - **Short:** per-minute limit; blocked for a fixed cooldown
//!
//! The gate never queues or retries. Callers check [`QuotaScheduler::check`]
//! before every upstream call and report failures back. Blocks lift lazily on
//! the first query at or after the blocked-until time.

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime};
use racesheet_common::config::{QuotaConfig, MAX_SHORT_COOLDOWN_MINUTES};
use racesheet_common::time::{format_clock, local_from_naive, now_local};
use std::fmt;
use tracing::{error, info, warn};

use crate::error::{IngestError, IngestResult};

/// Class of quota failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKind {
    Short,
    Daily,
}

impl QuotaKind {
    /// Classify an upstream quota error message
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if ["per day", "daily", "quota_exceeded"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            Self::Daily
        } else {
            Self::Short
        }
    }
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Daily => write!(f, "daily"),
        }
    }
}

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaState {
    Open,
    BlockedShort { until: DateTime<Local> },
    BlockedDaily { until: DateTime<Local> },
}

impl QuotaState {
    pub fn blocked_until(&self) -> Option<DateTime<Local>> {
        match self {
            Self::Open => None,
            Self::BlockedShort { until } | Self::BlockedDaily { until } => Some(*until),
        }
    }

    pub fn kind(&self) -> Option<QuotaKind> {
        match self {
            Self::Open => None,
            Self::BlockedShort { .. } => Some(QuotaKind::Short),
            Self::BlockedDaily { .. } => Some(QuotaKind::Daily),
        }
    }
}

/// Next occurrence of `hour:00` strictly after `now` (today if still ahead)
pub fn next_daily_reset(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let reset_time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date().and_time(reset_time);
    if now >= today {
        today + Duration::days(1)
    } else {
        today
    }
}

/// Process-wide quota state, owned by the pipeline
#[derive(Debug, Clone)]
pub struct QuotaScheduler {
    state: QuotaState,
    daily_reset_hour: u32,
    short_cooldown: Duration,
}

impl QuotaScheduler {
    pub fn new(config: &QuotaConfig) -> Self {
        Self {
            state: QuotaState::Open,
            daily_reset_hour: config.daily_reset_hour,
            short_cooldown: Duration::minutes(
                config
                    .short_cooldown_minutes
                    .clamp(1, MAX_SHORT_COOLDOWN_MINUTES),
            ),
        }
    }

    pub fn state(&self) -> QuotaState {
        self.state
    }

    pub fn blocked_until(&self) -> Option<DateTime<Local>> {
        self.state.blocked_until()
    }

    pub fn is_blocked(&mut self) -> bool {
        self.is_blocked_at(now_local())
    }

    /// Whether an attempt at `now` is refused; lifts an expired block
    pub fn is_blocked_at(&mut self, now: DateTime<Local>) -> bool {
        match self.state.blocked_until() {
            None => false,
            Some(until) if now >= until => {
                info!(kind = ?self.state.kind(), "Extraction quota block lifted");
                self.state = QuotaState::Open;
                false
            }
            Some(_) => true,
        }
    }

    pub fn check(&mut self) -> IngestResult<()> {
        self.check_at(now_local())
    }

    /// Gate an attempt at `now`
    pub fn check_at(&mut self, now: DateTime<Local>) -> IngestResult<()> {
        if !self.is_blocked_at(now) {
            return Ok(());
        }
        match self.state {
            QuotaState::BlockedShort { until } => Err(IngestError::QuotaBlocked {
                kind: QuotaKind::Short,
                until,
            }),
            QuotaState::BlockedDaily { until } => Err(IngestError::QuotaBlocked {
                kind: QuotaKind::Daily,
                until,
            }),
            QuotaState::Open => Ok(()),
        }
    }

    pub fn record_failure(&mut self, kind: QuotaKind) -> DateTime<Local> {
        self.record_failure_at(kind, now_local())
    }

    /// Enter a block for a quota failure observed at `now`; returns blocked-until
    pub fn record_failure_at(&mut self, kind: QuotaKind, now: DateTime<Local>) -> DateTime<Local> {
        match kind {
            QuotaKind::Daily => {
                let until = local_from_naive(next_daily_reset(
                    now.naive_local(),
                    self.daily_reset_hour,
                ));
                error!(until = %format_clock(&until), "Daily extraction quota exhausted");
                self.state = QuotaState::BlockedDaily { until };
                until
            }
            QuotaKind::Short => {
                let until = now + self.short_cooldown;
                warn!(
                    until = %format_clock(&until),
                    cooldown_minutes = self.short_cooldown.num_minutes(),
                    "Extraction rate limit hit"
                );
                self.state = QuotaState::BlockedShort { until };
                until
            }
        }
    }

    /// A gated call went through
    pub fn record_success(&mut self) {
        self.state = QuotaState::Open;
    }
}
