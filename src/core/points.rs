//! Points earned by exploring the timeline, redeemable for ad-free time.

use crate::core::sealed::SealingKey;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub points: u64,
    pub ad_free_minutes: i64,
}

pub fn default_milestones() -> Vec<Milestone> {
    vec![
        Milestone {
            points: 100,
            ad_free_minutes: 30,
        },
        Milestone {
            points: 250,
            ad_free_minutes: 90,
        },
        Milestone {
            points: 500,
            ad_free_minutes: 240,
        },
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsLedger {
    pub points: u64,
    pub ad_free_until: Option<DateTime<Utc>>,
}

impl PointsLedger {
    pub fn award(&mut self, points: u64) -> u64 {
        self.points = self.points.saturating_add(points);
        self.points
    }

    /// Highest milestone the current balance reaches, regardless of list order.
    pub fn best_milestone(&self, milestones: &[Milestone]) -> Option<Milestone> {
        milestones
            .iter()
            .filter(|m| m.points <= self.points)
            .max_by_key(|m| (m.points, m.ad_free_minutes))
            .copied()
    }

    /// Spends points on the best milestone. Ad-free time stacks on top of any
    /// window that is still running.
    pub fn redeem(&mut self, now: DateTime<Utc>, milestones: &[Milestone]) -> Option<Milestone> {
        let milestone = self.best_milestone(milestones)?;
        self.points -= milestone.points;

        let start = match self.ad_free_until {
            Some(until) if until > now => until,
            _ => now,
        };
        self.ad_free_until = Some(start + Duration::minutes(milestone.ad_free_minutes));
        Some(milestone)
    }

    pub fn is_ad_free(&self, now: DateTime<Utc>) -> bool {
        self.ad_free_until.is_some_and(|until| until > now)
    }

    pub fn remaining_ad_free(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.ad_free_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }
}

/// Ledger persisted through a `Storage`: loaded once, saved after each change.
/// The stored file is the JSON ledger sealed with `key`.
pub struct PointsStore<S: Storage> {
    storage: S,
    file: String,
    key: SealingKey,
    milestones: Vec<Milestone>,
    ledger: PointsLedger,
}

impl<S: Storage> PointsStore<S> {
    pub async fn load(
        storage: S,
        file: impl Into<String>,
        key: SealingKey,
        milestones: Vec<Milestone>,
    ) -> Result<Self> {
        let file = file.into();
        let ledger = if storage.exists(&file).await {
            let sealed = storage.read_file(&file).await?;
            serde_json::from_slice(&key.open(&sealed)?)?
        } else {
            tracing::debug!("No points ledger at {}, starting fresh", file);
            PointsLedger::default()
        };

        Ok(Self {
            storage,
            file,
            key,
            milestones,
            ledger,
        })
    }

    pub fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    async fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.ledger)?;
        let sealed = self.key.seal(&bytes)?;
        self.storage.write_file(&self.file, &sealed).await
    }

    pub async fn award(&mut self, points: u64) -> Result<u64> {
        let total = self.ledger.award(points);
        self.save().await?;

        if let Some(milestone) = self.ledger.best_milestone(&self.milestones) {
            tracing::debug!(
                "Milestone {} reachable ({} minutes ad-free)",
                milestone.points,
                milestone.ad_free_minutes
            );
        }
        Ok(total)
    }

    pub async fn redeem(&mut self, now: DateTime<Utc>) -> Result<Option<Milestone>> {
        let redeemed = self.ledger.redeem(now, &self.milestones);
        if redeemed.is_some() {
            self.save().await?;
        }
        Ok(redeemed)
    }
}
