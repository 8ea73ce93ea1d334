//! One-shot calendar scheduler
//!
//! Arms a single future calendar moment (month, day, hour, minute) per
//! guild and runs an action when it arrives. At most one schedule is armed
//! at a time: arming again replaces the previous one. A fired schedule stays
//! visible through `scheduled_for` until it is cancelled or replaced.
//!
//! Occurrence resolution always picks the next *future* instant: a
//! month/day earlier than today rolls into the next year, and a day that
//! does not exist in the target year (Feb 29) keeps rolling forward until
//! it does.

use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use voicebox_common::types::GuildId;

use crate::error::{PlayerError, Result};

/// Action run when the armed moment arrives
pub type ScheduledAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Calendar point with minute granularity, year left open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSpec {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

struct Armed {
    spec: ScheduleSpec,
    fire_at: DateTime<Utc>,
    action: ScheduledAction,
    task: JoinHandle<()>,
}

/// Single-slot scheduler for one guild
pub struct OneShotScheduler {
    guild_id: GuildId,
    armed: Mutex<Option<Armed>>,
}

impl OneShotScheduler {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            armed: Mutex::new(None),
        }
    }

    /// Arm the next future occurrence of `spec`, replacing any armed schedule
    pub async fn schedule(
        &self,
        spec: ScheduleSpec,
        action: ScheduledAction,
    ) -> Result<DateTime<Utc>> {
        let fire_at = next_occurrence(Utc::now(), spec)?;
        self.arm(spec, fire_at, action).await;
        Ok(fire_at)
    }

    /// Disarm; returns whether a schedule was armed
    pub async fn cancel(&self) -> bool {
        match self.armed.lock().await.take() {
            Some(armed) => {
                armed.task.abort();
                info!(guild = %self.guild_id, "one-shot schedule cancelled");
                true
            }
            None => false,
        }
    }

    /// Re-arm the stored spec at its next future occurrence
    ///
    /// Returns the new firing time, or `None` when nothing is armed.
    pub async fn update(&self) -> Result<Option<DateTime<Utc>>> {
        let current = {
            let slot = self.armed.lock().await;
            slot.as_ref().map(|a| (a.spec, Arc::clone(&a.action)))
        };
        match current {
            Some((spec, action)) => {
                let fire_at = next_occurrence(Utc::now(), spec)?;
                self.arm(spec, fire_at, action).await;
                Ok(Some(fire_at))
            }
            None => Ok(None),
        }
    }

    /// Firing time of the armed schedule, if any
    pub async fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        self.armed.lock().await.as_ref().map(|a| a.fire_at)
    }

    async fn arm(&self, spec: ScheduleSpec, fire_at: DateTime<Utc>, action: ScheduledAction) {
        let mut slot = self.armed.lock().await;
        if let Some(prev) = slot.take() {
            prev.task.abort();
            debug!(guild = %self.guild_id, "replacing armed schedule");
        }
        let task = spawn_timer(self.guild_id, fire_at, Arc::clone(&action));
        *slot = Some(Armed {
            spec,
            fire_at,
            action,
            task,
        });
        info!(guild = %self.guild_id, %fire_at, "one-shot schedule armed");
    }
}

fn spawn_timer(guild_id: GuildId, fire_at: DateTime<Utc>, action: ScheduledAction) -> JoinHandle<()> {
    tokio::spawn(async move {
        let delay = (fire_at - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(delay).await;
        debug!(guild = %guild_id, "one-shot schedule fired");
        action().await;
    })
}

/// Next strictly-future instant matching `spec`, starting from `now`
fn next_occurrence(now: DateTime<Utc>, spec: ScheduleSpec) -> Result<DateTime<Utc>> {
    if !(1..=12).contains(&spec.month) {
        return Err(PlayerError::Schedule(format!(
            "month {} out of range",
            spec.month
        )));
    }
    if !(1..=31).contains(&spec.day) {
        return Err(PlayerError::Schedule(format!("day {} out of range", spec.day)));
    }
    if spec.hour > 23 || spec.minute > 59 {
        return Err(PlayerError::Schedule(format!(
            "time {:02}:{:02} out of range",
            spec.hour, spec.minute
        )));
    }

    // Feb 29 exists only in leap years, so scan a few years ahead
    for year in now.year()..=now.year() + 8 {
        if let Some(candidate) = Utc
            .with_ymd_and_hms(year, spec.month, spec.day, spec.hour, spec.minute, 0)
            .single()
        {
            if candidate > now {
                return Ok(candidate);
            }
        }
    }
    Err(PlayerError::Schedule(format!(
        "no upcoming occurrence of {:02}-{:02} {:02}:{:02}",
        spec.month, spec.day, spec.hour, spec.minute
    )))
}
