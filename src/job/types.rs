use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum run time of a partition, in minutes, or no cap at all.
///
/// Serialized as a plain integer or the string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeLimit {
    Unlimited,
    #[serde(untagged)]
    Minutes(u32),
}

impl TimeLimit {
    /// Minutes for a capped limit, None when unlimited.
    pub fn minutes(self) -> Option<u32> {
        match self {
            TimeLimit::Minutes(m) => Some(m),
            TimeLimit::Unlimited => None,
        }
    }
}

/// The slice of a scheduler job the site factor reads and writes.
///
/// The host owns the job; the factor engine only reads the accrual and
/// time-limit fields and writes `site_factor`.
pub trait JobView {
    /// Start of priority accrual. None when unset or when the job carries
    /// no accrual tracking at all.
    fn accrue_time(&self) -> Option<DateTime<Utc>>;

    /// Job's own time limit in minutes, None when not set.
    fn time_limit(&self) -> Option<u32>;

    /// Max time of the job's partition, None when the job has no partition.
    fn partition_max_time(&self) -> Option<TimeLimit>;

    fn is_pending(&self) -> bool;

    fn site_factor(&self) -> u64;

    fn set_site_factor(&mut self, value: u64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Suspended,
    Completed,
    Cancelled,
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Suspended => "SUSPENDED",
            JobState::Completed => "COMPLETED",
            JobState::Cancelled => "CANCELLED",
            JobState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// A job as recorded in a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub accrue_time: Option<DateTime<Utc>>,
    /// Minutes
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub partition_max_time: Option<TimeLimit>,
    #[serde(default)]
    pub site_factor: u64,
}

impl JobRecord {
    /// Time since accrual started, zero when accrual is unset or in the future
    pub fn pending_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        match self.accrue_time {
            Some(t) if now > t => now - t,
            _ => chrono::Duration::zero(),
        }
    }
}

impl JobView for JobRecord {
    fn accrue_time(&self) -> Option<DateTime<Utc>> {
        self.accrue_time
    }

    fn time_limit(&self) -> Option<u32> {
        self.time_limit
    }

    fn partition_max_time(&self) -> Option<TimeLimit> {
        // A job outside any partition has no partition cap to fall back on.
        self.partition.as_ref()?;
        self.partition_max_time
    }

    fn is_pending(&self) -> bool {
        self.state == JobState::Pending
    }

    fn site_factor(&self) -> u64 {
        self.site_factor
    }

    fn set_site_factor(&mut self, value: u64) {
        self.site_factor = value;
    }
}

/// On-disk collection of jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobSnapshot {
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
}

impl JobSnapshot {
    pub fn find_mut(&mut self, id: u32) -> Option<&mut JobRecord> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }
}
