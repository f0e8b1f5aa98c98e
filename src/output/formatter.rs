use std::io::IsTerminal;

use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::job::{JobRecord, JobView};
use crate::scoring::{effective_time_limit, XFactorParams};

/// A job with its xfactor for display
#[derive(Debug, Clone, Serialize)]
pub struct ScoredJob<'a> {
    #[serde(skip)]
    pub job: &'a JobRecord,
    pub id: u32,
    /// None when this pass did not score the job
    pub factor: Option<u32>,
    /// Effective time limit in minutes
    pub time_limit: u32,
    pub site_factor: u64,
    /// Whether site_factor was written on this pass
    pub updated: bool,
}

impl<'a> ScoredJob<'a> {
    /// A job the plugin just wrote; the factor is read back from its site factor.
    pub fn applied(job: &'a JobRecord, params: &XFactorParams) -> Self {
        let factor = job
            .site_factor
            .saturating_sub(u64::from(params.nice_offset()));
        Self {
            job,
            id: job.id,
            factor: Some(u32::try_from(factor).unwrap_or(u32::MAX)),
            time_limit: effective_time_limit(job, params),
            site_factor: job.site_factor,
            updated: true,
        }
    }

    /// A job left as it was; its stored site factor is shown unchanged.
    pub fn untouched(job: &'a JobRecord, params: &XFactorParams) -> Self {
        Self {
            job,
            id: job.id,
            factor: None,
            time_limit: effective_time_limit(job, params),
            site_factor: job.site_factor,
            updated: false,
        }
    }

    /// What applying `factor` would store, without touching the job.
    pub fn preview(job: &'a JobRecord, params: &XFactorParams, factor: u32) -> Self {
        Self {
            job,
            id: job.id,
            factor: Some(factor),
            time_limit: effective_time_limit(job, params),
            site_factor: u64::from(factor) + u64::from(params.nice_offset()),
            updated: false,
        }
    }

    fn factor_label(&self) -> String {
        self.factor
            .map(|f| f.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Human-readable pending time, truncated to whole minutes ("1h 20m")
pub fn format_pending(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0) as u64;
    if minutes == 0 {
        return "-".to_string();
    }
    humantime::format_duration(std::time::Duration::from_secs(minutes * 60)).to_string()
}

/// Format jobs as a fixed-width table with a header row:
/// JOBID, STATE, PENDING, LIMIT, FACTOR, SITE_FACTOR, NAME
pub fn format_factor_table(jobs: &[ScoredJob], now: DateTime<Utc>, use_colors: bool) -> String {
    if jobs.is_empty() {
        return "No jobs found.".to_string();
    }

    let header = format!(
        "{:>8}  {:<10} {:>12} {:>8} {:>8} {:>12}  {}",
        "JOBID", "STATE", "PENDING", "LIMIT", "FACTOR", "SITE_FACTOR", "NAME"
    );

    let mut lines = Vec::with_capacity(jobs.len() + 1);
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    for scored in jobs {
        let state = format!("{:<10}", scored.job.state.to_string());
        let pending = format!("{:>12}", format_pending(scored.job.pending_for(now)));
        let limit = format!("{:>7}m", scored.time_limit);
        let factor = format!("{:>8}", scored.factor_label());
        let site_factor = format!("{:>12}", scored.site_factor);

        if use_colors {
            let state = if scored.job.is_pending() {
                state.yellow().to_string()
            } else {
                state.dimmed().to_string()
            };
            let site_factor = if scored.updated {
                site_factor.green().to_string()
            } else {
                site_factor
            };
            lines.push(format!(
                "{:>8}  {} {} {} {} {}  {}",
                scored.id,
                state,
                pending,
                limit,
                factor.bold(),
                site_factor,
                scored.job.name.cyan()
            ));
        } else {
            lines.push(format!(
                "{:>8}  {} {} {} {} {}  {}",
                scored.id, state, pending, limit, factor, site_factor, scored.job.name
            ));
        }
    }

    lines.join("\n")
}

/// Format a single job with detailed multi-line output
pub fn format_job_detail(scored: &ScoredJob, now: DateTime<Utc>, use_colors: bool) -> String {
    let job = scored.job;
    let accrue = job
        .accrue_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unset".to_string());
    let partition = job.partition.as_deref().unwrap_or("(none)");

    if use_colors {
        format!(
            "Job {} ({})\n  State: {}\n  Partition: {}\n  Accrue time: {}\n  Pending: {}\n  Effective limit: {}m\n  Factor: {}\n  Site factor: {}",
            job.id.bold(),
            job.name.cyan(),
            job.state,
            partition,
            accrue,
            format_pending(job.pending_for(now)),
            scored.time_limit,
            scored.factor_label().bold(),
            scored.site_factor.green()
        )
    } else {
        format!(
            "Job {} ({})\n  State: {}\n  Partition: {}\n  Accrue time: {}\n  Pending: {}\n  Effective limit: {}m\n  Factor: {}\n  Site factor: {}",
            job.id,
            job.name,
            job.state,
            partition,
            accrue,
            format_pending(job.pending_for(now)),
            scored.time_limit,
            scored.factor_label(),
            scored.site_factor
        )
    }
}

/// Format jobs as a JSON array for scripting
pub fn format_json(jobs: &[ScoredJob]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(jobs)?)
}
