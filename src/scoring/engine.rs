use chrono::{DateTime, Utc};
use tracing::debug;

use super::params::XFactorParams;
use crate::debug_flags::DebugFlags;
use crate::job::JobView;
use crate::plugin::PLUGIN_TYPE;

/// Effective time limit in minutes: the job's own limit, else its
/// partition's capped max time, else one minute; never below `min_time`.
pub fn effective_time_limit<J: JobView + ?Sized>(job: &J, params: &XFactorParams) -> u32 {
    let limit = job
        .time_limit()
        .or_else(|| job.partition_max_time().and_then(|t| t.minutes()))
        .unwrap_or(1);

    limit.max(params.min_time())
}

/// Weighted xfactor for a job, evaluated now.
pub fn compute_factor<J: JobView + ?Sized>(
    job: &J,
    params: &XFactorParams,
    flags: DebugFlags,
) -> u32 {
    compute_factor_at(job, params, Utc::now(), flags)
}

/// Weighted xfactor for a job at instant `now`, in `[0, params.max()]`.
///
/// Elapsed accrual time is converted to minutes before it is divided by the
/// effective time limit, so a job waiting as long as its limit scores 1
/// before weighting.
pub fn compute_factor_at<J: JobView + ?Sized>(
    job: &J,
    params: &XFactorParams,
    now: DateTime<Utc>,
    flags: DebugFlags,
) -> u32 {
    if params.weight() == 0 {
        return 0;
    }
    let Some(accrue_time) = job.accrue_time() else {
        return 0;
    };

    let delta_secs = if now > accrue_time {
        (now - accrue_time).num_seconds()
    } else {
        0
    };
    if delta_secs <= 0 {
        return 0;
    }

    let limit = effective_time_limit(job, params);
    let quotient = (delta_secs as f64 / 60.0) / f64::from(limit);
    // f64::round rounds half away from zero; the cast saturates.
    let raw = quotient.round() as u64;

    let weighted = raw.saturating_mul(u64::from(params.weight()));
    let factor = weighted.min(u64::from(params.max())) as u32;

    if flags.contains(DebugFlags::PRIORITY) {
        debug!(plugin = PLUGIN_TYPE, "weightened site_factor={}", factor);
    }

    factor
}

/// Encode the factor around the host's neutral offset and store it on the job.
pub fn apply_to_job<J: JobView + ?Sized>(job: &mut J, params: &XFactorParams, flags: DebugFlags) {
    apply_to_job_at(job, params, Utc::now(), flags);
}

pub fn apply_to_job_at<J: JobView + ?Sized>(
    job: &mut J,
    params: &XFactorParams,
    now: DateTime<Utc>,
    flags: DebugFlags,
) {
    let factor = compute_factor_at(job, params, now, flags);
    job.set_site_factor(u64::from(factor) + u64::from(params.nice_offset()));
}

/// Re-apply the factor to every pending job. Returns how many were updated.
pub fn recompute_all<'a, J, I>(jobs: I, params: &XFactorParams, flags: DebugFlags) -> usize
where
    J: JobView + ?Sized + 'a,
    I: IntoIterator<Item = &'a mut J>,
{
    recompute_all_at(jobs, params, Utc::now(), flags)
}

pub fn recompute_all_at<'a, J, I>(
    jobs: I,
    params: &XFactorParams,
    now: DateTime<Utc>,
    flags: DebugFlags,
) -> usize
where
    J: JobView + ?Sized + 'a,
    I: IntoIterator<Item = &'a mut J>,
{
    let mut updated = 0;
    for job in jobs {
        if job.is_pending() {
            apply_to_job_at(job, params, now, flags);
            updated += 1;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobRecord, JobState, TimeLimit};
    use crate::scoring::params::NICE_OFFSET;
    use chrono::Duration;

    fn params(min_time: u32, max: u32, weight: u32) -> XFactorParams {
        XFactorParams::from_parts(min_time, max, weight, NICE_OFFSET)
    }

    fn sample_job(now: DateTime<Utc>, elapsed_minutes: i64, time_limit: Option<u32>) -> JobRecord {
        JobRecord {
            id: 1,
            name: "job".to_string(),
            state: JobState::Pending,
            accrue_time: Some(now - Duration::minutes(elapsed_minutes)),
            time_limit,
            partition: Some("batch".to_string()),
            partition_max_time: Some(TimeLimit::Unlimited),
            site_factor: 0,
        }
    }

    #[test]
    fn test_scenario_own_time_limit() {
        let now = Utc::now();
        let job = sample_job(now, 20, Some(10));
        let p = params(5, 100, 2);
        // round(20 / 10) = 2, weighted 4
        assert_eq!(compute_factor_at(&job, &p, now, DebugFlags::NONE), 4);
    }

    #[test]
    fn test_scenario_partition_limit_raised_to_min_time() {
        let now = Utc::now();
        let mut job = sample_job(now, 20, None);
        job.partition_max_time = Some(TimeLimit::Minutes(3));
        let p = params(5, 100, 2);

        assert_eq!(effective_time_limit(&job, &p), 5);
        // round(20 / 5) = 4, weighted 8
        assert_eq!(compute_factor_at(&job, &p, now, DebugFlags::NONE), 8);
    }

    #[test]
    fn test_scenario_clamped_to_max() {
        let now = Utc::now();
        let job = sample_job(now, 100, Some(10));
        let p = params(1, 3, 1);
        // raw 10, clamped to 3
        assert_eq!(compute_factor_at(&job, &p, now, DebugFlags::NONE), 3);
    }

    #[test]
    fn test_fallback_limit_is_one_minute() {
        let now = Utc::now();
        let mut job = sample_job(now, 7, None);
        let p = params(1, 100, 1);
        assert_eq!(effective_time_limit(&job, &p), 1);
        assert_eq!(compute_factor_at(&job, &p, now, DebugFlags::NONE), 7);

        job.partition = None;
        job.partition_max_time = Some(TimeLimit::Minutes(60));
        assert_eq!(effective_time_limit(&job, &p), 1);
    }

    #[test]
    fn test_zero_weight() {
        let now = Utc::now();
        let job = sample_job(now, 20, Some(10));
        let p = params(1, 100, 0);
        assert_eq!(compute_factor_at(&job, &p, now, DebugFlags::NONE), 0);
    }

    #[test]
    fn test_unset_accrue_time() {
        let now = Utc::now();
        let mut job = sample_job(now, 20, Some(10));
        job.accrue_time = None;
        assert_eq!(compute_factor_at(&job, &params(1, 100, 1), now, DebugFlags::NONE), 0);
    }

    #[test]
    fn test_no_elapsed_time() {
        let now = Utc::now();
        let job = sample_job(now, 0, Some(10));
        assert_eq!(compute_factor_at(&job, &params(1, 100, 1), now, DebugFlags::NONE), 0);

        // Accrual in the future is not negative elapsed time.
        let job = sample_job(now, -30, Some(10));
        assert_eq!(compute_factor_at(&job, &params(1, 100, 1), now, DebugFlags::NONE), 0);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let now = Utc::now();
        let p = params(1, 100, 1);
        // 15 / 10 = 1.5 -> 2
        assert_eq!(compute_factor_at(&sample_job(now, 15, Some(10)), &p, now, DebugFlags::NONE), 2);
        // 14 / 10 = 1.4 -> 1
        assert_eq!(compute_factor_at(&sample_job(now, 14, Some(10)), &p, now, DebugFlags::NONE), 1);
        // 4 / 10 = 0.4 -> 0
        assert_eq!(compute_factor_at(&sample_job(now, 4, Some(10)), &p, now, DebugFlags::NONE), 0);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let now = Utc::now();
        let p = params(3, 25, 3);
        let mut previous = 0;
        for minutes in 0..600 {
            let job = sample_job(now, minutes, Some(7));
            let factor = compute_factor_at(&job, &p, now, DebugFlags::PRIORITY);
            assert!(factor >= previous, "factor dropped at {} minutes", minutes);
            assert!(factor <= p.max());
            previous = factor;
        }
        assert_eq!(previous, 25);
    }

    #[test]
    fn test_large_weight_does_not_overflow() {
        let now = Utc::now();
        let job = sample_job(now, 60 * 24 * 365, Some(1));
        let p = params(1, NICE_OFFSET, NICE_OFFSET);
        assert_eq!(compute_factor_at(&job, &p, now, DebugFlags::NONE), NICE_OFFSET);
    }

    #[test]
    fn test_apply_to_job_adds_offset() {
        let now = Utc::now();
        let p = params(5, 100, 2);

        let mut job = sample_job(now, 20, Some(10));
        apply_to_job_at(&mut job, &p, now, DebugFlags::NONE);
        assert_eq!(job.site_factor, 4 + u64::from(NICE_OFFSET));

        // Applies regardless of state.
        let mut running = sample_job(now, 20, Some(10));
        running.state = JobState::Running;
        apply_to_job_at(&mut running, &p, now, DebugFlags::NONE);
        assert_eq!(running.site_factor, 4 + u64::from(NICE_OFFSET));
    }

    #[test]
    fn test_apply_at_max_does_not_wrap() {
        let now = Utc::now();
        let mut job = sample_job(now, 1_000, Some(1));
        let p = params(1, NICE_OFFSET, 1);
        apply_to_job_at(&mut job, &p, now, DebugFlags::NONE);
        assert_eq!(job.site_factor, 1_000 + u64::from(NICE_OFFSET));

        let mut job = sample_job(now, 60 * 24 * 365 * 10, Some(1));
        let p = params(1, NICE_OFFSET, NICE_OFFSET);
        apply_to_job_at(&mut job, &p, now, DebugFlags::NONE);
        assert_eq!(job.site_factor, 2 * u64::from(NICE_OFFSET));
    }

    #[test]
    fn test_recompute_all_only_pending() {
        let now = Utc::now();
        let p = params(5, 100, 2);

        let mut jobs = vec![
            sample_job(now, 20, Some(10)),
            sample_job(now, 20, Some(10)),
            sample_job(now, 40, Some(10)),
        ];
        jobs[1].state = JobState::Running;
        jobs[1].site_factor = 12345;

        let updated = recompute_all_at(jobs.iter_mut(), &p, now, DebugFlags::NONE);
        assert_eq!(updated, 2);
        assert_eq!(jobs[0].site_factor, 4 + u64::from(NICE_OFFSET));
        assert_eq!(jobs[1].site_factor, 12345);
        assert_eq!(jobs[2].site_factor, 8 + u64::from(NICE_OFFSET));
    }

    #[test]
    fn test_recompute_all_empty() {
        let mut jobs: Vec<JobRecord> = Vec::new();
        assert_eq!(recompute_all(jobs.iter_mut(), &XFactorParams::default(), DebugFlags::NONE), 0);
    }

    #[test]
    fn test_recompute_all_keeps_going_past_unscored_jobs() {
        let now = Utc::now();
        let p = params(1, 100, 1);
        let mut jobs = vec![sample_job(now, 5, Some(1)), sample_job(now, 5, Some(1))];
        jobs[0].accrue_time = None;

        assert_eq!(recompute_all_at(&mut jobs, &p, now, DebugFlags::NONE), 2);
        assert_eq!(jobs[0].site_factor, u64::from(NICE_OFFSET));
        assert_eq!(jobs[1].site_factor, 5 + u64::from(NICE_OFFSET));
    }

    #[test]
    fn test_recompute_all_through_trait_objects() {
        let now = Utc::now();
        let p = params(5, 100, 2);
        let mut a = sample_job(now, 20, Some(10));
        let mut b = sample_job(now, 20, Some(10));
        b.state = JobState::Completed;

        let mut views: Vec<&mut dyn JobView> = vec![&mut a, &mut b];
        let updated = recompute_all_at(views.iter_mut().map(|v| &mut **v), &p, now, DebugFlags::NONE);
        drop(views);
        assert_eq!(updated, 1);
        assert_eq!(a.site_factor, 4 + u64::from(NICE_OFFSET));
        assert_eq!(b.site_factor, 0);
    }
}
