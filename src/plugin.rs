use chrono::{DateTime, Utc};
use tracing::debug;

use crate::debug_flags::DebugFlags;
use crate::job::JobView;
use crate::scoring::{self, XFactorParams, NICE_OFFSET};

pub const PLUGIN_NAME: &str = "xfactor site_factor plugin";
pub const PLUGIN_TYPE: &str = "site_factor/xfactor";

/// What a site factor plugin needs from the scheduler hosting it.
pub trait SiteFactorHost {
    /// Raw `PrioritySiteFactorParameters` line, None when not configured
    fn site_factor_params(&self) -> Option<String>;

    fn debug_flags(&self) -> DebugFlags;

    /// Neutral priority-adjustment offset
    fn nice_offset(&self) -> u32 {
        NICE_OFFSET
    }

    /// Wall-clock time used to measure accrual
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hooks the scheduler calls on a loaded site factor plugin.
///
/// `reconfigure` takes `&mut self` and scoring takes `&self`, so parameters
/// never change under a running pass. Hosts sharing a plugin across threads
/// wrap it in a lock.
pub trait SiteFactorPlugin {
    fn init(&mut self);

    fn fini(&mut self);

    fn reconfigure(&mut self);

    /// Score a single job, whatever its state.
    fn set<J: JobView + ?Sized>(&self, job: &mut J);

    /// Rescore every pending job. Returns how many were updated.
    fn update<'a, J, I>(&self, jobs: I) -> usize
    where
        J: JobView + ?Sized + 'a,
        I: IntoIterator<Item = &'a mut J>;
}

/// The xfactor strategy: boost pending jobs by accrued time over time limit.
#[derive(Debug)]
pub struct XFactor<H> {
    host: H,
    params: XFactorParams,
}

impl<H: SiteFactorHost> XFactor<H> {
    /// Create with default parameters. Call `init` to read the host's line.
    pub fn new(host: H) -> Self {
        let params = XFactorParams::new(host.nice_offset());
        Self { host, params }
    }

    pub fn params(&self) -> &XFactorParams {
        &self.params
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn load_params(&mut self) {
        let raw = self.host.site_factor_params();
        self.params.reload(raw.as_deref());
    }
}

impl<H: SiteFactorHost> SiteFactorPlugin for XFactor<H> {
    fn init(&mut self) {
        debug!(plugin = PLUGIN_TYPE, "{} loaded", PLUGIN_NAME);
        self.load_params();
    }

    fn fini(&mut self) {
        debug!(plugin = PLUGIN_TYPE, "unloading {}", PLUGIN_NAME);
    }

    fn reconfigure(&mut self) {
        self.load_params();
    }

    fn set<J: JobView + ?Sized>(&self, job: &mut J) {
        scoring::apply_to_job_at(job, &self.params, self.host.now(), self.host.debug_flags());
    }

    fn update<'a, J, I>(&self, jobs: I) -> usize
    where
        J: JobView + ?Sized + 'a,
        I: IntoIterator<Item = &'a mut J>,
    {
        scoring::recompute_all_at(jobs, &self.params, self.host.now(), self.host.debug_flags())
    }
}
