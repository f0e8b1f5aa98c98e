//! xfactor site factor for batch schedulers.
//!
//! Boosts pending jobs in proportion to how long they have been accruing
//! priority relative to their time limit, bounded and weighted by three
//! site-tunable parameters.

pub mod config;
pub mod debug_flags;
pub mod job;
pub mod logging;
pub mod output;
pub mod plugin;
pub mod scoring;

pub use debug_flags::DebugFlags;
pub use job::{JobRecord, JobSnapshot, JobState, JobView, TimeLimit};
pub use plugin::{SiteFactorHost, SiteFactorPlugin, XFactor, PLUGIN_NAME, PLUGIN_TYPE};
pub use scoring::{ParamError, XFactorParams, NICE_OFFSET};
