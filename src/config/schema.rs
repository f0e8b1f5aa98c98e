use serde::{Deserialize, Serialize};

use crate::scoring::NICE_OFFSET;

fn default_nice_offset() -> u32 {
    NICE_OFFSET
}

/// Scheduler-side settings the site factor plugin reads.
///
/// Example YAML:
/// ```yaml
/// priority_site_factor_parameters: "xfactor_min_time=5,xfactor_max=100,xfactor_weight=2"
/// nice_offset: 2147483648
/// debug_flags: [priority]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Raw parameter line handed to the plugin on init and reconfigure
    #[serde(default)]
    pub priority_site_factor_parameters: Option<String>,

    #[serde(default = "default_nice_offset")]
    pub nice_offset: u32,

    /// Debug flag names, e.g. "priority"
    #[serde(default)]
    pub debug_flags: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            priority_site_factor_parameters: None,
            nice_offset: NICE_OFFSET,
            debug_flags: Vec::new(),
        }
    }
}
