use std::ops::RangeInclusive;

use tracing::{debug, error};

use super::error::ParamError;
use crate::plugin::PLUGIN_TYPE;

/// Scheduler's neutral priority-adjustment offset.
pub const NICE_OFFSET: u32 = 0x8000_0000;

/// Upper bound for `xfactor_min_time` (90 days, in minutes).
pub const MAX_MIN_TIME: u32 = 129_600;

pub const KEY_MIN_TIME: &str = "xfactor_min_time";
pub const KEY_MAX: &str = "xfactor_max";
pub const KEY_WEIGHT: &str = "xfactor_weight";

/// Tunable xfactor parameters.
///
/// Parsed from a single flat line such as
/// `xfactor_min_time=5,xfactor_max=100,xfactor_weight=2`.
/// Keys are matched case-insensitively anywhere in the line.
/// Fields change only through `reload`/`parse_report`, which keep each one
/// inside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XFactorParams {
    min_time: u32,
    max: u32,
    weight: u32,
    nice_offset: u32,
}

impl Default for XFactorParams {
    fn default() -> Self {
        Self::new(NICE_OFFSET)
    }
}

impl XFactorParams {
    /// Defaults for a host whose neutral offset is `nice_offset`.
    pub fn new(nice_offset: u32) -> Self {
        debug_assert!(nice_offset > 0, "nice_offset must be at least 1");
        Self {
            min_time: 1,
            max: nice_offset,
            weight: 1,
            nice_offset,
        }
    }

    /// Values already checked against their domains.
    pub(super) fn from_parts(min_time: u32, max: u32, weight: u32, nice_offset: u32) -> Self {
        Self {
            min_time,
            max,
            weight,
            nice_offset,
        }
    }

    /// Floor for the effective time limit, in minutes
    pub fn min_time(&self) -> u32 {
        self.min_time
    }

    /// Ceiling for the weighted factor
    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn nice_offset(&self) -> u32 {
        self.nice_offset
    }

    /// Apply a raw parameter line, stopping at the first problem.
    ///
    /// Keys are processed in the order min_time, max, weight. Fields updated
    /// before the failing key keep their new values; the failing field and
    /// every field after it keep their previous values.
    pub fn parse_report(&mut self, raw: Option<&str>) -> Result<(), ParamError> {
        let raw = raw.filter(|r| !r.is_empty()).ok_or(ParamError::NotSet)?;

        self.min_time = read_key(raw, KEY_MIN_TIME, 1..=MAX_MIN_TIME)?;
        self.max = read_key(raw, KEY_MAX, 1..=self.nice_offset)?;
        self.weight = read_key(raw, KEY_WEIGHT, 1..=self.nice_offset)?;

        Ok(())
    }

    /// Re-populate from a raw parameter line, logging any problem.
    ///
    /// Never fails; always reports the values in effect afterwards.
    pub fn reload(&mut self, raw: Option<&str>) {
        if let Err(e) = self.parse_report(raw) {
            error!(plugin = PLUGIN_TYPE, "{}", e);
        }

        debug!(
            plugin = PLUGIN_TYPE,
            "xfactor_min_time={}, xfactor_max={}, xfactor_weight={}",
            self.min_time,
            self.max,
            self.weight
        );
    }
}

/// Look up `key=` and check the value against `range`.
pub(crate) fn read_key(
    raw: &str,
    key: &'static str,
    range: RangeInclusive<u32>,
) -> Result<u32, ParamError> {
    let value = find_value(raw, key).ok_or(ParamError::MissingKey(key))?;
    let parsed = leading_int(value);

    u32::try_from(parsed)
        .ok()
        .filter(|v| range.contains(v))
        .ok_or(ParamError::OutOfRange { key, value: parsed })
}

/// Text right after the first case-insensitive occurrence of `key=`.
fn find_value<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("{}=", key);
    // ASCII lowercasing keeps byte offsets aligned with `raw`.
    let idx = raw.to_ascii_lowercase().find(&needle)?;
    Some(&raw[idx + needle.len()..])
}

/// Leading decimal integer, C `atoi` style: leading whitespace and one sign
/// are accepted, parsing stops at the first non-digit, no digits reads as 0.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });

    if negative {
        -value
    } else {
        value
    }
}
