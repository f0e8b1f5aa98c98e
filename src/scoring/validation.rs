use super::params::{read_key, XFactorParams, KEY_MAX, KEY_MIN_TIME, KEY_WEIGHT, MAX_MIN_TIME};

/// Validate a site factor parameter line without applying it.
///
/// Unlike a reload, every key is checked so all errors are reported at once
/// (not just the first). On success returns the parameters a reload from
/// defaults would produce.
pub fn validate_params(raw: Option<&str>, nice_offset: u32) -> Result<XFactorParams, Vec<String>> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Err(vec![
            "PrioritySiteFactorParameters: not set (expected xfactor_min_time=, xfactor_max=, xfactor_weight=)"
                .to_string(),
        ]);
    };

    let mut errors = Vec::new();
    let mut check = |key: &'static str, hi: u32| match read_key(raw, key, 1..=hi) {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(format!("{}: {} (expected 1-{})", key, e, hi));
            None
        }
    };

    let min_time = check(KEY_MIN_TIME, MAX_MIN_TIME);
    let max = check(KEY_MAX, nice_offset);
    let weight = check(KEY_WEIGHT, nice_offset);

    match (min_time, max, weight) {
        (Some(min_time), Some(max), Some(weight)) => {
            Ok(XFactorParams::from_parts(min_time, max, weight, nice_offset))
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::params::NICE_OFFSET;

    #[test]
    fn test_valid_line() {
        let params = validate_params(
            Some("xfactor_min_time=5,xfactor_max=100,xfactor_weight=2"),
            NICE_OFFSET,
        )
        .unwrap();
        assert_eq!(params.min_time(), 5);
        assert_eq!(params.max(), 100);
        assert_eq!(params.weight(), 2);
    }

    #[test]
    fn test_not_set() {
        let errors = validate_params(None, NICE_OFFSET).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not set"));

        assert!(validate_params(Some(""), NICE_OFFSET).is_err());
    }

    #[test]
    fn test_missing_key() {
        let errors = validate_params(Some("xfactor_min_time=10"), NICE_OFFSET).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("xfactor_max not configured"));
        assert!(errors[1].contains("xfactor_weight not configured"));
    }

    #[test]
    fn test_collects_all_errors() {
        let errors = validate_params(
            Some("xfactor_min_time=0,xfactor_max=200,xfactor_weight=-1"),
            100,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("xfactor_min_time"));
        assert!(errors[1].contains("invalid xfactor_max value: 200"));
        assert!(errors[2].contains("expected 1-100"));
    }
}
