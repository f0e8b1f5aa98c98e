use thiserror::Error;

/// Why a parameter line did not fully apply.
///
/// None of these are fatal: the affected fields keep their previous values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("PrioritySiteFactorParameters not set")]
    NotSet,
    #[error("{0} not configured")]
    MissingKey(&'static str),
    #[error("invalid {key} value: {value}")]
    OutOfRange { key: &'static str, value: i64 },
}

impl ParamError {
    /// Parameter key the error refers to, if any
    pub fn key(&self) -> Option<&'static str> {
        match self {
            ParamError::NotSet => None,
            ParamError::MissingKey(k) | ParamError::OutOfRange { key: k, .. } => Some(k),
        }
    }
}
