pub mod engine;
pub mod error;
pub mod params;
pub mod validation;

pub use engine::{
    apply_to_job, apply_to_job_at, compute_factor, compute_factor_at, effective_time_limit,
    recompute_all, recompute_all_at,
};
pub use error::ParamError;
pub use params::{XFactorParams, MAX_MIN_TIME, NICE_OFFSET};
pub use validation::validate_params;
