pub mod formatter;

pub use formatter::{
    format_factor_table, format_job_detail, format_json, format_pending, should_use_colors,
    ScoredJob,
};
