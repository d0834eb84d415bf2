pub mod live_scan;
pub mod match_candidate;
pub mod match_config;
pub mod match_policy;
pub mod match_set;
pub mod summary;
