use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Upload attempts by outcome (accepted, rejected, upstream_error, upstream_timeout).
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "media_uploads_total",
        "Media uploads segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register media_uploads_total");
}
