use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Like toggles by resulting action (like/unlike).
    pub static ref POST_LIKES_TOGGLED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_likes_toggled_total",
        "Like toggles segmented by resulting action",
        &["action"]
    )
    .expect("failed to register post_likes_toggled_total");

    /// Comment mutations by action (added/deleted).
    pub static ref POST_COMMENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_comments_total",
        "Comment mutations segmented by action",
        &["action"]
    )
    .expect("failed to register post_comments_total");
}
