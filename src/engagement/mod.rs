//! Like tracking for the local visitor.

mod local_marks;
mod retry_policy;
mod tracker;
mod visitor;

pub use local_marks::{JsonFileLocalStorage, LocalLikeMarks, LocalStorage, MemoryLocalStorage};
pub use retry_policy::RetryPolicy;
pub use tracker::{LikeError, LikeOutcome, LikeState, LikeTracker};
pub use visitor::AnonymousVisitorId;
