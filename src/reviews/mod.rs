//! Review aggregation, submission intake and the card view model.

pub mod aggregation;
pub mod intake;
pub mod view;

pub use aggregation::{RatingBreakdown, ReviewSummary};
pub use intake::{IntakeError, ReviewDraft};
pub use view::{ResolvedSettings, ReviewCard};
