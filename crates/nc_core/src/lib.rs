pub mod annotate;
pub mod config;
pub mod dates;
pub mod error;
pub mod milestones;
pub mod normalize;
pub mod relevance;
pub mod timeline;
pub mod types;

pub use annotate::{EntityAnnotator, HeuristicAnnotator};
pub use config::{Config, RetryPolicy};
pub use dates::UNKNOWN_DATE;
pub use error::{Error, Result};
pub use types::{Article, Entity, MilestoneCandidate, TimelineBucket, TimelineEvent};

pub mod prelude {
    pub use super::types::{Article, Entity, MilestoneCandidate, TimelineBucket, TimelineEvent};
    pub use super::{Config, Error, Result};
}
