pub mod manager;
pub mod report;
pub mod sources;

pub use manager::{FetchPath, FetchResult, SourceManager};
pub use report::{gather, Report, ReportBuilder};
pub use sources::{Source, SourceKind, SourceMetadata};

pub mod prelude {
    pub use super::sources::Source;
    pub use super::{Report, ReportBuilder, SourceManager};
    pub use nc_core::{Article, Error, Result};
}
