pub mod data;
pub mod destination;
pub mod diff;
pub mod fingerprint;
pub mod raw_data;
pub mod relations;
pub mod schema;
pub mod source;
pub mod state;
pub mod sync;
pub mod upsert;

pub use data::{AssignmentData, CourseData, SubmissionStatus};
pub use destination::{DestinationApi, Document};
pub use fingerprint::{Fingerprint, SyncCache};
pub use schema::CourseLinkStyle;
pub use source::{SourceApi, SyncPayload};
pub use state::{FileStateStore, StateStore};
pub use sync::{SyncEngine, SyncOptions, SyncOutcome, SyncSummary};
