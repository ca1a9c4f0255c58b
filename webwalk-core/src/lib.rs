pub mod config;
pub mod error;
pub mod mirror;
pub mod normalize;
pub mod policy;
pub mod registry;
pub mod report;
pub mod walk;

pub use config::{RenderOptions, WalkConfig, WalkConfigBuilder};
pub use error::{ConfigError, MirrorError, PatternKind};
pub use mirror::{Mirror, MirrorMode, MirrorWrite};
pub use normalize::{NodeKind, Normalized};
pub use policy::{Admission, Policy, SkipReason};
pub use registry::{Disposition, FetchStatus, Node, NodeId, VisitedRegistry};
pub use report::{ReportEvent, ReportSink, Reporter};
pub use walk::{WalkReport, WalkSummary, Walker};
