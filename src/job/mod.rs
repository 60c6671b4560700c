//! Job construction.
//!
//! ## Pipeline
//!
//! ```text
//! caller input                resolution                     job model
//! ────────────                ──────────                     ─────────
//! SourceInput ──add_source──▶ explicit format or extension ─▶ SourceItem ┐
//!                             then existence/readability                 ├─▶ ConversionJob
//! TargetInput ──set_target──▶ explicit format or extension ─▶ TargetDescriptor ┘
//!                             then writability
//! ```
//!
//! Two front-ends share the resolution rules:
//!
//! - [`JobBuilder`] encodes the protocol in its type parameter so misuse is
//!   a compile error.
//! - [`JobSpecification`] checks the same protocol at run time.
//!
//! Both consume themselves in `build`, so a built job can never be built
//! again or modified.

mod builder;
mod executable;
pub(crate) mod resolve;
mod source;
mod spec;
mod target;

pub use builder::{Empty, JobBuilder, SourceSpecified, TargetSet};
pub use executable::{ConversionJob, EndpointKind, EndpointSummary, JobSummary};
pub use source::{SourceInput, SourceItem, SourceOrigin};
pub use spec::{JobSpecification, JobState};
pub use target::{TargetDescriptor, TargetInput, TargetSink};
