//! The AdScope extraction pipeline.
//!
//! Turns a video reference (local binary or URL) into a frozen
//! [`ExtractionManifest`](adscope_models::ExtractionManifest):
//! - The [`classifier`] routes the reference to an ordered strategy chain
//!   per asset kind.
//! - Each strategy in [`strategies`] tries to produce candidates; every
//!   candidate passes the [`validator`] gate before it can count as
//!   extracted.
//! - The [`pipeline`] runs one task per asset kind concurrently, joins
//!   them, classifies the tier, and assembles limitations.
//!
//! Nothing escapes a kind task as an error; failures become fallback
//! attempts or limitation entries. The only hard stops are an invalid
//! reference and caller cancellation.

pub mod classifier;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod strategies;
pub mod validator;

pub use classifier::{classify, ExtractionPlan, SourceRef, Strategy};
pub use config::{ExtractorConfig, TransformServiceConfig};
pub use error::{ExtractError, ExtractResult};
pub use pipeline::ExtractionPipeline;
pub use validator::AssetValidator;
