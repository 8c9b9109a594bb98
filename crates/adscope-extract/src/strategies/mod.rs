//! Extraction strategies.
//!
//! Each module implements one strategy from the classifier's chains. A
//! strategy either returns validated assets or an [`ExtractError`] the
//! pipeline absorbs into a fallback attempt or limitation; nothing here
//! writes to the manifest directly.
//!
//! [`ExtractError`]: crate::error::ExtractError

pub mod local;
pub mod oembed;
pub mod thumb_probe;
pub mod transform;
