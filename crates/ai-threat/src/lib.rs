//! Threat registry and purpose-selected fear evaluation.
//!
//! A threat kind registers up to three fear functions, one per [`FearPurpose`]. Asking the
//! registry for a purpose the kind doesn't cover yields `None` ("not a concern"), which is
//! distinct from a zero range.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod error;
pub mod purpose;
pub mod registry;

pub use error::ThreatError;
pub use purpose::{FearPurpose, FearQuery};
pub use registry::{FearFn, ThreatDescriptor, ThreatRegistry};
