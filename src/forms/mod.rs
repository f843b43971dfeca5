//! Form subsystem for divforms
//!
//! The submission pipeline:
//!
//! ```text
//! request -> AccessGate -> FormVersionManager (active definition)
//!         -> SubmissionValidator (cache / sanitize / compile / validate)
//!         -> Submission stamped with the validated version
//! ```
//!
//! Also hosts publishing and the division/screen/grant catalog.

mod catalog;
mod errors;
mod service;
mod submission;
mod versions;

pub use catalog::{
    Catalog, DivisionRef, DivisionRemoval, GrantOp, GrantView, ScreenRef, ScreenRemoval,
};
pub use errors::{FormError, FormResult};
pub use service::{FormService, SubmissionReceipt};
pub use submission::{SubmissionValidator, Validated};
pub use versions::{FormVersionManager, DEFAULT_PUBLISH_ATTEMPTS};
