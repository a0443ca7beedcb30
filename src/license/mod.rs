//! Rule-based license analysis.
//!
//! - [`vocabulary`]: line weighting by license vocabulary and legal register.
//! - [`extractor`]: locates the most probable license block in a text.
//! - [`spdx`]: identifies the named license in a block and its risk level.
//! - [`topics`]: obligation topics with affirming and denying license language.
//! - [`verifier`]: adjudicates obligation clauses against a license text.

pub mod extractor;
pub mod spdx;
pub mod topics;
pub mod verifier;
pub mod vocabulary;
