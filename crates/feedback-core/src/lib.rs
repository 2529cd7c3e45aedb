//! Account and feedback rules: credential registration and verification,
//! ownership checks, and form validation. Everything here is synchronous;
//! callers on an async runtime should run it on a blocking thread.

pub mod credentials;
pub mod error;
pub mod feedback;
pub mod gate;
pub mod hasher;
pub mod validate;

pub use credentials::CredentialStore;
pub use error::{Error, Result};
pub use feedback::{FeedbackService, Profile};
pub use gate::{Session, require_self};
pub use hasher::{Argon2Hasher, CredentialHasher};
pub use validate::{Validate, ValidationErrors};
