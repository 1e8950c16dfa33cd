//! # ud-federation
//!
//! Federates the two leaf backends into one logical user namespace.
//!
//! [`CombinedUserDirectory`] resolves lookups against the writable store
//! first and the read-only directory second, routes every mutation to the
//! writable store, and delegates credential checks to whichever backend owns
//! the effective identity. A writable record "shadows" a read-only record of
//! the same name until it is deleted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod combined;
pub mod error;

pub use combined::CombinedUserDirectory;
pub use error::{FederationError, FederationResult};
