//! Auth-domain identifiers, scope lists, and secret wrappers.

pub mod id;
pub mod scope;
pub mod secret;

pub use id::*;
pub use scope::*;
pub use secret::*;
