// Application layer: the transcript computations and their failure policy.
// Stores are reached only through the lookup traits in `storage`.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
