// Application layer: the ledger store every front-end talks to.

pub mod error;
pub mod reporting;
pub mod store;

pub use error::*;
pub use reporting::*;
pub use store::*;
