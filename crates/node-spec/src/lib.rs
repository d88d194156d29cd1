//! Luna node desired state
//!
//! Types describing what a node should look like, and the request document the
//! `luna-node` binary reads them from.

pub mod desired;
pub mod request;

pub use desired::*;
pub use request::*;
