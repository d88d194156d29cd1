//! Luna node repository
//!
//! The node reconciler never talks to the provisioning backend directly. It goes
//! through [`NodeRepository`], which owns node records, their interfaces and the
//! IP addresses assigned to them.
//!
//! # Example
//!
//! ```no_run
//! use luna_client::{InMemoryNodeRepository, NewNode, NodeRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = InMemoryNodeRepository::new();
//! repo.add_group("compute", ["eth0", "BOOTIF"]);
//!
//! let node = repo.create(NewNode::new("node001", "compute")).await?;
//! repo.set_ip(&node, "eth0", "10.141.0.1".parse()?).await?;
//! println!("{}", repo.snapshot(&node).await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Typed field access**: scalar fields are addressed by [`NodeField`], relational
//!   fields by [`Relation`], IP slots by [`IpFamily`]
//! - **In-memory inventory**: [`InMemoryNodeRepository`] mirrors luna's node semantics
//! - **State file**: [`StateFile`] persists the inventory as JSON between runs
//! - **Test support**: failure injection behind the `test-util` feature

pub mod error;
pub mod memory;
pub mod models;
#[path = "trait.rs"]
pub mod repository_trait;
pub mod state_file;

pub use error::RepositoryError;
pub use memory::{InMemoryNodeRepository, Mutation, Operation};
pub use models::*;
pub use repository_trait::NodeRepository;
pub use state_file::StateFile;
