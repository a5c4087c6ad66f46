//! # Kinds
//!
//! [`MailcowResource`](super::protocol::MailcowResource) implementations, one
//! module per custom resource. `connection` has its own, simpler pass.

pub mod alias;
pub mod connection;
pub mod domain;
pub mod domain_admin;
pub mod mailbox;

pub use connection::reconcile_connection;
