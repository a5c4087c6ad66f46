//! # Custom Resource Definitions
//!
//! CRD types for the mailcow controller.
//!
//! ## Module Structure
//!
//! - `connection.rs` - MailcowConnection (endpoint and API key)
//! - `domain.rs` - Domain and its rate-limit frame
//! - `domain_admin.rs` - DomainAdmin
//! - `mailbox.rs` - Mailbox
//! - `alias.rs` - Alias
//! - `refs.rs` - Secret key references
//! - `status.rs` - Status types shared by all kinds

mod alias;
mod connection;
mod domain;
mod domain_admin;
mod mailbox;
mod refs;
mod status;

// Re-export all public types
pub use alias::{Alias, AliasSpec};
pub use connection::{MailcowConnection, MailcowConnectionSpec};
pub use domain::{Domain, DomainSpec, RateLimitFrame};
pub use domain_admin::{DomainAdmin, DomainAdminSpec};
pub use mailbox::{Mailbox, MailboxSpec};
pub use refs::SecretKeyRef;
pub use status::{Condition, ResourceStatus};

/// Default value for boolean fields that are enabled unless stated otherwise
pub fn default_true() -> bool {
    true
}

/// Default value for boolean fields that are disabled unless stated otherwise
pub fn default_false() -> bool {
    false
}
