//! # Request Types
//!
//! Payloads sent to the mailcow API.
//!
//! Edits are wrapped in `{attr, items: [id]}`; deletes send a bare `[id]`.
//! Quotas are MiB and sent as floats, matching what the API documents.

use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// `{attr, items}` envelope of every edit call
#[derive(Debug, Clone, Serialize)]
pub struct EditRequest<A> {
    pub attr: A,
    pub items: Vec<String>,
}

impl<A> EditRequest<A> {
    /// Edit a single object identified by `id`
    pub fn single(id: impl Into<String>, attr: A) -> Self {
        Self {
            attr,
            items: vec![id.into()],
        }
    }
}

/// `POST /add/domain`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddDomainRequest {
    pub domain: String,
    pub description: String,
    pub quota: f32,
    pub maxquota: f32,
    pub defquota: f32,
    pub mailboxes: f32,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rl_value: Option<i64>,
    pub rl_frame: String,
}

/// `attr` of `POST /edit/domain`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditDomainAttr {
    pub description: String,
    pub quota: f32,
    pub maxquota: f32,
    pub defquota: f32,
    pub mailboxes: f32,
    pub active: bool,
}

/// `attr` of `POST /edit/rl-domain`
///
/// An absent `rl_value` clears the limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRateLimitAttr {
    pub rl_value: Option<i64>,
    pub rl_frame: String,
}

/// `POST /add/dkim`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddDkimRequest {
    pub domains: String,
    pub key_size: f32,
    pub dkim_selector: String,
}

/// `POST /add/domain-admin`
///
/// `active` is an integer on this endpoint only.
#[derive(Clone, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct AddDomainAdminRequest {
    pub username: String,
    pub password: String,
    pub password2: String,
    #[zeroize(skip)]
    pub active: i32,
    pub domains: Vec<String>,
}

impl std::fmt::Debug for AddDomainAdminRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddDomainAdminRequest")
            .field("username", &self.username)
            .field("active", &self.active)
            .field("domains", &self.domains)
            .finish_non_exhaustive()
    }
}

/// `attr` of `POST /edit/domain-admin`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditDomainAdminAttr {
    pub active: bool,
    pub domains: Vec<String>,
}

/// `POST /add/mailbox`
#[derive(Clone, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct AddMailboxRequest {
    pub domain: String,
    pub local_part: String,
    pub name: String,
    pub password: String,
    pub password2: String,
    #[zeroize(skip)]
    pub active: bool,
    #[zeroize(skip)]
    pub force_pw_update: bool,
    #[zeroize(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<f32>,
}

impl std::fmt::Debug for AddMailboxRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddMailboxRequest")
            .field("domain", &self.domain)
            .field("local_part", &self.local_part)
            .field("active", &self.active)
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

/// `attr` of `POST /edit/mailbox`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditMailboxAttr {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<f32>,
}

/// `POST /add/alias`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddAliasRequest {
    pub address: String,
    pub goto: String,
    pub active: bool,
}

/// `attr` of `POST /edit/alias`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditAliasAttr {
    pub goto: String,
    pub active: bool,
}
