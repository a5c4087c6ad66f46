//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions of every mailcow kind as a
//! multi-document YAML stream.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/mailcow.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use kube::core::CustomResourceExt;
use mailcow_controller::crd::{Alias, Domain, DomainAdmin, Mailbox, MailcowConnection};

fn main() -> Result<()> {
    let crds = [
        MailcowConnection::crd(),
        Domain::crd(),
        DomainAdmin::crd(),
        Mailbox::crd(),
        Alias::crd(),
    ];

    let mut documents = Vec::with_capacity(crds.len());
    for crd in &crds {
        let name = crd.metadata.name.as_deref().unwrap_or("unknown");
        documents.push(
            serde_yaml::to_string(crd).with_context(|| format!("Failed to serialize CRD {name}"))?,
        );
    }

    print!("{}", documents.join("---\n"));
    Ok(())
}
