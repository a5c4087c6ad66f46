//! # Kind Registry
//!
//! The kinds the controller runs, each with its controller entry point and a
//! way to count existing objects for the startup summary.

use crate::crd::{Alias, Domain, DomainAdmin, Mailbox, MailcowConnection};
use crate::runtime::watch_loop::{
    count_objects, run_connection_controller, run_kind_controller, WatchContext,
};
use futures::future::BoxFuture;
use kube::Client;

/// Runs one kind's controller until shutdown
pub type RunFn = fn(WatchContext) -> BoxFuture<'static, ()>;

/// Counts existing objects of one kind, optionally within a namespace
pub type CountFn = fn(Client, Option<String>) -> BoxFuture<'static, Result<usize, kube::Error>>;

/// A kind and its entry points
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    pub kind: &'static str,
    pub run: RunFn,
    pub count: CountFn,
}

#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: Vec<KindSpec>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every kind this controller manages
    pub fn standard() -> Self {
        Self::new()
            .register(KindSpec {
                kind: "MailcowConnection",
                run: run_connection_controller,
                count: count_objects::<MailcowConnection>,
            })
            .register(KindSpec {
                kind: "Domain",
                run: run_kind_controller::<Domain>,
                count: count_objects::<Domain>,
            })
            .register(KindSpec {
                kind: "DomainAdmin",
                run: run_kind_controller::<DomainAdmin>,
                count: count_objects::<DomainAdmin>,
            })
            .register(KindSpec {
                kind: "Mailbox",
                run: run_kind_controller::<Mailbox>,
                count: count_objects::<Mailbox>,
            })
            .register(KindSpec {
                kind: "Alias",
                run: run_kind_controller::<Alias>,
                count: count_objects::<Alias>,
            })
    }

    #[must_use]
    pub fn register(mut self, spec: KindSpec) -> Self {
        self.kinds.push(spec);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &KindSpec> {
        self.kinds.iter()
    }

    pub fn kind_names(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|spec| spec.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
