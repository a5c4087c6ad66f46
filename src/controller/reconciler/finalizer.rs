//! # Finalizer
//!
//! Membership of the controller's finalizer in `metadata.finalizers`.

use crate::constants::FINALIZER;
use kube::Resource;

pub fn has_finalizer<K: Resource>(object: &K) -> bool {
    object
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == FINALIZER))
}

/// Add the finalizer; returns false if it was already present
pub fn add_finalizer<K: Resource>(object: &mut K) -> bool {
    if has_finalizer(object) {
        return false;
    }
    object
        .meta_mut()
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(FINALIZER.to_string());
    true
}

/// Remove the finalizer and keep any others in place
pub fn remove_finalizer<K: Resource>(object: &mut K) -> bool {
    let Some(finalizers) = object.meta_mut().finalizers.as_mut() else {
        return false;
    };
    let before = finalizers.len();
    finalizers.retain(|f| f != FINALIZER);
    before != finalizers.len()
}
