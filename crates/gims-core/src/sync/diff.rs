//! Label-keyed reconciliation of nested collections.
//!
//! Properties are compared field by field; methods and parameters are
//! matched on label alone, so every label present on both sides is an
//! update candidate.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::RemoteMethod;
use crate::sync::projection::{LocalMethod, ParameterRecord, PropertyRecord};

/// Labels to add, update and delete, in source iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub add: Vec<String>,
    pub update: Vec<String>,
    pub delete: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    pub fn has_deletes(&self) -> bool {
        !self.delete.is_empty()
    }
}

pub trait Labeled {
    fn label(&self) -> &str;
}

impl Labeled for PropertyRecord {
    fn label(&self) -> &str {
        &self.label
    }
}

impl Labeled for ParameterRecord {
    fn label(&self) -> &str {
        &self.label
    }
}

impl Labeled for LocalMethod {
    fn label(&self) -> &str {
        LocalMethod::label(self)
    }
}

impl Labeled for RemoteMethod {
    fn label(&self) -> &str {
        &self.label
    }
}

/// Index a collection by label. A repeated label keeps its first position
/// and its last record.
pub fn index_by_label<T: Labeled>(items: &[T]) -> (Vec<&str>, HashMap<&str, &T>) {
    let mut order = Vec::new();
    let mut by_label = HashMap::new();
    for item in items {
        if by_label.insert(item.label(), item).is_none() {
            order.push(item.label());
        }
    }
    (order, by_label)
}

/// Classify every label; `changed` decides whether a shared label is an update.
pub fn diff_by_label<L, R>(local: &[L], remote: &[R], changed: impl Fn(&L, &R) -> bool) -> ChangeSet
where
    L: Labeled,
    R: Labeled,
{
    let (local_order, local_by_label) = index_by_label(local);
    let (remote_order, remote_by_label) = index_by_label(remote);

    let mut changes = ChangeSet::default();
    for label in &local_order {
        match remote_by_label.get(label) {
            None => changes.add.push(label.to_string()),
            Some(&remote) => {
                if changed(local_by_label[label], remote) {
                    changes.update.push(label.to_string());
                }
            }
        }
    }

    let local_labels: HashSet<&str> = local_order.iter().copied().collect();
    changes.delete = remote_order
        .into_iter()
        .filter(|label| !local_labels.contains(label))
        .map(str::to_string)
        .collect();
    changes
}

/// Properties: an update only when name, default value, required flag or
/// description differ.
pub fn property_diff_strict(local: &[PropertyRecord], remote: &[PropertyRecord]) -> ChangeSet {
    diff_by_label(local, remote, |l, r| {
        l.name != r.name
            || l.default_value != r.default_value
            || l.is_required != r.is_required
            || l.description != r.description
    })
}

/// Parameters: every shared label is an update, whether or not it changed.
pub fn parameter_diff_always_update(
    local: &[ParameterRecord],
    remote: &[ParameterRecord],
) -> ChangeSet {
    diff_by_label(local, remote, |_, _| true)
}

/// Methods: every shared label is an update.
pub fn method_diff(local: &[LocalMethod], remote: &[RemoteMethod]) -> ChangeSet {
    diff_by_label(local, remote, |_, _| true)
}
