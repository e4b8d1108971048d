//! Untracked resource detection

use crate::resource::{Resource, ResourceId};
use std::collections::HashSet;

/// Kinds that are never reported, matched case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPolicy {
    kinds: HashSet<String>,
}

impl ExclusionPolicy {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            kinds: kinds
                .into_iter()
                .map(|kind| kind.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn excludes(&self, kind: &str) -> bool {
        !self.kinds.is_empty() && self.kinds.contains(&kind.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Resources in `observed` that nothing in `declared` accounts for
///
/// Identity is exact; only the kind exclusion ignores case. Duplicates in
/// `observed` are judged one by one, and the result keeps `observed` order.
pub fn untracked<'a>(
    declared: &[Resource],
    observed: &'a [Resource],
    exclude: &ExclusionPolicy,
) -> Vec<&'a Resource> {
    let declared: HashSet<ResourceId> = declared.iter().map(Resource::id).collect();

    observed
        .iter()
        .filter(|resource| !exclude.excludes(&resource.kind))
        .filter(|resource| !declared.contains(&resource.id()))
        .collect()
}
