use std::collections::BTreeSet;

/// Which media count as selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Every asset in the library, now and in the future.
    ///
    /// `last_known` is the id set persisted alongside the flag. It does not
    /// decide selection while this policy is active.
    AllMedia { last_known: BTreeSet<String> },
    /// Only the listed ids.
    Explicit(BTreeSet<String>),
}

impl SelectionPolicy {
    pub fn is_sync_all(&self) -> bool {
        matches!(self, SelectionPolicy::AllMedia { .. })
    }

    /// The persisted id set behind this policy.
    pub fn stored_ids(&self) -> &BTreeSet<String> {
        match self {
            SelectionPolicy::AllMedia { last_known } => last_known,
            SelectionPolicy::Explicit(ids) => ids,
        }
    }
}
