//! Table-set diffing between primary and replica.

use serde::Serialize;
use std::collections::BTreeSet;

/// Tables present on only one side of the replication pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSetDiff {
    pub only_in_primary: BTreeSet<String>,
    pub only_in_replica: BTreeSet<String>,
}

impl TableSetDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_primary.is_empty() && self.only_in_replica.is_empty()
    }
}

/// Symmetric difference of the two table sets.
pub fn diff_tables(primary: &BTreeSet<String>, replica: &BTreeSet<String>) -> TableSetDiff {
    TableSetDiff {
        only_in_primary: primary.difference(replica).cloned().collect(),
        only_in_replica: replica.difference(primary).cloned().collect(),
    }
}

/// Tables present on both sides, in name order. These are still compared
/// even when the diff is non-empty, to maximize diagnostic value.
pub fn common_tables(primary: &BTreeSet<String>, replica: &BTreeSet<String>) -> Vec<String> {
    primary.intersection(replica).cloned().collect()
}
