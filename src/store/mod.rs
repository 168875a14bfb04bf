// Store: the persistent-store collaborator rendered in memory.
// Arena state, single-writer transactions, declared delete rules, deep
// duplication and JSON snapshot persistence.

pub mod delete_rules;
mod duplicate;
pub mod serialization;
mod state;
mod transaction;

pub use delete_rules::{DeleteRule, EntityKind, RULES, rule_for};
pub use state::StoreState;
pub use transaction::{Snapshot, Store, StoreError, Transaction};

pub(crate) use duplicate::duplicate_pattern;
