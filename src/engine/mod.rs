pub mod coordinator;
pub mod matcher;
pub mod rules;

pub use coordinator::{Coordinator, OperationOutcome, OutcomeStatus};
pub use rules::{NewRule, Rule, RuleStore, StoredRules};
