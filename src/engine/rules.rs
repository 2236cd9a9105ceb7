use serde::{Deserialize, Serialize};

use crate::auth::credential::now_unix;
use crate::auth::random_token;
use crate::error::{AppError, AppResult};
use crate::storage::{KeyValueStore, RULES_KEY};

const RULE_ID_BYTES: usize = 9;

/// One stored matching rule. Predicates are gated by their enable
/// flags; a rule with both flags disabled matches every item, which is
/// deliberate and covered by tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub sender: String,
    pub sender_match: bool,
    pub subject: String,
    pub subject_match: bool,
    pub label_id: String,
    pub label_name: String,
    pub created_at_unix: u64,
}

/// Fields a caller supplies when creating a rule; id and timestamp are
/// minted here.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub sender: String,
    pub sender_match: bool,
    pub subject: String,
    pub subject_match: bool,
    pub label_id: String,
    pub label_name: String,
}

/// Supplier of the ordered active rule set. Batches snapshot the list
/// once at start, so a mid-batch edit never changes that batch.
pub trait RuleStore {
    fn list_rules(&self) -> AppResult<Vec<Rule>>;
}

/// Rule set persisted whole-value under one key in the key-value
/// collaborator, in creation order.
#[derive(Debug, Clone)]
pub struct StoredRules<S> {
    kv: S,
}

impl<S: KeyValueStore> StoredRules<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn add_rule(&self, new_rule: NewRule) -> AppResult<Rule> {
        let rule = Rule {
            id: random_token(RULE_ID_BYTES),
            sender: new_rule.sender,
            sender_match: new_rule.sender_match,
            subject: new_rule.subject,
            subject_match: new_rule.subject_match,
            label_id: new_rule.label_id,
            label_name: new_rule.label_name,
            created_at_unix: now_unix(),
        };

        let mut rules = self.list_rules()?;
        rules.push(rule.clone());
        self.save(&rules)?;
        Ok(rule)
    }

    pub fn remove_rule(&self, rule_id: &str) -> AppResult<()> {
        let mut rules = self.list_rules()?;
        let before = rules.len();
        rules.retain(|rule| rule.id != rule_id);

        if rules.len() == before {
            return Err(AppError::InvalidInput(format!(
                "no rule with id `{rule_id}`; run `mailsort rule ls` to inspect rules"
            )));
        }

        self.save(&rules)
    }

    fn save(&self, rules: &[Rule]) -> AppResult<()> {
        let raw = serde_json::to_string_pretty(rules)?;
        self.kv.write(RULES_KEY, &raw)
    }
}

impl<S: KeyValueStore> RuleStore for StoredRules<S> {
    fn list_rules(&self) -> AppResult<Vec<Rule>> {
        let Some(raw) = self.kv.read(RULES_KEY)? else {
            return Ok(Vec::new());
        };

        let rules = serde_json::from_str(&raw)?;
        Ok(rules)
    }
}
