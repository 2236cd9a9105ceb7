use serde::Serialize;
use tracing::{debug, warn};

use crate::api::ApiGateway;
use crate::auth::Authorizer;
use crate::error::{AppError, AppResult};
use crate::storage::KeyValueStore;

use super::matcher::matching_rules;
use super::rules::{Rule, RuleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Applied,
    Failed,
    NoActiveRules,
}

/// Per-item, per-rule result of one batch. Lives for the batch only;
/// serialized for `--json` output, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl OperationOutcome {
    fn applied(item_id: &str, rule: &Rule) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            rule_id: Some(rule.id.clone()),
            label_id: Some(rule.label_id.clone()),
            status: OutcomeStatus::Applied,
            error_detail: None,
        }
    }

    fn fetch_failed(item_id: &str, err: &AppError) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            rule_id: None,
            label_id: None,
            status: OutcomeStatus::Failed,
            error_detail: Some(err.to_string()),
        }
    }

    fn apply_failed(item_id: &str, rule: &Rule, err: &AppError) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            rule_id: Some(rule.id.clone()),
            label_id: Some(rule.label_id.clone()),
            status: OutcomeStatus::Failed,
            error_detail: Some(err.to_string()),
        }
    }

    fn no_active_rules() -> Self {
        Self {
            item_id: None,
            rule_id: None,
            label_id: None,
            status: OutcomeStatus::NoActiveRules,
            error_detail: None,
        }
    }
}

/// Drives one batch end to end: snapshot rules, fetch each item's
/// metadata, match, apply labels. Item and rule failures are isolated
/// into outcomes; nothing short of the initial authorization aborts the
/// batch.
pub struct Coordinator<'a, A, S, R> {
    gateway: &'a ApiGateway<A, S>,
    rules: &'a R,
}

impl<'a, A: Authorizer, S: KeyValueStore, R: RuleStore> Coordinator<'a, A, S, R> {
    pub fn new(gateway: &'a ApiGateway<A, S>, rules: &'a R) -> Self {
        Self { gateway, rules }
    }

    pub async fn process_batch(&self, item_ids: &[String]) -> AppResult<Vec<OperationOutcome>> {
        // One snapshot per batch; a rule edited mid-batch keeps its old
        // semantics until the next run.
        let rules = self.rules.list_rules()?;
        if rules.is_empty() {
            debug!("no active rules, skipping batch");
            return Ok(vec![OperationOutcome::no_active_rules()]);
        }

        let mut outcomes = Vec::new();
        for item_id in item_ids {
            self.process_item(item_id, &rules, &mut outcomes).await;
        }

        Ok(outcomes)
    }

    async fn process_item(
        &self,
        item_id: &str,
        rules: &[Rule],
        outcomes: &mut Vec<OperationOutcome>,
    ) {
        let metadata = match self.gateway.get_metadata(item_id).await {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(item = item_id, "metadata fetch failed: {err}");
                outcomes.push(OperationOutcome::fetch_failed(item_id, &err));
                return;
            }
        };

        for rule in matching_rules(&metadata, rules) {
            match self.gateway.apply_label(item_id, &rule.label_id).await {
                Ok(()) => {
                    debug!(item = item_id, label = %rule.label_name, "label applied");
                    outcomes.push(OperationOutcome::applied(item_id, rule));
                }
                Err(err) => {
                    warn!(item = item_id, label = %rule.label_name, "label apply failed: {err}");
                    outcomes.push(OperationOutcome::apply_failed(item_id, rule, &err));
                }
            }
        }
    }
}
