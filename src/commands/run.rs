use serde::Serialize;

use crate::cli::RunArgs;
use crate::context::AppContext;
use crate::engine::{Coordinator, OperationOutcome, OutcomeStatus};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct RunReport {
    items: usize,
    applied: usize,
    failed: usize,
    outcomes: Vec<OperationOutcome>,
}

pub async fn run(ctx: &AppContext, args: RunArgs) -> AppResult<()> {
    if args.limit == 0 {
        return Err(AppError::InvalidInput(
            "--limit must be greater than 0".to_string(),
        ));
    }

    let gateway = ctx.gateway()?;
    let rules = ctx.rules();

    let item_ids = gateway.list_items(args.limit, args.q.as_deref()).await?;
    let outcomes = Coordinator::new(&gateway, &rules)
        .process_batch(&item_ids)
        .await?;

    let report = RunReport {
        items: item_ids.len(),
        applied: count(&outcomes, OutcomeStatus::Applied),
        failed: count(&outcomes, OutcomeStatus::Failed),
        outcomes,
    };

    let mut lines = Vec::new();
    for outcome in &report.outcomes {
        lines.push(describe_outcome(outcome));
    }
    lines.push(format!(
        "{} messages, {} labels applied, {} failures",
        report.items, report.applied, report.failed
    ));

    ctx.output.emit_list(&lines, &report)
}

fn count(outcomes: &[OperationOutcome], status: OutcomeStatus) -> usize {
    outcomes
        .iter()
        .filter(|outcome| outcome.status == status)
        .count()
}

fn describe_outcome(outcome: &OperationOutcome) -> String {
    let item = outcome.item_id.as_deref().unwrap_or("-");
    match outcome.status {
        OutcomeStatus::Applied => format!(
            "{item}: applied label {}",
            outcome.label_id.as_deref().unwrap_or("?")
        ),
        OutcomeStatus::Failed => format!(
            "{item}: failed{}: {}",
            outcome
                .label_id
                .as_deref()
                .map(|label| format!(" applying label {label}"))
                .unwrap_or_default(),
            outcome.error_detail.as_deref().unwrap_or("unknown error")
        ),
        OutcomeStatus::NoActiveRules => {
            "no active rules; add one with `mailsort rule add`".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: OutcomeStatus) -> OperationOutcome {
        OperationOutcome {
            item_id: Some("m1".to_string()),
            rule_id: Some("r1".to_string()),
            label_id: Some("L1".to_string()),
            status,
            error_detail: match status {
                OutcomeStatus::Failed => Some("remote api error (500): boom".to_string()),
                _ => None,
            },
        }
    }

    #[test]
    fn describes_applied_outcome() {
        assert_eq!(
            describe_outcome(&outcome(OutcomeStatus::Applied)),
            "m1: applied label L1"
        );
    }

    #[test]
    fn describes_failed_apply_with_detail() {
        let text = describe_outcome(&outcome(OutcomeStatus::Failed));
        assert!(text.contains("failed applying label L1"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn counts_by_status() {
        let outcomes = vec![
            outcome(OutcomeStatus::Applied),
            outcome(OutcomeStatus::Applied),
            outcome(OutcomeStatus::Failed),
        ];
        assert_eq!(count(&outcomes, OutcomeStatus::Applied), 2);
        assert_eq!(count(&outcomes, OutcomeStatus::Failed), 1);
    }
}
