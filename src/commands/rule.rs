use serde::Serialize;

use crate::cli::{RuleAddArgs, RuleCommand, RuleRmArgs};
use crate::context::AppContext;
use crate::engine::{NewRule, RuleStore};
use crate::error::{AppError, AppResult};
use crate::output::OutputMode;

pub async fn run(ctx: &AppContext, command: RuleCommand) -> AppResult<()> {
    match command {
        RuleCommand::Add(args) => add(ctx, args).await,
        RuleCommand::Ls => list(ctx),
        RuleCommand::Rm(args) => remove(ctx, args),
    }
}

async fn add(ctx: &AppContext, args: RuleAddArgs) -> AppResult<()> {
    let sender = args.sender.as_deref().map(str::trim).unwrap_or_default();
    let subject = args.subject.as_deref().map(str::trim).unwrap_or_default();

    if sender.is_empty() && subject.is_empty() && !args.match_all {
        return Err(AppError::InvalidInput(
            "give at least one of --sender/--subject, or pass --match-all for a rule that labels everything".to_string(),
        ));
    }

    let gateway = ctx.gateway()?;
    let label = gateway.ensure_label(&args.label).await?;

    let rule = ctx.rules().add_rule(NewRule {
        sender: sender.to_string(),
        sender_match: !sender.is_empty(),
        subject: subject.to_string(),
        subject_match: !subject.is_empty(),
        label_id: label.id,
        label_name: label.name,
    })?;

    let text = format!("rule {} added: {}", rule.id, describe_rule(&rule));
    ctx.output.emit(&text, &rule)
}

fn list(ctx: &AppContext) -> AppResult<()> {
    let rules = ctx.rules().list_rules()?;

    if ctx.output.mode() == OutputMode::Text {
        if rules.is_empty() {
            println!("0 rules");
            return Ok(());
        }

        for (index, rule) in rules.iter().enumerate() {
            println!("{}. {}: {}", index + 1, rule.id, describe_rule(rule));
        }

        return Ok(());
    }

    let text = format!("{} rules", rules.len());
    ctx.output.emit(&text, &rules)
}

fn remove(ctx: &AppContext, args: RuleRmArgs) -> AppResult<()> {
    ctx.rules().remove_rule(&args.id)?;

    #[derive(Serialize)]
    struct Removed {
        id: String,
    }

    let text = format!("rule {} removed", args.id);
    ctx.output.emit(&text, &Removed { id: args.id })
}

fn describe_rule(rule: &crate::engine::Rule) -> String {
    let mut predicates = Vec::new();
    if rule.sender_match {
        predicates.push(format!("sender contains \"{}\"", rule.sender));
    }
    if rule.subject_match {
        predicates.push(format!("subject contains \"{}\"", rule.subject));
    }

    let condition = if predicates.is_empty() {
        "every message".to_string()
    } else {
        predicates.join(" and ")
    };

    format!("{condition} -> label \"{}\"", rule.label_name)
}
