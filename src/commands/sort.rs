use serde::Serialize;

use crate::cli::SortArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct SortResult {
    sender: String,
    label: String,
    output: String,
}

/// Hands one sender/label pair to the local relay, which bulk-files the
/// sender's existing mail on its own.
pub async fn run(ctx: &AppContext, args: SortArgs) -> AppResult<()> {
    let sender = args.sender.trim();
    let label = args.label.trim();
    if sender.is_empty() || label.is_empty() {
        return Err(AppError::InvalidInput(
            "--sender and --label must not be empty".to_string(),
        ));
    }

    let output = ctx.relay().sort_by_sender(sender, label).await?;

    let result = SortResult {
        sender: sender.to_string(),
        label: label.to_string(),
        output,
    };

    let text = if result.output.is_empty() {
        format!("relay sorted mail from {} into \"{}\"", result.sender, result.label)
    } else {
        format!(
            "relay sorted mail from {} into \"{}\": {}",
            result.sender,
            result.label,
            result.output.trim()
        )
    };
    ctx.output.emit(&text, &result)
}
