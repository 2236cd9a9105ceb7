use crate::cli::LabelCommand;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::OutputMode;

pub async fn run(ctx: &AppContext, command: LabelCommand) -> AppResult<()> {
    match command {
        LabelCommand::Ls => {
            let labels = ctx.gateway()?.list_labels().await?;

            if ctx.output.mode() == OutputMode::Text {
                if labels.is_empty() {
                    println!("0 labels");
                    return Ok(());
                }

                for (index, label) in labels.iter().enumerate() {
                    println!("{}. {} [{}] (id: {})", index + 1, label.name, label.kind, label.id);
                }

                return Ok(());
            }

            let text = format!("{} labels", labels.len());
            ctx.output.emit(&text, &labels)
        }
    }
}
