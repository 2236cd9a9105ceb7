use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mailsort", version, about = "Rule-based mailbox labeling")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Auth(AuthArgs),
    Rule(RuleArgs),
    Run(RunArgs),
    Label(LabelArgs),
    Sort(SortArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    Login,
    Status,
    Logout,
}

#[derive(Debug, Args)]
pub struct RuleArgs {
    #[command(subcommand)]
    pub command: RuleCommand,
}

#[derive(Debug, Subcommand)]
pub enum RuleCommand {
    Add(RuleAddArgs),
    Ls,
    Rm(RuleRmArgs),
}

#[derive(Debug, Args)]
pub struct RuleAddArgs {
    #[arg(long, help = "Match messages whose From header contains this text")]
    pub sender: Option<String>,
    #[arg(long, help = "Match messages whose Subject header contains this text")]
    pub subject: Option<String>,
    #[arg(
        long,
        help = "Create a rule with no predicates that matches every message"
    )]
    pub match_all: bool,
    #[arg(long, help = "Label name or id to apply; created when missing")]
    pub label: String,
}

#[derive(Debug, Args)]
pub struct RuleRmArgs {
    #[arg(help = "Rule id to remove")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, default_value_t = 50, help = "Maximum messages to process")]
    pub limit: u32,
    #[arg(long, help = "Mailbox search query restricting the batch")]
    pub q: Option<String>,
}

#[derive(Debug, Args)]
pub struct LabelArgs {
    #[command(subcommand)]
    pub command: LabelCommand,
}

#[derive(Debug, Subcommand)]
pub enum LabelCommand {
    Ls,
}

#[derive(Debug, Args)]
pub struct SortArgs {
    #[arg(long, help = "Sender address to sort existing mail for")]
    pub sender: String,
    #[arg(long, help = "Label name the relay should file messages under")]
    pub label: String,
}
