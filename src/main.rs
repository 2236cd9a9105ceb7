use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = mailsort::cli::Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = mailsort::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the crate's level.
fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "mailsort=warn",
        1 => "mailsort=info",
        2 => "mailsort=debug",
        _ => "mailsort=trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
