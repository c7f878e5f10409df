use anyhow::Result;
use clap::Parser;

/// Browse recorded AI coding-agent session transcripts.
#[derive(Parser)]
#[command(name = "loupe", version, about)]
struct Cli {
    /// Base URL of the loupe session server (overrides the config file).
    #[arg(long)]
    server: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    loupe_tui::run(loupe_tui::RunOptions {
        server_url: cli.server,
    })
}
