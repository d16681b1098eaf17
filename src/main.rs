use clap::{Parser, Subcommand};

mod cmd;
mod isa;
mod ledger;
mod tax;

use cmd::accounts::AccountsCommand;
use cmd::report::ReportCommand;

#[derive(Parser)]
#[command(
    name = "isarep",
    version,
    about = "UK ISA allowance reporting for GnuCash ledgers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-tax-year deposits and allowance usage
    Report(ReportCommand),
    /// List the ISA accounts detected in a ledger
    Accounts(AccountsCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    log::debug!("start");
    let result = match &cli.command {
        Commands::Report(cmd) => cmd.exec(),
        Commands::Accounts(cmd) => cmd.exec(),
    };
    log::debug!("finish");
    result
}
