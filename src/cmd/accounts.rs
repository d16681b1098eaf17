//! Accounts command - list the ISA accounts detected in a ledger

use crate::cmd::load_snapshot;
use crate::isa::classify;
use clap::Args;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct AccountsCommand {
    /// GnuCash XML file
    #[arg(short, long)]
    file: PathBuf,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Account")]
    account: String,

    #[tabled(rename = "Kind")]
    kind: &'static str,

    #[tabled(rename = "Closed")]
    closed: &'static str,

    #[tabled(rename = "Currency")]
    currency: String,
}

impl AccountsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.file)?;

        let rows: Vec<AccountRow> = snapshot
            .walk()
            .filter(|(_, account)| classify::is_isa_account(*account))
            .map(|(path, account)| AccountRow {
                account: path.join(":"),
                kind: classify::isa_kind(account).map_or("-", |kind| kind.label()),
                closed: if classify::is_closed(account) { "yes" } else { "" },
                currency: account.currency().unwrap_or_default().to_string(),
            })
            .collect();

        if rows.is_empty() {
            println!("No ISA accounts found");
            return Ok(());
        }

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::left()));
        println!("{table}");
        Ok(())
    }
}
