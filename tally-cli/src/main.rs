use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tally_chat::{Dispatcher, Inbound, MasculineDefault, Renderer, StaticRoster};
use tally_core::{Money, PartyId, ScopeId};
use tally_engine::{normalize_payees, ChargeRequest, DebtEngine};
use tally_ledger::{DebtEntry, SqliteLedgerStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tally-cli", about = "Inspect and drive a tally debt ledger")]
struct Cli {
    /// Path to the SQLite ledger file.
    #[arg(long, default_value = "tally.db")]
    ledger: PathBuf,
    /// Chat scope the command applies to.
    #[arg(long, default_value_t = 0)]
    scope: i64,
    /// Emit machine-readable JSON instead of text.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Record a charge from `--payer`, split evenly across the payees.
    Charge {
        #[arg(long)]
        payer: String,
        #[arg(long = "payee", required = true)]
        payees: Vec<String>,
        amount: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show netted balances, optionally only those involving one member.
    Balance {
        #[arg(long)]
        of: Option<String>,
    },
    /// Show entries from the last N days, newest first.
    History {
        #[arg(default_value_t = 1)]
        days: i64,
    },
    /// List every raw entry of the scope, newest first.
    Entries,
    /// Cancel the newest operation, if `--requester` authored it.
    Cancel {
        #[arg(long)]
        requester: String,
    },
    /// Feed one chat message through the full parse/engine/render path.
    Say {
        #[arg(long)]
        sender: String,
        /// Chat members, used to resolve @all charges.
        #[arg(long = "member")]
        members: Vec<String>,
        text: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();
    let store = SqliteLedgerStore::open(&cli.ledger)
        .with_context(|| format!("opening ledger {}", cli.ledger.display()))?;
    let engine = DebtEngine::new(Arc::new(store))?;
    let scope = ScopeId::new(cli.scope);

    match cli.command {
        CliCommand::Charge {
            payer,
            payees,
            amount,
            reason,
        } => {
            let total = Money::parse(&amount)
                .with_context(|| format!("parsing amount `{amount}`"))?;
            if !total.is_positive() {
                bail!("amount must be positive");
            }
            let payer = PartyId::new(payer);
            let payees: Vec<PartyId> = payees.into_iter().map(PartyId::new).collect();
            let participants = normalize_payees(&payer, &payees).len() as i64;
            let outcome = engine.charge(ChargeRequest {
                scope,
                payer,
                payees,
                total,
                reason,
                participants,
            })?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                match outcome.operation_id {
                    Some(id) => {
                        println!("operation {id} (share {}):", outcome.share);
                        for entry in &outcome.entries {
                            print_entry(entry);
                        }
                    }
                    None => println!("nothing to record"),
                }
            }
        }
        CliCommand::Balance { of } => {
            let balances = match of {
                Some(member) => engine.balances_involving(scope, &PartyId::new(member))?,
                None => engine.all_balances(scope)?,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&balances)?);
            } else if balances.is_empty() {
                println!("no outstanding balances");
            } else {
                for balance in &balances {
                    println!(
                        "{} owes {} {}",
                        balance.debtor, balance.creditor, balance.amount
                    );
                }
            }
        }
        CliCommand::History { days } => {
            if days < 1 {
                bail!("history window must be at least one day");
            }
            let entries = engine.history(scope, days)?;
            print_entries(&entries, cli.json)?;
        }
        CliCommand::Entries => {
            let entries = engine.entries(scope)?;
            print_entries(&entries, cli.json)?;
        }
        CliCommand::Cancel { requester } => {
            let outcome = engine.cancel(scope, &PartyId::new(requester))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "cancelled operation {} ({} entries):",
                    outcome.operation_id,
                    outcome.removed.len()
                );
                for entry in &outcome.removed {
                    print_entry(entry);
                }
            }
        }
        CliCommand::Say {
            sender,
            members,
            text,
        } => {
            let roster = StaticRoster::new(members.into_iter().map(PartyId::new).collect());
            let dispatcher = Dispatcher::new(
                engine,
                Arc::new(roster),
                Renderer::new(Arc::new(MasculineDefault)),
            );
            let inbound = Inbound {
                scope,
                sender: PartyId::new(sender),
                text,
            };
            match dispatcher.dispatch(&inbound) {
                Some(reply) => println!("{reply}"),
                None => println!("(no reply)"),
            }
        }
    }
    Ok(())
}

fn print_entries(entries: &[DebtEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
    } else if entries.is_empty() {
        println!("no entries");
    } else {
        for entry in entries {
            print_entry(entry);
        }
    }
    Ok(())
}

fn print_entry(entry: &DebtEntry) {
    let reason = entry
        .reason
        .as_deref()
        .map(|reason| format!(" ({reason})"))
        .unwrap_or_default();
    println!(
        "[{}] #{} {} {} -> {} {}{}",
        entry.created_at.format("%d.%m.%Y %H:%M"),
        entry.operation_id,
        entry.kind,
        entry.from,
        entry.to,
        entry.amount,
        reason
    );
}
