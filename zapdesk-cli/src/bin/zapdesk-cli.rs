use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use console::{style, Term};
use dialoguer::{Confirm, Input};
use tracing::info;
use zapdesk_core::amount::Sats;
use zapdesk_resolver::{
    config::{DirectoryConfig, ResolverConfig},
    controller::{InvoiceResult, ResolutionController, ResolveOutcome},
    directory::{HttpDirectory, PayeeDirectory, StaticDirectory},
    error::ResolutionError,
    http::HttpClient,
};
use zapdeskcli::cli::{self, TipAction};

#[derive(Parser)]
#[command(arg_required_else_help(true))]
struct Opts {
    /// Lightning address to tip. Skips the directory lookup
    #[clap(short, long, env = "ZAPDESK_ADDRESS")]
    address: Option<String>,

    /// Agent email to look up in the directory
    #[clap(long, env = "ZAPDESK_AGENT_EMAIL")]
    agent_email: Option<String>,

    #[clap(flatten)]
    resolver: ResolverConfig,

    #[clap(flatten)]
    directory: DirectoryConfig,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Create an invoice for an amount in sats
    Invoice { amount: u64 },

    /// Choose an amount, show the invoice and record the tip
    Tip,

    /// Write the invoice QR code as svg
    Svg { amount: u64, path: PathBuf },

    /// Show version and configuration
    Info,
}

struct Session {
    controller: ResolutionController<HttpClient>,
    directory: Box<dyn PayeeDirectory>,
    address: Option<String>,
    agent_email: Option<String>,
}

impl Session {
    async fn resolve(&self, amount: Sats) -> Result<ResolveOutcome, ResolutionError> {
        match &self.address {
            Some(address) => self.controller.resolve_and_render(address, amount).await,
            None => {
                self.controller
                    .resolve_for_payee(self.directory.as_ref(), self.agent_email.as_deref(), amount)
                    .await
            }
        }
    }

    /// Resolves with a spinner. Failures are returned, not printed.
    async fn resolve_with_progress(&self, amount: Sats) -> anyhow::Result<Arc<InvoiceResult>> {
        let progress_bar = cli::progress_bar()?;
        progress_bar.set_message(format!("Creating invoice for {} ...", cli::format_sats(amount)));
        let outcome = self.resolve(amount).await;
        progress_bar.finish_and_clear();
        cli::ready_invoice(outcome, amount)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    cli::init_tracing();

    let opts = Opts::parse();
    let term = Term::stdout();

    let client = HttpClient::new(&opts.resolver)?;
    let directory: Box<dyn PayeeDirectory> = match &opts.directory.directory_url {
        Some(url) => Box::new(HttpDirectory::new(url.clone(), client.clone())),
        None => Box::new(StaticDirectory::default()),
    };
    let session = Session {
        controller: ResolutionController::builder(client)
            .with_config(opts.resolver.clone())
            .with_default_address(opts.directory.default_address.clone())
            .build(),
        directory,
        address: opts.address.clone(),
        agent_email: opts.agent_email.clone(),
    };

    match opts.command {
        Command::Info => {
            let version = style(env!("CARGO_PKG_VERSION")).cyan();
            term.write_line(&format!("Version: {version}"))?;
            term.write_line(&format!(
                "Default address: {}",
                style(&opts.directory.default_address).cyan()
            ))?;
            if let Some(url) = &opts.directory.directory_url {
                term.write_line(&format!("Directory: {url}"))?;
            }
            if let Some(proxy) = &opts.resolver.proxy {
                term.write_line(&format!("Proxy: {proxy}"))?;
            }
            term.write_line(&format!(
                "Request timeout: {}s, cache ttl: {}s",
                opts.resolver.request_timeout_secs, opts.resolver.cache_ttl_secs
            ))?;
        }
        Command::Invoice { amount } => {
            let result = session.resolve_with_progress(Sats(amount)).await?;
            cli::show_invoice(&term, &result)?;
        }
        Command::Svg { amount, path } => {
            let result = session.resolve_with_progress(Sats(amount)).await?;
            tokio::fs::write(&path, result.code.svg()).await?;
            term.write_line(&format!(
                "Invoice for {} written to {}",
                cli::format_sats(result.amount),
                path.display()
            ))?;
        }
        Command::Tip => {
            let mut amount = cli::choose_amount()?;
            loop {
                let result = match session.resolve_with_progress(amount).await {
                    Ok(result) => result,
                    Err(err) => {
                        term.write_line(&format!("{} {}", style("Error:").red(), err))?;
                        let retry = Confirm::new()
                            .with_prompt("Try again?")
                            .default(true)
                            .interact()?;
                        if retry {
                            continue;
                        }
                        break;
                    }
                };
                cli::show_invoice(&term, &result)?;

                match cli::choose_action()? {
                    TipAction::MarkAsPaid => {
                        let message = Input::<String>::new()
                            .with_prompt("Message (optional)")
                            .allow_empty(true)
                            .interact_text()?;
                        info!("tip of {} to {} marked as paid", result.amount, result.address);
                        term.write_line(&format!(
                            "\n{}",
                            cli::confirmation_note(result.amount, Some(&message))
                        ))?;
                        break;
                    }
                    TipAction::ChangeAmount => amount = cli::choose_amount()?,
                    TipAction::Quit => break,
                }
            }
        }
    }
    Ok(())
}
