use std::{sync::Arc, time::Duration};

use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use num_format::{Locale, ToFormattedString};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};
use zapdesk_core::amount::Sats;
use zapdesk_resolver::{
    controller::{InvoiceResult, ResolveOutcome},
    error::ResolutionError,
};

pub const PRESET_AMOUNTS: [Sats; 3] = [Sats(100), Sats(1_000), Sats(10_000)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipAction {
    MarkAsPaid,
    ChangeAmount,
    Quit,
}

/// Logs go to stderr so the rendered code on stdout stays intact. `RUST_LOG` overrides
/// the default `warn` level.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

pub fn progress_bar() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    Ok(pb)
}

pub fn format_sats(amount: Sats) -> String {
    format!("{} sat", amount.0.to_formatted_string(&Locale::en))
}

pub fn choose_amount() -> anyhow::Result<Sats> {
    let mut items = PRESET_AMOUNTS
        .iter()
        .map(|amount| format_sats(*amount))
        .collect::<Vec<String>>();
    items.push("Custom amount".to_owned());

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Choose a tip amount:")
        .default(0)
        .items(&items[..])
        .interact()?;

    if let Some(amount) = PRESET_AMOUNTS.get(selection) {
        return Ok(*amount);
    }

    let custom = Input::<u64>::with_theme(&ColorfulTheme::default())
        .with_prompt("Amount (sat)")
        .validate_with(|input: &u64| -> Result<(), &'static str> {
            if *input > 0 {
                Ok(())
            } else {
                Err("Amount must be positive")
            }
        })
        .interact_text()?;
    Ok(Sats(custom))
}

pub fn choose_action() -> anyhow::Result<TipAction> {
    let actions = [
        (TipAction::MarkAsPaid, "Mark as paid"),
        (TipAction::ChangeAmount, "Choose another amount"),
        (TipAction::Quit, "Quit"),
    ];
    let labels = actions.iter().map(|(_, label)| *label).collect::<Vec<_>>();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Scan the code with your lightning wallet, then:")
        .default(0)
        .items(&labels[..])
        .interact()?;
    Ok(actions
        .get(selection)
        .map_or(TipAction::Quit, |(action, _)| *action))
}

/// The invoice of a finished call. The CLI never starts competing calls, so a
/// superseded outcome is reported as an error like any failure.
pub fn ready_invoice(
    outcome: Result<ResolveOutcome, ResolutionError>,
    amount: Sats,
) -> anyhow::Result<Arc<InvoiceResult>> {
    match outcome? {
        ResolveOutcome::Ready(result) => Ok(result),
        ResolveOutcome::Superseded => {
            anyhow::bail!("invoice for {} was superseded", format_sats(amount))
        }
    }
}

pub fn show_invoice(term: &Term, result: &InvoiceResult) -> anyhow::Result<()> {
    if let Some(description) = &result.description {
        term.write_line(&format!("{}", style(description).bold()))?;
    }
    term.write_line(&format!(
        "Tip {} to {}\n",
        style(format_sats(result.amount)).cyan(),
        result.address
    ))?;
    term.write_line(result.code.unicode())?;
    term.write_line(&result.payment_request)?;
    Ok(())
}

/// Text of the comment that records a tip on the ticket. Payment is not verified, the
/// note only reflects what the user asserted.
pub fn confirmation_note(amount: Sats, message: Option<&str>) -> String {
    let mut note = format!(
        "⚡ Lightning tip sent: {} sats",
        amount.0.to_formatted_string(&Locale::en)
    );
    if let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) {
        note.push_str("\n\nMessage: ");
        note.push_str(message);
    }
    note.push_str("\n\nTip sent via zapdesk");
    note
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use zapdesk_core::amount::{Millisats, Sats};
    use zapdesk_resolver::{controller::ResolveOutcome, error::ResolutionError};

    use super::{confirmation_note, format_sats, ready_invoice};

    #[test]
    fn test_format_sats() {
        assert_eq!("100 sat", format_sats(Sats(100)));
        assert_eq!("10,000 sat", format_sats(Sats(10_000)));
        assert_eq!("2,100,000 sat", format_sats(Sats(2_100_000)));
    }

    #[test]
    fn test_confirmation_note() {
        assert_eq!(
            "⚡ Lightning tip sent: 1,000 sats\n\nMessage: thanks for the quick fix\n\nTip sent via zapdesk",
            confirmation_note(Sats(1_000), Some(" thanks for the quick fix "))
        );
    }

    #[test]
    fn test_confirmation_note_without_message() {
        let expected = "⚡ Lightning tip sent: 100 sats\n\nTip sent via zapdesk";
        assert_eq!(expected, confirmation_note(Sats(100), None));
        assert_eq!(expected, confirmation_note(Sats(100), Some("   ")));
    }

    #[test]
    fn test_ready_invoice_propagates_resolution_errors() {
        let err = ResolutionError::AmountOutOfRange {
            amount: Sats(0),
            min: Millisats(1_000),
            max: Millisats(100_000_000),
        };
        let result = ready_invoice(Err(err.clone()), Sats(0));
        assert_eq!(
            Some(&err),
            result
                .err()
                .as_ref()
                .and_then(|e| e.downcast_ref::<ResolutionError>())
        );
    }

    #[test]
    fn test_ready_invoice_rejects_superseded() {
        let result = ready_invoice(Ok(ResolveOutcome::Superseded), Sats(100));
        assert!(result.is_err_and(|e| e.to_string().contains("superseded")));
    }
}
