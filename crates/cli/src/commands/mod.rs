use crate::context::Context;
use agentpay_core::MandateRecord;
use agentpay_utils::redact_token;
use clap::Subcommand;
use std::fmt::Write;
use std::path::Path;

pub mod ensure;
pub mod status;
pub mod verify;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print a usable mandate token, issuing a new mandate if needed
    Ensure {
        /// Print the full token instead of a redacted preview
        #[arg(long)]
        reveal: bool,
    },

    /// Verify a mandate token with the authority and print its envelope
    Verify {
        /// Mandate token to verify
        token: String,
    },

    /// Ensure a mandate, re-verify it, and print the budget the authority reports
    Status,
}

impl Commands {
    /// Run the command against the configuration at `config_path`
    pub async fn execute(self, config_path: &Path) -> eyre::Result<String> {
        let context = Context::load(config_path)?;
        self.run(&context).await
    }

    /// Run the command with an already built context
    pub async fn run(self, context: &Context) -> eyre::Result<String> {
        match self {
            Commands::Ensure { reveal } => ensure::execute(context, reveal).await,
            Commands::Verify { token } => verify::execute(context, &token).await,
            Commands::Status => status::execute(context).await,
        }
    }
}

/// Plain-text view of a mandate record
pub(crate) fn render_record(record: &MandateRecord, reveal: bool) -> String {
    let token = if reveal {
        record.token().to_string()
    } else {
        redact_token(record.token())
    };

    let mut out = String::new();
    let _ = writeln!(out, "subject:          {}", record.subject());
    let _ = writeln!(out, "scope:            {}", record.scope());
    let _ = writeln!(out, "budget total:     ${}", record.budget_total());
    let _ = writeln!(out, "budget remaining: ${}", record.budget_remaining());
    let _ = writeln!(out, "issued at:        {}", record.issued_at().to_rfc3339());
    let _ = writeln!(out, "expires at:       {}", record.expires_at().to_rfc3339());
    let _ = write!(out, "token:            {token}");
    out
}
