use super::render_record;
use crate::context::Context;
use agentpay_cache::Decision;
use std::fmt::Write;

/// Ensure a mandate exists, then re-verify it so the printed budget reflects
/// what the authority has recorded, not what was cached at issuance
pub async fn execute(context: &Context) -> eyre::Result<String> {
    let manager = context.manager();
    manager.ensure_default().await?;

    let subject = manager.config().subject.clone();
    let record = manager.refresh(&subject).await?;

    let next = match manager.decide(&subject) {
        Decision::Reuse => "reuse".to_string(),
        Decision::Renew(reason) => format!("renew ({reason})"),
    };

    let mut out = render_record(&record, false);
    let _ = write!(out, "\nnext call:        {next}");
    Ok(out)
}
