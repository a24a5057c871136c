use super::render_record;
use crate::context::Context;
use eyre::OptionExt;

pub async fn execute(context: &Context, reveal: bool) -> eyre::Result<String> {
    let manager = context.manager();
    manager.ensure_default().await?;

    let subject = &manager.config().subject;
    let record = manager
        .current(subject)
        .ok_or_eyre("no mandate cached after a successful ensure")?;

    tracing::debug!(subject = %subject, "mandate ready");
    Ok(render_record(&record, reveal))
}
