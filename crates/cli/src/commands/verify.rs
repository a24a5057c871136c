use super::render_record;
use crate::context::Context;
use agentpay_core::RemoteMandateAuthority;
use eyre::WrapErr;
use std::fmt::Write;

pub async fn execute(context: &Context, token: &str) -> eyre::Result<String> {
    let record = context
        .authority()
        .verify(token)
        .await
        .wrap_err("mandate verification failed")?;

    let mut out = render_record(&record, false);
    if let Err(e) = record.validate() {
        let _ = write!(out, "\nwarning:          {e}");
    }
    Ok(out)
}
