//! Status command implementation.

use anyhow::{Result, anyhow, bail};

use greenhouse_core::live::LiveDataCoordinator;

use super::{AppContext, NOT_LOGGED_IN, SESSION_EXPIRED};
use crate::format::{FormatOptions, OutputFormat, format_live_json, format_live_text};

pub async fn cmd_status(
    ctx: &AppContext,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<()> {
    if ctx.session.token().is_none() {
        bail!(NOT_LOGGED_IN);
    }

    let coordinator = LiveDataCoordinator::new(
        ctx.api.clone(),
        ctx.session.clone(),
        ctx.events.clone(),
    );

    if let Err(e) = coordinator.refresh().await {
        if e.is_auth() {
            bail!(SESSION_EXPIRED);
        }
        return Err(e.into());
    }

    let view = coordinator
        .view()
        .await
        .ok_or_else(|| anyhow!("No live data available"))?;

    let content = match format {
        OutputFormat::Json => format_live_json(&view, opts)?,
        OutputFormat::Text => format_live_text(&view, opts),
    };
    print!("{}", content);
    Ok(())
}
