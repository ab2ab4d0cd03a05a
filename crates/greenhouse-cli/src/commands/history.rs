//! History command implementation.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use greenhouse_core::history::{HistoryQueryEngine, QueryOutcome};
use greenhouse_types::TimeRange;

use super::{AppContext, NOT_LOGGED_IN, SESSION_EXPIRED};
use crate::format::{FormatOptions, OutputFormat, format_history_json, format_history_text};

pub async fn cmd_history(
    ctx: &AppContext,
    from: &str,
    to: &str,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<()> {
    let from = parse_timestamp(from).context("Invalid --from timestamp")?;
    let to = parse_timestamp(to).context("Invalid --to timestamp")?;
    let range = TimeRange::new(from, to);
    if !range.is_valid() {
        bail!("--from must not be after --to");
    }

    if ctx.session.token().is_none() {
        bail!(NOT_LOGGED_IN);
    }

    let engine = HistoryQueryEngine::new(
        ctx.api.clone(),
        Arc::clone(&ctx.session),
        ctx.events.clone(),
    );

    let outcome = match engine.query(range).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_auth() => bail!(SESSION_EXPIRED),
        Err(e) => return Err(e.into()),
    };

    match outcome {
        QueryOutcome::Applied => {
            let series = engine
                .series()
                .await
                .ok_or_else(|| anyhow!("No history data available"))?;
            let content = match format {
                OutputFormat::Json => format_history_json(&series, opts)?,
                OutputFormat::Text => format_history_text(&series, opts),
            };
            print!("{}", content);
        }
        // Range and session were validated above; a lone query cannot
        // be raced by a newer one.
        QueryOutcome::Skipped | QueryOutcome::Superseded => {
            bail!("History query did not complete");
        }
    }
    Ok(())
}

/// Parse an RFC 3339 timestamp, accepting a bare `YYYY-MM-DD` date as
/// midnight UTC for convenience.
fn parse_timestamp(input: &str) -> Result<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(input, &Rfc3339) {
        return Ok(ts);
    }
    OffsetDateTime::parse(&format!("{}T00:00:00Z", input), &Rfc3339).map_err(|_| {
        anyhow!(
            "expected RFC 3339 (e.g. 2025-06-01T00:00:00Z) or a date (2025-06-01), got: {}",
            input
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_full_timestamp() {
        assert_eq!(
            parse_timestamp("2025-06-01T12:30:00Z").unwrap(),
            datetime!(2025-06-01 12:30 UTC)
        );
    }

    #[test]
    fn test_parse_bare_date_as_midnight_utc() {
        assert_eq!(
            parse_timestamp("2025-06-01").unwrap(),
            datetime!(2025-06-01 00:00 UTC)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("2025-13-01").is_err());
    }
}
