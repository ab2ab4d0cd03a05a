//! Settings show/set command implementations.

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Subcommand;

use greenhouse_core::error::Error;
use greenhouse_core::settings::SettingsSync;
use greenhouse_types::ThresholdConfig;

use super::{AppContext, NOT_LOGGED_IN, SESSION_EXPIRED};
use crate::format::{FormatOptions, OutputFormat, format_settings_json, format_settings_text};

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Show the active threshold configuration
    Show {
        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Update threshold values (unspecified fields keep their value)
    Set {
        /// Configuration name
        #[arg(long)]
        name: Option<String>,

        /// Minimum temperature (°C)
        #[arg(long)]
        temp_min: Option<f64>,

        /// Maximum temperature (°C)
        #[arg(long)]
        temp_max: Option<f64>,

        /// Minimum humidity (%)
        #[arg(long)]
        hum_min: Option<f64>,

        /// Maximum humidity (%)
        #[arg(long)]
        hum_max: Option<f64>,

        /// Minimum light level (lx)
        #[arg(long)]
        light_min: Option<f64>,

        /// Maximum light level (lx)
        #[arg(long)]
        light_max: Option<f64>,

        /// Minimum soil moisture
        #[arg(long)]
        soil_min: Option<f64>,
    },
}

pub async fn cmd_settings(
    ctx: &AppContext,
    action: SettingsAction,
    opts: &FormatOptions,
) -> Result<()> {
    if ctx.session.token().is_none() {
        bail!(NOT_LOGGED_IN);
    }

    let sync = SettingsSync::new(
        ctx.api.clone(),
        Arc::clone(&ctx.session),
        ctx.events.clone(),
    );

    match action {
        SettingsAction::Show { format } => {
            let config = load_settings(&sync).await?;
            let content = match format {
                OutputFormat::Json => format_settings_json(&config, opts)?,
                OutputFormat::Text => format_settings_text(&config, opts),
            };
            print!("{}", content);
        }
        SettingsAction::Set {
            name,
            temp_min,
            temp_max,
            hum_min,
            hum_max,
            light_min,
            light_max,
            soil_min,
        } => {
            let mut config = load_settings(&sync).await?;
            merge(&mut config.name, name);
            merge(&mut config.temp_min, temp_min);
            merge(&mut config.temp_max, temp_max);
            merge(&mut config.hum_min, hum_min);
            merge(&mut config.hum_max, hum_max);
            merge(&mut config.light_min, light_min);
            merge(&mut config.light_max, light_max);
            merge(&mut config.soil_min, soil_min);

            match sync.save(&config).await {
                Ok(()) => println!("Settings saved."),
                Err(Error::IncompleteSettings { missing }) => {
                    bail!(
                        "Settings are incomplete: missing {}. Set every field at least once.",
                        missing.join(", ")
                    );
                }
                Err(e) if e.is_auth() => bail!(SESSION_EXPIRED),
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

async fn load_settings(sync: &SettingsSync) -> Result<ThresholdConfig> {
    match sync.load(None).await {
        Ok(config) => Ok(config),
        Err(e) if e.is_auth() => bail!(SESSION_EXPIRED),
        Err(e) => Err(e.into()),
    }
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
