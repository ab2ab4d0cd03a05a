//! Change-password command implementation.

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Password};

use greenhouse_core::password::{require_valid_password, suggest_password};

use super::{AppContext, NOT_LOGGED_IN, SESSION_EXPIRED};

pub async fn cmd_change_password(ctx: &AppContext, suggest: bool) -> Result<()> {
    let Some(token) = ctx.session.token() else {
        bail!(NOT_LOGGED_IN);
    };

    let new_password = if suggest {
        let candidate = suggest_password()?;
        println!("Suggested password: {}", candidate);
        let accepted = Confirm::new()
            .with_prompt("Use this password?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;
        if !accepted {
            println!("Password unchanged.");
            return Ok(());
        }
        candidate
    } else {
        let password = Password::new()
            .with_prompt("New password")
            .interact()
            .context("Failed to read password")?;
        // Policy is checked locally before anything reaches the wire.
        require_valid_password(&password)?;
        let confirm = Password::new()
            .with_prompt("Confirm password")
            .interact()
            .context("Failed to read confirmation")?;
        if password != confirm {
            bail!("Passwords do not match");
        }
        password
    };

    match ctx
        .api
        .change_password(&token, &new_password, &new_password)
        .await
    {
        Ok(()) => {
            println!("Password changed.");
            Ok(())
        }
        Err(e) if e.is_auth() => bail!(SESSION_EXPIRED),
        Err(e) => Err(e.into()),
    }
}
