//! Login and logout command implementations.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use greenhouse_core::session::sign_out;

use super::AppContext;

pub async fn cmd_login(
    ctx: &AppContext,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let response = ctx
        .api
        .login(&username, &password)
        .await
        .context("Login failed")?;
    ctx.session.login(response.access_token);

    println!("Logged in as {}.", username);
    if response.is_first_login {
        println!(
            "This account still has its initial password. \
             Run 'greenhouse change-password' to set your own."
        );
    }
    Ok(())
}

pub async fn cmd_logout(ctx: &AppContext) -> Result<()> {
    if ctx.session.token().is_none() {
        println!("Not logged in.");
        return Ok(());
    }

    // Best-effort on the backend; the local session is cleared either way.
    sign_out(ctx.api.as_ref(), &ctx.session).await;
    println!("Logged out.");
    Ok(())
}
