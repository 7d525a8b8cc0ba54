//! Login, register and logout handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, bail};

use crate::cli::app::App;

pub async fn login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = password_or_stdin(password)?;

    if let Some(message) = app.session.login(username, &password).await.error_message() {
        bail!("{message}");
    }

    let session = app.session.snapshot();
    let name = session
        .user
        .as_ref()
        .and_then(|user| user.username.as_deref())
        .unwrap_or(username);
    println!("Logged in as {name}");
    Ok(())
}

pub async fn register(
    app: &App,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_stdin(password)?;

    if let Some(message) = app.session.register(username, email, &password).await.error_message() {
        bail!("{message}");
    }

    println!("Registered {username}. Run `checkin login --username {username}` to sign in.");
    Ok(())
}

pub fn logout(app: &App) {
    let had_credential = app.session.has_stored_credential();
    app.session.logout();
    if had_credential {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
}

fn password_or_stdin(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush().context("flush prompt")?;
    }

    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("No password given (use --password or pipe it on stdin)");
    }
    Ok(password.to_string())
}
