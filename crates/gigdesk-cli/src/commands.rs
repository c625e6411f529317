use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use gigdesk_core::models::PaginationParams;
use gigdesk_core::{AuthError, Config, GateDecision, RouteGate, SessionManager, SessionState, UserService};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { email: Option<String> },
    Logout,
    Status,
    Refresh,
    Users { page: Option<u32>, limit: Option<u32> },
    User { id: String },
    Gate { path: String },
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        match name.as_str() {
            "help" | "-h" | "--help" => Ok(Command::Help),
            "login" => Ok(Command::Login {
                email: rest.first().cloned(),
            }),
            "logout" => Ok(Command::Logout),
            "status" => Ok(Command::Status),
            "refresh" => Ok(Command::Refresh),
            "users" => {
                let mut page = None;
                let mut limit = None;
                let mut iter = rest.iter();
                while let Some(flag) = iter.next() {
                    let value = iter
                        .next()
                        .with_context(|| format!("Missing value for {}", flag))?;
                    let number: u32 = value
                        .parse()
                        .with_context(|| format!("Invalid number for {}: {}", flag, value))?;
                    match flag.as_str() {
                        "--page" => page = Some(number),
                        "--limit" => limit = Some(number),
                        other => bail!("Unknown option for users: {}", other),
                    }
                }
                Ok(Command::Users { page, limit })
            }
            "user" => match rest.first() {
                Some(id) => Ok(Command::User { id: id.clone() }),
                None => bail!("user requires an id"),
            },
            "gate" => match rest.first() {
                Some(path) => Ok(Command::Gate { path: path.clone() }),
                None => bail!("gate requires a path"),
            },
            other => bail!("Unknown command: {}", other),
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}

pub async fn run(command: Command, session: &SessionManager, config: &mut Config) -> Result<()> {
    match command {
        Command::Help => Ok(()),
        Command::Login { email } => login(session, config, email).await,
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            status(session);
            Ok(())
        }
        Command::Refresh => {
            let token = session.refresh_token().await.context("Token refresh failed")?;
            println!("Token refreshed, expires at {}", token.expires_at());
            Ok(())
        }
        Command::Users { page, limit } => {
            let params = PaginationParams {
                page,
                limit,
                ..PaginationParams::default()
            };
            let users = UserService::new(session.client().clone())
                .list(&params)
                .await
                .context("Failed to list users")?;
            println!("{}", serde_json::to_string_pretty(&users)?);
            Ok(())
        }
        Command::User { id } => {
            let user = UserService::new(session.client().clone())
                .get(&id)
                .await
                .with_context(|| format!("Failed to fetch user {}", id))?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(())
        }
        Command::Gate { path } => {
            match RouteGate::new().decide(&path, session.status()) {
                GateDecision::Loading => println!("loading"),
                GateDecision::Allow => println!("allow"),
                GateDecision::Redirect { location } => println!("redirect {}", location),
                GateDecision::Reject { status, body } => println!("reject {} {}", status, body),
            }
            Ok(())
        }
    }
}

async fn login(session: &SessionManager, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    match session.login(&email, &password).await {
        Ok(token) => {
            println!("Logged in, session expires at {}", token.expires_at());
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            Ok(())
        }
        Err(AuthError::InvalidCredentials) => bail!("Invalid email or password"),
        Err(e) => Err(e).context("Login failed"),
    }
}

fn status(session: &SessionManager) {
    let state = session.state();
    let label = match state {
        SessionState::Unauthenticated => "not logged in",
        SessionState::Authenticating => "logging in",
        SessionState::Authenticated => "logged in",
        SessionState::Expired => "session expired",
    };
    println!("{}", label);
    println!(
        "api {} (timeout {} ms)",
        session.client().base_url(),
        session.client().timeout().as_millis()
    );
    if let Some(token) = session.token() {
        if state == SessionState::Authenticated {
            println!(
                "expires at {} ({} min left)",
                token.expires_at(),
                token.minutes_until_expiry(Utc::now())
            );
        }
    }
}
