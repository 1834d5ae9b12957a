//! One function per console view. Each view fetches what it shows through
//! the API client and prints it; the login and password views may hand back
//! a follow-up location.

use std::io::{self, Write};

use anyhow::Result;
use serde_json::Value;

use bedrock_panel_core::api::ApiError;
use bedrock_panel_core::navigation::{Route, LANDING_PATH, LOGIN_PATH, ROTATION_PATH};

use crate::app::App;

/// Render `route`. Returns where to go next, if anywhere.
pub async fn show(app: &mut App, route: &Route) -> Result<Option<&'static str>> {
    println!("== {} ==", route.name);

    match route.path {
        LOGIN_PATH => return login(app).await,
        ROTATION_PATH => return change_password(app).await,
        LANDING_PATH => {
            print_section("Server", app.api.server_status().await);
            print_section("Console", app.api.interaction_status().await);
        }
        "/config" => print_result(app.api.server_config().await),
        "/players" => print_result(app.api.allowlist().await),
        "/permissions" => print_result(app.api.permissions().await),
        "/worlds" => print_result(app.api.worlds().await),
        "/resource-packs" => print_result(app.api.resource_packs().await),
        "/versions" => print_result(app.api.server_versions().await),
        "/commands" => {
            print_section("Quick commands", app.api.quick_commands(None).await);
            print_section("History", app.api.command_history(None).await);
        }
        "/logs" => print_result(app.api.logs(None).await),
        "/performance" => print_result(app.api.performance().await),
        other => println!("Nothing to show for {}", other),
    }
    Ok(None)
}

async fn login(app: &mut App) -> Result<Option<&'static str>> {
    let password = match app.login_password.take() {
        Some(password) => password,
        None => rpassword::prompt_password("Panel password: ")?,
    };

    match app.api.login(&password).await {
        Ok(outcome) => {
            if outcome.rotation_required {
                println!("Logged in. The panel is using its default password; change it now.");
            } else {
                println!("Logged in.");
            }
            // The guard sends a session holder on to the right place.
            Ok(Some(LOGIN_PATH))
        }
        Err(e) => {
            print_error(&e);
            println!("Type `login` to try again.");
            Ok(None)
        }
    }
}

async fn change_password(app: &mut App) -> Result<Option<&'static str>> {
    if app.session().password_rotation_required {
        println!("You are using the default password. Choose a strong one to continue.");
    }
    println!("At least 8 characters, with upper and lower case letters, a digit and a symbol.");

    let current = rpassword::prompt_password("Current password: ")?;
    let new = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Confirm new password: ")?;

    match app.api.change_password(&current, &new, &confirm).await {
        Ok(()) => {
            println!("Password changed.");
            Ok(Some(LANDING_PATH))
        }
        Err(e) => {
            print_error(&e);
            println!("Type `passwd` to try again.");
            Ok(None)
        }
    }
}

pub fn print_result(result: Result<Value, ApiError>) {
    match result {
        Ok(value) => print_json(&value),
        Err(e) => print_error(&e),
    }
}

fn print_section(title: &str, result: Result<Value, ApiError>) {
    println!("-- {} --", title);
    print_result(result);
}

fn print_json(value: &Value) {
    match value {
        Value::Null => println!("OK"),
        Value::String(s) => println!("{}", s),
        other => match serde_json::to_string_pretty(other) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", other),
        },
    }
    let _ = io::stdout().flush();
}

pub fn print_error(error: &ApiError) {
    match error {
        ApiError::AuthorizationRejected => {
            println!("Your session is no longer valid. Please log in again.")
        }
        ApiError::InvalidCredentials => println!("Wrong password."),
        ApiError::RateLimited(info) => {
            println!("Too many failed login attempts; login is temporarily blocked.");
            if let Some(until) = &info.blocked_until {
                println!("Blocked until: {}", until);
            }
            if let Some(secs) = info.retry_after {
                println!("Retry after {} seconds.", secs);
            }
        }
        other => println!("Error: {}", other),
    }
}
