//! Application state for the interactive console.
//!
//! The console keeps a "current location" just like the web panel did. Every
//! navigation runs through the guard first; views then issue their calls
//! through the gateway, which may queue a redirect back to the login view.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use bedrock_panel_core::api::ApiClient;
use bedrock_panel_core::config::Config;
use bedrock_panel_core::navigation::{
    self, LocationNavigator, NavigationDecision, Navigator, Route, LANDING_PATH, LOGIN_PATH,
    ROTATION_PATH,
};
use bedrock_panel_core::{Session, SessionState};

use crate::views;

// ============================================================================
// Constants
// ============================================================================

/// Guard redirects followed for a single navigation before giving up.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

pub struct App {
    pub api: ApiClient,
    pub navigator: Arc<LocationNavigator>,
    pub config: Config,
    pub state: AppState,
    /// Pre-filled from the environment; used for the first login prompt only.
    pub login_password: Option<String>,
}

impl App {
    pub fn new(api: ApiClient, navigator: Arc<LocationNavigator>, config: Config) -> Self {
        let login_password = std::env::var("BEDROCK_PANEL_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        Self {
            api,
            navigator,
            config,
            state: AppState::Running,
            login_password,
        }
    }

    pub fn session(&self) -> Session {
        self.api.coordinator().store().read()
    }

    pub fn location(&self) -> String {
        self.navigator.current_path()
    }

    /// Navigate to `path`, following guard redirects and view follow-ups.
    pub async fn navigate(&mut self, path: &str) -> Result<()> {
        let mut target = path.to_string();

        loop {
            let Some(route) = resolve_target(&target, &self.session())? else {
                println!("No such view: {}", target);
                return Ok(());
            };

            self.navigator.set_current(route.path);
            info!(view = route.name, "Showing view");
            match views::show(self, route).await? {
                Some(next) => target = next.to_string(),
                None => return Ok(()),
            }
        }
    }

    /// Follow any redirect the gateway queued while a view was loading.
    pub async fn follow_pending(&mut self) -> Result<()> {
        while let Some(path) = self.navigator.take_pending() {
            self.navigate(&path).await?;
        }
        Ok(())
    }

    pub async fn handle_command(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        let (command, arg) = split_command(line);

        match command {
            "" => {}
            path if path.starts_with('/') => self.navigate(path).await?,
            "go" if !arg.is_empty() => self.navigate(arg).await?,
            "login" => self.navigate(LOGIN_PATH).await?,
            "passwd" => self.navigate(ROTATION_PATH).await?,
            "home" => self.navigate(LANDING_PATH).await?,
            "reload" => {
                let here = self.location();
                self.navigate(&here).await?;
            }
            "logout" => {
                if let Err(e) = self.api.coordinator().on_logout() {
                    warn!(error = %e, "Failed to clear session");
                    println!("Error: {}", e);
                    return Ok(());
                }
                println!("Logged out.");
                self.navigate(LOGIN_PATH).await?;
            }
            "whoami" => self.print_session(),
            "routes" => {
                for route in navigation::routes::all() {
                    let access = if route.requires_auth() { "" } else { " (public)" };
                    println!("  {:<18} {}{}", route.path, route.name, access);
                }
            }
            "start" => views::print_result(self.api.start_server().await),
            "stop" => views::print_result(self.api.stop_server().await),
            "restart" => views::print_result(self.api.restart_server().await),
            "cmd" if !arg.is_empty() => views::print_result(self.api.send_command(arg).await),
            "server" if !arg.is_empty() => {
                self.config.server_url = Some(arg.to_string());
                self.config.save()?;
                println!("Saved. The new panel address is used from the next start.");
            }
            "help" | "?" => print_help(),
            "quit" | "exit" => self.state = AppState::Quitting,
            _ => println!("Unknown command: {} (try `help`)", line),
        }

        self.follow_pending().await
    }

    fn print_session(&self) {
        let state = match self.session().state() {
            SessionState::Unauthenticated => "logged out",
            SessionState::Authenticated => "logged in",
            SessionState::AuthenticatedPendingRotation => "logged in, password change required",
        };
        println!("Panel:    {}", self.config.server_url());
        println!("Session:  {}", state);
        println!("Location: {}", self.location());
    }

    pub fn prompt(&self) -> Result<()> {
        print!("bedrock-panel:{}> ", self.location());
        io::stdout().flush()?;
        Ok(())
    }
}

/// Apply the guard to `path` until it settles on a route `session` may see.
/// `None` for a path with no view.
fn resolve_target(path: &str, session: &Session) -> Result<Option<&'static Route>> {
    let mut target = path;

    for _ in 0..=MAX_REDIRECTS {
        let Some(route) = navigation::resolve(target) else {
            return Ok(None);
        };
        match navigation::evaluate(route, session) {
            NavigationDecision::Proceed => return Ok(Some(route)),
            NavigationDecision::Redirect(next) => {
                debug!(from = route.path, to = next, "Guard redirect");
                target = next;
            }
        }
    }

    anyhow::bail!("Redirect loop while navigating to {}", path)
}

/// Split a shell line into the command word and the rest.
fn split_command(line: &str) -> (&str, &str) {
    match line.trim().split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line.trim(), ""),
    }
}

fn print_help() {
    println!("Navigation:");
    println!("  /<view> | go <path>   open a view (see `routes`)");
    println!("  home | reload         open the dashboard / reopen the current view");
    println!("Session:");
    println!("  login | logout        log in / log out");
    println!("  passwd                change the panel password");
    println!("  whoami                show session state");
    println!("Server:");
    println!("  start | stop | restart");
    println!("  cmd <command>         send a console command");
    println!("  server <url>          set the panel address");
    println!("  quit");
}
