use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use tracing::{info, warn};

use tourbook_core::models::DetailTourRequest;
use tourbook_core::{
    Access, ApiClient, ApiError, Config, NavShell, Requirement, Role, RouteGuard, SessionError,
    SessionStore,
};

pub const USAGE: &str = "\
Usage: tourbook <command>

Commands:
  status               Show the current session
  login [TOKEN]        Install a bearer token (prompted for, or TOURBOOK_TOKEN, if omitted)
  logout               End the session
  guard <PATH>         Show whether PATH may be entered
  nav                  Show the navigation shell for the session
  orders               List your orders with totals
  tours                List tours
  transporters         List transporters
  create-tour <FILE>   Schedule a detail tour from a JSON file (admin)
  watch                Keep the session alive until it expires or Ctrl-C
  help                 Show this message";

const ENV_TOKEN: &str = "TOURBOOK_TOKEN";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Status,
    Login(Option<String>),
    Logout,
    Guard(String),
    Nav,
    Orders,
    Tours,
    Transporters,
    CreateTour(PathBuf),
    Watch,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let command = match args.next() {
            None | Some("status") => Command::Status,
            Some("login") => Command::Login(args.next().map(str::to_string)),
            Some("logout") => Command::Logout,
            Some("guard") => match args.next() {
                Some(path) => Command::Guard(path.to_string()),
                None => bail!("guard needs a path"),
            },
            Some("nav") => Command::Nav,
            Some("orders") => Command::Orders,
            Some("tours") => Command::Tours,
            Some("transporters") => Command::Transporters,
            Some("create-tour") => match args.next() {
                Some(file) => Command::CreateTour(PathBuf::from(file)),
                None => bail!("create-tour needs a JSON file"),
            },
            Some("watch") => Command::Watch,
            Some("help" | "-h" | "--help") => Command::Help,
            Some(other) => bail!("Unknown command: {}", other),
        };
        if let Some(extra) = args.next() {
            bail!("Unexpected argument: {}", extra);
        }
        Ok(command)
    }
}

pub struct Context {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub api: ApiClient,
}

impl Context {
    fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.clone())
    }

    fn authed_api(&self) -> ApiClient {
        self.api.for_session(&self.session)
    }

    /// Deny with a message unless `requirement` holds.
    fn require(&self, requirement: Requirement) -> Result<()> {
        match self.guard().check(requirement) {
            Access::Allow => Ok(()),
            Access::RedirectToLogin => bail!("Not logged in. Run `tourbook login` first."),
            Access::Forbidden => bail!("This command is for administrators only."),
        }
    }

    /// End the session if the backend rejected our token. A 403 keeps it.
    fn handle_api_error(&self, err: anyhow::Error) -> anyhow::Error {
        let (expired, forbidden) = match err.downcast_ref::<ApiError>() {
            Some(api) => (api.requires_login(), matches!(api, ApiError::Forbidden(_))),
            None => (false, false),
        };
        if expired {
            warn!("Backend rejected the session token");
            self.session.logout();
            return err.context("Authentication error. Please login again.");
        }
        if forbidden {
            return err.context("Your account may not do this.");
        }
        err
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_token(arg: Option<String>) -> Result<String> {
    if let Some(token) = arg.or_else(|| std::env::var(ENV_TOKEN).ok()) {
        return Ok(token);
    }
    let token = rpassword::prompt_password("Token: ")?;
    Ok(token)
}

pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Status => status(ctx),
        Command::Login(token) => login(ctx, token),
        Command::Logout => {
            ctx.session.logout();
            println!("Logged out");
            Ok(())
        }
        Command::Guard(path) => {
            let access = ctx.guard().check_path(&path);
            match access.redirect_path() {
                None => println!("{}: allowed", path),
                Some(to) => println!("{}: {:?}, redirect to {}", path, access, to),
            }
            Ok(())
        }
        Command::Nav => nav(ctx).await,
        Command::Orders => orders(ctx).await,
        Command::Tours => {
            let tours = ctx.authed_api().fetch_tours().await.map_err(|e| ctx.handle_api_error(e))?;
            print_json(&tours)
        }
        Command::Transporters => {
            let transporters = ctx
                .authed_api()
                .fetch_transporters()
                .await
                .map_err(|e| ctx.handle_api_error(e))?;
            print_json(&transporters)
        }
        Command::CreateTour(file) => create_tour(ctx, &file).await,
        Command::Watch => watch(ctx).await,
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn status(ctx: &Context) -> Result<()> {
    let state = ctx.session.state();
    match state.identity() {
        Some(identity) => {
            println!("Logged in as {} ({})", identity.username, identity.role);
            if let Some(claims) = ctx.session.token().and_then(|t| tourbook_core::auth::token::decode(&t).ok()) {
                if let Some(expires) = claims.expires_at() {
                    let minutes = (expires - Utc::now()).num_minutes().max(0);
                    println!("Token expires {} ({} min left)", expires.to_rfc3339(), minutes);
                }
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

fn login(ctx: &Context, token: Option<String>) -> Result<()> {
    let token = read_token(token)?;
    match ctx.session.login(&token) {
        Ok(claims) => {
            println!("Logged in as {} ({})", claims.username, claims.role);
            Ok(())
        }
        Err(SessionError::ExpiredToken) => bail!("Token is expired"),
        Err(e) => Err(e).context("Login failed"),
    }
}

async fn nav(ctx: &Context) -> Result<()> {
    let state = ctx.session.state();
    let mut order_count = 0;
    if state.is_authenticated() && !state.has_role(Role::Admin) {
        match ctx.authed_api().fetch_orders().await {
            Ok(orders) => order_count = orders.len(),
            Err(e) => warn!(error = %e, "Failed to fetch order count"),
        }
    }
    print_json(&NavShell::for_state(&state, order_count))
}

async fn orders(ctx: &Context) -> Result<()> {
    ctx.require(Requirement::Authenticated)?;
    let orders = ctx.authed_api().fetch_orders().await.map_err(|e| ctx.handle_api_error(e))?;
    let summary = tourbook_core::models::OrderSummary::from_orders(&orders);

    let mut out = io::stdout().lock();
    for order in &orders {
        writeln!(
            out,
            "#{:<6} {:<12} {:<16} {:>3} people  ${:.2}",
            order.id,
            order.parsed_date().map(|d| d.to_string()).unwrap_or_else(|| "N/A".into()),
            order.typeoforder_name.as_deref().unwrap_or("-"),
            order.numberpeople,
            order.totalprice,
        )?;
    }
    writeln!(
        out,
        "{} orders, {} people, ${:.2} total",
        summary.count, summary.total_people, summary.total_amount
    )?;
    Ok(())
}

async fn create_tour(ctx: &Context, file: &Path) -> Result<()> {
    ctx.require(Requirement::Role(Role::Admin))?;

    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let request: DetailTourRequest = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    request.validate()?;

    let api = ctx.authed_api();
    let (tours, transporters) = api
        .fetch_create_tour_options()
        .await
        .map_err(|e| ctx.handle_api_error(e))?;
    if !tours.iter().any(|t| t.id == request.tour_id) {
        bail!("Unknown tour id {}", request.tour_id);
    }
    if !transporters.iter().any(|t| t.id == request.transportertourid) {
        bail!("Unknown transporter id {}", request.transportertourid);
    }

    let message = api
        .create_detail_tour(&request)
        .await
        .map_err(|e| ctx.handle_api_error(e))
        .context("Failed to create detail tour")?;
    info!(tour_id = request.tour_id, "Detail tour created");
    println!("{}", message.unwrap_or_else(|| "Detail tour created".to_string()));
    Ok(())
}

async fn watch(ctx: &Context) -> Result<()> {
    ctx.require(Requirement::Authenticated)?;

    let mut changes = ctx.session.subscribe();
    let _sweep = ctx.session.spawn_expiry_sweep(ctx.config.sweep_interval());
    println!("Watching session (checks every {}s, Ctrl-C to stop)", ctx.config.sweep_interval_secs);

    loop {
        tokio::select! {
            changed = changes.changed() => {
                changed?;
                if !changes.borrow_and_update().is_authenticated() {
                    println!("Session expired");
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped");
                return Ok(());
            }
        }
    }
}
