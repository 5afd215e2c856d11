//! Feedback portal server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `PORTAL_*`
//! environment variables, opens the SQLite store, and serves the portal over
//! HTTP.
//!
//! # Accounts
//!
//! Accounts live in the store. To create one:
//!
//! ```
//! cargo run -p portal-web --bin server -- add-account --email student@example.edu
//! ```
//!
//! The account whose email equals `admin_email` in the config is the admin.

use std::{
  ffi::OsString,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, ensure};
use clap::{Parser, Subcommand};
use portal_core::feedback::validate_subjects;
use portal_store_sqlite::SqliteStore;
use portal_web::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Student feedback portal server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Create an account; the password is read from stdin.
  AddAccount {
    #[arg(long)]
    email: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = load_config(cli.config, environment())?;

  let store_path = expand_home(&server_cfg.store_path, std::env::var_os("HOME"));
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(Command::AddAccount { email }) = cli.command {
    let password = read_password()?;
    let identity = store.add_account(&email, &password).await?;
    println!("{} {}", identity.uid, identity.email);
    return Ok(());
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = portal_web::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// `PORTAL_*` variables. `PORTAL_SUBJECTS` is a comma-separated list.
fn environment() -> config::Environment {
  config::Environment::with_prefix("PORTAL")
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("subjects")
}

/// Layer defaults, the config file at `path` and `env`, in that order.
fn load_config(path: PathBuf, env: config::Environment) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "~/.local/share/portal/portal.db")?
    .add_source(config::File::from(path).required(false))
    .add_source(env)
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig (is admin_email set?)")?;
  validate_subjects(&server_cfg.subjects).context("invalid subjects in config")?;
  Ok(server_cfg)
}

/// Prompt on stderr and read one line of stdin as the new account's password.
fn read_password() -> anyhow::Result<String> {
  use std::io::BufRead as _;

  eprint!("Password for the new account: ");
  let mut line = String::new();
  std::io::stdin().lock().read_line(&mut line).context("failed to read stdin")?;
  let password = line.trim_end_matches(['\r', '\n']).to_owned();
  ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}

/// Resolve a `~` first component against `home`. Other paths are unchanged.
fn expand_home(path: &Path, home: Option<OsString>) -> PathBuf {
  match (path.strip_prefix("~"), home) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string()));
    environment().source(Some(vars.collect()))
  }

  #[test]
  fn subjects_and_port_come_from_environment() {
    let cfg = load_config(
      PathBuf::from("does-not-exist.toml"),
      env(&[
        ("PORTAL_ADMIN_EMAIL", "admin@portal.test"),
        ("PORTAL_SUBJECTS", "Math,Art,History,Music,Physics"),
        ("PORTAL_PORT", "9000"),
      ]),
    )
    .unwrap();
    assert_eq!(cfg.subjects, ["Math", "Art", "History", "Music", "Physics"]);
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
  }

  #[test]
  fn missing_admin_email_is_an_error() {
    assert!(load_config(PathBuf::from("does-not-exist.toml"), env(&[])).is_err());
  }

  #[test]
  fn duplicate_subjects_are_rejected() {
    let result = load_config(
      PathBuf::from("does-not-exist.toml"),
      env(&[("PORTAL_ADMIN_EMAIL", "a@b.c"), ("PORTAL_SUBJECTS", "Math,Math")]),
    );
    assert!(result.is_err());
  }

  #[test]
  fn home_is_expanded_only_in_first_component() {
    let home = Some(OsString::from("/home/ada"));
    assert_eq!(
      expand_home(Path::new("~/.local/portal.db"), home.clone()),
      PathBuf::from("/home/ada/.local/portal.db")
    );
    assert_eq!(expand_home(Path::new("/srv/portal.db"), home.clone()), PathBuf::from("/srv/portal.db"));
    assert_eq!(expand_home(Path::new("~ada/portal.db"), home), PathBuf::from("~ada/portal.db"));
    assert_eq!(expand_home(Path::new("~/portal.db"), None), PathBuf::from("~/portal.db"));
  }

  #[test]
  fn cli_has_only_the_add_account_command() {
    assert!(Cli::try_parse_from(["server", "--hash-password"]).is_err());

    let cli = Cli::try_parse_from(["server", "add-account", "--email", "s@portal.test"]).unwrap();
    assert!(matches!(&cli.command, Some(Command::AddAccount { email }) if email == "s@portal.test"));
    assert_eq!(cli.config, PathBuf::from("config.toml"));
  }
}
