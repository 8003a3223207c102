//! ringbook server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) and
//! `RINGBOOK_*` environment variables, opens the SQLite store, and serves
//! the JSON API over HTTP.
//!
//! # Staff accounts
//!
//! Staff cannot sign up through the API. Create one from the command line:
//!
//! ```
//! cargo run -p ringbook-server -- --add-staff admin +918123456789
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use ringbook_core::{PhoneNormalizer, Phonebook, phonebook::NewUserInput};
use ringbook_server::ServerConfig;
use ringbook_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Ringbook phone directory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Register a staff user with USERNAME and PHONE, print its id, and exit.
  #[arg(long, num_args = 2, value_names = ["USERNAME", "PHONE"])]
  add_staff: Option<Vec<String>>,

  /// Email for the staff user created with `--add-staff`.
  #[arg(long, requires = "add_staff")]
  email: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("RINGBOOK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let normalizer = PhoneNormalizer::new(&server_cfg.default_region)
    .context("invalid default_region")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let phonebook = Arc::new(Phonebook::new(store, normalizer));

  // Helper mode: create a staff user and exit.
  if let Some(args) = cli.add_staff {
    let [username, phone] = <[String; 2]>::try_from(args)
      .map_err(|_| anyhow::anyhow!("--add-staff takes USERNAME and PHONE"))?;
    let user = phonebook
      .register_user(NewUserInput { username, phone, email: cli.email, is_staff: true })
      .await
      .context("failed to register staff user")?;
    println!("{}", user.user_id);
    return Ok(());
  }

  let address = server_cfg.address();

  tracing::info!(
    region = ?phonebook.normalizer().region(),
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let app = ringbook_server::router(phonebook);
  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
