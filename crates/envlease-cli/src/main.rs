//! envlease command-line client.
//!
//! Provides the `envlease` binary, which runs lease operations directly
//! against a SQLite lease database. It uses the same
//! `ReservationCoordinator` as the HTTP server, so both entry points share
//! identical semantics. Results are printed to stdout as JSON.
//!
//! Admin-only subcommands (`create`, `delete`, `release --force`) check the
//! caller against the admins stored in the database, seeded from
//! `ENVLEASE_ADMINS`.

use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use envlease_core::{parse_duration_minutes, AuditQuery, CoreError, ResourceId, SystemClock, UserId};
use envlease_server::admin::{AdminCommand, AdminError, AdminService, Authorizer};
use envlease_server::config::ServerConfig;
use envlease_server::coordinator::{ReservationCoordinator, ResourceFilter};
use envlease_server::error::CoordinatorError;
use envlease_server::notify::TracingNotifier;
use envlease_storage::SqliteStore;

/// Time-bounded reservations of shared build environments.
#[derive(Parser)]
#[command(name = "envlease", about = "Reserve, release and watch shared environments")]
struct Cli {
    /// Path to the lease database file (default: $ENVLEASE_DB_PATH or envlease.db).
    #[arg(short, long, global = true)]
    db: Option<String>,

    /// Identity to act as.
    #[arg(short, long, global = true, env = "USER", default_value = "anonymous")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create a resource (admin).
    Create { name: String },

    /// Delete a resource (admin).
    Delete { name: String },

    /// Reserve a resource.
    Reserve {
        name: String,
        /// Duration such as 90, 45m, 2h or 1h12m.
        #[arg(long = "for", default_value = "1h")]
        duration: String,
    },

    /// Release a resource you hold.
    Release {
        name: String,
        /// Release someone else's lease (admin).
        #[arg(long)]
        force: bool,
    },

    /// Show whether a resource is held.
    Status { name: String },

    /// Get notified when a resource is released or taken.
    Watch {
        name: String,
        #[arg(long = "for", default_value = "1h")]
        duration: String,
    },

    /// Stop watching a resource.
    Unwatch { name: String },

    /// List resources.
    List {
        /// all, reserved or available.
        #[arg(long, default_value = "all")]
        filter: String,
        /// Only names starting with this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Show reservation (or watch) history, most recent first.
    Logs {
        #[arg(long)]
        resource: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Show watch history instead of reservations.
        #[arg(long)]
        watches: bool,
    },
}

/// A failed command and the exit code it maps to.
///
/// Exit codes: 1 = domain failure (bad input, rule violation, forbidden),
/// 3 = store failure.
#[derive(Debug)]
struct Failure {
    code: i32,
    message: String,
}

impl Failure {
    fn domain(message: impl Into<String>) -> Self {
        Failure {
            code: 1,
            message: message.into(),
        }
    }
}

impl From<CoordinatorError> for Failure {
    fn from(err: CoordinatorError) -> Self {
        Failure {
            code: if err.is_retryable() { 3 } else { 1 },
            message: err.to_string(),
        }
    }
}

impl From<AdminError> for Failure {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Coordinator(inner) => inner.into(),
            other => Failure::domain(other.to_string()),
        }
    }
}

impl From<CoreError> for Failure {
    fn from(err: CoreError) -> Self {
        Failure::domain(err.to_string())
    }
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,envlease_server::notify=info")),
        )
        .try_init();

    let cli = Cli::parse();
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    process::exit(run(cli, config));
}

/// Opens the database, executes one subcommand, prints the result.
///
/// Returns the process exit code.
fn run(cli: Cli, config: ServerConfig) -> i32 {
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    tracing::debug!(db = %db_path, user = %cli.user, "running command");

    let store = match SqliteStore::new(&db_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Error: failed to open database '{}': {}", db_path, e);
            return 3;
        }
    };
    let authorizer = match Authorizer::seeded(store.clone(), config.admins.clone()) {
        Ok(a) => Arc::new(a),
        Err(e) => {
            eprintln!("Error: failed to load admins: {}", e);
            return 3;
        }
    };

    let coordinator = match ReservationCoordinator::from_backend(
        store,
        Arc::new(TracingNotifier),
        Arc::new(SystemClock),
        config.coordinator.clone(),
    ) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error: {}", e);
            return Failure::from(e).code;
        }
    };
    let admin = AdminService::new(Arc::clone(&coordinator), authorizer);

    let result = UserId::new(cli.user.clone())
        .map_err(Failure::from)
        .and_then(|user| execute(&coordinator, &admin, &user, cli.command));

    match result {
        Ok(value) => {
            let json = serde_json::to_string_pretty(&value).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize result: {}\"}}", e)
            });
            println!("{}", json);
            0
        }
        Err(failure) => {
            eprintln!("Error: {}", failure.message);
            failure.code
        }
    }
}

fn execute(
    coordinator: &ReservationCoordinator,
    admin: &AdminService,
    user: &UserId,
    command: Commands,
) -> Result<serde_json::Value, Failure> {
    let value = match command {
        Commands::Create { name } => {
            let outcome = admin.execute(user, AdminCommand::CreateResource(ResourceId::new(name)?))?;
            to_json(&outcome)
        }
        Commands::Delete { name } => {
            let outcome = admin.execute(user, AdminCommand::DeleteResource(ResourceId::new(name)?))?;
            to_json(&outcome)
        }
        Commands::Reserve { name, duration } => {
            let minutes = parse_duration_minutes(&duration)?;
            to_json(&coordinator.reserve(&ResourceId::new(name)?, user, minutes)?)
        }
        Commands::Release { name, force } => {
            let name = ResourceId::new(name)?;
            if force {
                to_json(&admin.execute(user, AdminCommand::ForceRelease(name))?)
            } else {
                to_json(&coordinator.release(&name, user, false)?)
            }
        }
        Commands::Status { name } => {
            let name = ResourceId::new(name)?;
            let status = coordinator.status(&name)?;
            serde_json::json!({ "name": name, "status": status })
        }
        Commands::Watch { name, duration } => {
            let minutes = parse_duration_minutes(&duration)?;
            let name = ResourceId::new(name)?;
            let until = coordinator.watch(&name, user, minutes)?;
            serde_json::json!({ "resource": name, "watcher": user, "until": until })
        }
        Commands::Unwatch { name } => {
            let name = ResourceId::new(name)?;
            let was_watching = coordinator.unwatch(&name, user)?;
            serde_json::json!({ "resource": name, "was_watching": was_watching })
        }
        Commands::List { filter, prefix } => {
            let filter: ResourceFilter = filter.parse().map_err(Failure::domain)?;
            to_json(&coordinator.list_resources(filter, prefix.as_deref())?)
        }
        Commands::Logs {
            resource,
            subject,
            watches,
        } => {
            let query = AuditQuery {
                resource: resource.map(ResourceId::new).transpose()?,
                subject: subject.map(UserId::new).transpose()?,
            };
            let entries = if watches {
                coordinator.watch_log(&query)?
            } else {
                coordinator.reservation_log(&query)?
            };
            to_json(&entries)
        }
    };
    Ok(value)
}

fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, ServerConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            db_path: dir.path().join("cli.db").to_str().unwrap().to_string(),
            admins: vec![UserId::new("root").unwrap()],
            ..ServerConfig::default()
        };
        (dir, config)
    }

    fn cli(user: &str, args: &[&str]) -> Cli {
        let mut argv = vec!["envlease", "--user", user];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_reserve_conflict_and_release_exit_codes() {
        let (_dir, config) = setup();
        assert_eq!(run(cli("root", &["create", "env-a"]), config.clone()), 0);
        assert_eq!(
            run(cli("alice", &["reserve", "env-a", "--for", "1h12m"]), config.clone()),
            0
        );
        assert_eq!(run(cli("bob", &["reserve", "env-a"]), config.clone()), 1);
        assert_eq!(run(cli("bob", &["release", "env-a"]), config.clone()), 1);
        assert_eq!(run(cli("alice", &["release", "env-a"]), config), 0);
    }

    #[test]
    fn test_admin_only_commands() {
        let (_dir, config) = setup();
        assert_eq!(run(cli("alice", &["create", "env-a"]), config.clone()), 1);
        assert_eq!(run(cli("root", &["create", "env-a"]), config.clone()), 0);
        assert_eq!(run(cli("alice", &["reserve", "env-a"]), config.clone()), 0);
        assert_eq!(
            run(cli("bob", &["release", "env-a", "--force"]), config.clone()),
            1
        );
        assert_eq!(
            run(cli("root", &["release", "env-a", "--force"]), config),
            0
        );
    }

    #[test]
    fn test_admin_granted_elsewhere_is_honoured() {
        use envlease_storage::AdminStore;

        let (_dir, config) = setup();
        assert_eq!(run(cli("bob", &["create", "env-a"]), config.clone()), 1);

        // A grant made by the server lands in the same database.
        SqliteStore::new(&config.db_path)
            .unwrap()
            .grant_admin(&UserId::new("bob").unwrap())
            .unwrap();
        assert_eq!(run(cli("bob", &["create", "env-a"]), config), 0);
    }

    #[test]
    fn test_bad_input_is_domain_failure() {
        let (_dir, config) = setup();
        assert_eq!(run(cli("root", &["create", "env-a"]), config.clone()), 0);
        assert_eq!(
            run(cli("alice", &["reserve", "env-a", "--for", "soon"]), config.clone()),
            1
        );
        assert_eq!(
            run(cli("alice", &["list", "--filter", "busy"]), config.clone()),
            1
        );
        assert_eq!(run(cli("alice", &["status", "missing-env"]), config), 1);
    }

    #[test]
    fn test_unopenable_database_is_store_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            // A directory cannot be opened as a database file.
            db_path: dir.path().to_str().unwrap().to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(run(cli("alice", &["list"]), config), 3);
    }
}
