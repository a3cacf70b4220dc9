mod commands;
mod platform;
mod storage;
mod transport;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::edit::AddArgs;
use commands::session::Settings;

#[derive(Parser)]
#[command(name = "starvault", about = "Encrypted, offline-first universe of nested ideas")]
struct Cli {
    /// Directory holding the local vault
    #[arg(long, global = true, env = "STARVAULT_DIR", default_value = ".starvault")]
    dir: PathBuf,

    /// Remote document server (e.g. http://localhost:8080). Omit to stay offline.
    #[arg(long, global = true, env = "STARVAULT_SERVER")]
    server: Option<String>,

    /// User id the remote document is stored under. Omit to stay signed out.
    #[arg(long, global = true, env = "STARVAULT_USER")]
    user: Option<String>,

    /// Override the key-derivation salt (at least 16 bytes)
    #[arg(long, global = true, env = "STARVAULT_SALT", hide = true)]
    salt: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the starter document
    Init {
        /// Name of the root universe (defaults to the user id)
        #[arg(long)]
        name: Option<String>,
    },

    /// Print a universe as a tree, with links, wormholes and the black hole
    Show {
        /// Show the interior of this node instead of the root
        #[arg(long)]
        inside: Option<String>,
    },

    /// Add a node to a universe
    Add {
        name: String,

        /// star, galaxy, life, microbe or any other label
        #[arg(long, short, default_value = "star")]
        category: String,

        /// Node whose interior receives the new node (default: root)
        #[arg(long)]
        inside: Option<String>,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,

        #[arg(long)]
        size: Option<f64>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Link two nodes of the same universe
    Link { a: String, b: String },

    /// Open (or with --remove, close) a wormhole between any two nodes
    Wormhole {
        a: String,
        b: String,

        #[arg(long)]
        remove: bool,
    },

    /// Attach a note to a node (an empty string clears it)
    Note { node: String, text: String },

    /// Move a node and its interior into the black hole
    Banish { node: String },

    /// Bring a node back from the black hole
    Recall {
        node: String,

        /// Node whose interior receives it (default: root)
        #[arg(long)]
        into: Option<String>,
    },

    /// Destroy a black hole entry and everything inside it
    Purge {
        node: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Write the encrypted snapshot to a .universe file
    Export {
        /// Output path (default: starvault_YYYYMMDD.universe)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Replace the document with a .universe file
    Import {
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show recent activity
    Log {
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },

    /// Show vault and connection status (no password needed)
    Status,

    /// Erase the document locally and remotely
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (controlled by RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings {
        dir: cli.dir,
        server: cli.server,
        user: cli.user,
        salt: cli.salt,
    };

    let result = match cli.command {
        Commands::Init { name } => commands::init::run_init(&settings, name).await,
        Commands::Show { inside } => commands::show::run_show(&settings, inside.as_deref()).await,
        Commands::Add {
            name,
            category,
            inside,
            x,
            y,
            size,
            color,
        } => {
            let args = AddArgs {
                name,
                category,
                inside,
                x,
                y,
                size,
                color,
            };
            commands::edit::run_add(&settings, args).await
        }
        Commands::Link { a, b } => commands::edit::run_link(&settings, &a, &b).await,
        Commands::Wormhole { a, b, remove } => {
            commands::edit::run_wormhole(&settings, &a, &b, remove).await
        }
        Commands::Note { node, text } => commands::edit::run_note(&settings, &node, &text).await,
        Commands::Banish { node } => commands::edit::run_banish(&settings, &node).await,
        Commands::Recall { node, into } => {
            commands::edit::run_recall(&settings, &node, into.as_deref()).await
        }
        Commands::Purge { node, yes } => commands::edit::run_purge(&settings, &node, yes).await,
        Commands::Export { out } => commands::capsule::run_export(&settings, out).await,
        Commands::Import { file, yes } => commands::capsule::run_import(&settings, &file, yes).await,
        Commands::Log { limit } => commands::log::run_log(&settings, limit).await,
        Commands::Status => commands::status::run_status(&settings).await,
        Commands::Reset { yes } => commands::reset::run_reset(&settings, yes).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "starvault",
            "add",
            "Sun",
            "--category",
            "galaxy",
            "--x",
            "-12.5",
            "--dir",
            "/tmp/sv",
        ])
        .unwrap();
        assert_eq!(cli.dir, PathBuf::from("/tmp/sv"));
        match cli.command {
            Commands::Add { name, category, x, .. } => {
                assert_eq!(name, "Sun");
                assert_eq!(category, "galaxy");
                assert_eq!(x, -12.5);
            }
            _ => panic!("expected add"),
        }
    }
}
