//! Thin migration CLI: argument parsing plus dispatch onto a
//! caller-supplied [`Migrator`].
//!
//! The embedding application owns the binary entry point, the driver, and
//! the migration registry; this crate turns `argv` into migrator calls and
//! an exit code.
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() {
//!     let migrator = build_migrator().await;
//!     let code = pgquill_cli::run(&std::env::args().collect::<Vec<_>>(), &migrator).await;
//!     std::process::exit(code);
//! }
//! ```

mod cli;

pub use cli::{parse_args, print_help, Command};

use pgquill::Migrator;

/// Parse `args` and run the resulting command against `migrator`.
///
/// Returns the process exit code: 0 on success, 1 on any user error
/// (unknown command, invalid migration name, driver failure).
pub async fn run(args: &[String], migrator: &Migrator) -> i32 {
    let command = match cli::parse_args(args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e:#}");
            return 1;
        }
    };
    match execute(command, migrator).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e:#}");
            1
        }
    }
}

async fn execute(command: Command, migrator: &Migrator) -> anyhow::Result<()> {
    match command {
        Command::Help => cli::print_help(),
        Command::Make { name } => {
            let path = migrator.make(&name)?;
            println!("created {}", path.display());
        }
        Command::Up => {
            let applied = migrator.up().await?;
            if applied.is_empty() {
                println!("nothing to migrate");
            } else {
                for name in &applied {
                    println!("applied {name}");
                }
            }
        }
        Command::Down => {
            let rolled_back = migrator.down().await?;
            if rolled_back.is_empty() {
                println!("nothing to roll back");
            } else {
                for name in &rolled_back {
                    println!("rolled back {name}");
                }
            }
        }
    }
    Ok(())
}
