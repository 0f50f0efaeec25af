//! Command-line parsing for the migration front-end.

/// A parsed CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `migrate:make <name>`
    Make { name: String },
    /// `migrate:up`
    Up,
    /// `migrate:down`
    Down,
    /// `--help` / no arguments
    Help,
}

/// Parse `argv` (including the program name at index 0).
pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help);
    };

    let command = match first.as_str() {
        "-h" | "--help" => Command::Help,
        "migrate:make" => {
            let Some(name) = it.next() else {
                anyhow::bail!("migrate:make requires a migration name");
            };
            Command::Make { name: name.clone() }
        }
        "migrate:up" => Command::Up,
        "migrate:down" => Command::Down,
        other => anyhow::bail!("unknown command: {other}"),
    };

    if let Some(extra) = it.next() {
        anyhow::bail!("unexpected argument: {extra}");
    }
    Ok(command)
}

pub fn print_help() {
    println!(
        "\
pgquill - schema migrations

USAGE:
  <app> migrate:make <name>   Scaffold a new migration source file
  <app> migrate:up            Apply all pending migrations as one batch
  <app> migrate:down          Roll back the newest batch
  <app> --help                Print this help

Migration names must match [A-Za-z_][A-Za-z0-9_]*."
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        std::iter::once("app")
            .chain(parts.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_each_command() {
        assert_eq!(parse_args(&args(&[])).unwrap(), Command::Help);
        assert_eq!(parse_args(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(parse_args(&args(&["migrate:up"])).unwrap(), Command::Up);
        assert_eq!(parse_args(&args(&["migrate:down"])).unwrap(), Command::Down);
        assert_eq!(
            parse_args(&args(&["migrate:make", "create_users"])).unwrap(),
            Command::Make {
                name: "create_users".to_string()
            }
        );
    }

    #[test]
    fn make_requires_a_name() {
        assert!(parse_args(&args(&["migrate:make"])).is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse_args(&args(&["migrate:sideways"])).is_err());
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(parse_args(&args(&["migrate:up", "now"])).is_err());
    }
}
