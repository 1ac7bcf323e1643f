//! Command-line argument parsing.

use anyhow::{bail, Result};

pub const USAGE: &str = "\
Usage: sok-cache <command>

Commands:
  install                       Fetch the manifest into the current cache
  fetch <url> [--method M] [--body]
                                Request a URL through the proxy
  activate                      Delete caches other than the current one
  status                        Show cache name, state and stored entries
  bump                          Move the config to the next cache version
  help                          Show this message

Environment:
  SOK_CACHE_ORIGIN              Site origin (overrides the config file)
  RUST_LOG                      Log filter, e.g. RUST_LOG=debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Install,
    Fetch {
        url: String,
        method: String,
        print_body: bool,
    },
    Activate,
    Status,
    Bump,
    Help,
}

pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    let command = match command.as_str() {
        "install" => Command::Install,
        "activate" => Command::Activate,
        "status" => Command::Status,
        "bump" => Command::Bump,
        "help" | "-h" | "--help" => Command::Help,
        "fetch" => {
            let mut url = None;
            let mut method = "GET".to_string();
            let mut print_body = false;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--body" => print_body = true,
                    "--method" => match args.next() {
                        Some(m) => method = m,
                        None => bail!("--method needs a value"),
                    },
                    flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                    _ if url.is_none() => url = Some(arg.clone()),
                    _ => bail!("Unexpected argument: {}", arg),
                }
            }
            let Some(url) = url else {
                bail!("fetch needs a URL");
            };
            return Ok(Command::Fetch {
                url,
                method,
                print_body,
            });
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    };

    if let Some(extra) = args.next() {
        bail!("Unexpected argument: {}", extra);
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(parse(&[]).unwrap(), Command::Help);
        assert_eq!(parse(&["--help"]).unwrap(), Command::Help);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse(&["install"]).unwrap(), Command::Install);
        assert_eq!(parse(&["activate"]).unwrap(), Command::Activate);
        assert_eq!(parse(&["status"]).unwrap(), Command::Status);
        assert_eq!(parse(&["bump"]).unwrap(), Command::Bump);
        assert!(parse(&["install", "now"]).is_err());
        assert!(parse(&["uninstall"]).is_err());
    }

    #[test]
    fn test_fetch_options() {
        assert_eq!(
            parse(&["fetch", "/css/styles.css"]).unwrap(),
            Command::Fetch {
                url: "/css/styles.css".to_string(),
                method: "GET".to_string(),
                print_body: false,
            }
        );
        assert_eq!(
            parse(&["fetch", "--body", "/", "--method", "head"]).unwrap(),
            Command::Fetch {
                url: "/".to_string(),
                method: "head".to_string(),
                print_body: true,
            }
        );
    }

    #[test]
    fn test_fetch_errors() {
        assert!(parse(&["fetch"]).is_err());
        assert!(parse(&["fetch", "/", "/other"]).is_err());
        assert!(parse(&["fetch", "/", "--method"]).is_err());
        assert!(parse(&["fetch", "/", "--verbose"]).is_err());
    }
}
