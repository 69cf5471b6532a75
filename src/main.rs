//! `casi` binary: load config, assemble the router, serve HTTP until Ctrl-C.
//!
//! ```text
//! casi [-f PATH] [--bind ADDR] [-v…] [--check]
//! ```

use casi::bootstrap::logger::{self, LogLevel};
use casi::{bootstrap, comms, config, error::AppError};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::level_filters::LevelFilter;

const USAGE: &str = "\
Usage: casi [OPTIONS]

Options:
  -f, --config <PATH>   Config file (default: config/default.toml)
      --bind <ADDR>     Override [http] bind
  -v, -vv, -vvv         Log at info, debug, trace (overrides RUST_LOG)
      --check           Load config and data files, report, and exit
  -h, --help            Print this help";

#[tokio::main]
async fn main() {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(msg) => {
            eprintln!("error: {msg}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if let Err(e) = run(options).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(options: Options) -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let mut config = config::load(options.config_path.as_deref())?;
    if let Some(bind) = options.bind {
        config.http.bind = bind;
    }

    let level = match options.verbosity {
        Some(level) => LogLevel::Flag(level),
        None => LogLevel::Configured(logger::parse_level(&config.log_level)?),
    };
    let directives = logger::init(level)?;
    info!(
        service = %config.service_name,
        bind = %config.http.bind,
        log_level = %config.log_level,
        log_directives = %directives,
        "casi starting"
    );

    let state = bootstrap::assemble(&config)?;
    if options.check {
        let router = &state.router;
        println!(
            "ok: {} knowledge records, {} company urls, search={}, completion={}",
            router.knowledge().len(),
            router.company_urls().len(),
            router.search().backend().name(),
            router.llm().map_or("none", |llm| llm.name()),
        );
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c: draining connections");
            on_ctrl_c.cancel();
        }
    });

    comms::serve(&config.http.bind, state, shutdown).await
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    config_path: Option<String>,
    bind: Option<String>,
    verbosity: Option<LevelFilter>,
    check: bool,
}

impl Options {
    /// `Ok(None)` means help was requested.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, String> {
        let mut options = Options::default();
        let mut vs = 0usize;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "-f" | "--config" => {
                    options.config_path = Some(args.next().ok_or_else(|| format!("{arg} needs a path"))?);
                }
                "--bind" => options.bind = Some(args.next().ok_or("--bind needs an address")?),
                "--check" => options.check = true,
                "--verbose" => vs += 1,
                flag if flag.len() > 1 && flag.strip_prefix('-').is_some_and(|v| v.chars().all(|c| c == 'v')) => {
                    vs += flag.len() - 1;
                }
                other => return Err(format!("unexpected argument '{other}'")),
            }
        }
        options.verbosity = match vs {
            0 => None,
            1 => Some(LevelFilter::INFO),
            2 => Some(LevelFilter::DEBUG),
            _ => Some(LevelFilter::TRACE),
        };
        Ok(Some(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Options>, String> {
        Options::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn no_args_defers_to_config() {
        assert_eq!(parse(&[]).unwrap(), Some(Options::default()));
    }

    #[test]
    fn verbosity_counts_across_flags() {
        assert_eq!(parse(&["-v"]).unwrap().unwrap().verbosity, Some(LevelFilter::INFO));
        assert_eq!(parse(&["-v", "--verbose"]).unwrap().unwrap().verbosity, Some(LevelFilter::DEBUG));
        assert_eq!(parse(&["-vvvv"]).unwrap().unwrap().verbosity, Some(LevelFilter::TRACE));
    }

    #[test]
    fn paths_and_overrides() {
        let o = parse(&["-f", "casi.toml", "--bind", "0.0.0.0:9000", "--check"]).unwrap().unwrap();
        assert_eq!(o.config_path.as_deref(), Some("casi.toml"));
        assert_eq!(o.bind.as_deref(), Some("0.0.0.0:9000"));
        assert!(o.check);
    }

    #[test]
    fn help_and_errors() {
        assert_eq!(parse(&["--check", "-h"]).unwrap(), None);
        assert!(parse(&["--config"]).unwrap_err().contains("needs a path"));
        assert!(parse(&["--bind"]).is_err());
        assert!(parse(&["serve"]).unwrap_err().contains("'serve'"));
        assert!(parse(&["-x"]).is_err());
    }
}
