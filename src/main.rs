use argh::{EarlyExit, FromArgs};
use mc_bootstrap::io_adapters::Terminal;
use mc_bootstrap::config::strict_exit_requested;
use mc_bootstrap::error::Abort;
use mc_bootstrap::{BootstrapError, Command, Config, ConfirmationGate, Dispatcher, SystemRunner};
use std::collections::HashMap;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Builds the self-hosted M compiler from scratch.
struct Cli {
    #[argh(positional)]
    /// one of: help, clean, build, repl, test
    command: Option<String>,
}

fn main() -> ExitCode {
    init_tracing();

    let vars: HashMap<String, String> = std::env::vars().collect();
    let strict = strict_exit_requested(&vars);

    let args: Vec<String> = std::env::args().collect();
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    let (name, rest) = argv.split_first().map_or(("mc", &[][..]), |(n, r)| (*n, r));

    let cli = match Cli::from_args(&[name], rest) {
        Ok(cli) => cli,
        Err(EarlyExit { output, status }) => {
            print!("{}", mc_bootstrap::dispatch::HELP);
            return match status {
                Ok(()) => ExitCode::SUCCESS,
                Err(()) => abort(&BootstrapError::Usage { message: output }.into(), strict),
            };
        }
    };

    let config = match Config::new() {
        Ok(config) => config,
        Err(err) => return abort(&err, strict),
    };

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => abort(&err, strict),
    }
}

fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    let command = match cli.command {
        None => Command::Help,
        Some(name) => match name.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                mc_bootstrap::dispatch::help(&mut stdout)?;
                return Err(err.into());
            }
        },
    };

    let gate = ConfirmationGate::new(Terminal::new()?);
    let mut dispatcher = Dispatcher::new(config, SystemRunner::from_env(), gate);
    dispatcher.dispatch(command, &mut stdout)
}

fn abort(err: &anyhow::Error, strict: bool) -> ExitCode {
    let abort = Abort::from_error(err, strict);
    eprintln!("{}", abort.message);
    ExitCode::from(abort.status)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}
