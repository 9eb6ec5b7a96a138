use depcon::cli;
use env_logger::{Builder, Env};
use log::error;
use std::process::exit;

fn main() {
    let args = cli::parse_args();

    // RUST_LOG wins over the verbosity flags
    Builder::from_env(Env::default().default_filter_or(args.verbosity.log_filter()))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = cli::execute(&args) {
        error!("Error: {}", e);
        exit(1);
    }
}
