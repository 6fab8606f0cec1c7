use clap::Parser;
use gridsynth::cli::Cli;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();
    let result = cli.run();
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
