use clap::Parser;
use rc_core::cli::{self, Cli};
use rc_core::logging;

fn main() {
    let cli = Cli::parse();
    logging::init_subscriber(cli.verbosity(), cli.log_format);
    let code = cli::run(&cli);
    std::process::exit(code.as_i32());
}
