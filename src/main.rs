use clap::Parser;

use schemagen::cli::Args;
use schemagen::config::Config;
use schemagen::logging::init_tracing;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::resolve(args.config.as_deref())?;
    init_tracing(config.log_level());
    tracing::debug!(?config, "resolved configuration");
    let output = args.command.run(&config, args.format)?;
    println!("{}", output);
    Ok(())
}
