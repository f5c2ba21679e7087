use super::args::{Cli, Commands};
use super::handlers;
use crate::config::Settings;
use crate::logging;
use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    match cli.command {
        Commands::Tail(args) => {
            let settings = Settings::load(cli.config.as_deref(), &args, cli.annotations)?;
            handlers::tail::handle(&settings, &args)
        }
        Commands::Replay(args) => {
            let settings = Settings::load(cli.config.as_deref(), &args, cli.annotations)?;
            handlers::replay::handle(&settings, &args)
        }
    }
}
