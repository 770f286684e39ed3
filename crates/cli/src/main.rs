use clap::Parser;

mod args;
mod commands;

use args::{Args, Commands};

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Commands::Info(info) => {
            let summary = commands::info(&info.path)?;
            print!("{summary}");
        }
        Commands::Convert(convert) => commands::convert(&convert)?,
    }
    Ok(())
}
