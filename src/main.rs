use clap::Parser;

use orbprint::cli::SubCommandExtend;
use orbprint::config::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    let result = match &opts.subcmd {
        SubCommand::Build(config) => config.run(&opts),
        SubCommand::Compare(config) => config.run(&opts),
        SubCommand::Extract(config) => config.run(&opts),
        SubCommand::Evaluate(config) => config.run(&opts),
        SubCommand::Render(config) => config.run(&opts),
        SubCommand::Show(config) => config.run(&opts),
    };

    if let Err(e) = result {
        eprintln!("[ERR] {:#}", e);
        std::process::exit(1);
    }
}
