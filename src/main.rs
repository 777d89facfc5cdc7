// rawtx - key generation, transaction signing and broadcast

use clap::Parser;
use rawtx_wallet::{Cli, CliHandler, Network};

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let handler = CliHandler::new(Network::from_testnet_flag(cli.testnet));

    if let Err(e) = handler.handle(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
