// Entrypoint for the points sender.
// - Keeps `main` small: load config and token, build the API client and hand
//   it to one interactive session.
// - A missing token is the only failure that changes the exit status.

use std::process;

use log::{error, info};
use points_sender::api::ApiClient;
use points_sender::config::Config;
use points_sender::credentials::load_token;
use points_sender::session::Session;
use points_sender::ui::TerminalConsole;

fn main() -> anyhow::Result<()> {
    init_logger();
    println!("Points Sender Starting...");

    let config = Config::from_env();
    let token = match load_token(&config.token_path) {
        Ok(token) => token,
        Err(e) => {
            error!("credential load failed: {}", e);
            eprintln!("Error reading {}", e);
            process::exit(1);
        }
    };

    let api = match ApiClient::new(&config.base_url, &token) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error creating API client: {}", e);
            process::exit(1);
        }
    };
    info!("using API at {}", api.base_url());

    let mut console = TerminalConsole::new();
    let outcome = Session::new(&api, &mut console)
        .strict_recipient_check(config.strict_recipient_check)
        .run()?;
    info!("session finished: {:?}", outcome);
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}
