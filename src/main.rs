use clap::Parser;
use egts_updater::cli;
use egts_updater::core::{EXIT_USAGE, user_friendly_error};

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also arrive here and go to stdout
            std::process::exit(if e.use_stderr() { EXIT_USAGE } else { 0 });
        }
    };

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        std::process::exit(error_ctx.exit_code);
    }
}
