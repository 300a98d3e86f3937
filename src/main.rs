use anyhow::{Context, Result};

mod alert;
mod app;
mod application_lifecycle;
mod client;
mod ipc_server;
mod opts;
mod paths;
mod protocol;
mod server;

fn main() {
    let opts: opts::Opt = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder().filter(Some("irssi_icon"), log_level_filter).init();
    }

    if let Err(err) = run(opts) {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    match opts.action {
        opts::Action::SendClear => client::send_clear(&opts.endpoint),
        opts::Action::Daemon { foreground } => {
            let paths = paths::IconPaths::default().context("Failed to initialize irssi-icon paths")?;
            server::initialize_server(opts.endpoint, paths, !foreground)?;
            Ok(())
        }
    }
}
