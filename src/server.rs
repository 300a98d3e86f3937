use crate::{
    app::{App, IconState},
    application_lifecycle,
    ipc_server::{Endpoint, IpcServer},
    paths::IconPaths,
};
use anyhow::{Context, Result};
use std::{os::unix::io::AsRawFd, path::Path};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ForkResult {
    Parent,
    Child,
}

/// Bring up the daemon: optionally detach from the terminal, install signal
/// handlers, then run the notification channel and the dispatch loop on a
/// single-threaded runtime until a clear shutdown is requested.
pub fn initialize_server(endpoint: Endpoint, paths: IconPaths, should_daemonize: bool) -> Result<ForkResult> {
    if should_daemonize {
        let fork_result = do_detach(paths.get_log_file())?;

        if fork_result == ForkResult::Parent {
            return Ok(ForkResult::Parent);
        }
    }

    simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], move |_| {
        log::info!("Shutting down irssi-icon daemon...");
        if let Err(e) = application_lifecycle::send_exit() {
            log::error!("Failed to send application shutdown event to workers: {:?}", e);
            std::process::exit(1);
        }
    });

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to initialize tokio runtime")?;

    rt.block_on(async {
        let (evt_send, mut evt_recv) = tokio::sync::mpsc::unbounded_channel();

        let server = IpcServer::bind(&endpoint).await?;
        log::info!("Initializing irssi-icon daemon on {}", server.local_endpoint()?);

        let ipc_server_handle = tokio::spawn(server.run(evt_send.clone()));

        let forward_exit_handle = tokio::spawn(async move {
            let _ = application_lifecycle::recv_exit().await;
            log::debug!("Forward task received exit event");
            let _ = evt_send.send(crate::app::DaemonCommand::KillServer);
        });

        let mut app = App { observer: IconState::default() };
        while let Some(command) = evt_recv.recv().await {
            if !app.handle_command(command) {
                break;
            }
        }

        ipc_server_handle.abort();
        forward_exit_handle.abort();
        Ok::<_, anyhow::Error>(())
    })?;

    log::info!("main application thread finished");

    Ok(ForkResult::Child)
}

/// Detach the process from the terminal, redirecting stdout and stderr to the
/// log file.
fn do_detach(log_file_path: impl AsRef<Path>) -> Result<ForkResult> {
    match unsafe { nix::unistd::fork()? } {
        nix::unistd::ForkResult::Child => {
            nix::unistd::setsid()?;
            match unsafe { nix::unistd::fork()? } {
                nix::unistd::ForkResult::Parent { .. } => std::process::exit(0),
                nix::unistd::ForkResult::Child => {}
            }
        }
        nix::unistd::ForkResult::Parent { .. } => {
            return Ok(ForkResult::Parent);
        }
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("Failed to open log file {} for writing", log_file_path.as_ref().display()))?;
    let fd = file.as_raw_fd();

    if nix::unistd::isatty(1)? {
        nix::unistd::dup2(fd, std::io::stdout().as_raw_fd())?;
    }
    if nix::unistd::isatty(2)? {
        nix::unistd::dup2(fd, std::io::stderr().as_raw_fd())?;
    }

    Ok(ForkResult::Child)
}
