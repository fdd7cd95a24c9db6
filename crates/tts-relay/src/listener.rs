//! Listening socket selection
//!
//! A supervisor using socket activation passes an already-bound socket as
//! fd 3 and announces it through `LISTEN_FDS` / `LISTEN_PID`. Without one we
//! bind the configured port ourselves.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// First descriptor handed over by socket activation
const LISTEN_FDS_START: i32 = 3;

/// Descriptor of an inherited listening socket, if the activation variables
/// announce one for this process
pub fn inherited_fd(listen_fds: Option<&str>, listen_pid: Option<&str>, pid: u32) -> Option<i32> {
    let count: u32 = listen_fds?.trim().parse().ok()?;
    if count == 0 {
        return None;
    }

    // Variables meant for another process (e.g. our parent) are ignored
    if let Some(target) = listen_pid {
        if target.trim().parse::<u32>().ok()? != pid {
            return None;
        }
    }

    if count > 1 {
        warn!(count, "Multiple sockets passed, using the first");
    }
    Some(LISTEN_FDS_START)
}

/// Adopt the inherited socket or bind `0.0.0.0:<port>`
pub async fn open_listener(port: u16) -> std::io::Result<TcpListener> {
    #[cfg(unix)]
    {
        let listen_fds = std::env::var("LISTEN_FDS").ok();
        let listen_pid = std::env::var("LISTEN_PID").ok();
        if let Some(fd) = inherited_fd(
            listen_fds.as_deref(),
            listen_pid.as_deref(),
            std::process::id(),
        ) {
            let listener = adopt(fd)?;
            info!(fd, addr = ?listener.local_addr().ok(), "Using inherited listening socket");
            return Ok(listener);
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);
    TcpListener::bind(addr).await
}

#[cfg(unix)]
fn adopt(fd: i32) -> std::io::Result<TcpListener> {
    use std::os::unix::io::FromRawFd;

    // SAFETY: the activation protocol hands this descriptor to us alone, and
    // nothing else in the process wraps it.
    let listener = unsafe { std::net::TcpListener::from_raw_fd(fd) };
    listener.set_nonblocking(true)?;
    TcpListener::from_std(listener)
}
