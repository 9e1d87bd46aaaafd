//! In-process API server, used by the desktop grid's embedded mode and by
//! headless tests that need a real socket.

use crate::{resolve_bind_address, serve_router, AppError, AppState};
use std::io;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{info, warn};

const SERVER_THREAD_NAME: &str = "repogrid-embedded-server";
const SERVER_WORKER_THREADS: usize = 2;

/// What the server thread reports back once it is listening (or has given up).
type Startup = Result<BoundAddr, String>;

#[derive(Debug, Clone, Copy)]
struct BoundAddr {
    addr: SocketAddr,
    used_fallback: bool,
}

/// Handle to an API server running on its own thread and runtime.
///
/// Dropping the handle signals shutdown and joins the thread.
pub struct EmbeddedServer {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    bound: BoundAddr,
}

impl EmbeddedServer {
    /// Start serving `state` on a background thread.
    ///
    /// Binds to `BIND` or `127.0.0.1:PORT` from the state's config; an
    /// address already in use falls back to an OS-assigned port on the same
    /// interface. `port: 0` always gets an OS-assigned port.
    ///
    /// # Returns
    /// A running [`EmbeddedServer`] once the listener is bound.
    ///
    /// # Errors
    /// [`AppError::Server`] when the thread, runtime, or socket cannot be
    /// created.
    pub fn start(state: AppState, allow_public: bool) -> Result<Self, AppError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Startup>();

        let thread = thread::Builder::new()
            .name(SERVER_THREAD_NAME.into())
            .spawn(move || {
                let runtime = match build_runtime() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(format!("failed to start runtime: {}", err)));
                        return;
                    }
                };

                let requested = resolve_bind_address(&state.config, allow_public);
                let (listener, bound) = match bind_with_fallback(&runtime, requested) {
                    Ok(bound) => bound,
                    Err(err) => {
                        let _ = ready_tx.send(Err(format!("failed to bind server socket: {}", err)));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(bound));

                let shutdown = async {
                    let _ = shutdown_rx.await;
                };
                if let Err(err) =
                    runtime.block_on(serve_router(listener, state, allow_public, shutdown))
                {
                    warn!("embedded server stopped with error: {}", err);
                }
            })
            .map_err(|err| AppError::Server(format!("failed to spawn server: {}", err)))?;

        let mut server = Self {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
            bound: BoundAddr {
                addr: SocketAddr::from(([127, 0, 0, 1], 0)),
                used_fallback: false,
            },
        };

        match ready_rx.recv() {
            Ok(Ok(bound)) => {
                if !bound.addr.ip().is_loopback() {
                    warn!("embedded server bound to non-localhost address {}", bound.addr);
                }
                server.bound = bound;
                Ok(server)
            }
            // Dropping `server` joins the thread, which has already exited.
            Ok(Err(message)) => Err(AppError::Server(message)),
            Err(_) => Err(AppError::Server(
                "embedded server exited before binding".to_string(),
            )),
        }
    }

    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.bound.addr
    }

    /// Base URL for clients of this server, e.g. `http://127.0.0.1:38511`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.bound.addr)
    }

    /// Whether the configured address was busy and an auto port was used.
    pub fn used_fallback(&self) -> bool {
        self.bound.used_fallback
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EmbeddedServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(SERVER_WORKER_THREADS)
        .enable_all()
        .build()
}

fn bind_with_fallback(
    runtime: &Runtime,
    requested: SocketAddr,
) -> io::Result<(TcpListener, BoundAddr)> {
    let (listener, used_fallback) = match runtime.block_on(TcpListener::bind(requested)) {
        Ok(listener) => (listener, false),
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
            warn!("{} is in use; falling back to an auto port", requested);
            let fallback = SocketAddr::new(requested.ip(), 0);
            (runtime.block_on(TcpListener::bind(fallback))?, true)
        }
        Err(err) => return Err(err),
    };
    let addr = listener.local_addr().unwrap_or(requested);
    info!(fallback = used_fallback, "API listening on http://{}", addr);
    Ok((listener, BoundAddr { addr, used_fallback }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    fn state() -> AppState {
        AppState::seeded(
            Config {
                port: 0,
                seed_rows: 3,
                ..Config::default()
            },
            1,
        )
    }

    #[test]
    fn busy_port_falls_back_to_an_auto_port() {
        let _guard = crate::tests::BIND_ENV
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let first = EmbeddedServer::start(state(), false).expect("first server");
        let config = Config {
            port: first.addr().port(),
            seed_rows: 3,
            ..Config::default()
        };
        let second =
            EmbeddedServer::start(AppState::seeded(config, 1), false).expect("second server");

        assert!(second.used_fallback());
        assert_ne!(second.addr(), first.addr());
        assert!(second.base_url().starts_with("http://127.0.0.1:"));
    }
}
