//! TCP Server
//!
//! Accepts connections and hands each one to its own handler thread.
//!
//! ## Shutdown
//! `accept` blocks. `ShutdownHandle::shutdown` sets the flag, wakes an accept
//! loop parked on the connection cap, then connects to the listener once so a
//! blocked `accept` returns and sees the flag.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{RelayError, Result};
use crate::network::Connection;

/// Pause after an unexpected accept failure (e.g. out of file descriptors)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Timeout for the wake-up connection made on shutdown
const WAKE_TIMEOUT: Duration = Duration::from_millis(500);

/// TCP server for SqlRelay
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    admission: Arc<Admission>,
}

/// Live handler count, with a wake-up for the accept loop when one exits
struct Admission {
    active: Mutex<usize>,
    freed: Condvar,
}

/// Stops a running server from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    admission: Arc<Admission>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        {
            // Holding the lock orders this against the capacity wait's flag check
            let _active = self.admission.active.lock();
            self.admission.freed.notify_all();
        }
        // Fails harmlessly if the listener is already gone
        let _ = TcpStream::connect_timeout(&self.wake_addr, WAKE_TIMEOUT);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Releases one admission slot when a handler exits
struct ConnectionSlot(Arc<Admission>);

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        let mut active = self.0.active.lock();
        *active -= 1;
        self.0.freed.notify_one();
    }
}

impl Server {
    /// Bind the configured address
    ///
    /// A bind failure is fatal; there is no retry.
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            RelayError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config,
            engine,
            listener,
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
            admission: Arc::new(Admission {
                active: Mutex::new(0),
                freed: Condvar::new(),
            }),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            admission: Arc::clone(&self.admission),
            wake_addr: wake_addr(self.local_addr),
        }
    }

    /// Run the accept loop (blocking until shutdown)
    ///
    /// In-flight handlers are left running when this returns; dropping the
    /// server only releases the listening socket.
    pub fn run(self) -> Result<()> {
        tracing::info!(
            "[{}] Server started on {}",
            self.config.server_name,
            self.local_addr
        );

        while self.wait_for_slot() {
            match self.listener.accept() {
                Ok(_) if self.is_shutdown() => break,
                Ok((stream, peer)) => self.spawn_handler(stream, peer),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    // Per-connection accept failures (e.g. aborted handshakes)
                    // must not take the listener down.
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_ERROR_BACKOFF);
                }
            }
        }

        tracing::info!("[{}] Shutting down server...", self.config.server_name);
        Ok(())
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Block while the connection cap is reached
    ///
    /// Returns false once shutdown has been requested.
    fn wait_for_slot(&self) -> bool {
        let max = self.config.max_connections;
        let mut active = self.admission.active.lock();
        while max > 0 && *active >= max && !self.is_shutdown() {
            self.admission.freed.wait(&mut active);
        }
        !self.is_shutdown()
    }

    fn spawn_handler(&self, stream: TcpStream, peer: SocketAddr) {
        let mut connection = match Connection::new(stream, Arc::clone(&self.engine)) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to set up connection for {}: {}", peer, e);
                return;
            }
        };
        if let Err(e) =
            connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
        {
            tracing::warn!("Failed to set timeouts for {}: {}", peer, e);
            return;
        }

        *self.admission.active.lock() += 1;
        let slot = ConnectionSlot(Arc::clone(&self.admission));

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let _slot = slot;
                connection.run();
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn handler for {}: {}", peer, e);
        }
    }
}

/// Address to connect to when waking the listener
///
/// A wildcard bind is reached through loopback of the same family.
fn wake_addr(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}
