use may::coroutine::JoinHandle;
use may_minihttp::{HttpServer as RawServer, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);
const READY_POLL_ATTEMPTS: u32 = 50;

/// Binds a service (normally a [`RouterService`](super::RouterService)) to a
/// socket.
///
/// The accept loop runs in one `may` coroutine and every connection gets a
/// coroutine of its own, all sharing the same read-only router.
pub struct HttpServer<T>(pub T);

/// A listening bramble server.
///
/// Dropping the handle leaves the accept coroutine running; call
/// [`ServerHandle::stop`] to shut it down or [`ServerHandle::join`] to park
/// the caller for the lifetime of the process.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the accept loop is bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until a TCP connect to [`ServerHandle::addr`] succeeds.
    ///
    /// # Errors
    ///
    /// `TimedOut` when the accept loop is still unreachable after
    /// `READY_POLL_ATTEMPTS` polls.
    pub fn wait_ready(&self) -> io::Result<()> {
        let ready = (0..READY_POLL_ATTEMPTS).any(|attempt| {
            if attempt > 0 {
                thread::sleep(READY_POLL_INTERVAL);
            }
            TcpStream::connect(self.addr).is_ok()
        });
        if ready {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("bramble server on {} not accepting connections", self.addr),
            ))
        }
    }

    /// Cancel the accept coroutine and wait for it to unwind.
    ///
    /// Connections already being served finish on their own coroutines.
    #[allow(unsafe_code)]
    pub fn stop(self) {
        // SAFETY: cancelling unwinds the accept coroutine; we own its handle
        // and join it immediately, so nothing observes it half-torn-down.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let addr = self.addr;
        match self.handle.join() {
            Ok(()) => debug!(%addr, "Accept loop exited"),
            Err(_) => debug!(%addr, "Accept loop cancelled"),
        }
    }

    /// Wait for the accept coroutine to finish.
    ///
    /// # Errors
    ///
    /// The panic payload if the accept loop panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` (first resolved address wins) and spawn the accept loop.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `addr` resolves to nothing, or the bind error.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        })?;
        let handle = RawServer(self.0).start(addr)?;
        info!(%addr, "bramble listening");
        Ok(ServerHandle { addr, handle })
    }
}
