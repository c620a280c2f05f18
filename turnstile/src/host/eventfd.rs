//! Linux `eventfd`-based parker.
//!
//! The loop blocks in `poll(2)` on an internal `eventfd`; any [`Unpark`]
//! handle writes to it to interrupt the wait. Because the descriptor is
//! exposed through [`AsRawFd`], a host that already runs its own `epoll`
//! loop can register it and learn when the scheduler has work again.

use super::park::{Park, Unpark};

use libc::{EFD_CLOEXEC, EFD_NONBLOCK, POLLIN, eventfd, pollfd};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;
use std::time::Duration;

/// Owned `eventfd` descriptor, closed on drop.
struct EventFd(RawFd);

impl EventFd {
    /// Consumes any pending wake-up so the next `poll` blocks again.
    fn drain(&self) {
        let mut buf = 0u64;
        unsafe {
            libc::read(self.0, &mut buf as *mut u64 as *mut _, 8);
        }
    }
}

impl Unpark for EventFd {
    fn unpark(&self) {
        let buf: u64 = 1;
        unsafe {
            libc::write(self.0, &buf as *const u64 as *const _, 8);
        }
    }
}

impl Drop for EventFd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

/// A [`Park`] implementation driven by a Linux `eventfd`.
pub struct EventFdParker {
    fd: Arc<EventFd>,
}

impl EventFdParker {
    /// Creates a non-blocking, close-on-exec `eventfd`.
    pub fn new() -> io::Result<Self> {
        let fd = unsafe { eventfd(0, EFD_NONBLOCK | EFD_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            fd: Arc::new(EventFd(fd)),
        })
    }
}

impl AsRawFd for EventFdParker {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.0
    }
}

impl Park for EventFdParker {
    fn park(&self, timeout: Option<Duration>) {
        // Round up so a sub-millisecond wait does not turn into a busy loop.
        let timeout_ms = timeout
            .map(|t| t.as_nanos().div_ceil(1_000_000).min(i32::MAX as u128) as i32)
            .unwrap_or(-1);

        let mut fds = pollfd {
            fd: self.fd.0,
            events: POLLIN,
            revents: 0,
        };

        let rc = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                tracing::warn!(error = %err, "eventfd poll failed");
            }
            return;
        }

        if fds.revents & POLLIN != 0 {
            self.fd.drain();
        }
    }

    fn unparker(&self) -> Arc<dyn Unpark> {
        self.fd.clone()
    }
}
