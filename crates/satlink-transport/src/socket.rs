use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default bound on a single blocking receive.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Socket behavior applied at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOptions {
    /// Set `SO_REUSEADDR` before binding so a restarted listener can rebind at once.
    ///
    /// For UDP on Linux this also lets a second socket that sets the option
    /// bind the same address while the first is still open. Each datagram is
    /// then delivered to only one of them.
    pub reuse_address: bool,
    /// Upper bound on how long [`DatagramSocket::recv`] blocks. Must be non-zero.
    pub recv_timeout: Duration,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            reuse_address: true,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }
}

/// Outcome of one bounded receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// A datagram of `len` bytes was written to the buffer.
    Datagram { len: usize, from: SocketAddr },
    /// Nothing arrived within the receive timeout.
    TimedOut,
}

/// A bound UDP socket with a bounded receive.
///
/// Safe to share between threads: one thread blocks in [`recv`](Self::recv)
/// while another calls [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct DatagramSocket {
    inner: UdpSocket,
    local_addr: SocketAddr,
}

impl DatagramSocket {
    /// Bind with default options (address reuse, 1 s receive timeout).
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        Self::bind_with_options(addr, SocketOptions::default())
    }

    /// Bind with explicit options.
    pub fn bind_with_options(addr: SocketAddr, options: SocketOptions) -> Result<Self> {
        let bind_err = move |source| TransportError::Bind { addr, source };

        if options.recv_timeout.is_zero() {
            return Err(bind_err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "receive timeout must be non-zero",
            )));
        }

        let inner = open_udp(addr, options.reuse_address).map_err(bind_err)?;
        inner
            .set_read_timeout(Some(options.recv_timeout))
            .map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        info!(
            %local_addr,
            reuse_address = options.reuse_address,
            recv_timeout_ms = options.recv_timeout.as_millis() as u64,
            "listening on udp socket"
        );

        Ok(Self { inner, local_addr })
    }

    /// Receive one datagram, waiting at most the configured timeout.
    ///
    /// Datagrams longer than `buf` are truncated by the OS.
    pub fn recv(&self, buf: &mut [u8]) -> Result<Received> {
        match self.inner.recv_from(buf) {
            Ok((len, from)) => Ok(Received::Datagram { len, from }),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(Received::TimedOut)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    /// Wake any thread blocked in [`recv`](Self::recv).
    ///
    /// Best effort: where the platform does not wake the receiver, it still
    /// returns within one receive timeout. The descriptor is released when the
    /// last owner drops the socket.
    pub fn shutdown(&self) {
        #[cfg(unix)]
        {
            use std::os::fd::AsRawFd;

            // SAFETY: the descriptor is owned by `self.inner` and remains open
            // for the duration of this call.
            let rc = unsafe { libc::shutdown(self.inner.as_raw_fd(), libc::SHUT_RDWR) };
            if rc != 0 {
                // Unconnected UDP sockets report ENOTCONN but still wake receivers on Linux.
                debug!(
                    error = %std::io::Error::last_os_error(),
                    "udp socket shutdown reported an error"
                );
            }
        }
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "udp"
    }
}

/// Send one datagram from an ephemeral socket.
pub fn send_datagram(target: SocketAddr, payload: &[u8]) -> Result<usize> {
    let local: SocketAddr = match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let send_err = move |source| TransportError::Send {
        addr: target,
        source,
    };

    let socket = UdpSocket::bind(local).map_err(send_err)?;
    let sent = socket.send_to(payload, target).map_err(send_err)?;
    debug!(%target, bytes = sent, "sent datagram");
    Ok(sent)
}

#[cfg(unix)]
fn open_udp(addr: SocketAddr, reuse_address: bool) -> std::io::Result<UdpSocket> {
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    let domain = match addr {
        SocketAddr::V4(_) => libc::AF_INET,
        SocketAddr::V6(_) => libc::AF_INET6,
    };

    // SAFETY: plain socket(2) call with constant arguments; the result is
    // checked before it is used as a descriptor.
    let fd = unsafe { libc::socket(domain, libc::SOCK_DGRAM, 0) };
    if fd < 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: `fd` was just returned by socket(2) and is owned by nothing else.
    let owned = unsafe { OwnedFd::from_raw_fd(fd) };

    // SAFETY: `owned` is an open descriptor for the duration of the call.
    if unsafe { libc::fcntl(owned.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    if reuse_address {
        set_reuse_address(&owned)?;
    }
    bind_raw(&owned, addr)?;

    Ok(UdpSocket::from(owned))
}

#[cfg(unix)]
fn set_reuse_address(fd: &std::os::fd::OwnedFd) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let enable: libc::c_int = 1;
    // SAFETY: `enable` is a valid readable c_int for the declared length, and
    // `fd` is an open socket descriptor.
    let rc = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            (&enable as *const libc::c_int).cast::<libc::c_void>(),
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn bind_raw(fd: &std::os::fd::OwnedFd, addr: SocketAddr) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let rc = match addr {
        SocketAddr::V4(v4) => {
            // SAFETY: an all-zero sockaddr_in is a valid value.
            let mut raw: libc::sockaddr_in = unsafe { std::mem::zeroed() };
            raw.sin_family = libc::AF_INET as libc::sa_family_t;
            raw.sin_port = v4.port().to_be();
            raw.sin_addr.s_addr = u32::from_ne_bytes(v4.ip().octets());
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
                target_os = "dragonfly"
            ))]
            {
                raw.sin_len = std::mem::size_of::<libc::sockaddr_in>() as u8;
            }

            // SAFETY: `raw` is a fully initialized sockaddr_in and the length
            // passed matches its size.
            unsafe {
                libc::bind(
                    fd.as_raw_fd(),
                    (&raw as *const libc::sockaddr_in).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                )
            }
        }
        SocketAddr::V6(v6) => {
            // SAFETY: an all-zero sockaddr_in6 is a valid value.
            let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
            raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            raw.sin6_port = v6.port().to_be();
            raw.sin6_flowinfo = v6.flowinfo();
            raw.sin6_addr.s6_addr = v6.ip().octets();
            raw.sin6_scope_id = v6.scope_id();
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
                target_os = "dragonfly"
            ))]
            {
                raw.sin6_len = std::mem::size_of::<libc::sockaddr_in6>() as u8;
            }

            // SAFETY: `raw` is a fully initialized sockaddr_in6 and the length
            // passed matches its size.
            unsafe {
                libc::bind(
                    fd.as_raw_fd(),
                    (&raw as *const libc::sockaddr_in6).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
                )
            }
        }
    };

    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn open_udp(addr: SocketAddr, reuse_address: bool) -> std::io::Result<UdpSocket> {
    if reuse_address {
        debug!("address reuse is not applied on this platform");
    }
    UdpSocket::bind(addr)
}
