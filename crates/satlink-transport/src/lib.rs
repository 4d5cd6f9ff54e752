//! Connectionless datagram transport.
//!
//! This is the lowest layer of satlink. It owns the UDP socket and exposes
//! exactly what a receive loop needs: bind with address reuse, a bounded
//! receive that reports timeouts as a normal outcome, and a shutdown that
//! another thread can use to wake a blocked receiver.

pub mod error;
pub mod socket;

pub use error::{Result, TransportError};
pub use socket::{send_datagram, DatagramSocket, Received, SocketOptions, DEFAULT_RECV_TIMEOUT};
