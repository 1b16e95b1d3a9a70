//! UDP OSC receiver worker.
//!
//! A long-lived thread owns the socket. Bind/unbind requests arrive over a
//! bounded command channel and are answered synchronously through reply
//! channels, so callers observe the single-binding state machine directly:
//! a bind while bound tears the old socket down before opening the new
//! one, and there is never more than one live socket.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use rosc::{OscMessage, OscPacket};
use tracing::{info, warn};

use crate::error::{Error, Result};

const COMMAND_QUEUE_SIZE: usize = 16;
/// Socket read timeout; also bounds how long a queued command can wait
/// while the socket is idle.
const SOCKET_READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Upper bound on waiting for the worker to answer a bind/unbind.
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);
/// Largest datagram we accept. OSC control traffic is far smaller.
const RECV_BUFFER_SIZE: usize = 1536;

/// Callback invoked on the worker thread for every decoded OSC message.
pub type DispatchFn = Arc<dyn Fn(&OscMessage) + Send + Sync>;

enum Command {
    Bind { port: u16, reply: Sender<Result<()>> },
    Unbind { reply: Sender<()> },
    Shutdown,
}

pub struct OscReceiver {
    commands: Sender<Command>,
    /// Locally bound port while listening; 0 when unbound.
    bound_port: Arc<AtomicU16>,
}

impl OscReceiver {
    pub fn new(dispatch: DispatchFn) -> Self {
        let (commands, command_receiver) = bounded(COMMAND_QUEUE_SIZE);
        let bound_port = Arc::new(AtomicU16::new(0));
        let worker_port = Arc::clone(&bound_port);

        thread::spawn(move || Self::worker(command_receiver, worker_port, dispatch));

        Self {
            commands,
            bound_port,
        }
    }

    /// Bind the receiver to `port`, tearing down any previous binding
    /// first. Port 0 asks the OS for a free port; `local_port` reports the
    /// result.
    pub fn bind(&self, port: u16) -> Result<()> {
        let (reply, result) = bounded(1);
        self.commands
            .send(Command::Bind { port, reply })
            .map_err(|_| Error::ReceiverGone)?;
        result
            .recv_timeout(REPLY_TIMEOUT)
            .map_err(|_| Error::ReceiverGone)?
    }

    /// Close the current binding. Idempotent; a no-op when unbound.
    pub fn unbind(&self) {
        let (reply, done) = bounded(1);
        if self.commands.send(Command::Unbind { reply }).is_ok() {
            let _ = done.recv_timeout(REPLY_TIMEOUT);
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound_port.load(Ordering::SeqCst) != 0
    }

    pub fn local_port(&self) -> Option<u16> {
        match self.bound_port.load(Ordering::SeqCst) {
            0 => None,
            port => Some(port),
        }
    }

    fn worker(commands: Receiver<Command>, bound_port: Arc<AtomicU16>, dispatch: DispatchFn) {
        let mut socket: Option<UdpSocket> = None;
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        loop {
            // While listening, poll commands without blocking; otherwise
            // park on the command channel.
            let command = if socket.is_some() {
                match commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            } else {
                match commands.recv_timeout(SOCKET_READ_TIMEOUT) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            };

            if let Some(command) = command {
                match command {
                    Command::Bind { port, reply } => {
                        if socket.take().is_some() {
                            bound_port.store(0, Ordering::SeqCst);
                            info!("closed previous OSC binding");
                        }
                        match Self::open_socket(port) {
                            Ok((new_socket, local)) => {
                                socket = Some(new_socket);
                                bound_port.store(local, Ordering::SeqCst);
                                info!("OSC receiver listening on port {}", local);
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                warn!("failed to bind OSC port {}: {}", port, e);
                                let _ = reply.send(Err(e));
                            }
                        }
                    }
                    Command::Unbind { reply } => {
                        if socket.take().is_some() {
                            info!("OSC receiver unbound");
                        }
                        bound_port.store(0, Ordering::SeqCst);
                        let _ = reply.send(());
                    }
                    Command::Shutdown => break,
                }
                continue;
            }

            if let Some(ref active) = socket {
                match active.recv_from(&mut buf) {
                    Ok((len, _src)) => Self::handle_datagram(&buf[..len], &dispatch),
                    Err(ref e)
                        if e.kind() == io::ErrorKind::WouldBlock
                            || e.kind() == io::ErrorKind::TimedOut => {}
                    Err(e) => warn!("OSC socket error: {}", e),
                }
            }
        }

        bound_port.store(0, Ordering::SeqCst);
    }

    fn open_socket(port: u16) -> Result<(UdpSocket, u16)> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_read_timeout(Some(SOCKET_READ_TIMEOUT))?;
        let local = socket.local_addr()?.port();
        Ok((socket, local))
    }

    fn handle_datagram(data: &[u8], dispatch: &DispatchFn) {
        match rosc::decoder::decode_udp(data) {
            Ok((_rest, packet)) => Self::dispatch_packet(packet, dispatch),
            Err(e) => warn!("failed to decode OSC packet: {}", e),
        }
    }

    fn dispatch_packet(packet: OscPacket, dispatch: &DispatchFn) {
        match packet {
            OscPacket::Message(message) => dispatch(&message),
            OscPacket::Bundle(bundle) => {
                for inner in bundle.content {
                    Self::dispatch_packet(inner, dispatch);
                }
            }
        }
    }
}

impl Drop for OscReceiver {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}
