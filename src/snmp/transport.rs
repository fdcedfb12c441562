//! Request/response transports.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::error::CollectorError;
use crate::snmp::pdu::SnmpMessage;

pub const SNMP_PORT: u16 = 161;

/// One SNMP round-trip. Implementations own retry policy; callers see
/// either a decoded response or an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(&self, msg: &SnmpMessage) -> Result<SnmpMessage, CollectorError>;
}

/// Connected UDP socket to one agent.
pub struct UdpTransport {
    socket: UdpSocket,
    peer: String,
    timeout: Duration,
    tries: u32,
}

impl UdpTransport {
    pub async fn connect(
        addr: Ipv4Addr,
        timeout: Duration,
        tries: u32,
    ) -> Result<Self, CollectorError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect((addr, SNMP_PORT)).await?;
        Ok(UdpTransport {
            socket,
            peer: addr.to_string(),
            timeout,
            tries: tries.max(1),
        })
    }

    /// Test hook: talk to an agent on an arbitrary port.
    #[cfg(test)]
    pub async fn connect_to(
        addr: std::net::SocketAddr,
        timeout: Duration,
        tries: u32,
    ) -> Result<Self, CollectorError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect(addr).await?;
        Ok(UdpTransport {
            socket,
            peer: addr.to_string(),
            timeout,
            tries: tries.max(1),
        })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn exchange(&self, msg: &SnmpMessage) -> Result<SnmpMessage, CollectorError> {
        let frame = msg.encode()?;
        let mut buf = vec![0u8; 65_535];
        for _ in 0..self.tries {
            self.socket.send(&frame).await?;
            let deadline = tokio::time::Instant::now() + self.timeout;
            loop {
                match tokio::time::timeout_at(deadline, self.socket.recv(&mut buf)).await {
                    // attempt window elapsed, resend
                    Err(_) => break,
                    Ok(Err(e)) => return Err(e.into()),
                    Ok(Ok(n)) => {
                        let reply = SnmpMessage::decode(&buf[..n])?;
                        if reply.pdu.request_id == msg.pdu.request_id {
                            return Ok(reply);
                        }
                        // stale response from an earlier request, keep waiting
                    }
                }
            }
        }
        Err(CollectorError::Timeout {
            peer: self.peer.clone(),
        })
    }
}
