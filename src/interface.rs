// src/interface.rs
use log::{debug, error, info};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};

/// Network facts a PAC script may ask for. Implementations may block on real
/// I/O; the engine lock is released while they run.
pub trait ProxyBindings: Send + Sync {
    /// The local IPv4 address.
    fn my_ip_address(&self) -> Option<String>;

    /// All local addresses, IPv4 and IPv6, `;`-separated.
    fn my_ip_address_ex(&self) -> Option<String>;

    /// First IPv4 address of `host`.
    fn dns_resolve(&self, host: &str) -> Option<String>;

    /// All addresses of `host`, IPv4 and IPv6, `;`-separated.
    fn dns_resolve_ex(&self, host: &str) -> Option<String>;
}

/// Receives script diagnostics and `alert()` output.
pub trait ErrorListener: Send + Sync {
    fn error_message(&self, message: &str);
    fn alert_message(&self, message: &str);
}

/// Bindings backed by the operating system resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBindings;

impl SystemBindings {
    fn lookup(host: &str) -> Vec<IpAddr> {
        match (host, 0).to_socket_addrs() {
            Ok(addrs) => {
                let mut ips: Vec<IpAddr> = Vec::new();
                for ip in addrs.map(|addr| addr.ip()) {
                    if !ips.contains(&ip) {
                        ips.push(ip);
                    }
                }
                ips
            }
            Err(e) => {
                debug!("DNS lookup for {} failed: {}", host, e);
                Vec::new()
            }
        }
    }

    // Connecting a UDP socket sends nothing but makes the OS pick the
    // outgoing interface.
    fn local_address(bind: &str, remote: &str) -> Option<IpAddr> {
        let socket = UdpSocket::bind(bind).ok()?;
        let target: SocketAddr = remote.parse().ok()?;
        socket.connect(target).ok()?;
        socket.local_addr().ok().map(|addr| addr.ip())
    }

    fn join(ips: &[IpAddr]) -> Option<String> {
        if ips.is_empty() {
            return None;
        }
        let list: Vec<String> = ips.iter().map(IpAddr::to_string).collect();
        Some(list.join(";"))
    }
}

impl ProxyBindings for SystemBindings {
    fn my_ip_address(&self) -> Option<String> {
        Self::local_address("0.0.0.0:0", "8.8.8.8:53").map(|ip| ip.to_string())
    }

    fn my_ip_address_ex(&self) -> Option<String> {
        let ips: Vec<IpAddr> = [
            Self::local_address("0.0.0.0:0", "8.8.8.8:53"),
            Self::local_address("[::]:0", "[2001:4860:4860::8888]:53"),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self::join(&ips)
    }

    fn dns_resolve(&self, host: &str) -> Option<String> {
        Self::lookup(host)
            .into_iter()
            .find(IpAddr::is_ipv4)
            .map(|ip| ip.to_string())
    }

    fn dns_resolve_ex(&self, host: &str) -> Option<String> {
        Self::join(&Self::lookup(host))
    }
}

/// Forwards script diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorListener;

impl ErrorListener for LogErrorListener {
    fn error_message(&self, message: &str) {
        error!("PAC script error: {}", message);
    }

    fn alert_message(&self, message: &str) {
        info!("PAC alert: {}", message);
    }
}
