// src/pac/directive.rs
use log::warn;
use std::fmt;

/// One entry of a `FindProxyForURL()` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDirective {
    Direct,
    Proxy(String),
    Https(String),
    Socks4(String),
    Socks5(String),
}

impl ProxyDirective {
    /// `DIRECT`, or the proxy as a URL such as `http://host:port`.
    pub fn to_url(&self) -> String {
        match self {
            ProxyDirective::Direct => "DIRECT".to_string(),
            ProxyDirective::Proxy(host) => format!("http://{}", host),
            ProxyDirective::Https(host) => format!("https://{}", host),
            ProxyDirective::Socks4(host) => format!("socks4://{}", host),
            ProxyDirective::Socks5(host) => format!("socks5://{}", host),
        }
    }

    fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.eq_ignore_ascii_case("DIRECT") {
            return Some(ProxyDirective::Direct);
        }

        let (keyword, target) = match entry.split_once(char::is_whitespace) {
            Some((keyword, target)) => (keyword, target.trim()),
            // Some scripts return a bare `host:port`.
            None if entry.contains(':') && !entry.contains("://") => {
                return Some(ProxyDirective::Proxy(entry.to_string()));
            }
            None => return None,
        };
        if target.is_empty() {
            return None;
        }

        let target = target.to_string();
        match keyword.to_ascii_uppercase().as_str() {
            "PROXY" | "HTTP" => Some(ProxyDirective::Proxy(target)),
            "HTTPS" => Some(ProxyDirective::Https(target)),
            "SOCKS" | "SOCKS4" => Some(ProxyDirective::Socks4(target)),
            "SOCKS5" => Some(ProxyDirective::Socks5(target)),
            _ => None,
        }
    }
}

impl fmt::Display for ProxyDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyDirective::Direct => write!(f, "DIRECT"),
            ProxyDirective::Proxy(host) => write!(f, "PROXY {}", host),
            ProxyDirective::Https(host) => write!(f, "HTTPS {}", host),
            ProxyDirective::Socks4(host) => write!(f, "SOCKS4 {}", host),
            ProxyDirective::Socks5(host) => write!(f, "SOCKS5 {}", host),
        }
    }
}

/// Splits a PAC result into its directives, in order. Entries that cannot be
/// understood are skipped.
pub fn parse_directives(result: &str) -> Vec<ProxyDirective> {
    result
        .split(';')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let directive = ProxyDirective::parse(entry);
            if directive.is_none() {
                warn!("Ignoring unrecognized PAC directive: {:?}", entry.trim());
            }
            directive
        })
        .collect()
}
