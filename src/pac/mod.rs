// src/pac/mod.rs
pub(crate) mod bindings;
pub mod directive;
pub mod downloader;
pub mod engine;
pub mod ip;
pub mod lock;
pub mod platform;
pub mod strings;

use crate::config::EngineConfig;
use crate::error::PacError;
use crate::interface::{LogErrorListener, SystemBindings};
use crate::resolver::ProxyResolver;
use downloader::load_pac_source;
use log::info;
use std::sync::Arc;
use url::Url;

/// Whether a string looks like the location of a PAC script.
pub fn is_pac_url(s: &str) -> bool {
    let lower = s.to_lowercase();
    lower.ends_with(".pac") || lower.contains("proxy.pac") || lower.contains("wpad.dat")
}

/// Loads the PAC script at `location` (URL or path) and runs it for
/// `target_url` with the system resolver. Returns the raw PAC result.
pub fn evaluate_pac_for_url(
    location: &str,
    target_url: &str,
    config: &EngineConfig,
) -> Result<String, PacError> {
    let url_obj = Url::parse(target_url)?;
    let host = url_obj
        .host_str()
        .ok_or_else(|| PacError::MissingHost(target_url.to_string()))?
        .to_string();
    evaluate_pac_for_host(location, target_url, &host, config)
}

/// Like [`evaluate_pac_for_url`] with an explicit host argument.
pub fn evaluate_pac_for_host(
    location: &str,
    target_url: &str,
    host: &str,
    config: &EngineConfig,
) -> Result<String, PacError> {
    let script = load_pac_source(location, config.download_timeout())?;

    let mut resolver = ProxyResolver::new(
        Arc::new(SystemBindings),
        Arc::new(LogErrorListener),
        config.clone(),
    )?;
    resolver.set_script(&script)?;
    let result = resolver.get_proxy_for_url(target_url, host)?;
    info!("PAC resolved {} -> {}", target_url, result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn recognizes_pac_locations() {
        assert!(is_pac_url("http://wpad/wpad.dat"));
        assert!(is_pac_url("file:///etc/Proxy.PAC"));
        assert!(!is_pac_url("http://proxy.example:8080"));
    }

    #[test]
    fn evaluates_local_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "function FindProxyForURL(url, host) {{ return dnsDomainIs(host, '.example.com') ? 'PROXY p:1' : 'DIRECT'; }}"
        )
        .unwrap();
        let location = file.path().to_str().unwrap();
        let config = EngineConfig::default();
        assert_eq!(
            evaluate_pac_for_url(location, "http://www.example.com/x", &config).unwrap(),
            "PROXY p:1"
        );
        assert_eq!(
            evaluate_pac_for_url(location, "https://other.org/", &config).unwrap(),
            "DIRECT"
        );
    }

    #[test]
    fn target_without_host_is_rejected() {
        let err = evaluate_pac_for_url("unused.pac", "mailto:someone@example.com", &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, PacError::MissingHost(_)));
    }
}
