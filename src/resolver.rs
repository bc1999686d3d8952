// src/resolver.rs
use crate::config::EngineConfig;
use crate::error::{InitError, ResolveError};
use crate::interface::{ErrorListener, ProxyBindings};
use crate::pac::engine::ScriptHost;
use log::debug;
use std::fmt;
use std::sync::Arc;

/// PAC script source. Two scripts are the same script if their text is equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PacScript(Arc<str>);

impl PacScript {
    pub fn new(text: &str) -> Self {
        PacScript(Arc::from(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PacScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacScript({} bytes)", self.0.len())
    }
}

/// Resolves proxies for URLs with one PAC script at a time.
///
/// ```no_run
/// use std::sync::Arc;
/// use pacresolver::{EngineConfig, LogErrorListener, ProxyResolver, SystemBindings};
///
/// let mut resolver = ProxyResolver::new(
///     Arc::new(SystemBindings),
///     Arc::new(LogErrorListener),
///     EngineConfig::default(),
/// )?;
/// resolver.set_script("function FindProxyForURL(url, host) { return 'DIRECT'; }")?;
/// assert_eq!(resolver.get_proxy_for_url("http://example.com/", "example.com")?, "DIRECT");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ProxyResolver {
    host: ScriptHost,
    script: Option<PacScript>,
}

impl ProxyResolver {
    pub fn new(
        bindings: Arc<dyn ProxyBindings>,
        listener: Arc<dyn ErrorListener>,
        config: EngineConfig,
    ) -> std::io::Result<Self> {
        Ok(ProxyResolver {
            host: ScriptHost::new(bindings, listener, config)?,
            script: None,
        })
    }

    /// Replaces the PAC script. Any previous script is gone afterwards, even
    /// when the new one fails to load.
    pub fn set_script(&mut self, text: &str) -> Result<(), InitError> {
        self.script = None;
        let script = PacScript::new(text);
        self.host.load_script(Arc::clone(&script.0))?;
        debug!("Resolver now using {:?}", script);
        self.script = Some(script);
        Ok(())
    }

    /// The script currently in effect.
    pub fn script(&self) -> Option<&PacScript> {
        self.script.as_ref()
    }

    /// Runs `FindProxyForURL(url, host)`. Returns the script's answer as-is,
    /// e.g. `"PROXY proxy:8080; DIRECT"`.
    pub fn get_proxy_for_url(&self, url: &str, host: &str) -> Result<String, ResolveError> {
        if self.script.is_none() {
            return Err(ResolveError::NotInitialized);
        }
        Ok(self.host.evaluate(url, host)?)
    }

    pub fn purge_memory(&self) {
        self.host.purge_memory();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::interface::{LogErrorListener, SystemBindings};

    fn resolver() -> ProxyResolver {
        ProxyResolver::new(
            Arc::new(SystemBindings),
            Arc::new(LogErrorListener),
            EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn not_initialized_before_set_script() {
        let resolver = resolver();
        assert!(resolver.script().is_none());
        assert_eq!(
            resolver.get_proxy_for_url("http://a/", "a"),
            Err(ResolveError::NotInitialized)
        );
    }

    #[test]
    fn returns_script_result_unchanged() {
        let mut resolver = resolver();
        resolver
            .set_script("function FindProxyForURL(u, h) { return 'PROXY  a:1 ;DIRECT'; }")
            .unwrap();
        assert_eq!(resolver.get_proxy_for_url("http://a/", "a").unwrap(), "PROXY  a:1 ;DIRECT");
    }

    #[test]
    fn failed_set_script_discards_previous_script() {
        let mut resolver = resolver();
        resolver.set_script("function FindProxyForURL() { return 'DIRECT'; }").unwrap();
        assert_eq!(resolver.set_script("var nothing;"), Err(InitError::EntryMissing));
        assert!(resolver.script().is_none());
        assert_eq!(
            resolver.get_proxy_for_url("http://a/", "a"),
            Err(ResolveError::NotInitialized)
        );
    }

    #[test]
    fn empty_script_is_rejected() {
        let mut resolver = resolver();
        assert_eq!(resolver.set_script(""), Err(InitError::Empty));
    }

    #[test]
    fn script_failures_are_wrapped() {
        let mut resolver = resolver();
        resolver.set_script("function FindProxyForURL() { return null; }").unwrap();
        assert_eq!(
            resolver.get_proxy_for_url("http://a/", "a"),
            Err(ResolveError::ScriptFailure(EvalError::ReturnNotString))
        );
    }

    #[test]
    fn script_identity_is_its_text() {
        let mut resolver = resolver();
        let text = "function FindProxyForURL() { return 'DIRECT'; }";
        resolver.set_script(text).unwrap();
        assert_eq!(resolver.script(), Some(&PacScript::new(text)));
        resolver.purge_memory();
        assert_eq!(resolver.get_proxy_for_url("http://a/", "a").unwrap(), "DIRECT");
    }
}
