// src/lib.rs
//! Proxy auto-config (PAC) resolution.
//!
//! A [`ProxyResolver`] holds one PAC script, compiled together with the
//! standard PAC helper functions, and answers `FindProxyForURL(url, host)`
//! per request. Network lookups made by the script go through an injected
//! [`ProxyBindings`]; script diagnostics and `alert()` output go to an
//! [`ErrorListener`].
pub mod config;
pub mod error;
pub mod interface;
pub mod logging;
pub mod pac;
pub mod resolver;

pub use config::EngineConfig;
pub use error::{EvalError, InitError, PacError, ResolveError};
pub use interface::{ErrorListener, LogErrorListener, ProxyBindings, SystemBindings};
pub use pac::directive::{parse_directives, ProxyDirective};
pub use pac::evaluate_pac_for_url;
pub use pac::platform::init;
pub use resolver::{PacScript, ProxyResolver};
