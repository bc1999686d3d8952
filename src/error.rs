// src/error.rs
use std::path::PathBuf;

/// Failures of `load_script` / `set_script`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("PAC script is empty")]
    Empty,

    #[error("failed to run {resource}: {message}")]
    CompileFailure {
        resource: &'static str,
        message: String,
    },

    #[error("FindProxyForURL() is not defined or not callable")]
    EntryMissing,

    #[error("PAC engine thread is not running")]
    EngineUnavailable,
}

/// Failures of a single `FindProxyForURL` invocation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("no PAC script is loaded")]
    NotInitialized,

    #[error("FindProxyForURL() is undefined")]
    EntryMissing,

    #[error("FindProxyForURL() threw: {0}")]
    ThrowFailure(String),

    #[error("FindProxyForURL() did not return a string")]
    ReturnNotString,

    #[error("FindProxyForURL() returned a non-ASCII string")]
    NonAsciiResult,

    #[error("PAC engine thread is not running")]
    EngineUnavailable,
}

/// Failures of the IP list helpers. Scripts only ever see these as sentinels.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UtilityFailure {
    #[error("address list is empty")]
    Empty,

    #[error("invalid IP literal: {0:?}")]
    InvalidLiteral(String),

    #[error("invalid CIDR prefix: {0:?}")]
    InvalidPrefix(String),

    #[error("address and prefix belong to different families")]
    FamilyMismatch,
}

/// Status of `ProxyResolver::get_proxy_for_url`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("resolver has no PAC script loaded")]
    NotInitialized,

    #[error("PAC script failed: {0}")]
    ScriptFailure(#[source] EvalError),
}

impl From<EvalError> for ResolveError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::NotInitialized => ResolveError::NotInitialized,
            other => ResolveError::ScriptFailure(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures while fetching PAC script text.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("PAC download failed: HTTP {0}")]
    Status(u16),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error of `pac::evaluate_pac_for_url`.
#[derive(thiserror::Error, Debug)]
pub enum PacError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid target URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("failed to start PAC engine: {0}")]
    Engine(#[from] std::io::Error),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
