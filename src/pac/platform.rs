// src/pac/platform.rs
//! Process-wide engine setup, performed at most once.

use log::debug;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};

static PLATFORM: OnceCell<Platform> = OnceCell::new();

#[derive(Debug)]
pub struct Platform {
    engine_version: &'static str,
    next_engine_id: AtomicU64,
}

impl Platform {
    pub fn engine_version(&self) -> &'static str {
        self.engine_version
    }

    /// A process-unique id for a new engine instance.
    pub(crate) fn next_engine_id(&self) -> u64 {
        self.next_engine_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Initializes the engine platform. Later calls return the same instance.
pub fn init() -> &'static Platform {
    PLATFORM.get_or_init(|| {
        let platform = Platform {
            engine_version: "boa_engine 0.20",
            next_engine_id: AtomicU64::new(1),
        };
        debug!("PAC engine platform initialized ({})", platform.engine_version);
        platform
    })
}
