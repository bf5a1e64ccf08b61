// Application state module
// Read-only configuration shared by every connection

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use super::types::Config;
use crate::api::Handler;
use crate::routing::{PatternError, RouteTable};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Item API route table, built once at startup
    pub routes: RouteTable<Handler>,
    /// Connections currently being served
    pub active_connections: Arc<AtomicUsize>,
    /// Flips to `true` once shutdown starts; connections watch it
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, PatternError> {
        Ok(Self {
            config: config.clone(),
            routes: crate::api::route_table()?,
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown: watch::channel(false).0,
        })
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Ask every open connection to finish its current request and close
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
