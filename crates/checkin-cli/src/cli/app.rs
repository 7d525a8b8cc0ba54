//! Wires the stores to a gateway built from config and reacts to gateway events.

use std::sync::Arc;

use anyhow::{Context, Result};
use checkin_core::checkin::CheckInStore;
use checkin_core::config::{Config, DEFAULT_API_BASE_URL};
use checkin_core::gateway::{FileCredentialStore, GatewayClient, GatewayEvent};
use checkin_core::session::SessionStore;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub const SESSION_EXPIRED: &str = "Session expired. Run `checkin login` to sign in again.";

pub struct App {
    pub session: SessionStore,
    pub checkins: CheckInStore,
    events: broadcast::Receiver<GatewayEvent>,
}

impl App {
    pub fn from_config() -> Result<Self> {
        let config = Config::load().context("load config")?;
        let base_url = config.resolve_api_base_url()?;
        let credentials = FileCredentialStore::default_location();
        tracing::debug!(base_url = %base_url, credentials = %credentials.path().display(), "starting client");

        let gateway = GatewayClient::new(base_url, Arc::new(credentials), config.request_timeout())?;
        Ok(Self::with_gateway(gateway))
    }

    /// For commands that never reach the network. Ignores config and the
    /// API URL override so a broken setup cannot block them.
    pub fn local() -> Result<Self> {
        let credentials = FileCredentialStore::default_location();
        let gateway = GatewayClient::new(DEFAULT_API_BASE_URL, Arc::new(credentials), None)?;
        Ok(Self::with_gateway(gateway))
    }

    fn with_gateway(gateway: GatewayClient) -> Self {
        let events = gateway.subscribe();
        Self {
            session: SessionStore::new(gateway.clone()),
            checkins: CheckInStore::new(gateway),
            events,
        }
    }

    /// Reports gateway events raised while the command ran. An invalidated
    /// session sends the user back to `checkin login`, unless the command
    /// was already an attempt to sign in (`announce` false).
    pub fn handle_gateway_events(&mut self, announce: bool) {
        let mut invalidated = false;
        loop {
            match self.events.try_recv() {
                Ok(GatewayEvent::SessionInvalidated) => invalidated = true,
                // every event kind is an invalidation
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "gateway events lagged");
                    invalidated = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        if invalidated && announce {
            eprintln!("{SESSION_EXPIRED}");
        }
    }
}
