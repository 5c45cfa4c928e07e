//! Last known location of the device.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::{Geocoder, RESOLVING_ADDRESS, resolve_address};

/// Coordinates and their resolved address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationState {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `None` before the first update; [`RESOLVING_ADDRESS`] while a lookup
    /// is running.
    pub address: Option<String>,
    /// Bumped on every update; lookups for an older value are discarded.
    generation: u64,
}

/// Tracks the latest coordinates and resolves their address in the
/// background.
#[derive(Clone)]
pub struct LocationTracker {
    geocoder: Arc<dyn Geocoder>,
    state: Arc<watch::Sender<LocationState>>,
}

impl LocationTracker {
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            state: Arc::new(watch::Sender::new(LocationState::default())),
        }
    }

    #[must_use]
    pub fn state(&self) -> LocationState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    /// Record new coordinates and start resolving their address.
    ///
    /// Returns immediately; the address is published when the lookup
    /// finishes, unless a newer update arrived first.
    pub fn update(&self, latitude: f64, longitude: f64) {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.latitude = Some(latitude);
            s.longitude = Some(longitude);
            s.address = Some(RESOLVING_ADDRESS.to_string());
        });

        let geocoder = Arc::clone(&self.geocoder);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let address = resolve_address(geocoder.as_ref(), latitude, longitude).await;
            let applied = state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                s.address = Some(address);
                true
            });
            if !applied {
                debug!(generation, "Discarded stale address lookup");
            }
        });
    }
}
