//! Application state shared by every front end.

use std::sync::Arc;

use crate::catalog::{CatalogClient, CatalogSource};
use crate::config::StorefrontConfig;
use crate::db::{Database, RepositoryError, Store};
use crate::location::{Geocoder, LocationTracker, NominatimGeocoder};
use crate::services::{AdminService, AuthCoordinator, CartManager, ProfileService};
use crate::session::SessionIdentity;
use crate::view_state::CatalogAggregator;

/// Application state shared across all front ends.
///
/// This struct is cheaply cloneable via `Arc`. Every service shares the same
/// store and session, so a login through [`AppState::auth`] is seen by the
/// profile, admin and view-state consumers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    database: Database,
    session: SessionIdentity,
    catalog: Arc<dyn CatalogSource>,
    auth: AuthCoordinator,
    cart: CartManager,
    profile: ProfileService,
    admin: AdminService,
    location: LocationTracker,
}

impl AppState {
    /// Open the database from `config` and wire up the services.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database cannot be opened or migrated.
    pub async fn from_config(config: StorefrontConfig) -> Result<Self, RepositoryError> {
        let database = Database::connect(&config.database_url).await?;
        let catalog: Arc<dyn CatalogSource> = Arc::new(CatalogClient::new(&config.catalog));
        let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimGeocoder::new(&config.geocoder));
        Ok(Self::new(config, database, catalog, geocoder))
    }

    /// Build the state over already constructed collaborators.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        database: Database,
        catalog: Arc<dyn CatalogSource>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let store: Arc<dyn Store> = Arc::new(database.clone());
        let session = SessionIdentity::new();

        Self {
            inner: Arc::new(AppStateInner {
                auth: AuthCoordinator::new(Arc::clone(&store), session.clone()),
                profile: ProfileService::new(Arc::clone(&store), session.clone()),
                admin: AdminService::new(store, session.clone()),
                cart: CartManager::new(),
                location: LocationTracker::new(geocoder),
                config,
                database,
                session,
                catalog,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.inner.database
    }

    /// The store as a trait object, for feeds and background tasks.
    #[must_use]
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::new(self.inner.database.clone())
    }

    #[must_use]
    pub fn session(&self) -> &SessionIdentity {
        &self.inner.session
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<dyn CatalogSource> {
        Arc::clone(&self.inner.catalog)
    }

    #[must_use]
    pub fn auth(&self) -> &AuthCoordinator {
        &self.inner.auth
    }

    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    #[must_use]
    pub fn profile(&self) -> &ProfileService {
        &self.inner.profile
    }

    #[must_use]
    pub fn admin(&self) -> &AdminService {
        &self.inner.admin
    }

    #[must_use]
    pub fn location(&self) -> &LocationTracker {
        &self.inner.location
    }

    /// Start the catalog sync and the view-state aggregator for this session.
    #[must_use]
    pub fn start_catalog(&self) -> CatalogAggregator {
        CatalogAggregator::start(
            self.store(),
            &self.inner.session,
            self.catalog(),
            &self.inner.config.catalog,
        )
    }
}
