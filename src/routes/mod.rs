use crate::services::cache::ResponseCache;
use crate::services::geo::WktPointParser;
use crate::services::open_meteo::ArchiveClient;

pub mod admin;
pub mod competitions;
pub mod editions;
pub mod health;

/// Shared application state for admin and public competition endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pool: sqlx::PgPool,
    pub(crate) archive_client: ArchiveClient,
    pub(crate) geo_parser: WktPointParser,
    pub(crate) cache: ResponseCache,
}
