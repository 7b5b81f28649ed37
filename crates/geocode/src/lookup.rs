use crate::error::Result;
use async_trait::async_trait;
use renamr_cache::Coordinate;

/// Resolves a coordinate to a human-readable place label.
///
/// An empty label means the service knows nothing useful about the place;
/// it is a successful answer, not an error. Implementations enforce their
/// own per-call timeout.
#[async_trait]
pub trait LabelLookup: Send + Sync {
    async fn lookup(&self, coordinate: Coordinate) -> Result<String>;
}
