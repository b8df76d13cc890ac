//! SurrealDB repository implementations.

mod place;
mod reading;
mod tenant;

pub use place::SurrealPlaceRepository;
pub use reading::SurrealReadingRepository;
pub use tenant::SurrealTenantRepository;
