// Adapters layer: the public data providers, the HTTP client they share,
// and local storage for cache and outputs.

pub mod cache;
pub mod elexon;
pub mod http;
pub mod national_grid;
pub mod sheffield;
pub mod storage;

pub use cache::DiskCache;
pub use elexon::{ElexonClient, ElexonDemand, ElexonWind};
pub use http::ApiClient;
pub use national_grid::NationalGridWind;
pub use sheffield::SheffieldSolar;
pub use storage::LocalStorage;
