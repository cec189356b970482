// Service exports
pub mod appwrite;
pub mod directory;
pub mod geolocation;
pub mod postgres;
pub mod redis_store;
pub mod storage;

pub use appwrite::AppwriteDirectory;
pub use directory::{UserDirectory, MemoryDirectory, CachedDirectory, DirectoryError};
pub use geolocation::{LocationProvider, FixedLocationProvider, UnsupportedProvider, GeolocationError, ShareLocationError, acquire_location, share_current_location};
pub use postgres::PostgresStore;
pub use redis_store::RedisStore;
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageKey};
