// Playlist Export Infrastructure - SQLite Adapter
// Implements: PlaylistRepository (library store), MessageBroker (durable queue)

mod broker;
mod connection;
mod error;
mod migration;
mod playlist_repository;

pub use broker::SqliteMessageBroker;
pub use connection::create_pool;
pub use migration::run_migrations;
pub use playlist_repository::SqlitePlaylistRepository;
