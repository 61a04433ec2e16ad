//! External API clients.

pub mod tmdb;

pub use tmdb::TmdbClient;
