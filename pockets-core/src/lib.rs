pub mod calculations;
pub mod db;
pub mod models;
pub mod reports;
pub mod scan;

pub use db::repository::{PocketsRepository, RepositoryError};
pub use models::*;
