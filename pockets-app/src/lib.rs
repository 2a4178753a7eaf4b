pub mod app;
pub mod config;
pub mod error;
pub mod forms;
pub mod logging;
pub mod preferences;
pub mod scanner;
pub mod state;
pub mod utils;

pub use app::{Pockets, Session, build_registry};
pub use config::AppConfig;
pub use error::AppError;
