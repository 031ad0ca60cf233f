//! Persistence layer: MongoDB connection, document models, repositories.

pub mod models;
mod mongo;
pub mod repository;

pub use mongo::Database;
pub use repository::{
    ActionLogRepo, CaptchaRepo, ChatSettingsRepo, FederationRepo, FilterRepo, NoteRepo, UserRepo,
};
