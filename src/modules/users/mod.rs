// Users module: staff identities and the capability policy around them

pub mod models;
pub mod repository;

pub use models::{Capability, Role, User};
pub use repository::{MySqlUserRepository, UserRepository};
