// Students module: the slice of student data the fee ledger reads

pub mod models;
pub mod repository;

pub use models::Student;
pub use repository::{MySqlStudentRepository, StudentRepository};
