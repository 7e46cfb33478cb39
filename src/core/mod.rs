pub mod currency;
pub mod dates;
pub mod error;
pub mod insert;

pub use currency::Currency;
pub use error::{AppError, Result};
pub use insert::InsertOutcome;
