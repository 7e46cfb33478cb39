pub mod receipt_issuer;

pub use receipt_issuer::ReceiptIssuer;
