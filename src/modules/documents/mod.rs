// Documents module: invoice/receipt render contexts, canonical PDF paths, renderer capability

pub mod models;
pub mod paths;
pub mod services;

pub use models::{DocumentContext, DocumentKind, InvoiceDocument, ReceiptDocument};
pub use paths::DocumentPaths;
pub use services::{DocumentRenderer, WkhtmltopdfRenderer};
