use std::path::{Path, PathBuf};

use crate::config::DocumentsConfig;

const INVOICE_PREFIX: &str = "INV-";

/// Canonical, deterministic PDF locations. Paths are derived, never probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    invoices_dir: PathBuf,
    receipts_dir: PathBuf,
}

impl DocumentPaths {
    pub fn new(invoices_dir: impl Into<PathBuf>, receipts_dir: impl Into<PathBuf>) -> Self {
        Self {
            invoices_dir: invoices_dir.into(),
            receipts_dir: receipts_dir.into(),
        }
    }

    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self::new(&config.invoices_dir, &config.receipts_dir)
    }

    /// `INV-{invoice_no}.pdf`, without doubling a prefix the invoice_no already carries
    pub fn invoice_pdf(&self, invoice_no: &str) -> PathBuf {
        let file_name = if invoice_no.starts_with(INVOICE_PREFIX) {
            format!("{}.pdf", invoice_no)
        } else {
            format!("{}{}.pdf", INVOICE_PREFIX, invoice_no)
        };
        self.invoices_dir.join(file_name)
    }

    pub fn receipt_pdf(&self, receipt_no: &str) -> PathBuf {
        self.receipts_dir.join(format!("{}.pdf", receipt_no))
    }

    pub fn invoices_dir(&self) -> &Path {
        &self.invoices_dir
    }

    pub fn receipts_dir(&self) -> &Path {
        &self.receipts_dir
    }
}
