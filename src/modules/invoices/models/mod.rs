mod invoice;
mod line_item;

pub use invoice::{GenerateInvoiceRequest, Invoice, InvoiceStatus, NewInvoice};
pub use line_item::{any_amount_bearing, sum_amounts, LineItem, LineItemSource, FEES_DUE_DESCRIPTION};
