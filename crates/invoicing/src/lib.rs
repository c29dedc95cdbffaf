//! Invoicing: the invoice status model and its update path.
//!
//! The store owns persisted state; every status change goes through
//! [`InvoiceManager::update`], which guards the one illegal transition
//! (`Paid -> Canceled`).

pub mod in_memory;
pub mod invoice;
pub mod manager;
pub mod store;

pub use in_memory::InMemoryInvoiceStore;
pub use invoice::{
    Invoice, InvoiceCreateRequest, InvoiceQuery, InvoiceStatus, InvoiceUpdateRequest, NewInvoice,
};
pub use manager::{InvoiceError, InvoiceManager};
pub use store::InvoiceStore;
