//! Customers: the parties invoices are billed to.
//!
//! Plain CRUD over a [`CustomerStore`]; the only rules are request validation and
//! turning lookup misses into [`CustomerError::NotFound`].

pub mod customer;
pub mod in_memory;
pub mod service;
pub mod store;

pub use customer::{Customer, CustomerCreateRequest, CustomerUpdateRequest};
pub use in_memory::InMemoryCustomerStore;
pub use service::{CustomerError, CustomerService};
pub use store::CustomerStore;
