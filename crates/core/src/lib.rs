//! `chargebook-core` — shared building blocks for the billing back-office.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, the clock capability and the error types shared by stores.

pub mod clock;
pub mod error;
pub mod id;
pub mod money;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use id::{CustomerId, InvoiceId};
pub use money::{Currency, Money};
