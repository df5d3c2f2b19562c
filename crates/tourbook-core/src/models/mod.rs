//! Data models for the tour-booking backend.
//!
//! - `Tour`, `Transporter`, `DetailTourRequest`: catalog and admin scheduling
//! - `Order`, `OrderSummary`: a customer's order history

pub mod order;
pub mod tour;

pub use order::{Order, OrderSummary};
pub use tour::{DetailTourRequest, Tour, Transporter, ValidationError};
