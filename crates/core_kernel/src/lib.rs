//! Core Kernel - Foundational types and utilities for the lead marketplace
//!
//! This crate provides the fundamental building blocks used across all domain
//! modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers and value objects
//! - Port abstractions shared by store and gateway adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{JobId, ClaimId, HomeownerId, ProId, PaymentRef};
pub use ports::{PortError, DomainPort};
