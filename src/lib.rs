//! Credit portfolio scoring.
//!
//! Turns raw customer rows (limit, balance, overdue invoices, payment delay,
//! purchase history) into risk and value scores, a strategic value index (IVE),
//! a star tier, a payer profile and alerts. Every weight and threshold comes
//! from [`scoring::ScoringSettings`].

pub mod config;
pub mod insights;
pub mod output;
pub mod records;
pub mod scoring;
pub mod summary;
pub mod worker;

pub use records::{EnrichedCustomerRecord, RawCustomerRecord};
pub use scoring::{enrich, validate_settings, ScoringSettings};
pub use summary::{summarize, PortfolioSummary};
