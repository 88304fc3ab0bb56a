//! The WellNest retrieval pipeline.
//!
//! ```text
//! FilterCriteria ─▶ ActivityComposer ─▶ candidates (catalog order)
//!                                          │
//!                       AssetEnricher ◀────┘  bounded, order-preserving
//!                                          │
//!                                          ▼
//!                                   ActivityResponse
//! ```
//!
//! The composer issues one structured-store query and applies the theme
//! post-filter. The enricher attaches each candidate's flashcards from the
//! content store; its failures stay scoped to one activity. The service
//! ties the two together and assembles the response.

pub mod composer;
pub mod enricher;
pub mod service;

pub use composer::ActivityComposer;
pub use enricher::{AssetEnricher, EnricherConfig};
pub use service::RetrievalService;
