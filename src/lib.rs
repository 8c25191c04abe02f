//! Client library for the book rental storefront backend: catalog browsing with
//! server-side paging and local search ranking, rental cart, and account flows.

pub mod cart;
pub mod catalog_client;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod registration;
pub mod session;

pub use catalog_client::{BookCatalogService, CatalogClient, OrderService};
pub use engine::{CatalogQueryEngine, EngineConfig, FetchOutcome, QueryState};
pub use error::{CatalogError, CatalogResult};
pub use session::{Credential, MemorySession, SessionStore};
