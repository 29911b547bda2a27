//! Core library for cardvault
//!
//! This crate implements the **Functional Core** of the cardvault application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`cardvault_core`** (this crate): Pure transformation functions with zero network I/O
//! - **`cardvault`**: HTTP lookups, persistence and orchestration (the Imperative Shell)
//!
//! Everything here is deterministic and testable with plain fixture data: the
//! shell fetches catalog cards and stored collections, this crate decides what
//! they mean.
//!
//! # Module Organization
//!
//! - [`record`]: The collection data model and its persisted JSON form
//! - [`import`]: CSV export decoding and row normalization
//! - [`catalog`]: Interpretation of Scryfall card responses
//! - [`enrich`]: Merging a batch of lookup results back into the collection
//! - [`view`]: Search, pagination and totals for display
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use cardvault_core::import::import_collection;
//! use cardvault_core::view::{project, ViewState};
//!
//! let csv = "Name,Quantity\nLightning Bolt,4\nShock,2\n";
//! let records = import_collection(csv.as_bytes())?;
//!
//! let view = project(&records, &ViewState::new("bolt", 1));
//! assert_eq!(view.page.len(), 1);
//! ```

pub mod catalog;
pub mod enrich;
pub mod import;
pub mod record;
pub mod view;
