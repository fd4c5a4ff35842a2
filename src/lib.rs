//! Rangecheck - a reference model and conformance oracle for text providers
//! that expose range-based navigation.
//!
//! A provider under test implements the traits in [`provider`]. The oracle
//! writes a sample document into it, builds ranges over that document, calls
//! the provider, and compares every answer against what a small reference
//! model predicts.
//!
//! # Quick Start
//!
//! ```
//! use rangecheck::model::MemoryProvider;
//! use rangecheck::normalize::ProviderClass;
//! use rangecheck::scenario;
//! use rangecheck::session::DocumentSession;
//! use rangecheck::config::OracleConfig;
//!
//! let mut provider = MemoryProvider::new(ProviderClass::RichEdit);
//! let session = DocumentSession::establish(&mut provider, "String 1 String 2").unwrap();
//!
//! let table = scenario::move_count(&provider, &provider, &session, &OracleConfig::default()).unwrap();
//! assert!(table.is_clean());
//! assert_eq!(table.counts[0], 17);
//! ```
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`unit`], [`range`] | Text units, endpoints and immutable ranges |
//! | [`normalize`], [`session`] | Provider-appended terminators and document snapshots |
//! | [`factory`] | Builds ranges by kind |
//! | [`movement`], [`search`], [`compare`], [`attribute`] | The oracles |
//! | [`outcome`], [`error`] | Expected outcomes, failures and reports |
//! | [`scenario`] | Composite runs over a whole document |
//! | [`model`] | Reference segmentation and an in-memory provider |

pub mod attribute;
pub mod compare;
pub mod config;
pub mod error;
pub mod factory;
pub mod model;
pub mod movement;
pub mod normalize;
pub mod outcome;
pub mod provider;
pub mod range;
pub mod scenario;
pub mod search;
pub mod session;
pub mod unit;

pub use error::Error;
pub use error::Result;
