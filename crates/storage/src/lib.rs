//! Persistent storage layer for PoA governance state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Keeper (writes)   Query Service (reads)     │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌──────────────────┐  ┌────────────┐  ┌─────────────┐  │
//! │  │ Registry         │  │ codec      │  │ Storage     │  │
//! │  │  - Validators    │  │  - version │  │  - sled     │  │
//! │  │  - Applications  │  │    byte    │  │  - batches  │  │
//! │  │  - Kick props    │  │  - bincode │  │  - key      │  │
//! │  │  - Params        │  │            │  │    helpers  │  │
//! │  └──────────────────┘  └────────────┘  └─────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use poa_storage::{Registry, Storage};
//! use poa_core::{Address, Description, Validator};
//!
//! let storage = Storage::open("./poa_data").unwrap();
//! let registry = Registry::new(&storage);
//!
//! let alice = Validator::new(Address([0xAA; 20]), 10, Description::new("alice"), 0);
//! registry.put_validator(&alice).unwrap();
//! assert_eq!(registry.list_validators().unwrap().len(), 1);
//! ```

pub mod codec;
pub mod db;
pub mod registry;

// Re-export commonly used types
pub use db::{BatchOp, Result, Storage, StorageError};
pub use registry::{Registry, WriteSet, FIRST_PROPOSAL_ID};
