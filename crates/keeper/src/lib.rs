//! PoA membership governance keeper.
//!
//! The keeper is the only writer of governance state. It covers:
//! - Applications: an active validator proposes a candidate, validators
//!   vote, and an approved candidate joins the set
//! - Kick proposals: the same flow for removing an active validator, bounded
//!   by a minimum active set size
//! - Block application: signed messages are verified and delivered in order,
//!   then expired proposals are swept
//!
//! Every operation loads a working set, mutates it, and commits the result
//! in one storage batch, so a failed operation leaves no trace.
//!
//! # Example
//!
//! ```rust,no_run
//! use poa_core::{Description, GenesisState, Keypair};
//! use poa_keeper::{Context, Keeper};
//! use poa_storage::Storage;
//!
//! let storage = Storage::open_temporary().unwrap();
//! let alice = Keypair::generate();
//! let mut keeper = Keeper::new(&storage);
//! keeper
//!     .init_genesis(&GenesisState::with_validators([alice.address()], 10))
//!     .unwrap();
//!
//! // A lone validator holds the whole quorum, so this admits bob at once.
//! let bob = Keypair::generate();
//! let outcome = keeper
//!     .submit_application(
//!         Context::at(1),
//!         alice.address(),
//!         bob.address(),
//!         Description::new("bob"),
//!     )
//!     .unwrap();
//! println!("application {} is {}", outcome.id, outcome.status);
//! ```

mod admission;
pub mod error;
pub mod events;
pub mod handler;
pub mod keeper;
mod removal;
pub mod tally;
mod working;

pub use error::{KeeperError, Result};
pub use events::{Event, Outcome};
pub use handler::{BlockResult, Receipt};
pub use keeper::{Context, Keeper};
pub use tally::{evaluate, Verdict};
