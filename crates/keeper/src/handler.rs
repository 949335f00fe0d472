//! Message handler and block application.
//!
//! Signed messages are verified, executed against the block's working set
//! and turned into receipts. A failed message only affects its own receipt; a
//! store failure aborts the whole block. The block's records, its sweep and
//! its height are written in one batch.

use crate::error::{KeeperError, Result};
use crate::events::{Event, Outcome};
use crate::keeper::{settle, Context, Keeper};
use poa_core::{Address, ErrorKind, SignedMsg};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

/// Result of delivering a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hex hash of the signed message.
    pub tx_hash: String,
    pub sender: Address,
    /// Message kind, e.g. `vote-application`.
    pub msg: String,
    /// Set if the message was applied.
    pub outcome: Option<Outcome>,
    /// Error message (if failed).
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of applying a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResult {
    pub height: u64,
    /// One receipt per message, in block order.
    pub receipts: Vec<Receipt>,
    /// Events from the end-of-block sweep.
    pub events: Vec<Event>,
}

impl<'a> Keeper<'a> {
    /// Verify `signed` and apply its message on behalf of the sender.
    pub fn deliver(&mut self, ctx: Context, signed: &SignedMsg) -> Result<Outcome> {
        signed.verify()?;
        self.apply(ctx, signed.sender, &signed.msg)
    }

    /// Apply `msgs` at `height`, then run the end-of-block sweep.
    ///
    /// Heights must strictly increase across calls. Either the whole block
    /// is committed, height included, or nothing is.
    pub fn apply_block(&mut self, height: u64, msgs: &[SignedMsg]) -> Result<BlockResult> {
        let span = info_span!(target: "poa", "block", height);
        let _guard = span.enter();

        self.ensure_open_height(height)?;

        let ctx = Context::at(height);
        let mut ws = self.load()?;
        let mut receipts = Vec::with_capacity(msgs.len());
        for signed in msgs {
            let tx_hash = signed.hash().to_hex();
            let kind = signed.msg.kind();
            let snapshot = ws.clone();
            let result = signed
                .verify()
                .map_err(KeeperError::from)
                .and_then(|()| self.execute(&mut ws, ctx, signed.sender, &signed.msg));

            let receipt = match result {
                Ok(outcome) => Receipt {
                    tx_hash,
                    sender: signed.sender,
                    msg: kind.to_string(),
                    outcome: Some(outcome),
                    error: None,
                    error_kind: None,
                },
                Err(err @ KeeperError::Storage(_)) => return Err(err),
                Err(err) => {
                    ws = snapshot;
                    warn!(
                        target: "poa",
                        sender = %signed.sender,
                        msg = kind,
                        error = %err,
                        "message rejected"
                    );
                    Receipt {
                        tx_hash,
                        sender: signed.sender,
                        msg: kind.to_string(),
                        outcome: None,
                        error: Some(err.to_string()),
                        error_kind: Some(err.kind()),
                    }
                }
            };
            receipts.push(receipt);
        }

        let since = ws.events.len();
        settle(&mut ws, height);
        let (mut writes, mut events) = ws.into_write_set();
        let events = events.split_off(since);
        writes.last_height = Some(height);
        self.registry.commit(&writes)?;

        let failed = receipts.iter().filter(|r| !r.is_success()).count();
        info!(target: "poa", txs = receipts.len(), failed, "block applied");
        Ok(BlockResult {
            height,
            receipts,
            events,
        })
    }
}
