//! Typed access to validators, proposals and parameters.

use crate::codec;
use crate::db::{
    BatchOp, Result, Storage, APPLICATION_PREFIX, KICK_PREFIX, LAST_HEIGHT_KEY,
    NEXT_APPLICATION_ID_KEY, NEXT_KICK_ID_KEY, OPEN_APPLICATION_PREFIX, OPEN_KICK_PREFIX,
    PARAMS_KEY, VALIDATOR_PREFIX,
};
use poa_core::{Address, Application, KickProposal, Params, ProposalId, Validator};

/// First id handed out in each proposal sequence.
pub const FIRST_PROPOSAL_ID: ProposalId = 1;

/// Everything a single state transition writes, applied in one batch.
#[derive(Debug, Default)]
pub struct WriteSet {
    pub validators: Vec<Validator>,
    pub applications: Vec<Application>,
    pub kick_proposals: Vec<KickProposal>,
    pub params: Option<Params>,
    pub next_application_id: Option<ProposalId>,
    pub next_kick_id: Option<ProposalId>,
    pub last_height: Option<u64>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
            && self.applications.is_empty()
            && self.kick_proposals.is_empty()
            && self.params.is_none()
            && self.next_application_id.is_none()
            && self.next_kick_id.is_none()
            && self.last_height.is_none()
    }
}

/// Durable registry of PoA governance state.
///
/// The registry stores whatever it is given: business rules live in the
/// keeper. It only refuses malformed keys and unknown record versions.
pub struct Registry<'a> {
    storage: &'a Storage,
}

impl<'a> Registry<'a> {
    /// Create a new Registry wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // =========================================================================
    // Validators
    // =========================================================================

    pub fn get_validator(&self, address: &Address) -> Result<Option<Validator>> {
        self.storage.get(Storage::validator_key(address))
    }

    /// All validators, active and removed, ordered by address bytes.
    pub fn list_validators(&self) -> Result<Vec<Validator>> {
        let entries: Vec<(Vec<u8>, Validator)> = self.storage.scan(VALIDATOR_PREFIX)?;
        entries
            .into_iter()
            .map(|(suffix, validator)| {
                Storage::parse_address(&suffix)?;
                Ok(validator)
            })
            .collect()
    }

    /// Insert or overwrite a validator.
    pub fn put_validator(&self, validator: &Validator) -> Result<()> {
        self.storage
            .put(Storage::validator_key(&validator.address), validator)
    }

    // =========================================================================
    // Applications
    // =========================================================================

    pub fn get_application(&self, id: ProposalId) -> Result<Option<Application>> {
        self.storage.get(Storage::application_key(id))
    }

    /// Every application ever submitted, ordered by id.
    pub fn list_applications(&self) -> Result<Vec<Application>> {
        let entries: Vec<(Vec<u8>, Application)> = self.storage.scan(APPLICATION_PREFIX)?;
        entries
            .into_iter()
            .map(|(suffix, application)| {
                Storage::parse_id(&suffix)?;
                Ok(application)
            })
            .collect()
    }

    /// Applications still open, ordered by id.
    pub fn list_open_applications(&self) -> Result<Vec<Application>> {
        let mut open = Vec::new();
        for suffix in self.storage.scan_keys(OPEN_APPLICATION_PREFIX)? {
            let id = Storage::parse_id(&suffix)?;
            open.push(self.storage.get_or_err(Storage::application_key(id))?);
        }
        Ok(open)
    }

    pub fn put_application(&self, application: &Application) -> Result<()> {
        let mut ops = Vec::new();
        push_application(&mut ops, application)?;
        self.storage.batch(ops)
    }

    // =========================================================================
    // Kick proposals
    // =========================================================================

    pub fn get_kick_proposal(&self, id: ProposalId) -> Result<Option<KickProposal>> {
        self.storage.get(Storage::kick_key(id))
    }

    /// Every kick proposal ever submitted, ordered by id.
    pub fn list_kick_proposals(&self) -> Result<Vec<KickProposal>> {
        let entries: Vec<(Vec<u8>, KickProposal)> = self.storage.scan(KICK_PREFIX)?;
        entries
            .into_iter()
            .map(|(suffix, proposal)| {
                Storage::parse_id(&suffix)?;
                Ok(proposal)
            })
            .collect()
    }

    /// Kick proposals still open, ordered by id.
    pub fn list_open_kick_proposals(&self) -> Result<Vec<KickProposal>> {
        let mut open = Vec::new();
        for suffix in self.storage.scan_keys(OPEN_KICK_PREFIX)? {
            let id = Storage::parse_id(&suffix)?;
            open.push(self.storage.get_or_err(Storage::kick_key(id))?);
        }
        Ok(open)
    }

    pub fn put_kick_proposal(&self, proposal: &KickProposal) -> Result<()> {
        let mut ops = Vec::new();
        push_kick_proposal(&mut ops, proposal)?;
        self.storage.batch(ops)
    }

    // =========================================================================
    // Params and metadata
    // =========================================================================

    /// Current parameters, `None` before genesis.
    pub fn get_params(&self) -> Result<Option<Params>> {
        self.storage.get(PARAMS_KEY)
    }

    pub fn set_params(&self, params: &Params) -> Result<()> {
        self.storage.put(PARAMS_KEY, params)
    }

    pub fn next_application_id(&self) -> Result<ProposalId> {
        Ok(self
            .storage
            .get(NEXT_APPLICATION_ID_KEY)?
            .unwrap_or(FIRST_PROPOSAL_ID))
    }

    pub fn next_kick_id(&self) -> Result<ProposalId> {
        Ok(self.storage.get(NEXT_KICK_ID_KEY)?.unwrap_or(FIRST_PROPOSAL_ID))
    }

    /// Height of the last block applied, `None` if no block was applied yet.
    pub fn last_height(&self) -> Result<Option<u64>> {
        self.storage.get(LAST_HEIGHT_KEY)
    }

    // =========================================================================
    // Atomic commit
    // =========================================================================

    /// Write a whole state transition atomically.
    ///
    /// Every record is encoded before anything touches the database, so an
    /// encoding failure leaves the store unchanged.
    pub fn commit(&self, writes: &WriteSet) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut ops = Vec::new();
        for validator in &writes.validators {
            ops.push(BatchOp::Insert {
                key: Storage::validator_key(&validator.address),
                value: codec::encode(validator)?,
            });
        }
        for application in &writes.applications {
            push_application(&mut ops, application)?;
        }
        for proposal in &writes.kick_proposals {
            push_kick_proposal(&mut ops, proposal)?;
        }
        if let Some(params) = &writes.params {
            push_value(&mut ops, PARAMS_KEY, params)?;
        }
        if let Some(id) = writes.next_application_id {
            push_value(&mut ops, NEXT_APPLICATION_ID_KEY, &id)?;
        }
        if let Some(id) = writes.next_kick_id {
            push_value(&mut ops, NEXT_KICK_ID_KEY, &id)?;
        }
        if let Some(height) = writes.last_height {
            push_value(&mut ops, LAST_HEIGHT_KEY, &height)?;
        }

        self.storage.batch(ops)
    }
}

fn push_value<V: serde::Serialize>(ops: &mut Vec<BatchOp>, key: &[u8], value: &V) -> Result<()> {
    ops.push(BatchOp::Insert {
        key: key.to_vec(),
        value: codec::encode(value)?,
    });
    Ok(())
}

fn push_open_index(ops: &mut Vec<BatchOp>, key: Vec<u8>, open: bool) -> Result<()> {
    if open {
        ops.push(BatchOp::Insert {
            key,
            value: codec::encode(&())?,
        });
    } else {
        ops.push(BatchOp::Remove { key });
    }
    Ok(())
}

fn push_application(ops: &mut Vec<BatchOp>, application: &Application) -> Result<()> {
    ops.push(BatchOp::Insert {
        key: Storage::application_key(application.id),
        value: codec::encode(application)?,
    });
    push_open_index(
        ops,
        Storage::open_application_key(application.id),
        application.ballot.is_open(),
    )
}

fn push_kick_proposal(ops: &mut Vec<BatchOp>, proposal: &KickProposal) -> Result<()> {
    ops.push(BatchOp::Insert {
        key: Storage::kick_key(proposal.id),
        value: codec::encode(proposal)?,
    });
    push_open_index(
        ops,
        Storage::open_kick_key(proposal.id),
        proposal.ballot.is_open(),
    )
}
