use poa_core::{
    Address, Application, Description, GenesisState, KickProposal, Params, ProposalStatus,
    Validator, VoteValue,
};
use poa_keeper::{Context, Keeper};
use poa_query::{QueryProposalParams, QueryRoute, QueryService, QueryValidatorParams};
use poa_storage::Storage;

fn addr(b: u8) -> Address {
    Address([b; 20])
}

/// Three validators, one finalized and one open application, one open kick.
fn populated() -> Storage {
    let storage = Storage::open_temporary().unwrap();
    let mut keeper = Keeper::new(&storage);
    keeper
        .init_genesis(&GenesisState::with_validators([addr(1), addr(2), addr(3)], 10))
        .unwrap();

    let approved = keeper
        .submit_application(Context::at(1), addr(1), addr(8), Description::new("eight"))
        .unwrap()
        .id;
    keeper
        .vote_application(Context::at(1), approved, addr(2), VoteValue::Approve)
        .unwrap();
    keeper
        .submit_application(Context::at(2), addr(1), addr(9), Description::new("nine"))
        .unwrap();
    keeper
        .submit_kick_proposal(Context::at(2), addr(2), addr(3))
        .unwrap();
    storage
}

#[test]
fn test_json_responses_match_registry() {
    let storage = populated();
    let service = QueryService::new(&storage);

    let request = serde_json::to_vec(&QueryValidatorParams::new(&addr(8))).unwrap();
    let raw = service.query("custom/poa/validator", &request).unwrap();
    let validator: Validator = serde_json::from_slice(&raw).unwrap();
    assert_eq!(validator, service.validator(&addr(8)).unwrap());

    let raw = service.query("custom/poa/validators", &[]).unwrap();
    let validators: Vec<Validator> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(validators.len(), 4);
    assert!(validators.windows(2).all(|w| w[0].address < w[1].address));

    let raw = service.query("custom/poa/params", &[]).unwrap();
    let params: Params = serde_json::from_slice(&raw).unwrap();
    assert_eq!(params, Params::default());
}

#[test]
fn test_lists_only_show_open_proposals() {
    let storage = populated();
    let service = QueryService::new(&storage);

    let raw = service
        .query(&QueryRoute::Applications.path(), &[])
        .unwrap();
    let applications: Vec<Application> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].candidate, addr(9));

    let raw = service
        .query(&QueryRoute::KickProposals.path(), &[])
        .unwrap();
    let proposals: Vec<KickProposal> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].target, addr(3));
}

#[test]
fn test_point_lookups_include_finalized() {
    let storage = populated();
    let service = QueryService::new(&storage);

    let request = serde_json::to_vec(&QueryProposalParams { id: 1 }).unwrap();
    let raw = service.query("custom/poa/application", &request).unwrap();
    let application: Application = serde_json::from_slice(&raw).unwrap();
    assert_eq!(application.ballot.status, ProposalStatus::Approved);

    let raw = service.query("custom/poa/kick-proposal", &request).unwrap();
    let proposal: KickProposal = serde_json::from_slice(&raw).unwrap();
    assert_eq!(proposal.ballot.status, ProposalStatus::Open);

    let missing = serde_json::to_vec(&QueryProposalParams { id: 42 }).unwrap();
    assert!(service.query("custom/poa/application", &missing).is_err());
}

#[test]
fn test_concurrent_readers() {
    let storage = populated();
    let service = QueryService::new(&storage);
    let expected = service.validators().unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| service.validators().unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_written_validator_reads_back_identically() {
    let storage = Storage::open_temporary().unwrap();
    let registry = poa_storage::Registry::new(&storage);
    let mut removed = Validator::new(addr(5), 7, Description::new("five"), 3);
    removed.remove(9);
    registry.put_validator(&removed).unwrap();

    let service = QueryService::new(&storage);
    let single = service.validator(&addr(5)).unwrap();
    let listed = service.validators().unwrap();
    assert_eq!(single, removed);
    assert_eq!(listed, vec![removed]);
}
