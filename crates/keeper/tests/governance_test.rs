use poa_core::{
    Address, Description, Fraction, GenesisState, GenesisValidator, Keypair, Msg, Params,
    ProposalStatus, RejectionReason, SignedMsg, ValidatorStatus, VoteValue,
};
use poa_keeper::{Context, Event, Keeper, KeeperError};
use poa_storage::Storage;

fn addr(b: u8) -> Address {
    Address([b; 20])
}

fn genesis(validators: &[u8], params: Params) -> GenesisState {
    let mut genesis = GenesisState::with_validators(validators.iter().map(|b| addr(*b)), 10);
    genesis.params = params;
    genesis
}

fn setup(validators: &[u8]) -> Storage {
    let storage = Storage::open_temporary().unwrap();
    Keeper::new(&storage)
        .init_genesis(&genesis(validators, Params::default()))
        .unwrap();
    storage
}

fn active_count(keeper: &Keeper) -> usize {
    keeper
        .registry()
        .list_validators()
        .unwrap()
        .into_iter()
        .filter(|v| v.is_active())
        .count()
}

#[test]
fn test_two_of_three_admits_candidate() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let id = keeper
        .submit_application(Context::at(1), addr(1), addr(9), Description::new("x"))
        .unwrap()
        .id;
    let outcome = keeper
        .vote_application(Context::at(2), id, addr(2), VoteValue::Approve)
        .unwrap();

    assert_eq!(outcome.status, ProposalStatus::Approved);
    assert!(outcome.events.contains(&Event::ValidatorAdmitted {
        address: addr(9),
        power: 10
    }));
    assert_eq!(active_count(&keeper), 4);
    assert!(keeper.registry().list_open_applications().unwrap().is_empty());
}

#[test]
fn test_two_rejects_of_three_reject_application() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let id = keeper
        .submit_application(Context::at(1), addr(1), addr(9), Description::default())
        .unwrap()
        .id;
    let pending = keeper
        .vote_application(Context::at(2), id, addr(2), VoteValue::Reject)
        .unwrap();
    assert_eq!(pending.status, ProposalStatus::Open);

    let outcome = keeper
        .vote_application(Context::at(3), id, addr(3), VoteValue::Reject)
        .unwrap();
    assert_eq!(outcome.status, ProposalStatus::Rejected);
    assert_eq!(outcome.rejection, Some(RejectionReason::QuorumUnreachable));
    assert!(keeper.registry().get_validator(&addr(9)).unwrap().is_none());
}

#[test]
fn test_kick_below_floor_is_policy_violation() {
    let storage = Storage::open_temporary().unwrap();
    let params = Params {
        min_active_validators: 3,
        ..Params::default()
    };
    let mut keeper = Keeper::new(&storage);
    keeper.init_genesis(&genesis(&[1, 2, 3], params)).unwrap();

    let id = keeper
        .submit_kick_proposal(Context::at(1), addr(1), addr(2))
        .unwrap()
        .id;
    let outcome = keeper
        .vote_kick_proposal(Context::at(1), id, addr(3), VoteValue::Approve)
        .unwrap();

    assert_eq!(outcome.status, ProposalStatus::Rejected);
    let reason = outcome.rejection.unwrap();
    assert_eq!(reason, RejectionReason::QuorumMetButFloorViolation);
    assert_eq!(reason.kind(), Some(poa_core::ErrorKind::PolicyViolation));
    assert_eq!(active_count(&keeper), 3);
    assert!(!outcome
        .events
        .iter()
        .any(|e| matches!(e, Event::ValidatorRemoved { .. })));
}

#[test]
fn test_application_expires_at_window_end() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let id = keeper
        .submit_application(Context::at(10), addr(1), addr(9), Description::default())
        .unwrap()
        .id;

    assert!(keeper.end_block(Context::at(109)).unwrap().is_empty());
    let events = keeper.end_block(Context::at(110)).unwrap();
    assert_eq!(
        events,
        vec![Event::ApplicationFinalized {
            id,
            candidate: addr(9),
            status: ProposalStatus::Expired,
            rejection: None,
        }]
    );

    let application = keeper.registry().get_application(id).unwrap().unwrap();
    assert_eq!(application.ballot.status, ProposalStatus::Expired);
    assert_eq!(application.ballot.finalized_at, Some(110));
}

#[test]
fn test_late_vote_is_refused_before_sweep() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let id = keeper
        .submit_kick_proposal(Context::at(0), addr(1), addr(3))
        .unwrap()
        .id;
    let err = keeper
        .vote_kick_proposal(Context::at(100), id, addr(2), VoteValue::Approve)
        .unwrap_err();
    assert!(matches!(err, KeeperError::VotingClosed { deadline: 100, .. }));
    assert_eq!(active_count(&keeper), 3);
}

#[test]
fn test_last_vote_wins() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let id = keeper
        .submit_application(Context::at(1), addr(1), addr(9), Description::default())
        .unwrap()
        .id;
    keeper
        .vote_application(Context::at(2), id, addr(2), VoteValue::Reject)
        .unwrap();
    let outcome = keeper
        .vote_application(Context::at(3), id, addr(2), VoteValue::Approve)
        .unwrap();

    assert_eq!(outcome.status, ProposalStatus::Approved);
    let application = keeper.registry().get_application(id).unwrap().unwrap();
    assert_eq!(application.ballot.vote_of(&addr(2)), Some(VoteValue::Approve));
    assert_eq!(application.ballot.tally.reject_power, 0);
}

#[test]
fn test_removed_validator_votes_are_retracted() {
    let storage = setup(&[1, 2, 3, 4]);
    let mut keeper = Keeper::new(&storage);

    let application = keeper
        .submit_application(Context::at(1), addr(1), addr(9), Description::default())
        .unwrap()
        .id;
    keeper
        .vote_application(Context::at(1), application, addr(4), VoteValue::Reject)
        .unwrap();

    let kick = keeper
        .submit_kick_proposal(Context::at(2), addr(1), addr(4))
        .unwrap()
        .id;
    keeper
        .vote_kick_proposal(Context::at(2), kick, addr(2), VoteValue::Approve)
        .unwrap();
    let outcome = keeper
        .vote_kick_proposal(Context::at(2), kick, addr(3), VoteValue::Approve)
        .unwrap();
    assert_eq!(outcome.status, ProposalStatus::Approved);
    assert!(outcome.events.contains(&Event::VoteRetracted {
        voter: addr(4),
        application: Some(application),
        kick_proposal: None,
    }));

    let stored = keeper.registry().get_application(application).unwrap().unwrap();
    assert_eq!(stored.ballot.vote_of(&addr(4)), None);
    assert_eq!(stored.ballot.tally.reject_power, 0);
    assert_eq!(stored.ballot.status, ProposalStatus::Open);

    let err = keeper
        .vote_application(Context::at(3), application, addr(4), VoteValue::Reject)
        .unwrap_err();
    assert!(matches!(err, KeeperError::UnauthorizedVoter(_)));
}

#[test]
fn test_removal_can_carry_application_over_quorum() {
    let storage = setup(&[1, 2, 3, 4]);
    let mut keeper = Keeper::new(&storage);

    let application = keeper
        .submit_application(Context::at(1), addr(1), addr(9), Description::default())
        .unwrap()
        .id;
    keeper
        .vote_application(Context::at(1), application, addr(2), VoteValue::Approve)
        .unwrap();

    let kick = keeper
        .submit_kick_proposal(Context::at(2), addr(1), addr(4))
        .unwrap()
        .id;
    keeper
        .vote_kick_proposal(Context::at(2), kick, addr(2), VoteValue::Approve)
        .unwrap();
    let outcome = keeper
        .vote_kick_proposal(Context::at(2), kick, addr(3), VoteValue::Approve)
        .unwrap();

    // 20 of the remaining 30 power now meets 2/3.
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        Event::ApplicationFinalized {
            status: ProposalStatus::Approved,
            ..
        }
    )));
    let admitted = keeper.registry().get_validator(&addr(9)).unwrap().unwrap();
    assert!(admitted.is_active());
}

#[test]
fn test_removed_validator_can_reapply() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let kick = keeper
        .submit_kick_proposal(Context::at(1), addr(1), addr(3))
        .unwrap()
        .id;
    keeper
        .vote_kick_proposal(Context::at(1), kick, addr(2), VoteValue::Approve)
        .unwrap();
    assert_eq!(
        keeper.registry().get_validator(&addr(3)).unwrap().unwrap().status,
        ValidatorStatus::Removed
    );

    // Two validators left: one approval is half, both are needed.
    let application = keeper
        .submit_application(Context::at(5), addr(1), addr(3), Description::new("back"))
        .unwrap()
        .id;
    let outcome = keeper
        .vote_application(Context::at(6), application, addr(2), VoteValue::Approve)
        .unwrap();
    assert_eq!(outcome.status, ProposalStatus::Approved);

    let validator = keeper.registry().get_validator(&addr(3)).unwrap().unwrap();
    assert!(validator.is_active());
    assert_eq!(validator.admitted_at, 6);
    assert_eq!(validator.removed_at, None);
    assert_eq!(validator.description.moniker, "back");
}

#[test]
fn test_finalization_happens_once() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let id = keeper
        .submit_application(Context::at(1), addr(1), addr(9), Description::default())
        .unwrap()
        .id;
    keeper
        .vote_application(Context::at(2), id, addr(2), VoteValue::Approve)
        .unwrap();
    let before = keeper.registry().get_application(id).unwrap().unwrap();

    assert!(keeper.end_block(Context::at(500)).unwrap().is_empty());
    let after = keeper.registry().get_application(id).unwrap().unwrap();
    assert_eq!(before, after);
    assert_eq!(after.ballot.finalized_at, Some(2));
}

#[test]
fn test_params_update_resettles_open_proposals() {
    let storage = setup(&[1, 2, 3]);
    let mut keeper = Keeper::new(&storage);

    let id = keeper
        .submit_application(Context::at(1), addr(1), addr(9), Description::default())
        .unwrap()
        .id;
    let params = Params {
        quorum: Fraction::new(1, 3),
        ..Params::default()
    };
    let events = keeper.set_params(Context::at(2), params.clone()).unwrap();

    assert_eq!(events[0], Event::ParamsUpdated);
    assert_eq!(keeper.params().unwrap(), params);
    let application = keeper.registry().get_application(id).unwrap().unwrap();
    assert_eq!(application.ballot.status, ProposalStatus::Approved);
}

#[test]
fn test_invalid_params_are_refused() {
    let storage = setup(&[1]);
    let mut keeper = Keeper::new(&storage);

    let params = Params {
        voting_window: 0,
        ..Params::default()
    };
    assert!(matches!(
        keeper.set_params(Context::at(1), params),
        Err(KeeperError::InvalidParams(_))
    ));
    assert_eq!(keeper.params().unwrap(), Params::default());
}

#[test]
fn test_genesis_validation() {
    let storage = Storage::open_temporary().unwrap();
    let mut keeper = Keeper::new(&storage);

    let mut duplicate = genesis(&[1, 1], Params::default());
    assert!(matches!(
        keeper.init_genesis(&duplicate),
        Err(KeeperError::InvalidGenesis(_))
    ));

    duplicate.validators = vec![GenesisValidator {
        address: addr(1),
        power: 0,
        description: Description::default(),
    }];
    assert!(matches!(
        keeper.init_genesis(&duplicate),
        Err(KeeperError::InvalidGenesis(_))
    ));

    let too_few = genesis(
        &[1],
        Params {
            min_active_validators: 2,
            ..Params::default()
        },
    );
    assert!(matches!(
        keeper.init_genesis(&too_few),
        Err(KeeperError::InvalidGenesis(_))
    ));

    assert!(matches!(keeper.params(), Err(KeeperError::NotInitialized)));
    keeper
        .init_genesis(&genesis(&[1, 2], Params::default()))
        .unwrap();
    assert!(matches!(
        keeper.init_genesis(&genesis(&[3], Params::default())),
        Err(KeeperError::AlreadyInitialized)
    ));
}

#[test]
fn test_failed_message_leaves_state_untouched() {
    let alice = Keypair::generate();
    let bob = Keypair::generate();
    let carol = Keypair::generate();
    let storage = Storage::open_temporary().unwrap();
    let mut keeper = Keeper::new(&storage);
    keeper
        .init_genesis(&GenesisState::with_validators(
            [alice.address(), bob.address(), carol.address()],
            10,
        ))
        .unwrap();

    let candidate = addr(9);
    let submit = |keypair: &Keypair| {
        SignedMsg::new(
            Msg::SubmitApplication {
                candidate,
                description: Description::default(),
            },
            keypair,
        )
    };
    keeper.apply_block(1, &[submit(&alice)]).unwrap();
    let validators = keeper.registry().list_validators().unwrap();
    let application = keeper.registry().get_application(1).unwrap().unwrap();

    let result = keeper
        .apply_block(
            2,
            &[
                submit(&bob),
                SignedMsg::new(Msg::VoteApplication { id: 1, approve: true }, &Keypair::generate()),
                SignedMsg::new(Msg::VoteKickProposal { id: 4, approve: true }, &carol),
            ],
        )
        .unwrap();

    assert!(result.receipts.iter().all(|r| !r.is_success()));
    assert_eq!(keeper.registry().list_validators().unwrap(), validators);
    assert_eq!(keeper.registry().get_application(1).unwrap().unwrap(), application);
    assert_eq!(keeper.registry().next_application_id().unwrap(), 2);
    assert_eq!(keeper.registry().last_height().unwrap(), Some(2));
}

#[test]
fn test_block_sweep_expires_kick_proposal() {
    let alice = Keypair::generate();
    let bob = Keypair::generate();
    let carol = Keypair::generate();
    let storage = Storage::open_temporary().unwrap();
    let mut keeper = Keeper::new(&storage);
    keeper
        .init_genesis(&GenesisState::with_validators(
            [alice.address(), bob.address(), carol.address()],
            10,
        ))
        .unwrap();

    let kick = SignedMsg::new(
        Msg::SubmitKickProposal {
            target: carol.address(),
        },
        &alice,
    );
    keeper.apply_block(1, &[kick]).unwrap();
    assert!(keeper.apply_block(100, &[]).unwrap().events.is_empty());

    let result = keeper.apply_block(101, &[]).unwrap();
    assert!(matches!(
        result.events.as_slice(),
        [Event::KickProposalFinalized {
            status: ProposalStatus::Expired,
            ..
        }]
    ));
    assert!(keeper.registry().list_open_kick_proposals().unwrap().is_empty());
}

#[test]
fn test_block_commits_records_with_height() {
    let alice = Keypair::generate();
    let bob = Keypair::generate();
    let carol = Keypair::generate();
    let storage = Storage::open_temporary().unwrap();
    let mut keeper = Keeper::new(&storage);
    let mut genesis =
        GenesisState::with_validators([alice.address(), bob.address(), carol.address()], 10);
    genesis.params.min_active_validators = 3;
    keeper.init_genesis(&genesis).unwrap();

    let block = [
        SignedMsg::new(
            Msg::SubmitKickProposal {
                target: carol.address(),
            },
            &alice,
        ),
        SignedMsg::new(Msg::VoteKickProposal { id: 1, approve: true }, &bob),
    ];
    let result = keeper.apply_block(1, &block).unwrap();
    assert!(result.receipts.iter().all(|r| r.is_success()));

    let registry = keeper.registry();
    assert_eq!(registry.last_height().unwrap(), Some(1));
    assert_eq!(registry.next_kick_id().unwrap(), 2);
    let proposals = registry.list_kick_proposals().unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].ballot.status, ProposalStatus::Rejected);
    assert_eq!(
        proposals[0].ballot.rejection,
        Some(RejectionReason::QuorumMetButFloorViolation)
    );

    // Re-applying the same block changes nothing.
    assert!(matches!(
        keeper.apply_block(1, &block),
        Err(KeeperError::HeightNotIncreasing { last: 1, got: 1 })
    ));
    assert_eq!(keeper.registry().list_kick_proposals().unwrap(), proposals);
    assert_eq!(keeper.registry().next_kick_id().unwrap(), 2);
    assert_eq!(active_count(&keeper), 3);
}

#[test]
fn test_closed_height_refuses_replay() {
    let alice = Keypair::generate();
    let bob = Keypair::generate();
    let carol = Keypair::generate();
    let storage = Storage::open_temporary().unwrap();
    let mut keeper = Keeper::new(&storage);
    let mut genesis =
        GenesisState::with_validators([alice.address(), bob.address(), carol.address()], 10);
    genesis.params.min_active_validators = 3;
    keeper.init_genesis(&genesis).unwrap();

    let block = [
        SignedMsg::new(
            Msg::SubmitKickProposal {
                target: carol.address(),
            },
            &alice,
        ),
        SignedMsg::new(Msg::VoteKickProposal { id: 1, approve: true }, &bob),
    ];
    let ctx = Context::at(1);
    for signed in &block {
        keeper.deliver(ctx, signed).unwrap();
    }
    keeper.end_block(ctx).unwrap();
    assert_eq!(keeper.registry().last_height().unwrap(), Some(1));

    assert!(matches!(
        keeper.apply_block(1, &block),
        Err(KeeperError::HeightNotIncreasing { last: 1, got: 1 })
    ));
    assert!(matches!(
        keeper.deliver(ctx, &block[0]),
        Err(KeeperError::HeightNotIncreasing { .. })
    ));
    assert!(matches!(
        keeper.end_block(ctx),
        Err(KeeperError::HeightNotIncreasing { .. })
    ));
    assert_eq!(keeper.registry().list_kick_proposals().unwrap().len(), 1);
    assert_eq!(keeper.registry().next_kick_id().unwrap(), 2);
}

#[test]
fn test_events_serialize_to_json() {
    let event = Event::ValidatorAdmitted {
        address: addr(1),
        power: 10,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(
        json["ValidatorAdmitted"]["address"],
        "0x0101010101010101010101010101010101010101"
    );
}
