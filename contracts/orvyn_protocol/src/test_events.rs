extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Events, Ledger},
    vec, Address, Env, IntoVal, Map, Symbol, TryFromVal, TryIntoVal, Val, Vec,
};

use crate::events::{
    DonationReceived, FundsReleased, MilestoneChanged, MilestoneFinalized, MilestoneVoted,
    ProjectCancelled, ProjectCreated, Staked, YieldClaimed, YieldDistributed, YieldRouted,
};
use crate::rbac::RoleChanged;
use crate::test::{Harness, DAY, LOCK_PERIOD};
use crate::{MilestoneStatus, Role};

// ─── Helpers ─────────────────────────────────────────────

fn first_topic(env: &Env, topics: &Vec<Val>) -> Option<Symbol> {
    topics.get(0).and_then(|v| Symbol::try_from_val(env, &v).ok())
}

/// Contract events in emission order, as `(topics, data)`.
fn contract_events(h: &Harness) -> std::vec::Vec<(Vec<Val>, Val)> {
    h.env
        .events()
        .all()
        .iter()
        .filter(|(addr, _, _)| *addr == h.client.address)
        .map(|(_, topics, data)| (topics, data))
        .collect()
}

/// Most recent contract event whose first topic is `name`.
fn last_event(h: &Harness, name: Symbol) -> (Vec<Val>, Val) {
    contract_events(h)
        .into_iter()
        .rev()
        .find(|(topics, _)| first_topic(&h.env, topics) == Some(name.clone()))
        .expect("event not emitted")
}

fn seq_of(env: &Env, data: &Val) -> u64 {
    let fields: Map<Symbol, Val> = data.try_into_val(env).unwrap();
    fields.get(symbol_short!("seq")).unwrap().try_into_val(env).unwrap()
}

fn decode<T: TryFromVal<Env, Val>>(env: &Env, data: &Val) -> T {
    T::try_from_val(env, data).ok().expect("payload decode failed")
}

// ─── Staking ledger ──────────────────────────────────────

#[test]
fn test_staked_event() {
    let h = Harness::new();
    h.env.ledger().set_sequence_number(42);
    let staker = h.funded(700);
    h.client.stake(&staker, &700, &None, &None);

    let (topics, data) = last_event(&h, symbol_short!("staked"));
    let expected_topics = vec![
        &h.env,
        symbol_short!("staked").into_val(&h.env),
        staker.into_val(&h.env),
    ];
    assert_eq!(topics, expected_topics);
    assert_eq!(
        decode::<Staked>(&h.env, &data),
        Staked {
            staker: staker.clone(),
            amount: 700,
            staked_balance: 700,
            total_staked: 700,
            lock_expiry: LOCK_PERIOD,
            seq: h.client.last_event_seq(),
            ledger: 42,
        }
    );
}

#[test]
fn test_distributed_event_carries_index() {
    let h = Harness::new();
    let staker = h.funded(500);
    h.client.stake(&staker, &500, &None, &None);
    h.distribute(50);

    let (topics, data) = last_event(&h, symbol_short!("distrib"));
    let caller: Address = topics.get(1).unwrap().try_into_val(&h.env).unwrap();
    assert_eq!(caller, h.distributor);

    let event: YieldDistributed = decode(&h.env, &data);
    assert_eq!(event.amount, 50);
    assert_eq!(event.reward_index, h.client.reward_pool().reward_index);
    assert_eq!(event.total_staked, 500);
    assert_eq!(event.total_distributed, 50);
}

#[test]
fn test_routed_claim_emits_donation_route_and_claim_in_order() {
    let h = Harness::new();
    let project = h.project(&[(1_000, 7 * DAY)]);
    let staker = h.funded(1_000);
    h.client.stake(&staker, &1_000, &Some(project), &Some(1_000));
    h.distribute(500);

    h.client.claim_yield(&staker);

    let (_, donated) = last_event(&h, symbol_short!("donated"));
    let (routed_topics, routed) = last_event(&h, symbol_short!("routed"));
    let (_, claimed) = last_event(&h, symbol_short!("claimed"));

    let donated: DonationReceived = decode(&h.env, &donated);
    let routed_event: YieldRouted = decode(&h.env, &routed);
    let claimed: YieldClaimed = decode(&h.env, &claimed);

    assert_eq!(donated.donor, staker);
    assert_eq!(donated.amount, 50);
    assert_eq!(
        routed_topics,
        vec![
            &h.env,
            symbol_short!("routed").into_val(&h.env),
            project.into_val(&h.env)
        ]
    );
    assert_eq!(routed_event.amount, 50);
    assert_eq!((claimed.paid, claimed.routed), (450, 50));

    assert_eq!(routed_event.seq, donated.seq + 1);
    assert_eq!(claimed.seq, routed_event.seq + 1);
    assert_eq!(claimed.seq, h.client.last_event_seq());
}

// ─── Milestone escrow ────────────────────────────────────

#[test]
fn test_project_created_event() {
    let h = Harness::new();
    let id = h.project(&[(300, DAY), (700, DAY)]);

    let (topics, data) = last_event(&h, symbol_short!("created"));
    assert_eq!(
        topics,
        vec![
            &h.env,
            symbol_short!("created").into_val(&h.env),
            id.into_val(&h.env)
        ]
    );
    let event: ProjectCreated = decode(&h.env, &data);
    assert_eq!(event.researcher, h.researcher);
    assert_eq!(event.milestone_count, 2);
    assert_eq!(event.total_goal, 1_000);
}

#[test]
fn test_vote_event_reports_running_tally() {
    let h = Harness::new();
    let id = h.project(&[(1_000, DAY)]);
    let a = h.funded(300);
    let b = h.funded(200);
    h.client.donate(&id, &a, &300);
    h.client.donate(&id, &b, &200);
    h.set_time(DAY);
    h.client.submit_proof(&id, &h.researcher, &h.proof());

    h.client.vote(&id, &a, &true);
    h.client.vote(&id, &b, &false);

    let (_, data) = last_event(&h, symbol_short!("voted"));
    let event: MilestoneVoted = decode(&h.env, &data);
    assert_eq!(event.donor, b);
    assert!(!event.approve);
    assert_eq!(event.weight, 200);
    assert_eq!((event.votes_yes, event.votes_no), (300, 200));
}

#[test]
fn test_approval_emits_finalized_released_completed() {
    let h = Harness::new();
    let id = h.project(&[(100, DAY)]);
    let donor = h.funded(100);
    h.client.donate(&id, &donor, &100);
    h.set_time(DAY);
    h.client.submit_proof(&id, &h.researcher, &h.proof());
    h.client.vote(&id, &donor, &true);

    h.client.finalize_milestone(&id);

    let (_, finalized) = last_event(&h, symbol_short!("finalized"));
    let (_, released) = last_event(&h, symbol_short!("released"));
    let (_, completed) = last_event(&h, symbol_short!("completed"));

    let finalized: MilestoneFinalized = decode(&h.env, &finalized);
    let released: FundsReleased = decode(&h.env, &released);
    let completed: MilestoneChanged = decode(&h.env, &completed);

    assert_eq!(finalized.status, MilestoneStatus::Approved);
    assert_eq!(finalized.raised, 100);
    assert_eq!(released.researcher, h.researcher);
    assert_eq!(released.amount, 100);
    assert_eq!(completed.milestone_index, 0);
    assert!(finalized.seq < released.seq && released.seq < completed.seq);
}

#[test]
fn test_skip_emits_skipped_then_activated() {
    let h = Harness::new();
    let id = h.project(&[(100, DAY), (100, DAY)]);
    h.set_time(DAY);
    h.client.skip_milestone(&id);

    let (_, skipped) = last_event(&h, symbol_short!("skipped"));
    let (_, activated) = last_event(&h, symbol_short!("activated"));
    let skipped: MilestoneChanged = decode(&h.env, &skipped);
    let activated: MilestoneChanged = decode(&h.env, &activated);

    assert_eq!(skipped.milestone_index, 0);
    assert_eq!(activated.milestone_index, 1);
    assert_eq!(activated.seq, skipped.seq + 1);
}

#[test]
fn test_cancel_event() {
    let h = Harness::new();
    let id = h.project(&[(100, DAY), (100, DAY)]);
    h.client.cancel(&id, &h.researcher);

    let (_, data) = last_event(&h, symbol_short!("cancelled"));
    let event: ProjectCancelled = decode(&h.env, &data);
    assert_eq!(event.project_id, id);
    assert_eq!(event.researcher, h.researcher);
    assert_eq!(event.milestone_index, 0);
}

// ─── Administration ──────────────────────────────────────

#[test]
fn test_role_set_event() {
    let h = Harness::new();
    let (topics, data) = last_event(&h, symbol_short!("role_set"));

    assert_eq!(
        topics,
        vec![
            &h.env,
            symbol_short!("role_set").into_val(&h.env),
            h.researcher.into_val(&h.env),
            symbol_short!("research").into_val(&h.env)
        ]
    );
    let event: RoleChanged = decode(&h.env, &data);
    assert_eq!(event.by, Some(h.admin.clone()));
    assert!(h.client.has_role(&h.researcher, &Role::Researcher));
}

#[test]
fn test_pause_event_topic() {
    let h = Harness::new();
    h.client.pause(&h.admin);
    let (topics, _) = last_event(&h, symbol_short!("paused"));
    assert_eq!(topics.len(), 1);
}

// ─── Sequencing ──────────────────────────────────────────

#[test]
fn test_event_seq_is_strictly_increasing() {
    let h = Harness::new();
    let staker = h.funded(1_000);
    let mut last = h.client.last_event_seq();

    let mut step = |h: &Harness| {
        let events = contract_events(h);
        let (_, data) = events.last().expect("no contract event");
        let seq = seq_of(&h.env, data);
        assert!(seq > last, "seq went from {} to {}", last, seq);
        assert_eq!(seq, h.client.last_event_seq());
        last = seq;
    };

    h.client.stake(&staker, &1_000, &None, &None);
    step(&h);
    h.distribute(10);
    step(&h);
    h.client.claim_yield(&staker);
    step(&h);
    h.set_time(LOCK_PERIOD);
    h.client.unstake(&staker, &1_000);
    step(&h);
}

#[test]
fn test_failed_call_emits_nothing() {
    let h = Harness::new();
    let staker = h.funded(100);
    h.client.stake(&staker, &100, &None, &None);
    let seq = h.client.last_event_seq();

    assert!(h.client.try_unstake(&staker, &100).is_err());
    assert!(h.client.try_stake(&staker, &500, &None, &None).is_err());
    assert_eq!(h.client.last_event_seq(), seq);
}
