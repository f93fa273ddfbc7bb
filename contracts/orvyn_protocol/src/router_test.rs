#![cfg(test)]

extern crate std;

use core::cell::Cell;

use soroban_sdk::{testutils::Address as _, Address, Env};

use crate::router::{donation_share, split_yield, DonationSink, RoutedYield};
use crate::test::{Harness, DAY};
use crate::{Error, MilestoneStatus};

// ─── Mock sinks ──────────────────────────────────────────

/// Accepts up to `cap` and remembers what it was offered.
struct CappedSink {
    cap: i128,
    offered: Cell<i128>,
}

impl CappedSink {
    fn new(cap: i128) -> Self {
        CappedSink {
            cap,
            offered: Cell::new(0),
        }
    }
}

impl DonationSink for CappedSink {
    fn accept_donation(&self, _env: &Env, _donor: &Address, amount: i128) -> Result<i128, Error> {
        self.offered.set(amount);
        Ok(amount.min(self.cap))
    }
}

struct RejectingSink(Error);

impl DonationSink for RejectingSink {
    fn accept_donation(&self, _env: &Env, _donor: &Address, _amount: i128) -> Result<i128, Error> {
        Err(self.0)
    }
}

/// Misbehaving sink that claims more than it was given.
struct GreedySink;

impl DonationSink for GreedySink {
    fn accept_donation(&self, _env: &Env, _donor: &Address, amount: i128) -> Result<i128, Error> {
        Ok(amount * 2)
    }
}

fn routed(to_staker: i128, to_project: i128) -> RoutedYield {
    RoutedYield {
        to_staker,
        to_project,
    }
}

// ─── donation_share ──────────────────────────────────────

#[test]
fn test_donation_share_rounds_down() {
    assert_eq!(donation_share(1_000, 2_500), Ok(250));
    assert_eq!(donation_share(999, 3_333), Ok(332));
    assert_eq!(donation_share(1, 9_999), Ok(0));
    assert_eq!(donation_share(1_000, 10_000), Ok(1_000));
    assert_eq!(donation_share(1_000, 0), Ok(0));
}

#[test]
fn test_donation_share_rejects_bad_bps() {
    assert_eq!(donation_share(1_000, 10_001), Err(Error::InvalidSplit));
    assert_eq!(donation_share(i128::MAX, 2), Err(Error::Overflow));
}

// ─── split_yield ─────────────────────────────────────────

#[test]
fn test_split_sends_share_to_sink() {
    let env = Env::default();
    let staker = Address::generate(&env);
    let sink = CappedSink::new(i128::MAX);

    let out = split_yield(&env, &staker, 1_000, 4_000, Some(&sink)).unwrap();
    assert_eq!(out, routed(600, 400));
    assert_eq!(sink.offered.get(), 400);
}

#[test]
fn test_split_without_sink_or_share_pays_staker() {
    let env = Env::default();
    let staker = Address::generate(&env);
    let sink = CappedSink::new(i128::MAX);

    assert_eq!(
        split_yield::<CappedSink>(&env, &staker, 500, 5_000, None).unwrap(),
        routed(500, 0)
    );
    assert_eq!(
        split_yield(&env, &staker, 500, 0, Some(&sink)).unwrap(),
        routed(500, 0)
    );
    // A share that rounds to zero never reaches the sink.
    assert_eq!(
        split_yield(&env, &staker, 1, 5_000, Some(&sink)).unwrap(),
        routed(1, 0)
    );
    assert_eq!(sink.offered.get(), 0);
}

#[test]
fn test_partial_acceptance_returns_rest_to_staker() {
    let env = Env::default();
    let staker = Address::generate(&env);
    let sink = CappedSink::new(30);

    let out = split_yield(&env, &staker, 1_000, 10_000, Some(&sink)).unwrap();
    assert_eq!(out, routed(970, 30));
}

#[test]
fn test_rejected_donation_falls_back_to_staker() {
    let env = Env::default();
    let staker = Address::generate(&env);

    for err in [Error::InvalidState, Error::GoalExceeded, Error::ProtocolPaused] {
        let out = split_yield(&env, &staker, 800, 5_000, Some(&RejectingSink(err))).unwrap();
        assert_eq!(out, routed(800, 0));
    }
}

#[test]
fn test_sink_cannot_take_more_than_offered() {
    let env = Env::default();
    let staker = Address::generate(&env);

    let out = split_yield(&env, &staker, 100, 5_000, Some(&GreedySink)).unwrap();
    assert_eq!(out, routed(50, 50));
}

#[test]
fn test_invalid_bps_is_an_error() {
    let env = Env::default();
    let staker = Address::generate(&env);
    let sink = CappedSink::new(i128::MAX);

    assert_eq!(
        split_yield(&env, &staker, 100, 10_001, Some(&sink)),
        Err(Error::InvalidSplit)
    );
}

// ─── Routing through the escrow ──────────────────────────

/// A staker holding 1 000 with half of its yield pledged to `project`.
fn pledged_staker(h: &Harness, project: u64) -> Address {
    let staker = h.funded(1_000);
    h.client
        .stake(&staker, &1_000, &Some(project), &Some(5_000));
    staker
}

#[test]
fn test_routing_to_cancelled_project_pays_staker() {
    let h = Harness::new();
    let project = h.project(&[(1_000, 7 * DAY)]);
    let staker = pledged_staker(&h, project);

    h.client.cancel(&project, &h.researcher);
    h.distribute(200);

    assert_eq!(h.client.claim_yield(&staker), 200);
    assert_eq!(h.client.get_milestone(&project, &0).raised, 0);
    assert_eq!(h.client.reward_pool().total_routed, 0);
}

#[test]
fn test_routing_while_paused_pays_staker() {
    let h = Harness::new();
    let project = h.project(&[(1_000, 7 * DAY)]);
    let staker = pledged_staker(&h, project);
    h.distribute(200);

    h.client.pause(&h.admin);
    assert_eq!(h.client.claim_yield(&staker), 200);
    assert_eq!(h.client.donation_of(&project, &0, &staker), 0);
}

#[test]
fn test_routing_into_nearly_full_milestone_is_capped() {
    let h = Harness::new();
    let project = h.project(&[(1_000, 7 * DAY)]);
    let donor = h.funded(960);
    h.client.donate(&project, &donor, &960);

    let staker = pledged_staker(&h, project);
    h.distribute(200);

    // Half of 200 is pledged but only 40 fits under the goal.
    assert_eq!(h.client.claim_yield(&staker), 160);
    assert_eq!(h.client.donation_of(&project, &0, &staker), 40);
    assert_eq!(h.client.current_milestone(&project).raised, 1_000);
    assert_eq!(h.client.reward_pool().total_routed, 40);
    assert_eq!(h.client.reward_pool().total_claimed, 200);
}

#[test]
fn test_routing_follows_current_milestone() {
    let h = Harness::new();
    let project = h.project(&[(100, DAY), (1_000, 7 * DAY)]);
    let donor = h.funded(100);
    h.client.donate(&project, &donor, &100);
    let staker = pledged_staker(&h, project);

    // Milestone 0 is voting: nothing can be routed into it.
    h.set_time(DAY);
    h.client.submit_proof(&project, &h.researcher, &h.proof());
    h.distribute(100);
    assert_eq!(h.client.claim_yield(&staker), 100);

    h.client.finalize_milestone(&project);
    assert_eq!(h.client.get_milestone(&project, &0).status, MilestoneStatus::Approved);

    h.distribute(100);
    assert_eq!(h.client.claim_yield(&staker), 50);
    assert_eq!(h.client.donation_of(&project, &1, &staker), 50);
}
