#![allow(dead_code)]

extern crate std;

use std::vec::Vec;

use soroban_sdk::Address;

use crate::types::{Milestone, MilestoneStatus, ProjectStatus, RewardPool};
use crate::OrvynProtocolClient;

/// INV-1: Total staked equals the sum of every account's stake.
pub fn assert_stake_sum(client: &OrvynProtocolClient, stakers: &[Address]) {
    let sum: i128 = stakers
        .iter()
        .map(|s| client.stake_account(s).staked_amount)
        .sum();
    let total = client.reward_pool().total_staked;
    assert_eq!(
        sum, total,
        "INV-1 violated: sum of stakes {} != total_staked {}",
        sum, total
    );
}

/// INV-2: The reward index never decreases.
pub fn assert_index_monotonic(before: &RewardPool, after: &RewardPool) {
    assert!(
        after.reward_index >= before.reward_index,
        "INV-2 violated: reward index went from {} to {}",
        before.reward_index,
        after.reward_index
    );
}

/// INV-3: Everything claimable plus everything already claimed equals what was
/// distributed, minus at most one base unit of floor rounding per staker.
pub fn assert_index_conservation(client: &OrvynProtocolClient, stakers: &[Address]) {
    assert_index_conservation_within(client, stakers, stakers.len() as i128);
}

/// INV-3 with an explicit rounding allowance, for histories where accounts
/// were settled more than once (each settlement floors separately).
pub fn assert_index_conservation_within(
    client: &OrvynProtocolClient,
    stakers: &[Address],
    max_dust: i128,
) {
    let pool = client.reward_pool();
    let pending: i128 = stakers.iter().map(|s| client.pending_yield(s)).sum();
    let accounted = pending + pool.total_claimed;
    assert!(
        accounted <= pool.total_distributed,
        "INV-3 violated: {} owed/claimed exceeds {} distributed",
        accounted,
        pool.total_distributed
    );
    let dust = pool.total_distributed - accounted;
    assert!(
        dust <= max_dust,
        "INV-3 violated: {} units lost to rounding, allowance {}",
        dust,
        max_dust
    );
}

/// INV-4: A milestone never raises more than its goal, and votes never
/// exceed what was raised.
pub fn assert_milestone_bounds(milestone: &Milestone) {
    assert!(
        milestone.raised >= 0 && milestone.raised <= milestone.goal,
        "INV-4 violated: raised {} outside [0, {}]",
        milestone.raised,
        milestone.goal
    );
    assert!(
        milestone.votes_yes + milestone.votes_no <= milestone.raised,
        "INV-4 violated: votes {}+{} exceed raised {}",
        milestone.votes_yes,
        milestone.votes_no,
        milestone.raised
    );
    assert!(
        milestone.refunded <= milestone.raised,
        "INV-4 violated: refunded {} exceeds raised {}",
        milestone.refunded,
        milestone.raised
    );
    if milestone.status == MilestoneStatus::Approved {
        assert_eq!(
            milestone.released, milestone.raised,
            "INV-4 violated: approved milestone released {} of {}",
            milestone.released, milestone.raised
        );
    }
}

/// INV-5: While a project is active, exactly the current milestone is
/// non-terminal and every earlier one is terminal.
pub fn assert_sequencing(client: &OrvynProtocolClient, project_id: u64) {
    let project = client.get_project(&project_id);
    let milestones: Vec<Milestone> = (0..project.milestone_count)
        .map(|i| client.get_milestone(&project_id, &i))
        .collect();

    for milestone in &milestones {
        assert_milestone_bounds(milestone);
    }

    if project.status != ProjectStatus::Active {
        return;
    }
    for (i, milestone) in milestones.iter().enumerate() {
        let i = i as u32;
        if i < project.current_milestone {
            assert!(
                milestone.status.is_terminal(),
                "INV-5 violated: milestone {} before current {} is {:?}",
                i,
                project.current_milestone,
                milestone.status
            );
        } else if i == project.current_milestone {
            assert!(
                matches!(milestone.status, MilestoneStatus::Pending | MilestoneStatus::Voting),
                "INV-5 violated: current milestone {} is {:?}",
                i,
                milestone.status
            );
        } else {
            assert_eq!(
                milestone.status,
                MilestoneStatus::Pending,
                "INV-5 violated: future milestone {} already {:?}",
                i,
                milestone.status
            );
        }
    }
}

/// INV-6: Only forward milestone transitions.
///   Pending -> Voting | Skipped | Rejected (cancel)
///   Voting  -> Approved | Rejected
pub fn assert_valid_milestone_transition(from: &MilestoneStatus, to: &MilestoneStatus) {
    let valid = from == to
        || matches!(
            (from, to),
            (MilestoneStatus::Pending, MilestoneStatus::Voting)
                | (MilestoneStatus::Pending, MilestoneStatus::Skipped)
                | (MilestoneStatus::Pending, MilestoneStatus::Rejected)
                | (MilestoneStatus::Voting, MilestoneStatus::Approved)
                | (MilestoneStatus::Voting, MilestoneStatus::Rejected)
        );
    assert!(
        valid,
        "INV-6 violated: invalid milestone transition from {:?} to {:?}",
        from, to
    );
}
