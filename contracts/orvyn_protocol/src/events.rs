//! Event payloads published by every mutating entry point.
//!
//! Each payload carries `seq`, a contract-wide counter incremented once per
//! event, and `ledger`, the ledger sequence the event was emitted in.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::storage;
use crate::types::MilestoneStatus;

// ── Staking ledger ───────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Staked {
    pub staker: Address,
    pub amount: i128,
    pub staked_balance: i128,
    pub total_staked: i128,
    pub lock_expiry: u64,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unstaked {
    pub staker: Address,
    pub amount: i128,
    pub staked_balance: i128,
    pub total_staked: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct YieldClaimed {
    pub staker: Address,
    pub paid: i128,
    pub routed: i128,
    pub total_claimed: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct YieldDistributed {
    pub caller: Address,
    pub amount: i128,
    pub reward_index: i128,
    pub total_staked: i128,
    pub total_distributed: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct YieldRouted {
    pub project_id: u64,
    pub staker: Address,
    pub amount: i128,
    pub total_routed: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LockPeriodSet {
    pub caller: Address,
    pub lock_period: u64,
    pub seq: u64,
    pub ledger: u32,
}

// ── Milestone escrow ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCreated {
    pub project_id: u64,
    pub researcher: Address,
    pub title: String,
    pub milestone_count: u32,
    pub total_goal: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonationReceived {
    pub project_id: u64,
    pub donor: Address,
    pub milestone_index: u32,
    pub amount: i128,
    pub milestone_raised: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProofSubmitted {
    pub project_id: u64,
    pub milestone_index: u32,
    pub proof_uri: String,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneVoted {
    pub project_id: u64,
    pub donor: Address,
    pub milestone_index: u32,
    pub approve: bool,
    pub weight: i128,
    pub votes_yes: i128,
    pub votes_no: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneFinalized {
    pub project_id: u64,
    pub milestone_index: u32,
    pub status: MilestoneStatus,
    pub raised: i128,
    pub votes_yes: i128,
    pub votes_no: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsReleased {
    pub project_id: u64,
    pub researcher: Address,
    pub milestone_index: u32,
    pub amount: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneChanged {
    pub project_id: u64,
    pub milestone_index: u32,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RefundClaimed {
    pub project_id: u64,
    pub donor: Address,
    pub milestone_index: u32,
    pub amount: i128,
    pub milestone_refunded: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCancelled {
    pub project_id: u64,
    pub researcher: Address,
    pub milestone_index: u32,
    pub seq: u64,
    pub ledger: u32,
}

// ── Funding pool ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolDonation {
    pub donor: Address,
    pub amount: i128,
    pub pool_balance: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationMade {
    pub project_id: u64,
    pub allocator: Address,
    pub amount: i128,
    pub pool_balance: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationWithdrawn {
    pub project_id: u64,
    pub researcher: Address,
    pub amount: i128,
    pub remaining: i128,
    pub seq: u64,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PauseChanged {
    pub caller: Address,
    pub seq: u64,
    pub ledger: u32,
}

fn marker(env: &Env) -> (u64, u32) {
    (storage::next_event_seq(env), env.ledger().sequence())
}

// ── Emitters ─────────────────────────────────────────────────────────

pub fn emit_staked(
    env: &Env,
    staker: Address,
    amount: i128,
    staked_balance: i128,
    total_staked: i128,
    lock_expiry: u64,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("staked"), staker.clone());
    let data = Staked {
        staker,
        amount,
        staked_balance,
        total_staked,
        lock_expiry,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_unstaked(
    env: &Env,
    staker: Address,
    amount: i128,
    staked_balance: i128,
    total_staked: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("unstaked"), staker.clone());
    let data = Unstaked {
        staker,
        amount,
        staked_balance,
        total_staked,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_yield_claimed(
    env: &Env,
    staker: Address,
    paid: i128,
    routed: i128,
    total_claimed: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("claimed"), staker.clone());
    let data = YieldClaimed {
        staker,
        paid,
        routed,
        total_claimed,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_yield_distributed(
    env: &Env,
    caller: Address,
    amount: i128,
    reward_index: i128,
    total_staked: i128,
    total_distributed: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("distrib"), caller.clone());
    let data = YieldDistributed {
        caller,
        amount,
        reward_index,
        total_staked,
        total_distributed,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_yield_routed(
    env: &Env,
    project_id: u64,
    staker: Address,
    amount: i128,
    total_routed: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("routed"), project_id);
    let data = YieldRouted {
        project_id,
        staker,
        amount,
        total_routed,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_lock_period_set(env: &Env, caller: Address, lock_period: u64) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("lock_set"), caller.clone());
    let data = LockPeriodSet {
        caller,
        lock_period,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_project_created(
    env: &Env,
    project_id: u64,
    researcher: Address,
    title: String,
    milestone_count: u32,
    total_goal: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("created"), project_id);
    let data = ProjectCreated {
        project_id,
        researcher,
        title,
        milestone_count,
        total_goal,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_donation_received(
    env: &Env,
    project_id: u64,
    donor: Address,
    milestone_index: u32,
    amount: i128,
    milestone_raised: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("donated"), project_id);
    let data = DonationReceived {
        project_id,
        donor,
        milestone_index,
        amount,
        milestone_raised,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_proof_submitted(env: &Env, project_id: u64, milestone_index: u32, proof_uri: String) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("proof"), project_id);
    let data = ProofSubmitted {
        project_id,
        milestone_index,
        proof_uri,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_milestone_voted(
    env: &Env,
    project_id: u64,
    donor: Address,
    milestone_index: u32,
    approve: bool,
    weight: i128,
    tally: (i128, i128),
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("voted"), project_id);
    let data = MilestoneVoted {
        project_id,
        donor,
        milestone_index,
        approve,
        weight,
        votes_yes: tally.0,
        votes_no: tally.1,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_milestone_finalized(
    env: &Env,
    project_id: u64,
    milestone_index: u32,
    status: MilestoneStatus,
    raised: i128,
    tally: (i128, i128),
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("finalized"), project_id);
    let data = MilestoneFinalized {
        project_id,
        milestone_index,
        status,
        raised,
        votes_yes: tally.0,
        votes_no: tally.1,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_funds_released(
    env: &Env,
    project_id: u64,
    researcher: Address,
    milestone_index: u32,
    amount: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("released"), project_id);
    let data = FundsReleased {
        project_id,
        researcher,
        milestone_index,
        amount,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

/// Milestone skipped, next milestone activated, or project completed.
/// `topic` is one of `skipped`, `activated`, `completed`.
pub fn emit_milestone_changed(
    env: &Env,
    topic: soroban_sdk::Symbol,
    project_id: u64,
    milestone_index: u32,
) {
    let (seq, ledger) = marker(env);
    let data = MilestoneChanged {
        project_id,
        milestone_index,
        seq,
        ledger,
    };
    env.events().publish((topic, project_id), data);
}

pub fn emit_refund_claimed(
    env: &Env,
    project_id: u64,
    donor: Address,
    milestone_index: u32,
    amount: i128,
    milestone_refunded: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("refunded"), project_id);
    let data = RefundClaimed {
        project_id,
        donor,
        milestone_index,
        amount,
        milestone_refunded,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_project_cancelled(
    env: &Env,
    project_id: u64,
    researcher: Address,
    milestone_index: u32,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("cancelled"), project_id);
    let data = ProjectCancelled {
        project_id,
        researcher,
        milestone_index,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_pool_donation(env: &Env, donor: Address, amount: i128, pool_balance: i128) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("pool_don"), donor.clone());
    let data = PoolDonation {
        donor,
        amount,
        pool_balance,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_allocation_made(
    env: &Env,
    project_id: u64,
    allocator: Address,
    amount: i128,
    pool_balance: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("allocated"), project_id);
    let data = AllocationMade {
        project_id,
        allocator,
        amount,
        pool_balance,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_allocation_withdrawn(
    env: &Env,
    project_id: u64,
    researcher: Address,
    amount: i128,
    remaining: i128,
) {
    let (seq, ledger) = marker(env);
    let topics = (symbol_short!("alloc_wd"), project_id);
    let data = AllocationWithdrawn {
        project_id,
        researcher,
        amount,
        remaining,
        seq,
        ledger,
    };
    env.events().publish(topics, data);
}

pub fn emit_protocol_paused(env: &Env, caller: Address) {
    let (seq, ledger) = marker(env);
    env.events()
        .publish((symbol_short!("paused"),), PauseChanged { caller, seq, ledger });
}

pub fn emit_protocol_unpaused(env: &Env, caller: Address) {
    let (seq, ledger) = marker(env);
    env.events()
        .publish((symbol_short!("unpaused"),), PauseChanged { caller, seq, ledger });
}
