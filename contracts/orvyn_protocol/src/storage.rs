//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by Orvyn:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type             | Description                          |
//! |----------------|------------------|--------------------------------------|
//! | `Config`       | `ProtocolConfig` | Token and lock period                |
//! | `Pool`         | `RewardPool`     | Global reward index and totals       |
//! | `ProjectCount` | `u64`            | Auto-increment project ID counter    |
//! | `EventSeq`     | `u64`            | Monotonic event sequence marker      |
//! | `Paused`       | `bool`           | Emergency pause flag                 |
//! | `FundingPool`  | `FundingPool`    | Unallocated pool and its totals      |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                          | Type            | Description                   |
//! |------------------------------|-----------------|-------------------------------|
//! | `Stake(addr)`                | `StakeAccount`  | Per-staker ledger entry       |
//! | `ProjConfig(id)`             | `ProjectConfig` | Immutable project config      |
//! | `ProjState(id)`              | `ProjectState`  | Status and current milestone  |
//! | `Milestone(id, idx)`         | `Milestone`     | Milestone record              |
//! | `Donation(id, idx, addr)`    | `i128`          | Donor contribution            |
//! | `Voted(id, idx, addr)`       | `bool`          | Donor already voted           |
//! | `OwnedCount(addr)`           | `u32`           | Projects owned by researcher  |
//! | `Owned(addr, n)`             | `u64`           | ID of the n-th owned project  |
//! | `Allocation(id)`             | `Allocation`    | Pool funds granted to project |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! TTLs are extended on write only, so every `get_*`/`load_*` helper is a pure
//! read and query entry points leave the ledger untouched.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{
    Allocation, FundingPool, Milestone, ProjectConfig, ProjectState, ProtocolConfig, RewardPool,
    StakeAccount,
};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,
    Pool,
    ProjectCount,
    EventSeq,
    Paused,
    Stake(Address),
    ProjConfig(u64),
    ProjState(u64),
    Milestone(u64, u32),
    Donation(u64, u32, Address),
    Voted(u64, u32, Address),
    OwnedCount(Address),
    Owned(Address, u32),
    FundingPool,
    Allocation(u64),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

/// Load the protocol config, failing with `NotInitialized` before `init`.
pub fn load_config(env: &Env) -> Result<ProtocolConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn save_config(env: &Env, config: &ProtocolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn load_pool(env: &Env) -> RewardPool {
    env.storage()
        .instance()
        .get(&DataKey::Pool)
        .unwrap_or_else(RewardPool::genesis)
}

pub fn save_pool(env: &Env, pool: &RewardPool) {
    env.storage().instance().set(&DataKey::Pool, pool);
    bump_instance(env);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);
}

// ─────────────────────────────────────────────────────────
// Counters
// ─────────────────────────────────────────────────────────

/// Atomically read and increment the project counter.
/// Returns the ID that should be used for the next project.
pub fn get_and_increment_project_id(env: &Env) -> u64 {
    let current = project_count(env);
    env.storage()
        .instance()
        .set(&DataKey::ProjectCount, &(current + 1));
    bump_instance(env);
    current
}

pub fn project_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0)
}

/// Advance the event sequence marker and return the new value (first is 1).
pub fn next_event_seq(env: &Env) -> u64 {
    let next = last_event_seq(env) + 1;
    env.storage().instance().set(&DataKey::EventSeq, &next);
    bump_instance(env);
    next
}

pub fn last_event_seq(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::EventSeq)
        .unwrap_or(0)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn set_persistent<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

// ─────────────────────────────────────────────────────────
// Stake accounts
// ─────────────────────────────────────────────────────────

pub fn get_stake_account(env: &Env, staker: &Address) -> Option<StakeAccount> {
    env.storage()
        .persistent()
        .get(&DataKey::Stake(staker.clone()))
}

pub fn save_stake_account(env: &Env, staker: &Address, account: &StakeAccount) {
    set_persistent(env, &DataKey::Stake(staker.clone()), account);
}

// ─────────────────────────────────────────────────────────
// Projects
// ─────────────────────────────────────────────────────────

/// Load only the immutable project configuration.
pub fn load_project_config(env: &Env, id: u64) -> Result<ProjectConfig, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::ProjConfig(id))
        .ok_or(Error::ProjectNotFound)
}

/// Load only the mutable project state.
pub fn load_project_state(env: &Env, id: u64) -> Result<ProjectState, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::ProjState(id))
        .ok_or(Error::ProjectNotFound)
}

/// Read config and state together; most escrow operations need both.
pub fn load_project_pair(env: &Env, id: u64) -> Result<(ProjectConfig, ProjectState), Error> {
    Ok((load_project_config(env, id)?, load_project_state(env, id)?))
}

pub fn save_project_config(env: &Env, config: &ProjectConfig) {
    set_persistent(env, &DataKey::ProjConfig(config.id), config);
}

/// Save only the mutable project state.
pub fn save_project_state(env: &Env, id: u64, state: &ProjectState) {
    set_persistent(env, &DataKey::ProjState(id), state);
}

pub fn load_milestone(env: &Env, project_id: u64, index: u32) -> Result<Milestone, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Milestone(project_id, index))
        .ok_or(Error::MilestoneNotFound)
}

pub fn save_milestone(env: &Env, project_id: u64, index: u32, milestone: &Milestone) {
    set_persistent(env, &DataKey::Milestone(project_id, index), milestone);
}

pub fn get_donation(env: &Env, project_id: u64, index: u32, donor: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Donation(project_id, index, donor.clone()))
        .unwrap_or(0)
}

pub fn set_donation(env: &Env, project_id: u64, index: u32, donor: &Address, amount: i128) {
    set_persistent(env, &DataKey::Donation(project_id, index, donor.clone()), &amount);
}

pub fn has_voted(env: &Env, project_id: u64, index: u32, donor: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Voted(project_id, index, donor.clone()))
        .unwrap_or(false)
}

pub fn mark_voted(env: &Env, project_id: u64, index: u32, donor: &Address) {
    set_persistent(env, &DataKey::Voted(project_id, index, donor.clone()), &true);
}

pub fn owned_project_count(env: &Env, researcher: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::OwnedCount(researcher.clone()))
        .unwrap_or(0)
}

/// Record `project_id` as the researcher's next owned project. Writes one new
/// entry and the counter, whatever the researcher already owns.
pub fn push_researcher_project(env: &Env, researcher: &Address, project_id: u64) {
    let n = owned_project_count(env, researcher);
    set_persistent(env, &DataKey::Owned(researcher.clone(), n), &project_id);
    set_persistent(env, &DataKey::OwnedCount(researcher.clone()), &(n + 1));
}

/// IDs of the researcher's projects in creation order, starting at `offset`.
pub fn projects_of(env: &Env, researcher: &Address, offset: u32, limit: u32) -> Vec<u64> {
    let end = offset
        .saturating_add(limit)
        .min(owned_project_count(env, researcher));
    let mut ids = Vec::new(env);
    for n in offset..end {
        if let Some(id) = env
            .storage()
            .persistent()
            .get(&DataKey::Owned(researcher.clone(), n))
        {
            ids.push_back(id);
        }
    }
    ids
}

// ─────────────────────────────────────────────────────────
// Funding pool
// ─────────────────────────────────────────────────────────

pub fn load_funding_pool(env: &Env) -> FundingPool {
    env.storage()
        .instance()
        .get(&DataKey::FundingPool)
        .unwrap_or_else(FundingPool::empty)
}

pub fn save_funding_pool(env: &Env, pool: &FundingPool) {
    env.storage().instance().set(&DataKey::FundingPool, pool);
    bump_instance(env);
}

pub fn get_allocation(env: &Env, project_id: u64) -> Allocation {
    env.storage()
        .persistent()
        .get(&DataKey::Allocation(project_id))
        .unwrap_or_else(Allocation::empty)
}

pub fn save_allocation(env: &Env, project_id: u64, allocation: &Allocation) {
    set_persistent(env, &DataKey::Allocation(project_id), allocation);
}
