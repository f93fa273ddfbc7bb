//! # Orvyn Protocol Contract
//!
//! Accounting core of the Orvyn research-funding protocol: a staking ledger
//! that distributes yield through a global reward index, and milestone-based
//! escrows in which donors vote on each funding tranche.
//!
//! | Phase        | Entry Point(s)                                               |
//! |--------------|--------------------------------------------------------------|
//! | Bootstrap    | [`OrvynProtocol::init`]                                      |
//! | Role admin   | `grant_role`, `revoke_role`, `transfer_super_admin`          |
//! | Parameters   | `set_lock_period`, `pause`, `unpause`                        |
//! | Staking      | `stake`, `unstake`, `claim_yield`, `distribute`              |
//! | Projects     | `create_project`                                             |
//! | Escrow       | `donate`, `submit_proof`, `vote`, `finalize_milestone`,      |
//! |              | `skip_milestone`, `claim_refund`, `cancel`                   |
//! | Funding pool | `donate_to_pool`, `allocate_to_project`, `withdraw_allocation` |
//! | Queries      | `reward_pool`, `stake_account`, `get_project`, `pool_metrics`, ... |
//!
//! ## Architecture
//!
//! The ledger lives in [`staking`], the escrow in [`escrow`], and the glue that
//! routes part of a yield claim into an escrow in [`router`]. General donations
//! and their allocation to projects live in [`pool`]. Authorization is
//! delegated to [`rbac`] and storage access to [`storage`]. This file holds the
//! entry points: it authenticates callers, applies the pause gate and forwards
//! to the modules.
//!
//! Every entry point either commits entirely or fails with a structured
//! [`Error`] and leaves the ledger unchanged.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

pub mod escrow;
pub mod events;
pub mod pool;
pub mod rbac;
pub mod router;
pub mod staking;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod router_test;
#[cfg(test)]
mod test_events;

pub use rbac::Role;
pub use types::{
    Allocation, FundingPool, Milestone, MilestoneInput, MilestoneStatus, PoolMetrics, Project,
    ProjectStatus, ProtocolConfig, RewardPool, SplitSlot, StakeAccount, YieldSplit,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotAuthorized = 3,
    InvalidAmount = 4,
    InsufficientBalance = 5,
    LockedFunds = 6,
    InvalidState = 7,
    AlreadyVoted = 8,
    GoalExceeded = 9,
    ZeroTotalStake = 10,
    ProjectNotFound = 11,
    MilestoneNotFound = 12,
    InvalidMilestones = 13,
    InvalidGoal = 14,
    InvalidDuration = 15,
    InvalidSplit = 16,
    DeadlineNotReached = 17,
    NoContribution = 18,
    EmptyProof = 19,
    Overflow = 20,
    ProtocolPaused = 21,
}

#[contract]
pub struct OrvynProtocol;

#[contractimpl]
impl OrvynProtocol {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract.
    ///
    /// - `super_admin` is granted the `SuperAdmin` role and must sign.
    /// - `token` is the SAC used for stakes, yield and donations.
    /// - `lock_period` (seconds) is applied by every subsequent `stake`.
    ///
    /// Fails with `AlreadyInitialized` on a second call.
    pub fn init(
        env: Env,
        super_admin: Address,
        token: Address,
        lock_period: u64,
    ) -> Result<(), Error> {
        super_admin.require_auth();
        if storage::has_config(&env) {
            return Err(Error::AlreadyInitialized);
        }
        if lock_period > staking::MAX_LOCK_PERIOD {
            return Err(Error::InvalidDuration);
        }
        rbac::init_super_admin(&env, &super_admin)?;
        storage::save_config(&env, &ProtocolConfig { token, lock_period });
        storage::save_pool(&env, &RewardPool::genesis());
        Ok(())
    }

    pub fn config(env: Env) -> Result<ProtocolConfig, Error> {
        storage::load_config(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`. `caller` must hold `SuperAdmin` or `Admin`;
    /// only `SuperAdmin` can grant `SuperAdmin`.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        caller.require_auth();
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke any role from `target`. The SuperAdmin cannot be revoked.
    pub fn revoke_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::revoke_role(&env, &caller, &target)
    }

    /// Transfer SuperAdmin to `new_super_admin`; the previous holder loses it.
    pub fn transfer_super_admin(
        env: Env,
        current_super_admin: Address,
        new_super_admin: Address,
    ) -> Result<(), Error> {
        current_super_admin.require_auth();
        rbac::transfer_super_admin(&env, &current_super_admin, &new_super_admin)
    }

    pub fn role_of(env: Env, address: Address) -> Option<Role> {
        rbac::role_of(&env, address)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, address, role)
    }

    // ─────────────────────────────────────────────────────────
    // Parameters and emergency control
    // ─────────────────────────────────────────────────────────

    /// Change the lock applied by future stakes. Admin only.
    pub fn set_lock_period(env: Env, caller: Address, lock_period: u64) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        staking::set_lock_period(&env, &caller, lock_period)
    }

    /// Pause staking, distribution, project creation, donations, proofs,
    /// votes and finalisation. Withdrawals, yield claims, refunds and
    /// cancellation stay available.
    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        storage::set_paused(&env, true);
        events::emit_protocol_paused(&env, caller);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        storage::set_paused(&env, false);
        events::emit_protocol_unpaused(&env, caller);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Staking ledger
    // ─────────────────────────────────────────────────────────

    /// Stake `amount` tokens. Settles pending yield, resets the lock to
    /// `now + lock_period` and, when both `target_project` and `donate_bps`
    /// are given, records the yield split.
    pub fn stake(
        env: Env,
        staker: Address,
        amount: i128,
        target_project: Option<u64>,
        donate_bps: Option<u32>,
    ) -> Result<StakeAccount, Error> {
        Self::require_not_paused(&env)?;
        staker.require_auth();
        let split = match (target_project, donate_bps) {
            (Some(project_id), Some(donate_bps)) => Some(YieldSplit {
                project_id,
                donate_bps,
            }),
            (None, None) => None,
            _ => return Err(Error::InvalidSplit),
        };
        staking::stake(&env, &staker, amount, split)
    }

    /// Withdraw `amount` staked tokens once the lock has expired.
    pub fn unstake(env: Env, staker: Address, amount: i128) -> Result<StakeAccount, Error> {
        staker.require_auth();
        staking::unstake(&env, &staker, amount)
    }

    /// Pay out pending yield; returns the amount transferred to the staker.
    pub fn claim_yield(env: Env, staker: Address) -> Result<i128, Error> {
        staker.require_auth();
        staking::claim_yield(&env, &staker)
    }

    /// Deposit `amount` of yield for all current stakers. `caller` must hold
    /// `Distributor`, `Admin` or `SuperAdmin`.
    pub fn distribute(env: Env, caller: Address, amount: i128) -> Result<RewardPool, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        rbac::require_distributor(&env, &caller)?;
        staking::distribute(&env, &caller, amount)
    }

    pub fn reward_pool(env: Env) -> RewardPool {
        storage::load_pool(&env)
    }

    pub fn stake_account(env: Env, staker: Address) -> StakeAccount {
        staking::stake_account(&env, &staker)
    }

    pub fn pending_yield(env: Env, staker: Address) -> Result<i128, Error> {
        staking::pending_yield(&env, &staker)
    }

    pub fn is_locked(env: Env, staker: Address) -> bool {
        staking::is_locked(&env, &staker)
    }

    // ─────────────────────────────────────────────────────────
    // Project lifecycle
    // ─────────────────────────────────────────────────────────

    /// Open a project. `researcher` must hold `Researcher`, `Admin` or
    /// `SuperAdmin`. Returns the new project ID.
    pub fn create_project(
        env: Env,
        researcher: Address,
        title: String,
        milestones: Vec<MilestoneInput>,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        researcher.require_auth();
        rbac::require_can_create_project(&env, &researcher)?;
        escrow::create_project(&env, &researcher, title, milestones)
    }

    /// Donate to the project's current milestone; returns the accepted amount.
    pub fn donate(env: Env, project_id: u64, donor: Address, amount: i128) -> Result<i128, Error> {
        donor.require_auth();
        escrow::donate(&env, project_id, &donor, amount)
    }

    pub fn submit_proof(
        env: Env,
        project_id: u64,
        researcher: Address,
        proof_uri: String,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        researcher.require_auth();
        escrow::submit_proof(&env, project_id, &researcher, proof_uri)
    }

    pub fn vote(env: Env, project_id: u64, donor: Address, approve: bool) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        donor.require_auth();
        escrow::vote(&env, project_id, &donor, approve)
    }

    /// Tally the current milestone. Callable by anyone once voting is open.
    pub fn finalize_milestone(env: Env, project_id: u64) -> Result<MilestoneStatus, Error> {
        Self::require_not_paused(&env)?;
        escrow::finalize_milestone(&env, project_id)
    }

    /// Skip an expired milestone that raised nothing. Callable by anyone.
    pub fn skip_milestone(env: Env, project_id: u64) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        escrow::skip_milestone(&env, project_id)
    }

    pub fn claim_refund(
        env: Env,
        project_id: u64,
        donor: Address,
        milestone_index: u32,
    ) -> Result<i128, Error> {
        donor.require_auth();
        escrow::claim_refund(&env, project_id, &donor, milestone_index)
    }

    pub fn cancel(env: Env, project_id: u64, researcher: Address) -> Result<(), Error> {
        researcher.require_auth();
        escrow::cancel(&env, project_id, &researcher)
    }

    // ─────────────────────────────────────────────────────────
    // Project queries
    // ─────────────────────────────────────────────────────────

    pub fn get_project(env: Env, project_id: u64) -> Result<Project, Error> {
        escrow::get_project(&env, project_id)
    }

    pub fn get_milestone(
        env: Env,
        project_id: u64,
        milestone_index: u32,
    ) -> Result<Milestone, Error> {
        escrow::get_milestone(&env, project_id, milestone_index)
    }

    pub fn current_milestone(env: Env, project_id: u64) -> Result<Milestone, Error> {
        escrow::current_milestone(&env, project_id)
    }

    /// Funding progress of a milestone in basis points.
    pub fn milestone_progress(
        env: Env,
        project_id: u64,
        milestone_index: u32,
    ) -> Result<u32, Error> {
        escrow::milestone_progress(&env, project_id, milestone_index)
    }

    pub fn total_raised(env: Env, project_id: u64) -> Result<i128, Error> {
        escrow::total_raised(&env, project_id)
    }

    pub fn donation_of(env: Env, project_id: u64, milestone_index: u32, donor: Address) -> i128 {
        storage::get_donation(&env, project_id, milestone_index, &donor)
    }

    pub fn has_voted(env: Env, project_id: u64, milestone_index: u32, donor: Address) -> bool {
        storage::has_voted(&env, project_id, milestone_index, &donor)
    }

    pub fn project_count(env: Env) -> u64 {
        storage::project_count(&env)
    }

    pub fn get_projects(env: Env, offset: u64, limit: u32) -> Result<Vec<Project>, Error> {
        escrow::get_projects(&env, offset, limit)
    }

    /// IDs of `researcher`'s projects in creation order. `limit` is capped
    /// at `MAX_PAGE_SIZE`.
    pub fn projects_of(env: Env, researcher: Address, offset: u32, limit: u32) -> Vec<u64> {
        storage::projects_of(&env, &researcher, offset, limit.min(escrow::MAX_PAGE_SIZE))
    }

    pub fn project_count_of(env: Env, researcher: Address) -> u32 {
        storage::owned_project_count(&env, &researcher)
    }

    /// Sequence marker carried by the most recent event (0 before any event).
    pub fn last_event_seq(env: Env) -> u64 {
        storage::last_event_seq(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Funding pool
    // ─────────────────────────────────────────────────────────

    /// Donate to the general pool rather than to a milestone.
    pub fn donate_to_pool(env: Env, donor: Address, amount: i128) -> Result<FundingPool, Error> {
        Self::require_not_paused(&env)?;
        donor.require_auth();
        pool::donate_to_pool(&env, &donor, amount)
    }

    /// Grant unallocated pool funds to a project. `caller` must hold
    /// `Allocator`, `Admin` or `SuperAdmin`.
    pub fn allocate_to_project(
        env: Env,
        caller: Address,
        project_id: u64,
        amount: i128,
    ) -> Result<Allocation, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        rbac::require_allocator(&env, &caller)?;
        pool::allocate_to_project(&env, &caller, project_id, amount)
    }

    /// Researcher takes out part of the project's allocation. Stays open
    /// while paused.
    pub fn withdraw_allocation(
        env: Env,
        project_id: u64,
        researcher: Address,
        amount: i128,
    ) -> Result<Allocation, Error> {
        researcher.require_auth();
        pool::withdraw_allocation(&env, project_id, &researcher, amount)
    }

    pub fn project_allocation(env: Env, project_id: u64) -> Result<Allocation, Error> {
        pool::project_allocation(&env, project_id)
    }

    pub fn pool_metrics(env: Env) -> Result<PoolMetrics, Error> {
        pool::metrics(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────

    fn require_not_paused(env: &Env) -> Result<(), Error> {
        if storage::is_paused(env) {
            return Err(Error::ProtocolPaused);
        }
        Ok(())
    }
}
