//! # Types
//!
//! Shared data structures used across all modules of the Orvyn protocol.
//!
//! ## Design decisions
//!
//! ### Reward index
//!
//! [`RewardPool`] holds a single fixed-point accumulator, `reward_index`,
//! equal to the cumulative yield paid per staked unit (scaled by
//! [`SCALE`](crate::staking::SCALE)) since genesis. A [`StakeAccount`] stores
//! the index value at its last checkpoint in `reward_debt`, so its pending
//! yield is always
//!
//! ```text
//! unclaimed + staked_amount * (reward_index - reward_debt) / SCALE
//! ```
//!
//! and every ledger operation touches exactly one account entry plus the pool.
//!
//! ### Project Config / State split
//!
//! A project is stored as an immutable [`ProjectConfig`] and a small mutable
//! [`ProjectState`], so milestone transitions rewrite only a few bytes.
//! Milestones are separate entries keyed by `(project_id, index)`.
//!
//! ### Funding pool
//!
//! General donations accumulate in [`FundingPool::balance`] until an
//! allocator grants them to a project's [`Allocation`], from which the
//! project's researcher withdraws. Pool funds never pass through milestones.
//!
//! ### Milestone lifecycle
//!
//! ```text
//! Pending ──► Voting ──► Approved
//!    │           └─────► Rejected
//!    └──► Skipped
//! ```
//!
//! `cancel` may also move the current `Pending` milestone straight to
//! `Rejected` so that donors can reclaim their funds.

use soroban_sdk::{contracttype, Address, String};

// ─────────────────────────────────────────────────────────
// Protocol configuration
// ─────────────────────────────────────────────────────────

/// Protocol-wide configuration written by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    /// SAC address of the staking / donation token (DKT).
    pub token: Address,
    /// Seconds a stake stays locked after each `stake` call.
    pub lock_period: u64,
}

// ─────────────────────────────────────────────────────────
// Staking ledger
// ─────────────────────────────────────────────────────────

/// Staker-configured routing of claimed yield into a project escrow.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct YieldSplit {
    pub project_id: u64,
    /// Share of each claim donated to the project, in basis points (0–10 000).
    pub donate_bps: u32,
}

/// Whether a stake account routes part of its yield, and where.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SplitSlot {
    Unset,
    Set(YieldSplit),
}

impl SplitSlot {
    pub fn as_ref(&self) -> Option<&YieldSplit> {
        match self {
            SplitSlot::Unset => None,
            SplitSlot::Set(split) => Some(split),
        }
    }
}

/// Per-staker ledger entry. Created on first `stake`, never deleted.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeAccount {
    pub staked_amount: i128,
    /// Unstaking is rejected while `now < lock_expiry`.
    pub lock_expiry: u64,
    /// Reward index at the last settlement checkpoint.
    pub reward_debt: i128,
    /// Yield settled by `stake`/`unstake` and not yet claimed.
    pub unclaimed: i128,
    pub yield_split: SplitSlot,
}

impl StakeAccount {
    pub fn empty() -> Self {
        StakeAccount {
            staked_amount: 0,
            lock_expiry: 0,
            reward_debt: 0,
            unclaimed: 0,
            yield_split: SplitSlot::Unset,
        }
    }
}

/// Global reward state shared by every staker.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardPool {
    /// Sum of `staked_amount` over all accounts.
    pub total_staked: i128,
    /// Cumulative yield per staked unit, scaled by `SCALE`. Never decreases.
    pub reward_index: i128,
    /// Scaled remainder left over by the last index update, carried forward.
    pub index_carry: i128,
    pub total_distributed: i128,
    /// Yield settled out of the index and paid (to stakers or projects).
    pub total_claimed: i128,
    /// Portion of `total_claimed` that was routed into project escrows.
    pub total_routed: i128,
    pub last_distribution: u64,
    /// Number of successful `distribute` calls.
    pub epoch: u64,
}

impl RewardPool {
    pub fn genesis() -> Self {
        RewardPool {
            total_staked: 0,
            reward_index: 0,
            index_carry: 0,
            total_distributed: 0,
            total_claimed: 0,
            total_routed: 0,
            last_distribution: 0,
            epoch: 0,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Funding pool
// ─────────────────────────────────────────────────────────

/// General donations not yet assigned to a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundingPool {
    /// Unallocated funds held for the pool.
    pub balance: i128,
    pub total_donations: i128,
    pub total_allocated: i128,
    /// Allocated funds the researchers have already taken out.
    pub total_withdrawn: i128,
}

impl FundingPool {
    pub fn empty() -> Self {
        FundingPool {
            balance: 0,
            total_donations: 0,
            total_allocated: 0,
            total_withdrawn: 0,
        }
    }
}

/// Pool funds granted to one project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Allocation {
    /// Cumulative amount allocated by allocators.
    pub allocated: i128,
    pub withdrawn: i128,
}

impl Allocation {
    pub fn empty() -> Self {
        Allocation {
            allocated: 0,
            withdrawn: 0,
        }
    }

    /// Amount the project's researcher can still withdraw.
    pub fn available(&self) -> i128 {
        self.allocated - self.withdrawn
    }
}

/// Combined view of the funding pool and the yield side of the ledger.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolMetrics {
    pub pool_balance: i128,
    pub total_donations: i128,
    pub total_allocated: i128,
    pub total_withdrawn: i128,
    pub total_yield_distributed: i128,
    pub total_yield_routed: i128,
    /// Token balance held by the contract across stakes, escrows and the pool.
    pub custody: i128,
}

// ─────────────────────────────────────────────────────────
// Milestone escrow
// ─────────────────────────────────────────────────────────

/// Lifecycle state of a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProjectStatus {
    /// Exactly one milestone (the current one) is `Pending` or `Voting`.
    Active,
    /// Every milestone reached a terminal state.
    Completed,
    /// Researcher cancelled; the current milestone was rejected.
    Cancelled,
}

/// Lifecycle state of a single milestone.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MilestoneStatus {
    /// Accepting donations until proof is submitted or it is skipped.
    Pending,
    /// Proof submitted; donors are voting.
    Voting,
    /// Donors approved; raised funds released to the researcher.
    Approved,
    /// Donors rejected (or project cancelled); funds refundable.
    Rejected,
    /// Deadline passed with nothing raised.
    Skipped,
}

impl MilestoneStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MilestoneStatus::Approved | MilestoneStatus::Rejected | MilestoneStatus::Skipped
        )
    }
}

/// Milestone description supplied to `create_project`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneInput {
    pub title: String,
    pub goal: i128,
    /// Seconds after the previous milestone's deadline (or creation time).
    pub duration: u64,
}

/// A funding tranche of a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Milestone {
    pub title: String,
    pub goal: i128,
    pub deadline: u64,
    /// Total accepted donations. Never exceeds `goal`.
    pub raised: i128,
    /// Donation-weighted approval tally.
    pub votes_yes: i128,
    /// Donation-weighted rejection tally.
    pub votes_no: i128,
    pub proof_uri: String,
    pub status: MilestoneStatus,
    /// Amount paid to the researcher on approval.
    pub released: i128,
    /// Amount paid back to donors after rejection.
    pub refunded: i128,
}

/// Immutable project configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub id: u64,
    pub researcher: Address,
    pub title: String,
    pub milestone_count: u32,
    pub created_at: u64,
}

/// Mutable project state, rewritten on every milestone transition.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectState {
    pub status: ProjectStatus,
    pub current_milestone: u32,
}

/// Full project view returned by queries; rebuilt from config and state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Auto-incremented unique ID.
    pub id: u64,
    /// Owner; receives released funds and is the only one allowed to submit
    /// proofs or cancel.
    pub researcher: Address,
    pub title: String,
    pub milestone_count: u32,
    pub created_at: u64,
    pub status: ProjectStatus,
    pub current_milestone: u32,
}

impl Project {
    pub fn from_parts(config: ProjectConfig, state: ProjectState) -> Self {
        Project {
            id: config.id,
            researcher: config.researcher,
            title: config.title,
            milestone_count: config.milestone_count,
            created_at: config.created_at,
            status: state.status,
            current_milestone: state.current_milestone,
        }
    }
}
