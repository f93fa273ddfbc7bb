//! # Milestone Escrow
//!
//! Sequential milestone funding with donor-weighted approval.
//!
//! Each project owns an ordered list of milestones. Only the milestone at
//! `ProjectState::current_milestone` accepts donations or votes; once it
//! reaches a terminal state the project moves on to the next one, or becomes
//! `Completed` after the last.
//!
//! | Operation         | Caller      | Requires                                         |
//! |-------------------|-------------|--------------------------------------------------|
//! | `donate`          | donor       | Active, current `Pending`, `raised < goal`       |
//! | `submit_proof`    | researcher  | Active, `Pending`, deadline passed, `raised > 0` |
//! | `skip_milestone`  | anyone      | Active, `Pending`, deadline passed, `raised == 0`|
//! | `vote`            | donor       | Active, `Voting`, donated, not yet voted         |
//! | `finalize`        | anyone      | Active, `Voting`                                 |
//! | `claim_refund`    | donor       | milestone `Rejected`, unrefunded donation        |
//! | `cancel`          | researcher  | Active                                           |
//!
//! Donations past the goal are truncated to the remaining capacity; a
//! milestone that is already full rejects further donations with
//! `GoalExceeded`. Reaching the goal does not advance the milestone: the
//! researcher still has to submit proof after the deadline.

use soroban_sdk::{symbol_short, token, Address, Env, String, Vec};

use crate::router::{DonationSink, BPS_DENOMINATOR};
use crate::types::{
    Milestone, MilestoneInput, MilestoneStatus, Project, ProjectConfig, ProjectState,
    ProjectStatus,
};
use crate::{events, storage, Error};

/// Shortest allowed milestone duration (1 day).
pub const MIN_MILESTONE_DURATION: u64 = 24 * 60 * 60;
/// Longest allowed milestone duration (365 days).
pub const MAX_MILESTONE_DURATION: u64 = 365 * 24 * 60 * 60;
pub const MAX_MILESTONES: u32 = 20;
/// 10^30 base units.
pub const MAX_GOAL: i128 = 1_000_000_000_000_000_000_000_000_000_000;
pub const MAX_PAGE_SIZE: u32 = 50;

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

pub fn require_project(env: &Env, project_id: u64) -> Result<(), Error> {
    storage::load_project_config(env, project_id).map(|_| ())
}

fn require_active(state: &ProjectState) -> Result<(), Error> {
    if state.status != ProjectStatus::Active {
        return Err(Error::InvalidState);
    }
    Ok(())
}

fn require_researcher(config: &ProjectConfig, caller: &Address) -> Result<(), Error> {
    if &config.researcher != caller {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

fn deadline_passed(env: &Env, milestone: &Milestone) -> bool {
    env.ledger().timestamp() >= milestone.deadline
}

fn token_client<'a>(env: &'a Env) -> Result<token::Client<'a>, Error> {
    let config = storage::load_config(env)?;
    Ok(token::Client::new(env, &config.token))
}

/// Move the project past its current milestone, which must already be terminal.
fn advance(env: &Env, config: &ProjectConfig, state: &mut ProjectState) {
    if state.current_milestone + 1 < config.milestone_count {
        state.current_milestone += 1;
        events::emit_milestone_changed(
            env,
            symbol_short!("activated"),
            config.id,
            state.current_milestone,
        );
    } else {
        state.status = ProjectStatus::Completed;
        events::emit_milestone_changed(
            env,
            symbol_short!("completed"),
            config.id,
            state.current_milestone,
        );
    }
}

// ─────────────────────────────────────────────────────────
// Project registration
// ─────────────────────────────────────────────────────────

/// Open a new project with its full milestone plan.
///
/// Milestone deadlines are cumulative: each `duration` counts from the
/// previous milestone's deadline, the first one from now.
pub fn create_project(
    env: &Env,
    researcher: &Address,
    title: String,
    milestones: Vec<MilestoneInput>,
) -> Result<u64, Error> {
    storage::load_config(env)?;
    let count = milestones.len();
    if count == 0 || count > MAX_MILESTONES {
        return Err(Error::InvalidMilestones);
    }

    let now = env.ledger().timestamp();
    let mut deadline = now;
    let mut total_goal: i128 = 0;
    let mut records: Vec<Milestone> = Vec::new(env);
    for input in milestones.iter() {
        if input.goal <= 0 || input.goal > MAX_GOAL {
            return Err(Error::InvalidGoal);
        }
        if input.duration < MIN_MILESTONE_DURATION || input.duration > MAX_MILESTONE_DURATION {
            return Err(Error::InvalidDuration);
        }
        deadline = deadline
            .checked_add(input.duration)
            .ok_or(Error::Overflow)?;
        total_goal = total_goal
            .checked_add(input.goal)
            .ok_or(Error::Overflow)?;
        records.push_back(Milestone {
            title: input.title,
            goal: input.goal,
            deadline,
            raised: 0,
            votes_yes: 0,
            votes_no: 0,
            proof_uri: String::from_str(env, ""),
            status: MilestoneStatus::Pending,
            released: 0,
            refunded: 0,
        });
    }

    let id = storage::get_and_increment_project_id(env);
    let config = ProjectConfig {
        id,
        researcher: researcher.clone(),
        title: title.clone(),
        milestone_count: count,
        created_at: now,
    };
    let state = ProjectState {
        status: ProjectStatus::Active,
        current_milestone: 0,
    };

    storage::save_project_config(env, &config);
    storage::save_project_state(env, id, &state);
    for (index, milestone) in records.iter().enumerate() {
        storage::save_milestone(env, id, index as u32, &milestone);
    }
    storage::push_researcher_project(env, researcher, id);

    events::emit_project_created(env, id, researcher.clone(), title, count, total_goal);
    Ok(id)
}

// ─────────────────────────────────────────────────────────
// Donations
// ─────────────────────────────────────────────────────────

/// A validated donation that has not been written yet.
struct PreparedDonation {
    index: u32,
    milestone: Milestone,
    accepted: i128,
}

/// Check every donation precondition and compute the accepted (capped) amount.
fn prepare_donation(env: &Env, project_id: u64, amount: i128) -> Result<PreparedDonation, Error> {
    if storage::is_paused(env) {
        return Err(Error::ProtocolPaused);
    }
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let state = storage::load_project_state(env, project_id)?;
    require_active(&state)?;

    let index = state.current_milestone;
    let milestone = storage::load_milestone(env, project_id, index)?;
    if milestone.status != MilestoneStatus::Pending {
        return Err(Error::InvalidState);
    }
    let remaining = milestone.goal - milestone.raised;
    if remaining <= 0 {
        return Err(Error::GoalExceeded);
    }

    Ok(PreparedDonation {
        index,
        milestone,
        accepted: amount.min(remaining),
    })
}

fn commit_donation(
    env: &Env,
    project_id: u64,
    donor: &Address,
    prepared: PreparedDonation,
) -> i128 {
    let PreparedDonation {
        index,
        mut milestone,
        accepted,
    } = prepared;

    let previous = storage::get_donation(env, project_id, index, donor);
    storage::set_donation(env, project_id, index, donor, previous + accepted);
    milestone.raised += accepted;
    storage::save_milestone(env, project_id, index, &milestone);

    events::emit_donation_received(
        env,
        project_id,
        donor.clone(),
        index,
        accepted,
        milestone.raised,
    );
    accepted
}

/// Transfer up to `amount` from `donor` into escrow for the current milestone.
///
/// Returns the amount actually taken, which is less than `amount` when the
/// donation would overshoot the goal.
pub fn donate(env: &Env, project_id: u64, donor: &Address, amount: i128) -> Result<i128, Error> {
    let token_client = token_client(env)?;
    let prepared = prepare_donation(env, project_id, amount)?;
    if token_client.balance(donor) < prepared.accepted {
        return Err(Error::InsufficientBalance);
    }
    token_client.transfer(donor, &env.current_contract_address(), &prepared.accepted);
    Ok(commit_donation(env, project_id, donor, prepared))
}

/// Donation entry point for funds already held by the contract (routed yield).
///
/// Performs no token transfer and needs no donor authorisation.
pub fn credit_donation(
    env: &Env,
    project_id: u64,
    donor: &Address,
    amount: i128,
) -> Result<i128, Error> {
    let prepared = prepare_donation(env, project_id, amount)?;
    Ok(commit_donation(env, project_id, donor, prepared))
}

/// [`DonationSink`] backed by one project's escrow.
pub struct EscrowSink {
    project_id: u64,
}

impl EscrowSink {
    pub fn new(project_id: u64) -> Self {
        EscrowSink { project_id }
    }
}

impl DonationSink for EscrowSink {
    fn accept_donation(&self, env: &Env, donor: &Address, amount: i128) -> Result<i128, Error> {
        credit_donation(env, self.project_id, donor, amount)
    }
}

// ─────────────────────────────────────────────────────────
// Proof, voting and finalisation
// ─────────────────────────────────────────────────────────

/// Researcher submits completion proof; the milestone moves to `Voting`.
pub fn submit_proof(
    env: &Env,
    project_id: u64,
    researcher: &Address,
    proof_uri: String,
) -> Result<(), Error> {
    let (config, state) = storage::load_project_pair(env, project_id)?;
    require_researcher(&config, researcher)?;
    require_active(&state)?;

    let index = state.current_milestone;
    let mut milestone = storage::load_milestone(env, project_id, index)?;
    if milestone.status != MilestoneStatus::Pending {
        return Err(Error::InvalidState);
    }
    if !deadline_passed(env, &milestone) {
        return Err(Error::DeadlineNotReached);
    }
    if milestone.raised == 0 {
        return Err(Error::InvalidState);
    }
    if proof_uri.len() == 0 {
        return Err(Error::EmptyProof);
    }

    milestone.proof_uri = proof_uri.clone();
    milestone.status = MilestoneStatus::Voting;
    storage::save_milestone(env, project_id, index, &milestone);

    events::emit_proof_submitted(env, project_id, index, proof_uri);
    Ok(())
}

/// Skip an expired milestone that raised nothing.
pub fn skip_milestone(env: &Env, project_id: u64) -> Result<(), Error> {
    let (config, mut state) = storage::load_project_pair(env, project_id)?;
    require_active(&state)?;

    let index = state.current_milestone;
    let mut milestone = storage::load_milestone(env, project_id, index)?;
    if milestone.status != MilestoneStatus::Pending {
        return Err(Error::InvalidState);
    }
    if !deadline_passed(env, &milestone) {
        return Err(Error::DeadlineNotReached);
    }
    if milestone.raised != 0 {
        return Err(Error::InvalidState);
    }

    milestone.status = MilestoneStatus::Skipped;
    storage::save_milestone(env, project_id, index, &milestone);
    events::emit_milestone_changed(env, symbol_short!("skipped"), project_id, index);

    advance(env, &config, &mut state);
    storage::save_project_state(env, project_id, &state);
    Ok(())
}

/// Cast `donor`'s vote, weighted by what they gave to this milestone.
pub fn vote(env: &Env, project_id: u64, donor: &Address, approve: bool) -> Result<(), Error> {
    let state = storage::load_project_state(env, project_id)?;
    require_active(&state)?;

    let index = state.current_milestone;
    let mut milestone = storage::load_milestone(env, project_id, index)?;
    if milestone.status != MilestoneStatus::Voting {
        return Err(Error::InvalidState);
    }
    if storage::has_voted(env, project_id, index, donor) {
        return Err(Error::AlreadyVoted);
    }
    let weight = storage::get_donation(env, project_id, index, donor);
    if weight <= 0 {
        return Err(Error::NoContribution);
    }

    if approve {
        milestone.votes_yes += weight;
    } else {
        milestone.votes_no += weight;
    }
    storage::mark_voted(env, project_id, index, donor);
    storage::save_milestone(env, project_id, index, &milestone);

    events::emit_milestone_voted(
        env,
        project_id,
        donor.clone(),
        index,
        approve,
        weight,
        (milestone.votes_yes, milestone.votes_no),
    );
    Ok(())
}

/// Tally the current milestone. Ties approve.
///
/// Approval releases `raised` to the researcher; rejection leaves it in
/// escrow for refunds. Either way the project advances.
pub fn finalize_milestone(env: &Env, project_id: u64) -> Result<MilestoneStatus, Error> {
    let (config, mut state) = storage::load_project_pair(env, project_id)?;
    require_active(&state)?;

    let index = state.current_milestone;
    let mut milestone = storage::load_milestone(env, project_id, index)?;
    if milestone.status != MilestoneStatus::Voting {
        return Err(Error::InvalidState);
    }

    let approved = milestone.votes_yes >= milestone.votes_no;
    if approved {
        milestone.status = MilestoneStatus::Approved;
        milestone.released = milestone.raised;
        token_client(env)?.transfer(
            &env.current_contract_address(),
            &config.researcher,
            &milestone.raised,
        );
    } else {
        milestone.status = MilestoneStatus::Rejected;
    }
    storage::save_milestone(env, project_id, index, &milestone);

    events::emit_milestone_finalized(
        env,
        project_id,
        index,
        milestone.status.clone(),
        milestone.raised,
        (milestone.votes_yes, milestone.votes_no),
    );
    if approved {
        events::emit_funds_released(
            env,
            project_id,
            config.researcher.clone(),
            index,
            milestone.released,
        );
    }

    advance(env, &config, &mut state);
    storage::save_project_state(env, project_id, &state);
    Ok(milestone.status)
}

/// Return `donor`'s contribution to a rejected milestone. One claim per
/// (donor, milestone): the stored donation is zeroed.
pub fn claim_refund(
    env: &Env,
    project_id: u64,
    donor: &Address,
    index: u32,
) -> Result<i128, Error> {
    require_project(env, project_id)?;
    let mut milestone = storage::load_milestone(env, project_id, index)?;
    if milestone.status != MilestoneStatus::Rejected {
        return Err(Error::InvalidState);
    }
    let amount = storage::get_donation(env, project_id, index, donor);
    if amount <= 0 {
        return Err(Error::NoContribution);
    }

    storage::set_donation(env, project_id, index, donor, 0);
    milestone.refunded += amount;
    storage::save_milestone(env, project_id, index, &milestone);

    token_client(env)?.transfer(&env.current_contract_address(), donor, &amount);

    events::emit_refund_claimed(env, project_id, donor.clone(), index, amount, milestone.refunded);
    Ok(amount)
}

/// Researcher abandons the project. The current milestone becomes refundable
/// and the milestones after it are skipped. Irreversible.
pub fn cancel(env: &Env, project_id: u64, researcher: &Address) -> Result<(), Error> {
    let (config, mut state) = storage::load_project_pair(env, project_id)?;
    require_researcher(&config, researcher)?;
    require_active(&state)?;

    let index = state.current_milestone;
    let mut current = storage::load_milestone(env, project_id, index)?;
    current.status = MilestoneStatus::Rejected;
    storage::save_milestone(env, project_id, index, &current);

    for later in (index + 1)..config.milestone_count {
        let mut milestone = storage::load_milestone(env, project_id, later)?;
        milestone.status = MilestoneStatus::Skipped;
        storage::save_milestone(env, project_id, later, &milestone);
    }

    state.status = ProjectStatus::Cancelled;
    storage::save_project_state(env, project_id, &state);

    events::emit_project_cancelled(env, project_id, researcher.clone(), index);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────

pub fn get_project(env: &Env, project_id: u64) -> Result<Project, Error> {
    let (config, state) = storage::load_project_pair(env, project_id)?;
    Ok(Project::from_parts(config, state))
}

pub fn get_milestone(env: &Env, project_id: u64, index: u32) -> Result<Milestone, Error> {
    require_project(env, project_id)?;
    storage::load_milestone(env, project_id, index)
}

pub fn current_milestone(env: &Env, project_id: u64) -> Result<Milestone, Error> {
    let state = storage::load_project_state(env, project_id)?;
    storage::load_milestone(env, project_id, state.current_milestone)
}

/// Funding progress of a milestone in basis points, capped at 10 000.
pub fn milestone_progress(env: &Env, project_id: u64, index: u32) -> Result<u32, Error> {
    let milestone = get_milestone(env, project_id, index)?;
    let bps = milestone.raised * BPS_DENOMINATOR as i128 / milestone.goal;
    Ok(bps.min(BPS_DENOMINATOR as i128) as u32)
}

/// Sum of `raised` across every milestone of the project.
pub fn total_raised(env: &Env, project_id: u64) -> Result<i128, Error> {
    let config = storage::load_project_config(env, project_id)?;
    let mut total: i128 = 0;
    for index in 0..config.milestone_count {
        total += storage::load_milestone(env, project_id, index)?.raised;
    }
    Ok(total)
}

/// Page through projects by ID. `limit` is capped at [`MAX_PAGE_SIZE`].
pub fn get_projects(env: &Env, offset: u64, limit: u32) -> Result<Vec<Project>, Error> {
    let count = storage::project_count(env);
    let end = offset
        .saturating_add(limit.min(MAX_PAGE_SIZE) as u64)
        .min(count);
    let mut page = Vec::new(env);
    for id in offset..end {
        page.push_back(get_project(env, id)?);
    }
    Ok(page)
}
