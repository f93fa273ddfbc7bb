//! # Funding Pool
//!
//! Donations that are not tied to a milestone. Donors give to the pool, an
//! allocator grants pool funds to a project, and the project's researcher
//! withdraws the grant.
//!
//! | Operation             | Caller     | Requires                                  |
//! |-----------------------|------------|-------------------------------------------|
//! | `donate_to_pool`      | donor      | not paused, balance covers `amount`       |
//! | `allocate_to_project` | allocator  | not paused, project not cancelled, funds  |
//! | `withdraw_allocation` | researcher | owns project, `amount <= available`       |
//!
//! The pool is accounted separately from stakes and milestone escrows: every
//! token it holds is either in `FundingPool::balance` or in some project's
//! unwithdrawn [`Allocation`].

use soroban_sdk::{token, Address, Env};

use crate::types::{Allocation, FundingPool, PoolMetrics, ProjectStatus};
use crate::{events, storage, Error};

fn token_client<'a>(env: &'a Env) -> Result<token::Client<'a>, Error> {
    let config = storage::load_config(env)?;
    Ok(token::Client::new(env, &config.token))
}

/// Move `amount` from `donor` into the unallocated pool.
pub fn donate_to_pool(env: &Env, donor: &Address, amount: i128) -> Result<FundingPool, Error> {
    let token_client = token_client(env)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    if token_client.balance(donor) < amount {
        return Err(Error::InsufficientBalance);
    }

    let mut pool = storage::load_funding_pool(env);
    pool.balance = pool.balance.checked_add(amount).ok_or(Error::Overflow)?;
    pool.total_donations = pool
        .total_donations
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    token_client.transfer(donor, &env.current_contract_address(), &amount);
    storage::save_funding_pool(env, &pool);

    events::emit_pool_donation(env, donor.clone(), amount, pool.balance);
    Ok(pool)
}

/// Grant `amount` of unallocated pool funds to `project_id`.
pub fn allocate_to_project(
    env: &Env,
    allocator: &Address,
    project_id: u64,
    amount: i128,
) -> Result<Allocation, Error> {
    storage::load_config(env)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let state = storage::load_project_state(env, project_id)?;
    if state.status == ProjectStatus::Cancelled {
        return Err(Error::InvalidState);
    }

    let mut pool = storage::load_funding_pool(env);
    if amount > pool.balance {
        return Err(Error::InsufficientBalance);
    }
    let mut allocation = storage::get_allocation(env, project_id);
    allocation.allocated = allocation
        .allocated
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    pool.balance -= amount;
    pool.total_allocated = pool
        .total_allocated
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    storage::save_allocation(env, project_id, &allocation);
    storage::save_funding_pool(env, &pool);

    events::emit_allocation_made(env, project_id, allocator.clone(), amount, pool.balance);
    Ok(allocation)
}

/// Pay `amount` of the project's allocation out to its researcher.
pub fn withdraw_allocation(
    env: &Env,
    project_id: u64,
    researcher: &Address,
    amount: i128,
) -> Result<Allocation, Error> {
    let token_client = token_client(env)?;
    let config = storage::load_project_config(env, project_id)?;
    if &config.researcher != researcher {
        return Err(Error::NotAuthorized);
    }
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let mut allocation = storage::get_allocation(env, project_id);
    if amount > allocation.available() {
        return Err(Error::InsufficientBalance);
    }
    allocation.withdrawn += amount;

    let mut pool = storage::load_funding_pool(env);
    pool.total_withdrawn = pool
        .total_withdrawn
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    storage::save_allocation(env, project_id, &allocation);
    storage::save_funding_pool(env, &pool);
    token_client.transfer(&env.current_contract_address(), researcher, &amount);

    events::emit_allocation_withdrawn(
        env,
        project_id,
        researcher.clone(),
        amount,
        allocation.available(),
    );
    Ok(allocation)
}

pub fn project_allocation(env: &Env, project_id: u64) -> Result<Allocation, Error> {
    storage::load_project_config(env, project_id)?;
    Ok(storage::get_allocation(env, project_id))
}

pub fn metrics(env: &Env) -> Result<PoolMetrics, Error> {
    let custody = token_client(env)?.balance(&env.current_contract_address());
    let pool = storage::load_funding_pool(env);
    let rewards = storage::load_pool(env);
    Ok(PoolMetrics {
        pool_balance: pool.balance,
        total_donations: pool.total_donations,
        total_allocated: pool.total_allocated,
        total_withdrawn: pool.total_withdrawn,
        total_yield_distributed: rewards.total_distributed,
        total_yield_routed: rewards.total_routed,
        custody,
    })
}
