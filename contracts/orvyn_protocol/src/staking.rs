//! # Stake Yield Ledger
//!
//! Custody of staked DKT and pro-rata yield accrual through a single global
//! reward index.
//!
//! `distribute` never iterates stakers: it folds the deposited amount into
//! `RewardPool::reward_index`. Every other operation settles exactly one
//! [`StakeAccount`] against that index, so `stake`, `unstake` and
//! `claim_yield` read and write the same fixed set of entries whatever the
//! number of stakers.
//!
//! Settlement moves accrued yield into `StakeAccount::unclaimed` and snapshots
//! the index into `reward_debt`. Only `claim_yield` pays out.

use soroban_sdk::{token, Address, Env};

use crate::escrow::EscrowSink;
use crate::router::{self, RoutedYield};
use crate::types::{ProtocolConfig, RewardPool, SplitSlot, StakeAccount, YieldSplit};
use crate::{escrow, events, storage, Error};

/// Fixed-point scale of the reward index.
pub const SCALE: i128 = 1_000_000_000_000_000_000;

/// Upper bound for the configurable lock period (365 days).
pub const MAX_LOCK_PERIOD: u64 = 365 * 24 * 60 * 60;

// ─────────────────────────────────────────────────────────
// Index arithmetic
// ─────────────────────────────────────────────────────────

/// Yield accrued by `staked` units while the index moved from `debt` to `index`.
pub fn accrued(staked: i128, index: i128, debt: i128) -> Result<i128, Error> {
    let delta = index.checked_sub(debt).ok_or(Error::Overflow)?;
    staked
        .checked_mul(delta)
        .map(|scaled| scaled / SCALE)
        .ok_or(Error::Overflow)
}

/// Move everything accrued since the last checkpoint into `unclaimed`.
fn settle(account: &mut StakeAccount, pool: &RewardPool) -> Result<(), Error> {
    let earned = accrued(account.staked_amount, pool.reward_index, account.reward_debt)?;
    account.unclaimed = account
        .unclaimed
        .checked_add(earned)
        .ok_or(Error::Overflow)?;
    account.reward_debt = pool.reward_index;
    Ok(())
}

/// Fold `amount` into the index. The scaled remainder is carried so that
/// repeated small distributions are not lost to truncation.
fn fold_into_index(pool: &mut RewardPool, amount: i128) -> Result<(), Error> {
    if pool.total_staked == 0 {
        return Err(Error::ZeroTotalStake);
    }
    let scaled = amount
        .checked_mul(SCALE)
        .and_then(|v| v.checked_add(pool.index_carry))
        .ok_or(Error::Overflow)?;
    let delta = scaled / pool.total_staked;
    pool.index_carry = scaled % pool.total_staked;
    pool.reward_index = pool
        .reward_index
        .checked_add(delta)
        .ok_or(Error::Overflow)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────

/// Lock `amount` of `staker`'s tokens and optionally record a yield split.
pub fn stake(
    env: &Env,
    staker: &Address,
    amount: i128,
    split: Option<YieldSplit>,
) -> Result<StakeAccount, Error> {
    let config = storage::load_config(env)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    if let Some(ref s) = split {
        validate_split(env, s)?;
    }

    let token_client = token::Client::new(env, &config.token);
    if token_client.balance(staker) < amount {
        return Err(Error::InsufficientBalance);
    }

    let mut pool = storage::load_pool(env);
    let mut account = storage::get_stake_account(env, staker).unwrap_or_else(StakeAccount::empty);

    settle(&mut account, &pool)?;
    account.staked_amount = account
        .staked_amount
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    pool.total_staked = pool
        .total_staked
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    account.lock_expiry = env
        .ledger()
        .timestamp()
        .checked_add(config.lock_period)
        .ok_or(Error::Overflow)?;
    if let Some(split) = split {
        account.yield_split = SplitSlot::Set(split);
    }

    token_client.transfer(staker, &env.current_contract_address(), &amount);

    storage::save_stake_account(env, staker, &account);
    storage::save_pool(env, &pool);

    events::emit_staked(
        env,
        staker.clone(),
        amount,
        account.staked_amount,
        pool.total_staked,
        account.lock_expiry,
    );
    Ok(account)
}

/// Return `amount` of staked tokens once the lock has expired.
///
/// Withdrawing the full balance also clears the account's yield split.
pub fn unstake(env: &Env, staker: &Address, amount: i128) -> Result<StakeAccount, Error> {
    let config = storage::load_config(env)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let mut account = storage::get_stake_account(env, staker).ok_or(Error::InsufficientBalance)?;
    if env.ledger().timestamp() < account.lock_expiry {
        return Err(Error::LockedFunds);
    }
    if amount > account.staked_amount {
        return Err(Error::InsufficientBalance);
    }

    let mut pool = storage::load_pool(env);
    settle(&mut account, &pool)?;
    account.staked_amount -= amount;
    pool.total_staked -= amount;
    if account.staked_amount == 0 {
        account.yield_split = SplitSlot::Unset;
    }

    token::Client::new(env, &config.token).transfer(
        &env.current_contract_address(),
        staker,
        &amount,
    );

    storage::save_stake_account(env, staker, &account);
    storage::save_pool(env, &pool);

    events::emit_unstaked(
        env,
        staker.clone(),
        amount,
        account.staked_amount,
        pool.total_staked,
    );
    Ok(account)
}

/// Pay out everything `staker` has earned, honouring the yield split.
///
/// Returns the amount transferred to the staker. Claiming with nothing
/// pending succeeds with `0` and leaves the ledger untouched.
pub fn claim_yield(env: &Env, staker: &Address) -> Result<i128, Error> {
    let config = storage::load_config(env)?;
    let mut account = match storage::get_stake_account(env, staker) {
        Some(account) => account,
        None => return Ok(0),
    };
    let mut pool = storage::load_pool(env);

    settle(&mut account, &pool)?;
    let pending = account.unclaimed;
    if pending == 0 {
        return Ok(0);
    }
    account.unclaimed = 0;

    let routed = route(env, staker, pending, account.yield_split.as_ref())?;

    if routed.to_staker > 0 {
        token::Client::new(env, &config.token).transfer(
            &env.current_contract_address(),
            staker,
            &routed.to_staker,
        );
    }

    pool.total_claimed = pool
        .total_claimed
        .checked_add(pending)
        .ok_or(Error::Overflow)?;
    pool.total_routed = pool
        .total_routed
        .checked_add(routed.to_project)
        .ok_or(Error::Overflow)?;

    storage::save_stake_account(env, staker, &account);
    storage::save_pool(env, &pool);

    if let (true, Some(split)) = (routed.to_project > 0, account.yield_split.as_ref()) {
        events::emit_yield_routed(
            env,
            split.project_id,
            staker.clone(),
            routed.to_project,
            pool.total_routed,
        );
    }
    events::emit_yield_claimed(
        env,
        staker.clone(),
        routed.to_staker,
        routed.to_project,
        pool.total_claimed,
    );
    Ok(routed.to_staker)
}

fn route(
    env: &Env,
    staker: &Address,
    pending: i128,
    split: Option<&YieldSplit>,
) -> Result<RoutedYield, Error> {
    match split {
        Some(split) if split.donate_bps > 0 => {
            let sink = EscrowSink::new(split.project_id);
            router::split_yield(env, staker, pending, split.donate_bps, Some(&sink))
        }
        _ => router::split_yield::<EscrowSink>(env, staker, pending, 0, None),
    }
}

/// Deposit `amount` of yield from `caller` and credit it to all stakers pro rata.
///
/// Rejected with `ZeroTotalStake` when nothing is staked: there is no one to
/// credit and the index cannot absorb it.
pub fn distribute(env: &Env, caller: &Address, amount: i128) -> Result<RewardPool, Error> {
    let config = storage::load_config(env)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let mut pool = storage::load_pool(env);
    fold_into_index(&mut pool, amount)?;
    pool.total_distributed = pool
        .total_distributed
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    pool.last_distribution = env.ledger().timestamp();
    pool.epoch += 1;

    token::Client::new(env, &config.token).transfer(
        caller,
        &env.current_contract_address(),
        &amount,
    );

    storage::save_pool(env, &pool);

    events::emit_yield_distributed(
        env,
        caller.clone(),
        amount,
        pool.reward_index,
        pool.total_staked,
        pool.total_distributed,
    );
    Ok(pool)
}

/// Change the lock applied by future `stake` calls.
pub fn set_lock_period(env: &Env, caller: &Address, lock_period: u64) -> Result<(), Error> {
    let mut config: ProtocolConfig = storage::load_config(env)?;
    if lock_period > MAX_LOCK_PERIOD {
        return Err(Error::InvalidDuration);
    }
    config.lock_period = lock_period;
    storage::save_config(env, &config);
    events::emit_lock_period_set(env, caller.clone(), lock_period);
    Ok(())
}

fn validate_split(env: &Env, split: &YieldSplit) -> Result<(), Error> {
    if split.donate_bps > router::BPS_DENOMINATOR {
        return Err(Error::InvalidSplit);
    }
    escrow::require_project(env, split.project_id)
}

// ─────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────

pub fn stake_account(env: &Env, staker: &Address) -> StakeAccount {
    storage::get_stake_account(env, staker).unwrap_or_else(StakeAccount::empty)
}

/// Yield `staker` would receive from `claim_yield` right now.
pub fn pending_yield(env: &Env, staker: &Address) -> Result<i128, Error> {
    let account = stake_account(env, staker);
    let pool = storage::load_pool(env);
    accrued(account.staked_amount, pool.reward_index, account.reward_debt)?
        .checked_add(account.unclaimed)
        .ok_or(Error::Overflow)
}

pub fn is_locked(env: &Env, staker: &Address) -> bool {
    env.ledger().timestamp() < stake_account(env, staker).lock_expiry
}
