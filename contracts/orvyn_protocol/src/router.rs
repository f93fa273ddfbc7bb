//! # Yield Router
//!
//! Splits a claimed yield between the staker and a project escrow.
//!
//! The router never talks to the escrow directly. It is handed a
//! [`DonationSink`], the single capability it needs, so the staking ledger and
//! the escrow stay testable in isolation and the sink can be replaced by a mock.
//!
//! Routing is best effort: when there is no sink, or the sink rejects the
//! donation (project no longer active, milestone full, protocol paused), the
//! whole amount goes to the staker. A sink that accepts only part of the
//! donation sends the rest back to the staker as well.

use soroban_sdk::{log, Address, Env};

use crate::Error;

/// Basis-point denominator for `YieldSplit::donate_bps`.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Something that can take an internal donation of yield already held in
/// contract custody.
pub trait DonationSink {
    /// Credit up to `amount` on behalf of `donor`.
    ///
    /// Returns the amount actually accepted. On `Err` nothing was recorded.
    fn accept_donation(&self, env: &Env, donor: &Address, amount: i128) -> Result<i128, Error>;
}

/// Outcome of a split. `to_staker + to_project` always equals the claimed amount.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoutedYield {
    pub to_staker: i128,
    pub to_project: i128,
}

impl RoutedYield {
    fn all_to_staker(amount: i128) -> Self {
        RoutedYield {
            to_staker: amount,
            to_project: 0,
        }
    }
}

/// Share of `amount` a `donate_bps` split sends to the project (rounded down).
pub fn donation_share(amount: i128, donate_bps: u32) -> Result<i128, Error> {
    if donate_bps > BPS_DENOMINATOR {
        return Err(Error::InvalidSplit);
    }
    amount
        .checked_mul(donate_bps as i128)
        .map(|v| v / BPS_DENOMINATOR as i128)
        .ok_or(Error::Overflow)
}

/// Split `pending` yield of `staker` according to `donate_bps`.
pub fn split_yield<S: DonationSink>(
    env: &Env,
    staker: &Address,
    pending: i128,
    donate_bps: u32,
    sink: Option<&S>,
) -> Result<RoutedYield, Error> {
    let sink = match sink {
        Some(sink) if donate_bps > 0 => sink,
        _ => return Ok(RoutedYield::all_to_staker(pending)),
    };

    let share = donation_share(pending, donate_bps)?;
    if share == 0 {
        return Ok(RoutedYield::all_to_staker(pending));
    }

    match sink.accept_donation(env, staker, share) {
        Ok(accepted) => {
            let accepted = accepted.clamp(0, share);
            Ok(RoutedYield {
                to_staker: pending - accepted,
                to_project: accepted,
            })
        }
        Err(err) => {
            log!(env, "yield routing rejected, paying staker", staker.clone(), err as u32);
            Ok(RoutedYield::all_to_staker(pending))
        }
    }
}
