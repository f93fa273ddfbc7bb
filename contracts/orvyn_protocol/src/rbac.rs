//! # RBAC — Role-Based Access Control
//!
//! Role hierarchy used by Orvyn:
//!
//! ```text
//! SuperAdmin
//!     ├── Admin        (lock period, pause, role grants)
//!     ├── Distributor  (deposits yield via `distribute`)
//!     ├── Allocator    (grants funding-pool money to projects)
//!     └── Researcher   (opens milestone projects)
//! ```
//!
//! Per-project authority (submitting proofs, cancelling) is not a role: it is
//! bound to the `researcher` address stored in each project's config.
//!
//! ## Storage layout
//!
//! - `RbacKey::SuperAdmin` → `Address`  — the one and only super-admin.
//! - `RbacKey::Role(addr)` → `Role`     — the role held by `addr`, if any.
//!
//! ## Event emissions
//!
//! | Event topic prefix | Trigger |
//! |--------------------|---------|
//! | `role_set`         | Role granted or replaced |
//! | `role_del`         | Role revoked |
//!
//! An address holds **at most one role** at a time; granting a new role
//! replaces the old one. `SuperAdmin` can only change hands through
//! `transfer_super_admin`.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::storage;
use crate::Error;

/// The set of roles that can be assigned to an address.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    /// Full protocol control; the only role that can grant `SuperAdmin`.
    SuperAdmin,
    /// Grants/revokes non-SuperAdmin roles, sets the lock period, pauses.
    Admin,
    /// May call `distribute` to deposit yield into the reward index.
    Distributor,
    /// May call `allocate_to_project`.
    Allocator,
    /// May call `create_project`.
    Researcher,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    Role(Address),
    SuperAdmin,
}

fn store_role(env: &Env, address: &Address, role: &Role) {
    env.storage()
        .persistent()
        .set(&RbacKey::Role(address.clone()), role);
}

fn clear_role(env: &Env, address: &Address) {
    env.storage()
        .persistent()
        .remove(&RbacKey::Role(address.clone()));
}

/// Read the role for `address`, returning `None` if unassigned.
pub fn get_role(env: &Env, address: &Address) -> Option<Role> {
    env.storage()
        .persistent()
        .get(&RbacKey::Role(address.clone()))
}

pub fn get_super_admin(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&RbacKey::SuperAdmin)
}

// ─────────────────────────────────────────────────────────
// Initialisation
// ─────────────────────────────────────────────────────────

/// Set the initial SuperAdmin. Fails with `AlreadyInitialized` on a second call.
pub fn init_super_admin(env: &Env, super_admin: &Address) -> Result<(), Error> {
    if env.storage().persistent().has(&RbacKey::SuperAdmin) {
        return Err(Error::AlreadyInitialized);
    }
    env.storage()
        .persistent()
        .set(&RbacKey::SuperAdmin, super_admin);
    store_role(env, super_admin, &Role::SuperAdmin);
    emit_set(env, super_admin, &Role::SuperAdmin, None);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Role assignment
// ─────────────────────────────────────────────────────────

/// Grant `role` to `target`.
///
/// - `caller` must hold `SuperAdmin` or `Admin`; only `SuperAdmin` may grant
///   `SuperAdmin`.
/// - The SuperAdmin address cannot be demoted through this path.
pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    match role {
        Role::SuperAdmin => require_role(env, caller, &Role::SuperAdmin)?,
        _ => require_admin_or_above(env, caller)?,
    }

    if let Some(Role::SuperAdmin) = get_role(env, target) {
        if role != Role::SuperAdmin {
            return Err(Error::NotAuthorized);
        }
    }

    store_role(env, target, &role);
    emit_set(env, target, &role, Some(caller.clone()));
    Ok(())
}

/// Revoke any role from `target`. Revoking from an address with no role is a
/// no-op; the SuperAdmin cannot be revoked.
pub fn revoke_role(env: &Env, caller: &Address, target: &Address) -> Result<(), Error> {
    require_admin_or_above(env, caller)?;

    if get_super_admin(env).as_ref() == Some(target) {
        return Err(Error::NotAuthorized);
    }

    if get_role(env, target).is_some() {
        clear_role(env, target);
        emit_revoke(env, target, Some(caller.clone()));
    }
    Ok(())
}

/// Hand the SuperAdmin role from `current` to `new`.
pub fn transfer_super_admin(env: &Env, current: &Address, new: &Address) -> Result<(), Error> {
    require_role(env, current, &Role::SuperAdmin)?;

    clear_role(env, current);
    emit_revoke(env, current, Some(current.clone()));

    env.storage().persistent().set(&RbacKey::SuperAdmin, new);
    store_role(env, new, &Role::SuperAdmin);
    emit_set(env, new, &Role::SuperAdmin, Some(current.clone()));
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Access guards
// ─────────────────────────────────────────────────────────

/// Fails with `NotAuthorized` unless `address` holds exactly `required_role`.
pub fn require_role(env: &Env, address: &Address, required_role: &Role) -> Result<(), Error> {
    match get_role(env, address) {
        Some(ref r) if r == required_role => Ok(()),
        _ => Err(Error::NotAuthorized),
    }
}

/// Fails with `NotAuthorized` unless `address` holds one of `allowed`.
pub fn require_any_of(env: &Env, address: &Address, allowed: &[Role]) -> Result<(), Error> {
    match get_role(env, address) {
        Some(ref r) if allowed.contains(r) => Ok(()),
        _ => Err(Error::NotAuthorized),
    }
}

#[inline]
pub fn require_admin_or_above(env: &Env, address: &Address) -> Result<(), Error> {
    require_any_of(env, address, &[Role::SuperAdmin, Role::Admin])
}

/// Gate for `distribute`.
#[inline]
pub fn require_distributor(env: &Env, address: &Address) -> Result<(), Error> {
    require_any_of(
        env,
        address,
        &[Role::SuperAdmin, Role::Admin, Role::Distributor],
    )
}

/// Gate for `allocate_to_project`.
#[inline]
pub fn require_allocator(env: &Env, address: &Address) -> Result<(), Error> {
    require_any_of(
        env,
        address,
        &[Role::SuperAdmin, Role::Admin, Role::Allocator],
    )
}

/// Gate for `create_project`.
#[inline]
pub fn require_can_create_project(env: &Env, address: &Address) -> Result<(), Error> {
    require_any_of(
        env,
        address,
        &[Role::SuperAdmin, Role::Admin, Role::Researcher],
    )
}

// ─────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────

pub fn role_of(env: &Env, address: Address) -> Option<Role> {
    get_role(env, &address)
}

pub fn has_role(env: &Env, address: Address, role: Role) -> bool {
    get_role(env, &address).map(|r| r == role).unwrap_or(false)
}

// ─────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────

/// Payload of `role_set` / `role_del`; `by` is `None` only for the initial
/// SuperAdmin.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleChanged {
    pub by: Option<Address>,
    pub seq: u64,
    pub ledger: u32,
}

fn role_changed(env: &Env, by: Option<Address>) -> RoleChanged {
    RoleChanged {
        by,
        seq: storage::next_event_seq(env),
        ledger: env.ledger().sequence(),
    }
}

/// Topic: `(role_set, target, role_symbol)`.
fn emit_set(env: &Env, target: &Address, role: &Role, by: Option<Address>) {
    env.events().publish(
        (symbol_short!("role_set"), target.clone(), role_symbol(role)),
        role_changed(env, by),
    );
}

fn emit_revoke(env: &Env, target: &Address, by: Option<Address>) {
    env.events().publish(
        (symbol_short!("role_del"), target.clone()),
        role_changed(env, by),
    );
}

fn role_symbol(role: &Role) -> Symbol {
    match role {
        Role::SuperAdmin => symbol_short!("supadmin"),
        Role::Admin => symbol_short!("admin"),
        Role::Distributor => symbol_short!("distrib"),
        Role::Allocator => symbol_short!("allocator"),
        Role::Researcher => symbol_short!("research"),
    }
}
