//! Vault — balance and allowance custody for the reference ledger
//!
//! Tracks balances by `(owner, asset)` and the allowance each owner has given
//! the exchange to move that asset. Settlement transfers are applied as one
//! batch: every transfer is checked against staged balances first, and
//! nothing is committed unless all of them succeed.
//!
//! An allowance of `Amount::MAX` is unlimited and never decremented.

use std::collections::HashMap;
use types::asset::AssetData;
use types::ids::Address;
use types::numeric::Amount;

use crate::errors::LedgerError;
use crate::events::{Approval, ContractEvent, Deposit, TransferApplied};
use crate::settlement::Transfer;

type Key = (Address, AssetData);

/// In-memory custody ledger.
#[derive(Debug, Default)]
pub struct Vault {
    balances: HashMap<Key, Amount>,
    allowances: HashMap<Key, Amount>,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Credit `amount` of `asset` to `owner` from outside the ledger.
    pub fn deposit(&mut self, owner: Address, asset: AssetData, amount: Amount) -> Result<ContractEvent, LedgerError> {
        let key = (owner, asset);
        let current = self.balances.get(&key).copied().unwrap_or(Amount::ZERO);
        let updated = current.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.balances.insert(key.clone(), updated);

        let event = ContractEvent::Deposit(Deposit {
            owner: key.0,
            asset: key.1,
            amount,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    // ───────────────────────── Allowances ─────────────────────────

    /// Replace the allowance `owner` grants the exchange for `asset`.
    pub fn set_allowance(&mut self, owner: Address, asset: AssetData, amount: Amount) -> ContractEvent {
        self.allowances.insert((owner, asset.clone()), amount);
        let event = ContractEvent::Approval(Approval { owner, asset, amount });
        self.events.push(event.clone());
        event
    }

    /// Allow the exchange to move any amount of `asset` for `owner`.
    pub fn set_unlimited_allowance(&mut self, owner: Address, asset: AssetData) -> ContractEvent {
        self.set_allowance(owner, asset, Amount::MAX)
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn balance_of(&self, owner: &Address, asset: &AssetData) -> Amount {
        self.balances
            .get(&(*owner, asset.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn allowance_of(&self, owner: &Address, asset: &AssetData) -> Amount {
        self.allowances
            .get(&(*owner, asset.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    // ───────────────────────── Transfers ─────────────────────────

    /// Apply `transfers` in order, all or nothing.
    ///
    /// On error the vault is unchanged and no events are recorded.
    pub fn apply_transfers(&mut self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut balances: HashMap<Key, Amount> = HashMap::new();
        let mut allowances: HashMap<Key, Amount> = HashMap::new();

        for transfer in transfers {
            let from = (transfer.from, transfer.asset.clone());
            let to = (transfer.to, transfer.asset.clone());

            let available = staged(&balances, &self.balances, &from);
            let remaining = available
                .checked_sub(transfer.amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    owner: transfer.from,
                    asset: transfer.asset.to_string(),
                    required: transfer.amount,
                    available,
                })?;

            let allowance = staged(&allowances, &self.allowances, &from);
            if allowance != Amount::MAX {
                let left = allowance
                    .checked_sub(transfer.amount)
                    .ok_or_else(|| LedgerError::InsufficientAllowance {
                        owner: transfer.from,
                        asset: transfer.asset.to_string(),
                        required: transfer.amount,
                        available: allowance,
                    })?;
                allowances.insert(from.clone(), left);
            }

            balances.insert(from, remaining);
            let credited = staged(&balances, &self.balances, &to)
                .checked_add(transfer.amount)
                .ok_or(LedgerError::Overflow)?;
            balances.insert(to, credited);
        }

        self.balances.extend(balances);
        self.allowances.extend(allowances);
        self.events.extend(transfers.iter().map(|t| {
            ContractEvent::Transfer(TransferApplied {
                from: t.from,
                to: t.to,
                asset: t.asset.clone(),
                amount: t.amount,
                kind: t.kind,
            })
        }));
        Ok(())
    }

    /// Sum of all balances held in `asset`.
    pub fn total_supply(&self, asset: &AssetData) -> Option<Amount> {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .try_fold(Amount::ZERO, |acc, (_, amount)| acc.checked_add(*amount))
    }

    // ───────────────────────── Events ─────────────────────────

    pub(crate) fn record(&mut self, event: ContractEvent) {
        self.events.push(event);
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }
}

fn staged(overlay: &HashMap<Key, Amount>, committed: &HashMap<Key, Amount>, key: &Key) -> Amount {
    overlay
        .get(key)
        .or_else(|| committed.get(key))
        .copied()
        .unwrap_or(Amount::ZERO)
}
