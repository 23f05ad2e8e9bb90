//! Account state the zap flows write back into
//!
//! After an approval the new allowance is recorded under the token's name.
//! After a zap-in the owner's bond position is re-read from chain.

use crate::chain::{contracts, ChainClient};
use crate::error::ZapResult;
use crate::zap::Bond;

use async_trait::async_trait;
use dashmap::DashMap;
use ethers::types::{Address, U256};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Everything needed to re-read one bond position after a zap
#[derive(Clone)]
pub struct RefreshRequest {
    pub address: Address,
    pub bond: Bond,
    pub network: u64,
    pub deposit: Address,
    pub client: Arc<dyn ChainClient>,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("address", &self.address)
            .field("bond", &self.bond.name)
            .field("network", &self.network)
            .field("deposit", &self.deposit)
            .finish()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountState: Send + Sync {
    fn update_allowance(&self, token: &str, allowance: U256);

    async fn refresh(&self, request: RefreshRequest) -> ZapResult<()>;
}

/// Owner's position in one bond
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BondAccount {
    /// Balance of the bond's reserve asset
    pub reserve_balance: U256,
    /// Payout claimable from the depository
    pub pending_payout: U256,
}

#[derive(Default)]
pub struct AccountStore {
    allowances: DashMap<String, U256>,
    bonds: DashMap<(u64, Address, String), BondAccount>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowance(&self, token: &str) -> Option<U256> {
        self.allowances.get(token).map(|a| *a)
    }

    pub fn bond(&self, network: u64, owner: Address, bond: &str) -> Option<BondAccount> {
        self.bonds
            .get(&(network, owner, bond.to_string()))
            .map(|b| *b)
    }
}

#[async_trait]
impl AccountState for AccountStore {
    fn update_allowance(&self, token: &str, allowance: U256) {
        debug!("Allowance for {} is now {}", token, allowance);
        self.allowances.insert(token.to_string(), allowance);
    }

    async fn refresh(&self, request: RefreshRequest) -> ZapResult<()> {
        let client = request.client.as_ref();
        let reserve = request.bond.reserve_address(request.network);

        let reserve_balance = async {
            match reserve {
                Some(token) => contracts::balance_of(client, token, request.address).await,
                None => Ok(U256::zero()),
            }
        };
        let pending_payout =
            contracts::pending_payout_for(client, request.deposit, request.address);

        let (reserve_balance, pending_payout) =
            futures::try_join!(reserve_balance, pending_payout)?;

        debug!(
            "Refreshed {} for {:?}: balance {}, pending payout {}",
            request.bond.name, request.address, reserve_balance, pending_payout
        );

        self.bonds.insert(
            (request.network, request.address, request.bond.name.clone()),
            BondAccount {
                reserve_balance,
                pending_payout,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use crate::zap::testing::{self, addr, uint, ReadTable, BOND_A, DEPOSITORY};
    use ethers::abi::Token as AbiToken;

    #[test]
    fn test_allowance_overwrites() {
        let store = AccountStore::new();
        assert_eq!(store.allowance("BUSD"), None);

        store.update_allowance("BUSD", U256::from(5));
        store.update_allowance("BUSD", U256::MAX);
        assert_eq!(store.allowance("BUSD"), Some(U256::MAX));
    }

    #[tokio::test]
    async fn test_refresh_reads_position() {
        let owner = Address::repeat_byte(0x42);
        let mut client = MockChainClient::new();
        ReadTable::default()
            .answer(BOND_A, "balanceOf(address)", &[uint(700)])
            .answer(
                DEPOSITORY,
                "pendingPayoutFor(address)",
                &[AbiToken::Uint(U256::exp10(18))],
            )
            .install(&mut client);

        let store = AccountStore::new();
        let bond = testing::bond_with_reserve(BOND_A);
        store
            .refresh(RefreshRequest {
                address: owner,
                bond: bond.clone(),
                network: 56,
                deposit: addr(DEPOSITORY),
                client: Arc::new(client),
            })
            .await
            .unwrap();

        assert_eq!(
            store.bond(56, owner, &bond.name),
            Some(BondAccount {
                reserve_balance: U256::from(700),
                pending_payout: U256::exp10(18),
            })
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_store_untouched() {
        let owner = Address::repeat_byte(0x42);
        let mut client = MockChainClient::new();
        ReadTable::default().install(&mut client);

        let store = AccountStore::new();
        let bond = testing::bond_with_reserve(BOND_A);
        let result = store
            .refresh(RefreshRequest {
                address: owner,
                bond: bond.clone(),
                network: 56,
                deposit: addr(DEPOSITORY),
                client: Arc::new(client),
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.bond(56, owner, &bond.name), None);
    }
}
