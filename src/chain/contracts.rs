//! Contract call helpers for the ERC-20, AMM pair/factory/router, zapper and
//! bond depository contracts the zapper touches.
//!
//! Calldata is built from human-readable ABI fragments and sent through
//! `ChainClient::call`, so any client (real node or mock) can serve reads.

use super::ChainClient;
use crate::error::{ZapError, ZapResult};

use ethers::abi::{parse_abi, Detokenize, Tokenize};
use ethers::contract::BaseContract;
use ethers::types::{Address, Bytes, U256};
use lazy_static::lazy_static;

fn human_abi(fragments: &[&str]) -> BaseContract {
    BaseContract::from(parse_abi(fragments).expect("static ABI fragments parse"))
}

lazy_static! {
    static ref ERC20: BaseContract = human_abi(&[
        "function approve(address spender, uint256 amount) returns (bool)",
        "function allowance(address owner, address spender) view returns (uint256)",
        "function balanceOf(address owner) view returns (uint256)",
    ]);

    static ref PAIR: BaseContract = human_abi(&[
        "function token0() view returns (address)",
        "function token1() view returns (address)",
        "function getReserves() view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)",
        "function totalSupply() view returns (uint256)",
    ]);

    static ref FACTORY: BaseContract = human_abi(&[
        "function getPair(address tokenA, address tokenB) view returns (address pair)",
    ]);

    static ref ROUTER: BaseContract = human_abi(&[
        "function getAmountsOut(uint256 amountIn, address[] path) view returns (uint256[] amounts)",
    ]);

    static ref ZAPPER: BaseContract = human_abi(&[
        "function Zapin(address _from, uint256 amount, address[] path, address[] path1, address[] path2, uint256 version, uint256 deadline)",
    ]);

    static ref BOND_DEPOSITORY: BaseContract = human_abi(&[
        "function pendingPayoutFor(address depositor) view returns (uint256)",
    ]);
}

fn encode<T: Tokenize>(contract: &BaseContract, name: &str, args: T) -> ZapResult<Bytes> {
    contract
        .encode(name, args)
        .map_err(|e| ZapError::Contract(format!("encode {}: {}", name, e)))
}

async fn read<T: Tokenize, D: Detokenize>(
    client: &dyn ChainClient,
    contract: &BaseContract,
    to: Address,
    name: &str,
    args: T,
) -> ZapResult<D> {
    let data = encode(contract, name, args)?;
    let output = client.call(to, data).await?;
    contract
        .decode_output(name, output)
        .map_err(|e| ZapError::Contract(format!("decode {} from {:?}: {}", name, to, e)))
}

/// `approve(spender, amount)` calldata
pub fn approve_calldata(spender: Address, amount: U256) -> ZapResult<Bytes> {
    encode(&ERC20, "approve", (spender, amount))
}

pub async fn allowance(
    client: &dyn ChainClient,
    token: Address,
    owner: Address,
    spender: Address,
) -> ZapResult<U256> {
    read(client, &ERC20, token, "allowance", (owner, spender)).await
}

pub async fn balance_of(client: &dyn ChainClient, token: Address, owner: Address) -> ZapResult<U256> {
    read(client, &ERC20, token, "balanceOf", owner).await
}

pub async fn get_pair(
    client: &dyn ChainClient,
    factory: Address,
    token_a: Address,
    token_b: Address,
) -> ZapResult<Address> {
    read(client, &FACTORY, factory, "getPair", (token_a, token_b)).await
}

pub async fn token0(client: &dyn ChainClient, pair: Address) -> ZapResult<Address> {
    read(client, &PAIR, pair, "token0", ()).await
}

pub async fn token1(client: &dyn ChainClient, pair: Address) -> ZapResult<Address> {
    read(client, &PAIR, pair, "token1", ()).await
}

/// `(reserve0, reserve1)`; the block timestamp is dropped
pub async fn get_reserves(client: &dyn ChainClient, pair: Address) -> ZapResult<(U256, U256)> {
    let (reserve0, reserve1, _): (U256, U256, u32) =
        read(client, &PAIR, pair, "getReserves", ()).await?;
    Ok((reserve0, reserve1))
}

pub async fn total_supply(client: &dyn ChainClient, pair: Address) -> ZapResult<U256> {
    read(client, &PAIR, pair, "totalSupply", ()).await
}

pub async fn get_amounts_out(
    client: &dyn ChainClient,
    router: Address,
    amount_in: U256,
    path: Vec<Address>,
) -> ZapResult<Vec<U256>> {
    read(client, &ROUTER, router, "getAmountsOut", (amount_in, path)).await
}

pub async fn pending_payout_for(
    client: &dyn ChainClient,
    depository: Address,
    depositor: Address,
) -> ZapResult<U256> {
    read(client, &BOND_DEPOSITORY, depository, "pendingPayoutFor", depositor).await
}

/// Arguments of the zapper's `Zapin` entry point
#[derive(Debug, Clone, PartialEq)]
pub struct ZapinCall {
    pub from_token: Address,
    pub amount: U256,
    pub path: Vec<Address>,
    pub hop1: Vec<Address>,
    pub hop2: Vec<Address>,
    pub version: u64,
    pub deadline: u64,
}

impl ZapinCall {
    pub fn calldata(&self) -> ZapResult<Bytes> {
        encode(
            &ZAPPER,
            "Zapin",
            (
                self.from_token,
                self.amount,
                self.path.clone(),
                self.hop1.clone(),
                self.hop2.clone(),
                U256::from(self.version),
                U256::from(self.deadline),
            ),
        )
    }
}
