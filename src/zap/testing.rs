//! Shared fixtures for the zap module's tests

use super::types::{Bond, Token};
use crate::chain::MockChainClient;
use crate::config::{Settings, DEFAULT_CONFIG};
use crate::error::ClientError;

use ethers::abi::{encode, Token as AbiToken};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;
use std::collections::HashMap;

pub const WBNB: &str = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";
pub const ASSET_A: &str = "0x44b3efa6c6ca47badb3197b0ab675e4396e40023";
pub const ASSET_B: &str = "0x6aa5927e752b54bb4809d616a52af52b650fc731";
pub const BOND_A: &str = "0xd8d18a4045adadec926e0a3c289e22850993ca7b";
pub const BOND_B: &str = "0xcc6a01db54d19e07626bae15dcf870107fbb7d0e";
pub const BOND_C: &str = "0x27b56c126bff4c7f952746557752d8de28bca7ec";
pub const ZAPPER: &str = "0x83896c22ff6616C33b51e9DD0cf0B8032624c3c6";
pub const FACTORY: &str = "0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73";
pub const ROUTER: &str = "0xad02320a81606fbB760C32e065495A8ddbf322A8";
pub const BUSD: &str = "0xe9e7cea3dedca5984780bafc599bd69add087d56";
pub const DEPOSITORY: &str = "0x00000000000000000000000000000000000000d0";
pub const INPUT_PAIR: &str = "0x00000000000000000000000000000000000000a1";

pub fn addr(s: &str) -> Address {
    s.parse().expect("fixture address")
}

/// Shipped config with settle delays removed
pub fn settings() -> Settings {
    let mut settings = Settings::from_toml_str(DEFAULT_CONFIG).expect("default config");
    settings.zap.approval_settle_ms = 0;
    settings.zap.refresh_settle_ms = 0;
    settings
}

pub fn busd() -> Token {
    Token {
        address: addr(BUSD),
        name: "BUSD".into(),
        symbol: "BUSD".into(),
        decimals: 18,
    }
}

pub fn bond_with_reserve(reserve: &str) -> Bond {
    Bond::new("UFX-BNB", true).with_network(56, addr(reserve), addr(DEPOSITORY))
}

pub fn uint(v: u64) -> AbiToken {
    AbiToken::Uint(U256::from(v))
}

/// Canned `eth_call` answers keyed by contract and selector
#[derive(Default, Clone)]
pub struct ReadTable {
    answers: HashMap<(Address, [u8; 4]), Bytes>,
    exact: HashMap<(Address, Bytes), Bytes>,
}

impl ReadTable {
    pub fn answer(mut self, to: &str, signature: &str, tokens: &[AbiToken]) -> Self {
        self.answers
            .insert((addr(to), id(signature)), encode(tokens).into());
        self
    }

    /// Answer only a call whose calldata matches exactly
    pub fn answer_exact(mut self, to: &str, calldata: Bytes, tokens: &[AbiToken]) -> Self {
        self.exact.insert((addr(to), calldata), encode(tokens).into());
        self
    }

    /// Input pair for `(WBNB, BUSD)` with the given reserves
    pub fn input_pair(self, reserve0: u64, reserve1: u64) -> Self {
        self.answer(
            FACTORY,
            "getPair(address,address)",
            &[AbiToken::Address(addr(INPUT_PAIR))],
        )
        .answer(INPUT_PAIR, "token0()", &[AbiToken::Address(addr(WBNB))])
        .answer(INPUT_PAIR, "token1()", &[AbiToken::Address(addr(BUSD))])
        .answer(
            INPUT_PAIR,
            "getReserves()",
            &[uint(reserve0), uint(reserve1), uint(0)],
        )
    }

    /// Bond reserve pool state
    pub fn bond_pool(
        self,
        pool: &str,
        token0: &str,
        token1: &str,
        reserves: (u64, u64),
        total_supply: u64,
    ) -> Self {
        self.answer(pool, "token0()", &[AbiToken::Address(addr(token0))])
            .answer(pool, "token1()", &[AbiToken::Address(addr(token1))])
            .answer(
                pool,
                "getReserves()",
                &[uint(reserves.0), uint(reserves.1), uint(0)],
            )
            .answer(pool, "totalSupply()", &[uint(total_supply)])
    }

    pub fn install(self, client: &mut MockChainClient) {
        client.expect_call().returning(move |to, data| {
            if let Some(answer) = self.exact.get(&(to, data.clone())) {
                return Ok(answer.clone());
            }
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&data[..4]);
            self.answers
                .get(&(to, selector))
                .cloned()
                .ok_or_else(|| ClientError::Rpc {
                    code: Some(-32000),
                    message: format!("execution reverted: no answer for {:?}", to),
                })
        });
    }
}
