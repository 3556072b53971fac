// End-to-end token behaviour through the contract host.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::sync::Arc;

use tokenbook::runtime::ContractError;
use tokenbook::storage::{MemoryStorage, SledStorage, Storage};
use tokenbook::{AccountId, Amount, ContractHost, Token, TokenCall, TokenConfig, TokenError};

const BANK: &str = "bank";

fn id(s: &str) -> AccountId {
    AccountId::new(s)
}

fn amount(v: u64) -> Amount {
    Amount::from(v)
}

fn setup<S: Storage>(storage: S, supply: u64) -> (ContractHost<S>, Token) {
    let host = ContractHost::new(Arc::new(storage), BANK);
    let token = Token::new();
    let config = TokenConfig {
        supply: amount(supply),
        ..TokenConfig::default()
    };
    host.invoke(&token, &id(BANK), TokenCall::Customize(config)).unwrap();
    host.invoke(&token, &id(BANK), TokenCall::Initialize).unwrap();
    (host, token)
}

#[test]
fn test_bank_alice_bob_carol_scenario() {
    let (host, token) = setup(MemoryStorage::new(), 100);
    let storage = host.storage();

    assert_eq!(token.balance_of(storage, &id(BANK)).unwrap(), amount(100));

    host.invoke(
        &token,
        &id(BANK),
        TokenCall::Transfer {
            to: id("alice"),
            amount: amount(30),
        },
    )
    .unwrap();
    assert_eq!(token.balance_of(storage, &id(BANK)).unwrap(), amount(70));
    assert_eq!(token.balance_of(storage, &id("alice")).unwrap(), amount(30));

    host.invoke(
        &token,
        &id("alice"),
        TokenCall::Approve {
            spender: id("bob"),
            amount: amount(10),
        },
    )
    .unwrap();
    assert_eq!(token.allowance(storage, &id("alice"), &id("bob")).unwrap(), amount(10));

    host.invoke(
        &token,
        &id("bob"),
        TokenCall::TransferFrom {
            from: id("alice"),
            to: id("carol"),
            amount: amount(7),
        },
    )
    .unwrap();
    assert_eq!(token.balance_of(storage, &id("alice")).unwrap(), amount(23));
    assert_eq!(token.balance_of(storage, &id("carol")).unwrap(), amount(7));
    assert_eq!(token.allowance(storage, &id("alice"), &id("bob")).unwrap(), amount(3));

    let history = host
        .invoke(&token, &id("anyone"), TokenCall::RecentTransfers { limit: 10 })
        .unwrap();
    assert_eq!(
        history.value,
        json!([
            { "spender": "bob", "from": "alice", "to": "carol", "value": "7" },
            { "spender": "bank", "from": "bank", "to": "alice", "value": "30" },
            { "spender": "0x0", "from": "0x0", "to": "bank", "value": "100" },
        ])
    );
}

#[test]
fn test_random_transfers_conserve_supply() {
    let supply = 10_000u64;
    let (host, token) = setup(MemoryStorage::new(), supply);
    let storage = host.storage();
    let accounts = [BANK, "alice", "bob", "carol", "derek"];
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..300 {
        let from = accounts[rng.gen_range(0..accounts.len())];
        let to = accounts[rng.gen_range(0..accounts.len())];
        let value = amount(rng.gen_range(0..2_000));

        let call = if rng.gen_bool(0.3) {
            let spender = accounts[rng.gen_range(0..accounts.len())];
            if rng.gen_bool(0.5) {
                host.invoke(
                    &token,
                    &id(from),
                    TokenCall::Approve {
                        spender: id(spender),
                        amount: value,
                    },
                )
            } else {
                host.invoke(
                    &token,
                    &id(spender),
                    TokenCall::TransferFrom {
                        from: id(from),
                        to: id(to),
                        amount: value,
                    },
                )
            }
        } else {
            host.invoke(&token, &id(from), TokenCall::Transfer { to: id(to), amount: value })
        };

        if let Err(failure) = call {
            assert!(matches!(
                failure.error,
                ContractError::TokenError(
                    TokenError::InsufficientFunds { .. } | TokenError::Unauthorized { .. }
                )
            ));
        }

        let total = accounts
            .iter()
            .map(|a| token.balance_of(storage, &id(a)).unwrap().raw())
            .sum::<u128>();
        assert_eq!(total, supply as u128);
    }

    assert_eq!(token.total_supply(storage).unwrap(), amount(supply));
}

#[test]
fn test_rejected_calls_change_nothing() {
    let (host, token) = setup(MemoryStorage::new(), 100);
    let before = host.state_digest().unwrap();

    let attempts = vec![
        (id("mallory"), TokenCall::Initialize),
        (id(BANK), TokenCall::Initialize),
        (id(BANK), TokenCall::Customize(TokenConfig::default())),
        (
            id("alice"),
            TokenCall::Transfer {
                to: id("bob"),
                amount: amount(1),
            },
        ),
        (
            id(""),
            TokenCall::Transfer {
                to: id("bob"),
                amount: Amount::ZERO,
            },
        ),
        (
            id("bob"),
            TokenCall::TransferFrom {
                from: id(BANK),
                to: id("bob"),
                amount: amount(1),
            },
        ),
        (id("bob"), TokenCall::PopNewestApproval),
    ];

    for (signer, call) in attempts {
        assert!(host.invoke(&token, &signer, call).is_err());
        assert_eq!(host.state_digest().unwrap(), before);
    }
}

#[test]
fn test_state_survives_reopening_sled() {
    let dir = tempfile::tempdir().unwrap();

    {
        let (host, _token) = setup(SledStorage::new(dir.path()).unwrap(), 500);
        host.invoke_json(
            &Token::new(),
            &id(BANK),
            "transfer",
            Some(json!({ "to": "alice", "amount": "125" })),
        )
        .unwrap();
        host.storage().flush().unwrap();
    }

    let host = ContractHost::new(Arc::new(SledStorage::new(dir.path()).unwrap()), BANK);
    let token = Token::new();

    assert_eq!(token.balance_of(host.storage(), &id("alice")).unwrap(), amount(125));
    assert_eq!(token.total_supply(host.storage()).unwrap(), amount(500));

    let oldest = host
        .invoke(&token, &id(BANK), TokenCall::PopOldestTransfer)
        .unwrap();
    assert_eq!(oldest.value["from"], json!("0x0"));
    assert_eq!(token.ledger().transfer_count(host.storage()).unwrap(), 1);
}
