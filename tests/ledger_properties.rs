//! Ledger invariants under arbitrary operation sequences and concurrency
//!
//! - balances never go negative
//! - transfers conserve the total; deposits and withdrawals change it by
//!   exactly their amount
//! - concurrent deposits all land, opposite-direction transfers never deadlock

use bank_ledger::{BalanceEngine, EngineConfig, LedgerError};
use proptest::prelude::*;
use std::time::Duration;

const ACCOUNTS: [&str; 3] = ["A", "B", "C"];

async fn ledger(opening_balances: &[i64]) -> BalanceEngine {
    let engine = BalanceEngine::in_memory(EngineConfig::default());
    let user = engine.create_user("Ada", "Lovelace");
    for (number, balance) in ACCOUNTS.iter().zip(opening_balances) {
        let account = engine.open_account(user.id, number, number).await.unwrap();
        if *balance > 0 {
            engine.deposit(account.id, *balance).await.unwrap();
        }
    }
    engine
}

#[derive(Debug, Clone)]
enum Step {
    Deposit(usize, i64),
    Withdraw(usize, i64),
    Transfer(usize, usize, i64),
}

fn step() -> impl Strategy<Value = Step> {
    let account = 0..ACCOUNTS.len();
    let amount = -5i64..150;
    prop_oneof![
        (account.clone(), amount.clone()).prop_map(|(a, x)| Step::Deposit(a, x)),
        (account.clone(), amount.clone()).prop_map(|(a, x)| Step::Withdraw(a, x)),
        (account.clone(), account, amount).prop_map(|(a, b, x)| Step::Transfer(a, b, x)),
    ]
}

/// Reference model: what a correct ledger does with one step, sequentially
fn apply_to_model(model: &mut [i64], step: &Step) -> bool {
    match *step {
        Step::Deposit(a, amount) => {
            if amount <= 0 {
                return false;
            }
            model[a] += amount;
            true
        }
        Step::Withdraw(a, amount) => {
            if amount <= 0 || model[a] < amount {
                return false;
            }
            model[a] -= amount;
            true
        }
        Step::Transfer(from, to, amount) => {
            if amount <= 0 || from == to || model[from] < amount {
                return false;
            }
            model[from] -= amount;
            model[to] += amount;
            true
        }
    }
}

async fn apply_to_engine(engine: &BalanceEngine, step: &Step) -> Result<(), LedgerError> {
    let id = |index: usize| index as u64 + 1;
    match *step {
        Step::Deposit(a, amount) => engine.deposit(id(a), amount).await.map(|_| ()),
        Step::Withdraw(a, amount) => engine.withdraw(id(a), amount).await.map(|_| ()),
        Step::Transfer(from, to, amount) => engine
            .transfer(ACCOUNTS[from], ACCOUNTS[to], amount)
            .await
            .map(|_| ()),
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    /// Every step agrees with the reference model; balances stay non-negative
    #[test]
    fn prop_sequential_steps_match_model(
        opening in proptest::collection::vec(0i64..200, 3),
        steps in proptest::collection::vec(step(), 1..60),
    ) {
        let rt = runtime();
        let engine = rt.block_on(ledger(&opening));
        let mut model = opening.clone();

        for step in &steps {
            let before = engine.total_balance().unwrap();
            let accepted = apply_to_model(&mut model, step);
            let result = rt.block_on(apply_to_engine(&engine, step));

            prop_assert_eq!(result.is_ok(), accepted, "step {:?} gave {:?}", step, result);

            let after = engine.total_balance().unwrap();
            let expected_delta = match (step, accepted) {
                (Step::Deposit(_, amount), true) => *amount as i128,
                (Step::Withdraw(_, amount), true) => -(*amount as i128),
                _ => 0,
            };
            prop_assert_eq!(after - before, expected_delta);

            for account in engine.accounts().unwrap() {
                prop_assert!(account.balance >= 0);
            }
        }

        let balances: Vec<i64> = engine.accounts().unwrap().iter().map(|a| a.balance).collect();
        prop_assert_eq!(balances, model);
    }

    /// A rejected withdrawal can be repeated without changing anything
    #[test]
    fn prop_insufficient_funds_is_idempotent(balance in 0i64..1_000, excess in 1i64..1_000) {
        let rt = runtime();
        let engine = rt.block_on(ledger(&[balance, 0, 0]));

        for _ in 0..3 {
            let error = rt.block_on(engine.withdraw(1, balance + excess)).unwrap_err();
            let is_insufficient = matches!(error, LedgerError::InsufficientFunds { .. });
            prop_assert!(is_insufficient);
            prop_assert_eq!(engine.account(1).unwrap().balance, balance);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_deposits_all_land() {
    let engine = ledger(&[50, 0, 0]).await;

    let tasks: Vec<_> = (0..200)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.deposit(1, 7).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(engine.account(1).unwrap().balance, 50 + 200 * 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_opposite_direction_transfers_never_deadlock() {
    let engine = ledger(&[10_000, 10_000, 0]).await;

    let tasks: Vec<_> = (0..400)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    engine.transfer("A", "B", 3).await
                } else {
                    engine.transfer("B", "A", 2).await
                }
            })
        })
        .collect();

    let all = async {
        for task in tasks {
            task.await.unwrap().unwrap();
        }
    };
    tokio::time::timeout(Duration::from_secs(30), all)
        .await
        .expect("transfers deadlocked");

    // 200 transfers of 3 one way, 200 of 2 the other
    assert_eq!(engine.account(1).unwrap().balance, 10_000 - 600 + 400);
    assert_eq!(engine.account(2).unwrap().balance, 10_000 + 600 - 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_mixed_operations_keep_invariants() {
    let engine = ledger(&[300, 300, 300]).await;

    let tasks: Vec<_> = (0..300usize)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let from = ACCOUNTS[i % 3];
                let to = ACCOUNTS[(i + 1) % 3];
                match i % 4 {
                    0 => engine.deposit((i % 3) as u64 + 1, 5).await.map(|_| 5i128),
                    1 => engine.withdraw((i % 3) as u64 + 1, 40).await.map(|_| -40i128),
                    _ => engine.transfer(from, to, 25).await.map(|_| 0i128),
                }
            })
        })
        .collect();

    let mut expected_total: i128 = 900;
    for task in tasks {
        match task.await.unwrap() {
            Ok(delta) => expected_total += delta,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(engine.total_balance().unwrap(), expected_total);
    for account in engine.accounts().unwrap() {
        assert!(account.balance >= 0, "negative balance: {:?}", account);
    }
}

#[tokio::test]
async fn test_balance_scenarios() {
    let engine = ledger(&[100, 50, 0]).await;

    // Overdraft is refused and leaves the balance alone
    let error = engine.withdraw(1, 150).await.unwrap_err();
    assert!(matches!(error, LedgerError::InsufficientFunds { .. }));
    assert_eq!(engine.account(1).unwrap().balance, 100);

    let receipt = engine.transfer("A", "B", 30).await.unwrap();
    assert_eq!(receipt.from.balance, 70);
    assert_eq!(receipt.to.balance, 80);

    let error = engine.transfer("A", "B", 0).await.unwrap_err();
    assert!(matches!(error, LedgerError::InvalidAmount { .. }));

    let error = engine.transfer("missing", "B", 5).await.unwrap_err();
    assert!(matches!(error, LedgerError::NotFound { .. }));
    assert_eq!(engine.account(2).unwrap().balance, 80);
}
