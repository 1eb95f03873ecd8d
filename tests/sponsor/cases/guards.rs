use crate::environment::*;
use alloy::primitives::U256;
use gas_sponsor::{orchestrator::StepOutcome, types::Step};
use std::sync::Arc;

async fn wait_for_signature_request(wallet: &Wallet, count: u32) {
    while wallet.requests() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn insufficient_balance_never_debits() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    env.deposit(REQUIRED - 1);
    let session = env.open().await;
    session.advance().await.unwrap();

    for _ in 0..3 {
        let outcome = session.advance().await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::InsufficientFunds {
                required: U256::from(REQUIRED),
                available: U256::from(REQUIRED - 1),
                quote: session.run().fee_quote.unwrap(),
            }
        );
    }

    let chain = env.chain.lock();
    assert_eq!(chain.debit_calls, 0);
    assert_eq!(chain.balance, U256::from(REQUIRED - 1));
}

#[tokio::test]
async fn exact_balance_is_enough() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    env.deposit(REQUIRED);
    let session = env.open().await;
    session.advance().await.unwrap();

    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitFeePayment, to: Step::AwaitSubmission }
    );
    assert_eq!(env.chain.lock().balance, U256::ZERO);
}

#[tokio::test]
async fn concurrent_advance_is_rejected() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    let session = Arc::new(env.open().await);

    env.wallet.hold();
    let first = tokio::spawn({
        let session = session.clone();
        async move { session.advance().await }
    });
    wait_for_signature_request(&env.wallet, 1).await;
    assert!(session.run().processing);

    assert_eq!(session.advance().await.unwrap(), StepOutcome::Busy);
    assert_eq!(session.advance().await.unwrap(), StepOutcome::Busy);

    env.wallet.release();
    assert_eq!(
        first.await.unwrap().unwrap(),
        StepOutcome::Advanced { from: Step::AwaitSignature, to: Step::AwaitFeePayment }
    );
    assert_eq!(env.wallet.requests(), 1);
    assert!(!session.run().processing);
}

#[tokio::test]
async fn dropped_advance_leaves_run_in_place() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    let session = env.open().await;

    env.wallet.hold();
    tokio::select! {
        biased;
        _ = session.advance() => panic!("signature request should be pending"),
        _ = wait_for_signature_request(&env.wallet, 1) => {}
    }

    let run = session.run();
    assert!(!run.processing);
    assert_eq!(run.step, Step::AwaitSignature);
    assert!(run.signature.is_none());

    env.wallet.release();
    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitSignature, to: Step::AwaitFeePayment }
    );
}

#[tokio::test]
async fn reset_discards_in_flight_step() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    let session = Arc::new(env.open().await);

    env.wallet.hold();
    let in_flight = tokio::spawn({
        let session = session.clone();
        async move { session.advance().await }
    });
    wait_for_signature_request(&env.wallet, 1).await;

    session.reset(Environment::call()).await.unwrap();
    // the reset run stays busy while the old step is outstanding
    assert!(session.run().processing);
    assert_eq!(session.advance().await.unwrap(), StepOutcome::Busy);
    assert_eq!(env.wallet.requests(), 1);

    env.wallet.release();
    in_flight.await.unwrap().unwrap();

    let run = session.run();
    assert_eq!(run.step, Step::AwaitSignature);
    assert!(run.signature.is_none());
    assert!(!run.processing);

    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitSignature, to: Step::AwaitFeePayment }
    );
}
