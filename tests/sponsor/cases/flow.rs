use crate::environment::*;
use alloy::primitives::U256;
use gas_sponsor::{
    orchestrator::StepOutcome,
    types::{PriceSource, Step},
};

#[tokio::test]
async fn full_run_from_undelegated_account() {
    let env = Environment::new();
    let session = env.open().await;

    let run = session.run();
    assert_eq!(run.step, Step::AwaitDelegation);
    assert_eq!(run.nonce, INITIAL_NONCE);

    // step 1
    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitDelegation, to: Step::AwaitSignature }
    );
    assert!(env.chain.lock().installed);
    assert_eq!(session.run().nonce, INITIAL_NONCE + 1);

    // step 2
    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitSignature, to: Step::AwaitFeePayment }
    );
    assert!(session.run().signature.is_some());

    // step 3, nothing deposited yet
    let StepOutcome::InsufficientFunds { required, available, quote } =
        session.advance().await.unwrap()
    else {
        panic!("expected insufficient funds");
    };
    assert_eq!(required, U256::from(REQUIRED));
    assert_eq!(available, U256::ZERO);
    assert_eq!(quote.fee_stable_units, "0.22");
    assert_eq!(session.run().step, Step::AwaitFeePayment);
    assert_eq!(env.chain.lock().debit_calls, 0);

    // top up through the external deposit flow
    env.deposit(1_000_000);
    assert_eq!(session.available_balance().await.unwrap(), U256::from(1_000_000));

    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitFeePayment, to: Step::AwaitSubmission }
    );
    assert_eq!(env.chain.lock().balance, U256::from(1_000_000 - REQUIRED));
    assert_eq!(env.chain.lock().debit_calls, 1);

    // step 4
    assert!(matches!(session.advance().await.unwrap(), StepOutcome::Completed { .. }));
    let run = session.run();
    assert!(run.completed);
    assert!(!run.processing);

    let chain = env.chain.lock();
    assert_eq!(chain.submit_calls, 1);
    assert_eq!(chain.submitted_nonces, vec![INITIAL_NONCE + 1]);
    assert_eq!(chain.install_calls, 1);
}

#[tokio::test]
async fn completed_run_does_nothing() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    env.deposit(REQUIRED);
    let session = env.open().await;

    for _ in 0..2 {
        session.advance().await.unwrap();
    }
    assert!(matches!(session.advance().await.unwrap(), StepOutcome::Completed { .. }));

    assert_eq!(session.advance().await.unwrap(), StepOutcome::AlreadyCompleted);
    let chain = env.chain.lock();
    assert_eq!(chain.submit_calls, 1);
    assert_eq!(chain.debit_calls, 1);
    assert_eq!(chain.balance, U256::ZERO);
}

#[tokio::test]
async fn delegated_account_starts_at_signature() {
    let env = Environment::new();
    env.chain.lock().installed = true;

    let session = env.open().await;
    assert_eq!(session.run().step, Step::AwaitSignature);
    assert_eq!(session.run().nonce, INITIAL_NONCE);

    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitSignature, to: Step::AwaitFeePayment }
    );
    assert_eq!(env.chain.lock().install_calls, 0);
}

#[tokio::test]
async fn delegation_installed_after_open_is_skipped() {
    let env = Environment::new();
    let session = env.open().await;
    assert_eq!(session.run().step, Step::AwaitDelegation);

    // installed out of band, e.g. by an earlier attempt that timed out
    {
        let mut chain = env.chain.lock();
        chain.installed = true;
        chain.nonce += 1;
    }

    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitDelegation, to: Step::AwaitSignature }
    );
    assert_eq!(env.chain.lock().install_calls, 0);
    assert_eq!(session.run().nonce, INITIAL_NONCE + 1);
}

#[tokio::test]
async fn zero_fee_skips_debit() {
    let env = Environment::with_gas_price(0);
    env.chain.lock().installed = true;
    let session = env.open().await;

    session.advance().await.unwrap();
    assert_eq!(
        session.advance().await.unwrap(),
        StepOutcome::Advanced { from: Step::AwaitFeePayment, to: Step::AwaitSubmission }
    );

    let chain = env.chain.lock();
    assert_eq!(chain.debit_calls, 0);
    assert_eq!(chain.balance_reads, 0);
}

#[tokio::test]
async fn unavailable_price_feed_uses_fallback() {
    let env = Environment::with_price(None);
    env.chain.lock().installed = true;
    let session = env.open().await;

    session.advance().await.unwrap();
    let StepOutcome::InsufficientFunds { required, quote, .. } = session.advance().await.unwrap()
    else {
        panic!("expected insufficient funds");
    };

    assert_eq!(quote.price_source, PriceSource::Fallback);
    assert_eq!(required, U256::from(REQUIRED));
    assert_eq!(session.run().fee_quote, Some(quote));
}

#[tokio::test]
async fn quote_is_computed_once_per_run() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    let session = env.open().await;

    session.advance().await.unwrap();
    let StepOutcome::InsufficientFunds { quote: first, .. } = session.advance().await.unwrap()
    else {
        panic!("expected insufficient funds");
    };
    let StepOutcome::InsufficientFunds { quote: second, .. } = session.advance().await.unwrap()
    else {
        panic!("expected insufficient funds");
    };

    assert_eq!(first, second);
    assert_eq!(env.chain.lock().balance_reads, 2);
}

#[tokio::test]
async fn reset_opens_a_new_run() {
    let env = Environment::new();
    env.chain.lock().installed = true;
    let session = env.open().await;
    session.advance().await.unwrap();
    assert!(session.run().signature.is_some());

    let mut call = Environment::call();
    call.value = U256::from(1);
    session.reset(call.clone()).await.unwrap();

    let run = session.run();
    assert_eq!(run.call, call);
    assert_eq!(run.step, Step::AwaitSignature);
    assert!(run.signature.is_none());
    assert!(run.fee_quote.is_none());
}

#[tokio::test]
async fn close_returns_the_run() {
    let env = Environment::new();
    let session = env.open().await;
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    assert!(matches!(
        session.advance().await.unwrap(),
        StepOutcome::InsufficientFunds { .. }
    ));
    assert!(session.run().signature.is_some());
    assert!(session.run().fee_quote.is_some());

    let run = session.close();
    assert_eq!(run.step, Step::AwaitFeePayment);
    assert!(!run.processing);
    assert!(run.signature.is_none());
    assert!(run.fee_quote.is_none());
    // on-chain effects stay
    assert!(env.chain.lock().installed);
    assert_eq!(env.chain.lock().debit_calls, 0);
}
