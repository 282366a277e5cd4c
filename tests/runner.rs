//! Transaction runner tests against the in-memory submitter
//!
//! Run with: cargo test --test runner

mod common;

use alloy::primitives::{keccak256, Address, U256};
use common::{MockSubmitter, Outcome, DEPLOYER};
use deployer::demo::{BANK_UNIT, DEFAULT_DEMO_RECIPIENT, TOKEN_UNIT};
use deployer::{
    demo_steps, ArgValue, DemoConfig, DeployError, DeployedHandle, DeploymentSession, LinkError,
    TransactionError, TransactionRunner, TransactionStep,
};

const TOKEN: Address = Address::repeat_byte(0x11);
const BANK: Address = Address::repeat_byte(0x22);

fn session() -> DeploymentSession {
    let mut session = DeploymentSession::new(214);
    for (name, address) in [(TOKEN_UNIT, TOKEN), (BANK_UNIT, BANK)] {
        session
            .record(DeployedHandle {
                name: name.to_string(),
                address,
                tx_hash: None,
            })
            .unwrap();
    }
    session
}

fn three_steps() -> Vec<TransactionStep> {
    vec![
        TransactionStep::new(
            "step 1",
            TOKEN_UNIT,
            "approve(address,uint256)",
            vec![ArgValue::unit(BANK_UNIT), ArgValue::Uint(U256::from(10u64))],
        ),
        TransactionStep::new(
            "step 2",
            BANK_UNIT,
            "deposit(address,uint256,address)",
            vec![
                ArgValue::unit(TOKEN_UNIT),
                ArgValue::Uint(U256::from(5u64)),
                ArgValue::Deployer,
            ],
        ),
        TransactionStep::new(
            "step 3",
            BANK_UNIT,
            "deposit(address,uint256,address)",
            vec![
                ArgValue::unit(TOKEN_UNIT),
                ArgValue::Uint(U256::from(5u64)),
                ArgValue::Address(DEFAULT_DEMO_RECIPIENT),
            ],
        ),
    ]
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn word(address: Address) -> Vec<u8> {
    let mut w = vec![0u8; 12];
    w.extend_from_slice(address.as_slice());
    w
}

#[tokio::test]
async fn test_all_steps_succeed_in_order() {
    let session = session();
    let submitter = MockSubmitter::new();

    let receipts = TransactionRunner::new(&session, &submitter)
        .run(&three_steps())
        .await
        .unwrap();

    let names: Vec<_> = receipts.iter().map(|r| r.step.as_str()).collect();
    assert_eq!(names, vec!["step 1", "step 2", "step 3"]);
    assert!(receipts.iter().all(|r| r.receipt.success));

    let targets: Vec<_> = submitter.calls().into_iter().map(|(to, _)| to).collect();
    assert_eq!(targets, vec![TOKEN, BANK, BANK]);
}

#[tokio::test]
async fn test_failed_receipt_stops_the_sequence() {
    let session = session();
    let submitter = MockSubmitter::new().on_call(2, Outcome::Revert);

    let err = TransactionRunner::new(&session, &submitter)
        .run(&three_steps())
        .await
        .unwrap_err();

    match err {
        DeployError::Transaction(e @ TransactionError::Reverted { .. }) => {
            assert_eq!(e.step(), "step 2");
            assert!(e.to_string().contains("step 2"));
        }
        other => panic!("expected revert, got {:?}", other),
    }
    assert_eq!(submitter.calls().len(), 2);
}

#[tokio::test]
async fn test_submission_error_stops_the_sequence() {
    let session = session();
    let submitter = MockSubmitter::new().on_call(1, Outcome::Fail);

    let err = TransactionRunner::new(&session, &submitter)
        .run(&three_steps())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Transaction(TransactionError::Submission { ref step, .. }) if step == "step 1"
    ));
    assert_eq!(submitter.calls().len(), 1);
}

#[tokio::test]
async fn test_optional_step_may_revert() {
    let session = session();
    let submitter = MockSubmitter::new().on_call(2, Outcome::Revert);
    let mut steps = three_steps();
    steps[1].require_success = false;

    let receipts = TransactionRunner::new(&session, &submitter)
        .run(&steps)
        .await
        .unwrap();

    let flags: Vec<_> = receipts.iter().map(|r| r.receipt.success).collect();
    assert_eq!(flags, vec![true, false, true]);
}

#[tokio::test]
async fn test_unknown_target_is_rejected_before_submission() {
    let session = session();
    let submitter = MockSubmitter::new();
    let steps = vec![TransactionStep::new(
        "transfer",
        "ICS20TransferBank",
        "setChannelEscrowAddresses()",
        vec![],
    )];

    let err = TransactionRunner::new(&session, &submitter)
        .run(&steps)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Link(LinkError::Unresolved { ref dependency, .. }) if dependency == "ICS20TransferBank"
    ));
    assert!(submitter.submissions().is_empty());
}

#[tokio::test]
async fn test_bad_signature_is_an_encoding_error() {
    let session = session();
    let submitter = MockSubmitter::new();
    let steps = vec![TransactionStep::new(
        "broken",
        TOKEN_UNIT,
        "approve(address,uint256)",
        vec![ArgValue::unit(BANK_UNIT)],
    )];

    let err = TransactionRunner::new(&session, &submitter)
        .run(&steps)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Transaction(TransactionError::Encoding { ref step, .. }) if step == "broken"
    ));
    assert!(submitter.submissions().is_empty());
}

#[tokio::test]
async fn test_demo_sequence_calldata() {
    let session = session();
    let submitter = MockSubmitter::new();

    TransactionRunner::new(&session, &submitter)
        .run(&demo_steps(&DemoConfig::default()))
        .await
        .unwrap();

    let calls = submitter.calls();
    assert_eq!(calls.len(), 3);

    let (to, data) = &calls[0];
    assert_eq!(*to, TOKEN);
    assert_eq!(&data[..4], &selector("approve(address,uint256)"));
    assert_eq!(&data[4..36], word(BANK).as_slice());
    assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(1_000_000u64));

    let deposit = selector("deposit(address,uint256,address)");
    for ((to, data), receiver) in calls[1..].iter().zip([DEPLOYER, DEFAULT_DEMO_RECIPIENT]) {
        assert_eq!(*to, BANK);
        assert_eq!(&data[..4], &deposit);
        assert_eq!(&data[4..36], word(TOKEN).as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(500_000u64));
        assert_eq!(&data[68..100], word(receiver).as_slice());
    }
}
