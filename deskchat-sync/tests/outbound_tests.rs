mod support;

use chrono::Utc;
use deskchat_sync::{ChatError, DeliveryMode, SendCoordinator};
use support::*;

fn coordinator() -> SendCoordinator {
    SendCoordinator::new(operator(), DeliveryMode::OptimisticFirst)
}

#[test]
fn prepares_echo_and_outbound() {
    let c1 = cid("c1");
    let prepared = coordinator()
        .prepare(Some(&c1), &c1, "hi", Utc::now())
        .unwrap();

    assert!(prepared.local.is_local_echo);
    assert_eq!(prepared.local.local_ref, Some(prepared.local_ref));
    assert_eq!(prepared.local.sender_id, operator());
    assert_eq!(prepared.outbound.conversation_id, c1);
    assert_eq!(prepared.outbound.content, "hi");
}

#[test]
fn content_is_sent_untrimmed() {
    let c1 = cid("c1");
    let prepared = coordinator()
        .prepare(Some(&c1), &c1, "  spaced  ", Utc::now())
        .unwrap();
    assert_eq!(prepared.outbound.content, "  spaced  ");
}

#[test]
fn blank_content_is_rejected() {
    let c1 = cid("c1");
    let err = coordinator()
        .prepare(Some(&c1), &c1, " \n\t", Utc::now())
        .unwrap_err();
    assert!(matches!(err, ChatError::EmptyContent));
}

#[test]
fn send_without_selection_is_rejected() {
    let err = coordinator()
        .prepare(None, &cid("c1"), "hi", Utc::now())
        .unwrap_err();
    assert!(matches!(err, ChatError::NoActiveConversation));
}

#[test]
fn send_to_inactive_conversation_is_rejected() {
    let c1 = cid("c1");
    let err = coordinator()
        .prepare(Some(&c1), &cid("c2"), "hi", Utc::now())
        .unwrap_err();
    assert!(matches!(err, ChatError::NotActive(ref id) if id == "c2"));
    assert!(err.is_validation());
}

#[test]
fn each_send_gets_a_fresh_local_ref() {
    let c1 = cid("c1");
    let coordinator = coordinator();
    let a = coordinator.prepare(Some(&c1), &c1, "ok", Utc::now()).unwrap();
    let b = coordinator.prepare(Some(&c1), &c1, "ok", Utc::now()).unwrap();
    assert_ne!(a.local_ref, b.local_ref);
}
