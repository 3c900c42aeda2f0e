mod support;

use deskchat_sync::is_same_message;
use std::time::Duration;
use support::*;

const WINDOW: Option<Duration> = Some(Duration::from_secs(300));

#[test]
fn equal_ids_match() {
    let a = confirmed("m1", "c1", "alice", "hello");
    let b = confirmed("m1", "c1", "alice", "edited");
    assert!(is_same_message(&a, &b, WINDOW));
}

#[test]
fn different_ids_never_match_even_with_same_content() {
    let a = confirmed("m1", "c1", "alice", "hello");
    let b = confirmed("m2", "c1", "alice", "hello");
    assert!(!is_same_message(&a, &b, None));
}

#[test]
fn local_echo_matches_server_copy_by_content() {
    let local = echo("c1", "op", "hi");
    let server = confirmed("m2", "c1", "op", "hi");
    assert!(is_same_message(&local, &server, WINDOW));
}

#[test]
fn local_echo_requires_same_sender_and_conversation() {
    let local = echo("c1", "op", "hi");
    assert!(!is_same_message(&local, &confirmed("m2", "c1", "alice", "hi"), WINDOW));
    assert!(!is_same_message(&local, &confirmed("m2", "c2", "op", "hi"), WINDOW));
    assert!(!is_same_message(&local, &confirmed("m2", "c1", "op", "hi!"), WINDOW));
}

#[test]
fn confirmed_entry_is_never_matched_by_content() {
    let existing = confirmed("m1", "c1", "op", "hi");
    let mut candidate = confirmed("m2", "c1", "op", "hi");
    candidate.id = None;
    assert!(!is_same_message(&existing, &candidate, None));
}

#[test]
fn two_local_echoes_never_match() {
    let a = echo("c1", "op", "hi");
    let b = echo("c1", "op", "hi");
    assert!(!is_same_message(&a, &b, None));
}

#[test]
fn window_bounds_content_match() {
    let local = echo("c1", "op", "hi");
    let mut late = confirmed("m2", "c1", "op", "hi");
    late.timestamp = at(301);
    assert!(!is_same_message(&local, &late, WINDOW));

    late.timestamp = at(300);
    assert!(is_same_message(&local, &late, WINDOW));

    // Server clock behind the client.
    late.timestamp = at(-120);
    assert!(is_same_message(&local, &late, WINDOW));
}

#[test]
fn no_window_ignores_timestamps() {
    let local = echo("c1", "op", "hi");
    let mut late = confirmed("m2", "c1", "op", "hi");
    late.timestamp = at(86_400);
    assert!(is_same_message(&local, &late, None));
}
