//! Message identity.
//!
//! The reconciler needs one answer to "is this inbound message the one I
//! already show?". Local echoes carry no server id, so the only usable key
//! for them is content + sender + conversation, optionally bounded by a
//! timestamp window. Confirmed messages are only ever matched by id.

use deskchat_types::Message;
use std::time::Duration;

/// Returns true if `candidate` is the same logical message as `existing`.
///
/// - Both carry an id: same message iff the ids are equal.
/// - `existing` is a local echo and `candidate` is not: same message iff
///   content, sender and conversation are equal and the timestamps are
///   within `window` (when given).
/// - Anything else never matches. In particular a confirmed entry is never
///   collapsed into by a different message with the same content, and two
///   local echoes never match each other.
pub fn is_same_message(existing: &Message, candidate: &Message, window: Option<Duration>) -> bool {
    if let (Some(a), Some(b)) = (&existing.id, &candidate.id) {
        return a == b;
    }

    if !existing.is_local_echo || candidate.is_local_echo {
        return false;
    }

    existing.conversation_id == candidate.conversation_id
        && existing.sender_id == candidate.sender_id
        && existing.content == candidate.content
        && within_window(existing, candidate, window)
}

fn within_window(existing: &Message, candidate: &Message, window: Option<Duration>) -> bool {
    let Some(window) = window else {
        return true;
    };
    let delta_ms = (candidate.timestamp - existing.timestamp)
        .num_milliseconds()
        .unsigned_abs();
    u128::from(delta_ms) <= window.as_millis()
}
