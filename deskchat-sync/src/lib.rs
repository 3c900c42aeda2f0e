//! Chat synchronization engine for the back-office live chat.
//!
//! Keeps the operator's view of the active conversation consistent with
//! the server:
//! - `MessageStore`: ordered, deduplicated log of the active conversation
//! - `ConversationDirectory`: conversations visible to the operator
//! - `Reconciler`: applies push events and history loads to the store
//! - `SendCoordinator`: optimistic local sends and their outbound frames
//! - `ChatSession`: the event loop that owns all of the above and all I/O

pub mod config;
pub mod directory;
pub mod error;
pub mod matching;
pub mod outbound;
pub mod policy;
pub mod reconciler;
pub mod session;
pub mod store;
pub mod transport;

pub use config::{ChatConfig, DeliveryMode};
pub use directory::ConversationDirectory;
pub use error::{ChatError, ChatResult};
pub use matching::is_same_message;
pub use outbound::SendCoordinator;
pub use policy::{AllowAllPolicy, ModerationPolicy, OwnMessagesPolicy};
pub use reconciler::{EventOutcome, Reconciler, SelectTicket};
pub use session::{
    ChatCommand, ChatHandle, ChatSession, ChatSnapshot, ChatUpdate, create_chat_session,
    create_chat_session_with_policy,
};
pub use store::{MessageStore, ReplaceOutcome};
pub use transport::{ChannelEvent, ChatApi, PushChannel};
