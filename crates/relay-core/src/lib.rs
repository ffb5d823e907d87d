//! Domain types shared by the relay crates: connection ids, the structured
//! submission message, and the error taxonomy.

pub mod errors;
pub mod ids;
pub mod messages;

pub use errors::{ChannelError, SubmitError, UpgradeError};
pub use ids::ConnectionId;
pub use messages::{decode_submission, StructuredMessage};
