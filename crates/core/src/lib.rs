pub mod error;
pub mod models;
pub mod output;
pub mod routing;

pub use error::TurnError;
pub use models::*;
pub use output::{parse_responder_output, PlannedCall, ResponderOutput};
pub use routing::{classify_message, extract_place};
