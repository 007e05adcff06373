pub mod filter;
pub mod matcher;
pub mod normalize;
pub mod request;

pub use filter::filter_for_position;
pub use matcher::{DOC_URI_KEY, MatchFailure, find_match};
pub use normalize::{ActualAction, MalformedResponse, normalize};
pub use request::code_action_request;
