pub mod config;
pub mod driver;
pub mod endpoint;
pub mod fixture;
pub mod session;
pub mod verify;

pub use config::RunnerSettings;
pub use driver::{CaseError, CaseOutcome, CaseReport, FixtureDriver, SuiteReport};
pub use endpoint::{Endpoint, InProcessEndpoint, StdioEndpoint, TransportError};
pub use fixture::{CaseConfig, ExpectedAction, ExpectedCommand, FixtureError, TestCase, discover_cases};
pub use session::{SessionError, ToolingSession};
pub use verify::{
    ActualAction, DOC_URI_KEY, MalformedResponse, MatchFailure, code_action_request, filter_for_position, find_match,
    normalize,
};
