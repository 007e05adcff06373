//! Drives fixture cases through a tooling session and aggregates verdicts.

use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use tower_lsp::lsp_types::{Position, Url};
use tracing::{debug, error, info};

use crate::{
    endpoint::Endpoint,
    fixture::{CaseConfig, FixtureError, TestCase},
    session::{SessionError, ToolingSession},
    verify::{
        filter::filter_for_position,
        matcher::{MatchFailure, find_match},
        normalize::{MalformedResponse, normalize},
    },
};

/// Runs test cases against an initialized tooling session.
pub struct FixtureDriver<E: Endpoint> {
    session: ToolingSession<E>,
}

/// Verdict for one test case.
///
/// The case passes only if every expectation found a matching action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub source: PathBuf,
    pub cursor: Position,
    pub expectations: usize,
    pub failures: Vec<MatchFailure>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of one case within a suite run.
#[derive(Debug)]
pub struct CaseOutcome {
    pub case: TestCase,
    pub result: Result<CaseReport, CaseError>,
}

/// Aggregated suite verdicts. Errors stay local to their case.
#[derive(Debug, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| matches!(&outcome.result, Ok(report) if report.passed()))
    }

    pub fn passed_cases(&self) -> usize {
        self.outcomes.iter().filter(|outcome| matches!(&outcome.result, Ok(report) if report.passed())).count()
    }

    pub fn failed_cases(&self) -> usize {
        self.outcomes.iter().filter(|outcome| matches!(&outcome.result, Ok(report) if !report.passed())).count()
    }

    pub fn errored_cases(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err()).count()
    }
}

impl<E: Endpoint> FixtureDriver<E> {
    pub fn new(session: ToolingSession<E>) -> Self {
        Self {
            session,
        }
    }

    /// Run one case: open, query, match every expectation, close.
    ///
    /// The document is closed on the failure path too, so a failing case
    /// never leaks an open document into the next one.
    pub async fn run_case(
        &mut self,
        case: &TestCase,
    ) -> Result<CaseReport, CaseError> {
        let config = CaseConfig::load(&case.config)?;
        let cursor = config.cursor();
        info!(source = %case.source.display(), line = cursor.line, character = cursor.character, "running case");
        let uri = self.session.open_document(&case.source).await?;
        let verdict = self.check_expectations(&uri, cursor, &config).await;
        let closed = self.session.close_document(&uri).await;
        let failures = verdict?;
        closed?;
        Ok(CaseReport {
            source: case.source.clone(),
            cursor,
            expectations: config.expected.len(),
            failures,
        })
    }

    async fn check_expectations(
        &mut self,
        uri: &Url,
        cursor: Position,
        config: &CaseConfig,
    ) -> Result<Vec<MatchFailure>, CaseError> {
        let published = self.session.wait_for_diagnostics(uri).await?;
        let at_cursor = filter_for_position(&published, cursor);
        debug!(published = published.len(), at_cursor = at_cursor.len(), "filtered diagnostics to the cursor");
        let reply = self.session.code_actions(uri, cursor, at_cursor).await?;
        let actuals = normalize(&reply)?;
        let mut failures = Vec::new();
        for expected in &config.expected {
            if find_match(expected, &actuals).is_none() {
                failures.push(MatchFailure {
                    title: expected.title.clone(),
                    cursor,
                });
            }
        }
        Ok(failures)
    }

    /// Run every case, keeping each case's failure local to that case.
    pub async fn run_suite(
        &mut self,
        cases: &[TestCase],
    ) -> SuiteReport {
        let mut report = SuiteReport::default();
        for case in cases {
            let result = self.run_case(case).await;
            match &result {
                Ok(case_report) if case_report.passed() => {},
                Ok(case_report) => {
                    for failure in &case_report.failures {
                        error!(config = %case.config.display(), "{failure}");
                    }
                },
                Err(case_error) => error!(config = %case.config.display(), "case aborted: {case_error}"),
            }
            report.outcomes.push(CaseOutcome {
                case: case.clone(),
                result,
            });
        }
        report
    }

    /// Shut the underlying session down.
    pub async fn finish(self) -> Result<(), SessionError> {
        self.session.shutdown().await
    }
}

/// A test case aborted before its expectations could all be evaluated.
#[derive(Debug)]
pub enum CaseError {
    Fixture(FixtureError),
    Session(SessionError),
    Response(MalformedResponse),
}

impl From<FixtureError> for CaseError {
    fn from(error: FixtureError) -> Self {
        Self::Fixture(error)
    }
}

impl From<SessionError> for CaseError {
    fn from(error: SessionError) -> Self {
        Self::Session(error)
    }
}

impl From<MalformedResponse> for CaseError {
    fn from(error: MalformedResponse) -> Self {
        Self::Response(error)
    }
}

impl Display for CaseError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Fixture(error) => write!(f, "{error}"),
            Self::Session(error) => write!(f, "{error}"),
            Self::Response(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for CaseError {}

#[cfg(test)]
#[path = "../tests/src/driver_tests.rs"]
mod tests;
