use tower_lsp::lsp_types::{Diagnostic, Position, Range};

/// Keep the diagnostics whose reported range contains `position`.
///
/// Input order is preserved. An empty result is not an error: a code-action
/// request may legitimately carry zero diagnostics.
pub fn filter_for_position(
    diagnostics: &[Diagnostic],
    position: Position,
) -> Vec<Diagnostic> {
    diagnostics.iter().filter(|diagnostic| range_contains(&diagnostic.range, position)).cloned().collect()
}

/// Inclusive containment under the line-major `Position` ordering.
pub fn range_contains(
    range: &Range,
    position: Position,
) -> bool {
    range.start <= position && position <= range.end
}

#[cfg(test)]
#[path = "../../tests/src/verify/filter_tests.rs"]
mod tests;
