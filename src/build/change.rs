//! Change detection between consecutive successful builds.

use super::Outputs;

/// What a rebuild means for connected clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing to tell clients.
    NoOp,
    /// Only styles differ; clients can swap them in place.
    StyleOnly,
    /// Code differs; clients must reload.
    CodeChanged,
}

impl Change {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoOp => "nothing changed",
            Self::StyleOnly => "styles updated",
            Self::CodeChanged => "code updated",
        }
    }
}

/// Compare `current` with the previous successful outputs.
///
/// Without a baseline there is nothing to compare, so the result is `NoOp`.
pub fn classify(previous: Option<&Outputs>, current: &Outputs) -> Change {
    let Some(previous) = previous else {
        return Change::NoOp;
    };
    if previous.code != current.code {
        Change::CodeChanged
    } else if previous.style != current.style {
        Change::StyleOnly
    } else {
        Change::NoOp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(style: &str, code: &str) -> Outputs {
        Outputs::new(style, code)
    }

    #[test]
    fn test_no_baseline() {
        assert_eq!(classify(None, &outputs("a", "A")), Change::NoOp);
    }

    #[test]
    fn test_code_change() {
        let prev = outputs("a", "A");
        assert_eq!(classify(Some(&prev), &outputs("a", "B")), Change::CodeChanged);
    }

    #[test]
    fn test_code_change_wins_over_style() {
        let prev = outputs("a", "A");
        assert_eq!(classify(Some(&prev), &outputs("b", "B")), Change::CodeChanged);
    }

    #[test]
    fn test_style_only() {
        let prev = outputs("a", "A");
        assert_eq!(classify(Some(&prev), &outputs("b", "A")), Change::StyleOnly);
    }

    #[test]
    fn test_identical() {
        let prev = outputs("a", "A");
        assert_eq!(classify(Some(&prev), &outputs("a", "A")), Change::NoOp);
    }

    #[test]
    fn test_exact_comparison() {
        let prev = outputs("a", "A");
        assert_eq!(classify(Some(&prev), &outputs("a ", "A")), Change::StyleOnly);
        assert_eq!(classify(Some(&prev), &outputs("a", "A\n")), Change::CodeChanged);
    }
}
