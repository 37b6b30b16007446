use std::fmt;

/// Fatal screening errors. Anything in here aborts the run; per-instrument problems are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenError {
    BenchmarkMissing { benchmark_id: String },
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenError::BenchmarkMissing { benchmark_id } => write!(
                f,
                "benchmark series {benchmark_id} has no price history; load it before ranking"
            ),
        }
    }
}

impl std::error::Error for ScreenError {}
