// ============================================================
// Layer 3 — Predicted Spans
// ============================================================
use serde::Serialize;

/// An answer span over document token positions, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictedSpan {
    pub start: usize,
    pub end:   usize,
    /// `p_start[start] * p_end[end]`
    pub score: f32,
}

impl PredictedSpan {
    /// Number of tokens covered.
    pub fn token_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Ranked spans for one example, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub id:    String,
    pub spans: Vec<PredictedSpan>,
}

impl Prediction {
    pub fn best(&self) -> Option<&PredictedSpan> {
        self.spans.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_count_is_inclusive() {
        assert_eq!(PredictedSpan { start: 1, end: 2, score: 0.5 }.token_count(), 2);
        assert_eq!(PredictedSpan { start: 4, end: 4, score: 0.5 }.token_count(), 1);
    }
}
