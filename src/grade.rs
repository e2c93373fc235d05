// Assignment score normalization.

use crate::error::{Result, WhapiError};
use crate::model::Assignment;
use std::fmt;

/// Normalized score of one assignment.
///
/// `Ungraded` is kept apart from a score of zero: a zero is a real grade,
/// a placeholder like "Not Graded" is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grade {
    Scored(f64),
    Ungraded,
}

impl Grade {
    pub fn score(&self) -> Option<f64> {
        match self {
            Grade::Scored(s) => Some(*s),
            Grade::Ungraded => None,
        }
    }

    pub fn is_graded(&self) -> bool {
        matches!(self, Grade::Scored(_))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Scored(s) => write!(f, "{:.1}%", s * 100.0),
            Grade::Ungraded => write!(f, "ungraded"),
        }
    }
}

/// Points earned divided by max points.
///
/// Fails with `InvalidMaxPoints` when `max_points` isn't a positive number,
/// whatever the points say. Scores above 1 (extra credit) are returned as is.
pub fn normalize(assignment: &Assignment) -> Result<Grade> {
    let max = assignment.max_points;
    if !max.is_finite() || max <= 0.0 {
        return Err(WhapiError::InvalidMaxPoints(max));
    }
    let points = assignment
        .points
        .as_deref()
        .and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite());
    Ok(match points {
        Some(p) => Grade::Scored(p / max),
        None => Grade::Ungraded,
    })
}

impl Assignment {
    pub fn grade(&self) -> Result<Grade> {
        normalize(self)
    }
}
