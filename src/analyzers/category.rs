use std::fmt;

/// Buckets an age into a life-stage label.
///
/// | Range   | Category |
/// |---------|----------|
/// | >= 65   | Senior   |
/// | >= 18   | Adult    |
/// | < 18    | Minor    |
pub fn age_category(age: f64) -> &'static str {
    match age {
        a if a >= 65.0 => "Senior",
        a if a >= 18.0 => "Adult",
        _ => "Minor",
    }
}

/// Inclusive age limits. A missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgeBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AgeBounds {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// True when both sides are set and the lower one is above the upper one.
    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }

    pub fn contains(&self, age: f64) -> bool {
        self.min.is_none_or(|min| age >= min) && self.max.is_none_or(|max| age <= max)
    }
}

impl fmt::Display for AgeBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "aged {min} to {max}"),
            (Some(min), None) => write!(f, "aged {min} and above"),
            (None, Some(max)) => write!(f, "aged up to {max}"),
            (None, None) => f.write_str("of any age"),
        }
    }
}
