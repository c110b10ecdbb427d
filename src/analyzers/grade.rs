use serde::Serialize;
use std::fmt;

/// Letter grade for a demographic completeness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Grades a completeness proportion (0.0–1.0).
    ///
    /// | Range       | Grade |
    /// |-------------|-------|
    /// | >= 0.95     | A+    |
    /// | >= 0.90     | A     |
    /// | >= 0.80     | B     |
    /// | >= 0.65     | C     |
    /// | >= 0.40     | D     |
    /// | < 0.40      | F     |
    pub fn from_completeness(completeness: f64) -> Self {
        match completeness {
            p if p >= 0.95 => Grade::APlus,
            p if p >= 0.90 => Grade::A,
            p if p >= 0.80 => Grade::B,
            p if p >= 0.65 => Grade::C,
            p if p >= 0.40 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
