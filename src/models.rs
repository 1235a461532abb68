use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Part/semester pair chosen in the two selects. Empty string means "nothing selected".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub part: String,
    pub semester: String,
}

impl Selection {
    pub fn is_complete(&self) -> bool {
        !self.part.is_empty() && !self.semester.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub const ALL: [Grade; 6] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E, Grade::F];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown grade `{}`", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_code: String,
    pub course_title: String,
    pub course_unit: u32,
    #[serde(default)]
    pub is_carry_over: bool,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub course_code: String,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddSemesterRequest {
    pub part: String,
    pub semester: String,
    pub grades: Vec<GradeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterSummaryItem {
    #[serde(deserialize_with = "string_or_number")]
    pub part: String,
    pub semester: String,
    pub gpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterResult {
    pub semester_gpa: f64,
    pub cumulative_gpa: f64,
    #[serde(default)]
    pub session_summary: Vec<SemesterSummaryItem>,
}

/// Answer to a save. Some backends send only `{success, redirect_url}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SaveReceipt {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub record_id: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

// Body of every non-2xx JSON answer from the backend.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Initial state the server renders into the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    pub initial_cgpa: f64,
    pub initial_summary: Vec<SemesterSummaryItem>,
    pub part_options: Vec<String>,
    pub semester_options: Vec<String>,
    pub flash: Option<FlashMessage>,
}

/// A message the server flashed into the page, with its category ("success", "error", "info").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub message: String,
    pub category: String,
}

impl FlashMessage {
    pub fn is_error(&self) -> bool {
        matches!(self.category.as_str(), "error" | "danger")
    }
}

// Templates render parts either as "1" or 1.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
