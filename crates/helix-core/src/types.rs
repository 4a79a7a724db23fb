//! Domain types shared by the store, vector and hybrid engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::lenient;
use crate::traits::Embeddable;

/// Partition of both structured storage and vector indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Employees,
    Attendance,
    Leave,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Employees, Category::Attendance, Category::Leave];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Employees => "employees",
            Category::Attendance => "attendance",
            Category::Leave => "leave",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employees" | "employee" => Ok(Category::Employees),
            "attendance" => Ok(Category::Attendance),
            "leave" | "leave_history" => Ok(Category::Leave),
            other => Err(Error::validation(format!("unknown category '{other}'"))),
        }
    }
}

/// Selects the nearest-neighbor backend behind a `VectorIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact brute-force scan.
    #[default]
    Flat,
    /// Clustered inverted file; must be trained before the first add.
    Ivf,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Flat => f.write_str("flat"),
            IndexKind::Ivf => f.write_str("ivf"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(IndexKind::Flat),
            "ivf" => Ok(IndexKind::Ivf),
            other => Err(Error::validation(format!("unknown index kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(deserialize_with = "lenient::string")]
    pub emp_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub dept: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub joining_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub performance_rating: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub certifications: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub emp_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub check_in: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub check_out: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location_logged: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub emp_id: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub leave_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub days: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub reason: Option<String>,
}

/// One structured record of any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Employee(Employee),
    Attendance(AttendanceEntry),
    Leave(LeaveEntry),
}

impl Record {
    /// String value of a named field, used by structured filters.
    pub fn field(&self, name: &str) -> Option<String> {
        match self {
            Record::Employee(e) => match name {
                "emp_id" => Some(e.emp_id.clone()),
                "name" => Some(e.name.clone()),
                "dept" => e.dept.clone(),
                "location" => e.location.clone(),
                "role" => e.role.clone(),
                "joining_date" => e.joining_date.clone(),
                "performance_rating" => e.performance_rating.clone(),
                "certifications" => e.certifications.clone(),
                _ => None,
            },
            Record::Attendance(a) => match name {
                "emp_id" => Some(a.emp_id.clone()),
                "date" => Some(a.date.clone()),
                "check_in" => a.check_in.clone(),
                "check_out" => a.check_out.clone(),
                "location_logged" => a.location_logged.clone(),
                "device" => a.device.clone(),
                _ => None,
            },
            Record::Leave(l) => match name {
                "emp_id" => Some(l.emp_id.clone()),
                "leave_type" => l.leave_type.clone(),
                "start_date" => l.start_date.clone(),
                "end_date" => l.end_date.clone(),
                "days" => l.days.map(|d| d.to_string()),
                "status" => l.status.clone(),
                "reason" => l.reason.clone(),
                _ => None,
            },
        }
    }

    pub fn emp_id(&self) -> &str {
        match self {
            Record::Employee(e) => &e.emp_id,
            Record::Attendance(a) => &a.emp_id,
            Record::Leave(l) => &l.emp_id,
        }
    }
}

impl From<Employee> for Record {
    fn from(value: Employee) -> Self { Record::Employee(value) }
}

impl From<AttendanceEntry> for Record {
    fn from(value: AttendanceEntry) -> Self { Record::Attendance(value) }
}

impl From<LeaveEntry> for Record {
    fn from(value: LeaveEntry) -> Self { Record::Leave(value) }
}

/// A record prepared for (or already stored in) a vector index.
///
/// `embedding` and `embedding_text` are filled in before indexing and never
/// change afterwards; only a full rebuild produces new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub record: Record,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub embedding_text: Option<String>,
}

impl Document {
    /// Wraps a record without an embedding; the embedding text is precomputed.
    pub fn from_record(record: Record) -> Self {
        let embedding_text = Some(record.embedding_text());
        Self { record, embedding: None, embedding_text }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn id(&self) -> String { self.record.record_id() }

    pub fn category(&self) -> Category { self.record.category() }
}

/// A document paired with its similarity to the query, higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub document: Document,
    pub similarity: f32,
}

/// Field filter accepted by a `StructuredStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Eq { field: String, value: String },
    Regex { field: String, pattern: String, case_insensitive: bool },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq { field: field.into(), value: value.into() }
    }

    pub fn regex_ci(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Regex { field: field.into(), pattern: pattern.into(), case_insensitive: true }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq { field, .. } | Filter::Regex { field, .. } => field,
        }
    }
}

/// How the evidence behind a response was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Structured,
    Semantic,
    None,
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMethod::Structured => f.write_str("structured"),
            SearchMethod::Semantic => f.write_str("semantic"),
            SearchMethod::None => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 0.7 {
            ConfidenceLevel::High
        } else if confidence > 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

pub const NO_INFORMATION_ANSWER: &str = "I couldn't find relevant information to answer your question. \
Please try rephrasing or ask a more specific question about employees, attendance, or leave policies.";

/// Final answer handed back to the caller. Built once per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub answer: String,
    pub sources: Vec<Document>,
    pub confidence: f32,
    pub search_method: SearchMethod,
    pub source_count: usize,
    pub confidence_level: ConfidenceLevel,
}

impl Response {
    pub fn new(answer: String, sources: Vec<Document>, confidence: f32, search_method: SearchMethod) -> Self {
        let source_count = sources.len();
        let confidence_level = ConfidenceLevel::from_confidence(confidence);
        Self { answer, sources, confidence, search_method, source_count, confidence_level }
    }

    /// The terminal "nothing relevant" outcome; not an error.
    pub fn no_information(search_method: SearchMethod) -> Self {
        Self {
            answer: NO_INFORMATION_ANSWER.to_string(),
            sources: Vec::new(),
            confidence: 0.0,
            search_method,
            source_count: 0,
            confidence_level: ConfidenceLevel::None,
        }
    }

    pub fn has_sources(&self) -> bool { !self.sources.is_empty() }
}
