use anyhow::anyhow;

use crate::error::Result;
use crate::types::{AttendanceEntry, Category, Employee, Filter, LeaveEntry, Record};

/// Text → vector backend. Implementations must be deterministic within a
/// session and return vectors of `dim()` floats, one per input, in input order.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no vector"))
    }
}

/// Document store for exact lookups. Interior mutability is expected so a
/// single store can be shared by ingestion and query paths.
pub trait StructuredStore: Send + Sync {
    fn insert_many(&self, category: Category, records: Vec<Record>) -> Result<usize>;
    fn find_one(&self, category: Category, filter: &Filter) -> Result<Option<Record>>;
    fn find_many(&self, category: Category, filter: &Filter, limit: usize) -> Result<Vec<Record>>;
    fn count(&self, category: Category, filter: Option<&Filter>) -> Result<usize>;
    fn delete_all(&self, category: Category) -> Result<usize>;
    fn create_unique_index(&self, category: Category, field: &str) -> Result<()>;
}

/// Opaque text generation backend. Called once per answered query.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str, max_tokens: usize, temperature: f32) -> anyhow::Result<String>;
}

/// Anything that can be turned into an indexed document.
pub trait Embeddable {
    /// Stable identifier within the record's category.
    fn record_id(&self) -> String;
    /// Flattened text fed to the embedder.
    fn embedding_text(&self) -> String;
    fn category(&self) -> Category;
}

fn or_empty(value: &Option<String>) -> &str { value.as_deref().unwrap_or("") }

fn or_na(value: &Option<String>) -> &str { value.as_deref().unwrap_or("N/A") }

impl Embeddable for Employee {
    fn record_id(&self) -> String { self.emp_id.clone() }

    fn embedding_text(&self) -> String {
        [
            format!("Employee ID: {}", self.emp_id),
            format!("Name: {}", self.name),
            format!("Department: {}", or_empty(&self.dept)),
            format!("Location: {}", or_empty(&self.location)),
            format!("Role: {}", or_empty(&self.role)),
            format!("Joining Date: {}", or_empty(&self.joining_date)),
            format!("Performance: {}", or_empty(&self.performance_rating)),
            format!("Certifications: {}", or_empty(&self.certifications)),
        ]
        .join(" | ")
    }

    fn category(&self) -> Category { Category::Employees }
}

impl Embeddable for AttendanceEntry {
    fn record_id(&self) -> String { format!("{}_{}", self.emp_id, self.date) }

    fn embedding_text(&self) -> String {
        [
            format!("Employee: {}", self.emp_id),
            format!("Date: {}", self.date),
            format!("Check In: {}", or_na(&self.check_in)),
            format!("Check Out: {}", or_na(&self.check_out)),
            format!("Location: {}", or_empty(&self.location_logged)),
            format!("Device: {}", or_empty(&self.device)),
        ]
        .join(" | ")
    }

    fn category(&self) -> Category { Category::Attendance }
}

impl Embeddable for LeaveEntry {
    fn record_id(&self) -> String {
        format!("{}_{}_{}", self.emp_id, or_empty(&self.leave_type), or_empty(&self.start_date))
    }

    fn embedding_text(&self) -> String {
        let days = self.days.map(|d| d.to_string()).unwrap_or_default();
        [
            format!("Employee: {}", self.emp_id),
            format!("Leave Type: {}", or_empty(&self.leave_type)),
            format!("Start Date: {}", or_empty(&self.start_date)),
            format!("End Date: {}", or_empty(&self.end_date)),
            format!("Duration: {days} days"),
            format!("Status: {}", or_empty(&self.status)),
            format!("Reason: {}", or_empty(&self.reason)),
        ]
        .join(" | ")
    }

    fn category(&self) -> Category { Category::Leave }
}

impl Embeddable for Record {
    fn record_id(&self) -> String {
        match self {
            Record::Employee(e) => e.record_id(),
            Record::Attendance(a) => a.record_id(),
            Record::Leave(l) => l.record_id(),
        }
    }

    fn embedding_text(&self) -> String {
        match self {
            Record::Employee(e) => e.embedding_text(),
            Record::Attendance(a) => a.embedding_text(),
            Record::Leave(l) => l.embedding_text(),
        }
    }

    fn category(&self) -> Category {
        match self {
            Record::Employee(_) => Category::Employees,
            Record::Attendance(_) => Category::Attendance,
            Record::Leave(_) => Category::Leave,
        }
    }
}
