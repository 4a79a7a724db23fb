use helix_core::traits::StructuredStore;
use helix_core::{Category, Document, Error, Filter, Result};
use regex::{Regex, RegexBuilder};
use tracing::debug;

const NAME_MARKERS: [&str; 3] = ["employee", "person", "named"];
const NAME_LIMIT: usize = 5;

/// Exact lookup recognised in a free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredQuery {
    /// Identifier token, uppercased (`emp1001` → `EMP1001`).
    EmployeeId(String),
    /// Word following an explicit-name marker.
    Name(String),
}

/// Detects identifier and name lookups and runs them against the store.
pub struct StructuredMatcher {
    id_pattern: Regex,
}

impl StructuredMatcher {
    pub fn new(id_prefix: &str) -> Result<Self> {
        let id_pattern = RegexBuilder::new(&format!(r"{}\d+", regex::escape(id_prefix.trim())))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("id prefix '{id_prefix}': {e}")))?;
        Ok(Self { id_pattern })
    }

    /// An identifier token wins over a name marker. A name must start with an
    /// uppercase letter so "employee details" is not taken for a name.
    pub fn detect(&self, query: &str) -> Option<StructuredQuery> {
        if let Some(m) = self.id_pattern.find(query) {
            return Some(StructuredQuery::EmployeeId(m.as_str().to_uppercase()));
        }
        let words: Vec<&str> = query.split_whitespace().collect();
        words.windows(2).find_map(|pair| {
            let marker = pair[0].trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if !NAME_MARKERS.contains(&marker.as_str()) { return None; }
            let name = pair[1].trim_matches(|c: char| !c.is_alphanumeric());
            name.chars().next().filter(|c| c.is_uppercase()).map(|_| StructuredQuery::Name(name.to_string()))
        })
    }

    /// Matching employee documents. An identifier with no record yields an
    /// empty result; the name path is not tried in that case.
    pub fn lookup<S: StructuredStore + ?Sized>(&self, store: &S, query: &str) -> Result<Vec<Document>> {
        let Some(detected) = self.detect(query) else { return Ok(Vec::new()) };
        debug!(?detected, "structured lookup");
        let records = match detected {
            StructuredQuery::EmployeeId(id) => {
                store.find_one(Category::Employees, &Filter::eq("emp_id", id))?.into_iter().collect()
            }
            StructuredQuery::Name(name) => {
                store.find_many(Category::Employees, &Filter::regex_ci("name", regex::escape(&name)), NAME_LIMIT)?
            }
        };
        Ok(records.into_iter().map(Document::from_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> StructuredMatcher { StructuredMatcher::new("EMP").unwrap() }

    #[test]
    fn detects_identifier_case_insensitively() {
        assert_eq!(matcher().detect("Employee emp1001 details"), Some(StructuredQuery::EmployeeId("EMP1001".into())));
        assert_eq!(matcher().detect("what about EMP42?"), Some(StructuredQuery::EmployeeId("EMP42".into())));
    }

    #[test]
    fn detects_name_after_marker() {
        assert_eq!(matcher().detect("Tell me about employee Priya."), Some(StructuredQuery::Name("Priya".into())));
        assert_eq!(matcher().detect("a person named Arjun"), Some(StructuredQuery::Name("Arjun".into())));
        assert_eq!(matcher().detect("show employee details for finance"), None);
        assert_eq!(matcher().detect("how many sick leaves were approved"), None);
    }

    #[test]
    fn custom_prefix_is_escaped() {
        let m = StructuredMatcher::new("E.").unwrap();
        assert_eq!(m.detect("record E.77"), Some(StructuredQuery::EmployeeId("E.77".into())));
        assert_eq!(m.detect("record EX77"), None);
    }
}
