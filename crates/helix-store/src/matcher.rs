use helix_core::{Error, Filter, Record, Result};
use regex::{Regex, RegexBuilder};

/// A `Filter` with its pattern compiled once per call.
pub(crate) enum Matcher<'a> {
    Eq { field: &'a str, value: &'a str },
    Regex { field: &'a str, re: Regex },
}

impl<'a> Matcher<'a> {
    pub(crate) fn compile(filter: &'a Filter) -> Result<Self> {
        match filter {
            Filter::Eq { field, value } => Ok(Matcher::Eq { field: field.as_str(), value: value.as_str() }),
            Filter::Regex { field, pattern, case_insensitive } => {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .build()
                    .map_err(|e| Error::validation(format!("invalid pattern for '{field}': {e}")))?;
                Ok(Matcher::Regex { field: field.as_str(), re })
            }
        }
    }

    pub(crate) fn matches(&self, record: &Record) -> bool {
        match self {
            Matcher::Eq { field, value } => record.field(field).is_some_and(|v| v == *value),
            Matcher::Regex { field, re } => record.field(field).is_some_and(|v| re.is_match(&v)),
        }
    }
}
