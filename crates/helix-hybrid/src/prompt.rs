use std::fmt::Write;

use helix_core::{Document, Record};

const NA: &str = "N/A";

fn or_na(value: &Option<String>) -> &str { value.as_deref().unwrap_or(NA) }

/// Longest prefix of at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    fn format_record(out: &mut String, record: &Record) {
        let _ = match record {
            Record::Employee(e) => writeln!(
                out,
                "Employee: {} (ID: {})\nDepartment: {}\nLocation: {}\nRole: {}\nJoining Date: {}",
                e.name,
                e.emp_id,
                or_na(&e.dept),
                or_na(&e.location),
                or_na(&e.role),
                or_na(&e.joining_date)
            ),
            Record::Attendance(a) => writeln!(
                out,
                "Employee ID: {}\nDate: {}\nCheck In: {}\nCheck Out: {}",
                a.emp_id,
                a.date,
                or_na(&a.check_in),
                or_na(&a.check_out)
            ),
            Record::Leave(l) => writeln!(
                out,
                "Employee ID: {}\nLeave Type: {}\nDuration: {} days\nStatus: {}",
                l.emp_id,
                or_na(&l.leave_type),
                l.days.map_or_else(|| NA.to_string(), |d| d.to_string()),
                or_na(&l.status)
            ),
        };
    }

    pub fn hr_query_prompt(query: &str, docs: &[Document], policy_context: &str) -> String {
        let mut parts = Vec::with_capacity(docs.len());
        for (i, doc) in docs.iter().enumerate() {
            let mut text = format!("--- Document {} ---\n", i + 1);
            Self::format_record(&mut text, &doc.record);
            if let Some(full) = doc.embedding_text.as_deref() {
                let _ = writeln!(text, "\nFull Details: {full}");
            }
            parts.push(text);
        }
        let mut context = parts.join("\n");
        if !policy_context.is_empty() {
            context = format!("HR POLICIES:\n{policy_context}\n\nRELEVANT DATA:\n{context}");
        }
        format!(
            "You are an intelligent HR assistant for Helix Global Corp. Answer the following question based on the provided context.

{context}

Question: {query}

Instructions:
- Provide a clear, accurate, and professional answer
- Base your answer strictly on the provided context
- If you reference specific data, mention which document it came from
- If the context doesn't contain enough information, clearly state what's missing
- For policy questions, cite the specific policy sections
- For employee data questions, provide specific details from the records

Answer:"
        )
    }

    /// Numbered source list for display under an answer.
    pub fn format_source_references(sources: &[Document]) -> String {
        if sources.is_empty() { return "No source documents found.".to_string(); }
        let mut refs = vec!["Sources:".to_string()];
        for (i, doc) in sources.iter().enumerate() {
            let label = match &doc.record {
                Record::Employee(e) => format!("Employee {} ({})", e.emp_id, e.name),
                other => format!("Employee {}", other.emp_id()),
            };
            refs.push(format!("{}. {label}", i + 1));
        }
        refs.join("\n")
    }
}
