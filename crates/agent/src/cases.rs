//! Ticket chunks to similar cases.

use crate::answer::SimilarCase;
use copilot_knowledge::EvidenceChunk;

const CUSTOMER_PREFIX: &str = "Customer: ";
const SUPPORT_PREFIX: &str = "Support: ";

/// Convert ticket chunks into similar cases, preserving order.
///
/// The first line of a ticket is the customer message and the second the
/// support reply; missing lines become empty strings.
pub fn to_cases(ticket_chunks: &[EvidenceChunk]) -> Vec<SimilarCase> {
    ticket_chunks
        .iter()
        .map(|chunk| {
            let mut lines = chunk.content.lines();
            let customer = lines.next().unwrap_or_default();
            let support = lines.next().unwrap_or_default();

            SimilarCase {
                row_id: chunk.chunk_id,
                customer_text: strip_label(customer, CUSTOMER_PREFIX),
                support_text: strip_label(support, SUPPORT_PREFIX),
            }
        })
        .collect()
}

fn strip_label(line: &str, label: &str) -> String {
    line.strip_prefix(label).unwrap_or(line).to_string()
}
