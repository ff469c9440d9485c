//! Rendering accepted candidates into a prompt-ready context block.

use crate::document::Candidate;

/// Marker placed before each candidate's content.
pub const BULLET: &str = "• ";

/// Join candidate contents, one bulleted line each, in input order.
///
/// Callers only invoke this for candidate sets the confidence gate accepted,
/// which are never empty.
pub fn assemble(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|candidate| format!("{BULLET}{}", candidate.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User-role message for a grounded answer.
pub fn grounded_user_message(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion:\n{question}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bullet_line_per_candidate_in_order() {
        let candidates = vec![
            Candidate::new("parking", "Free on-site parking is available.", 0.2),
            Candidate::new("valet", "Valet service runs 7am to 11pm.", 0.4),
        ];
        assert_eq!(
            assemble(&candidates),
            "• Free on-site parking is available.\n• Valet service runs 7am to 11pm."
        );
    }

    #[test]
    fn grounded_message_layout() {
        let message = grounded_user_message("• Pets welcome.", "Can I bring my dog?");
        assert_eq!(message, "Context:\n• Pets welcome.\n\nQuestion:\nCan I bring my dog?");
    }
}
