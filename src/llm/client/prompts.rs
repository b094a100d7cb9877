//! Default LLM prompts for proposal extraction.

/// Default prompt for extracting proposals from a reply.
///
/// `{subject}` names the kind of entity wanted (e.g. "ministers"); the model
/// must answer with the literal `None` when the reply proposes nothing.
pub const DEFAULT_PROPOSALS_PROMPT: &str = r#"Extract the list of {subject} mentioned in the text below, following these rules:
1. Use full names.
2. Separate each name with the | character.
3. If no proposal is found anywhere in the text, answer only: None

Respond with ONLY the names or None. No formatting or preamble.

Text:
{content}"#;
