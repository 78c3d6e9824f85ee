//! Prompt assembly
//!
//! The template encodes the topic restriction as instructions to the model.
//! It is a soft constraint; [`crate::policy`] is the textual safety net.

use mzp_core::{RetrievedPassage, REFUSAL_MESSAGE};

/// Fixed prompt with `{context}` and `{question}` placeholders
pub const ASSISTANT_PROMPT_TEMPLATE: &str = r#"
You are a highly professional AI chatbot for the Mizoram Police Department. Your responsibility is to assist citizens with accurate and reliable information while maintaining confidentiality, professionalism, and clarity.

### **Guidelines for Responses:**
- **Only answer questions related to police, law enforcement, legal rights, and public safety.**
- **If the question is unrelated (e.g., about technology, sports, entertainment, politics etc.), firmly respond:**
  "{refusal}"
- **Never speculate, fabricate, or provide unauthorized legal advice.**  
- **If you are unsure, suggest contacting Mizoram Police directly.**

### **Context (if available):**
{context}  

### **Citizen's Question:**
{question}  

### **AI Response:**
"#;

/// Fills the template in a single pass
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The built-in Mizoram Police template
    pub fn assistant() -> Self {
        Self::new(ASSISTANT_PROMPT_TEMPLATE)
    }

    /// Render with the given context and question.
    ///
    /// Placeholders are only recognised in the template itself, so braces
    /// inside the question or passages are copied through untouched.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open..];

            let Some(close) = after.find('}') else {
                out.push_str(after);
                return out;
            };

            match &after[1..close] {
                "context" => out.push_str(context),
                "question" => out.push_str(question),
                "refusal" => out.push_str(REFUSAL_MESSAGE),
                _ => out.push_str(&after[..=close]),
            }
            rest = &after[close + 1..];
        }

        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::assistant()
    }
}

/// Concatenate passage contents separated by a blank line
pub fn build_context(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let prompt = PromptTemplate::assistant().render("Section 50 CrPC", "Can I know why I am arrested?");

        assert!(prompt.contains("### **Context (if available):**\nSection 50 CrPC  \n"));
        assert!(prompt.contains("### **Citizen's Question:**\nCan I know why I am arrested?  \n"));
        assert!(prompt.trim_end().ends_with("### **AI Response:**"));
        assert!(prompt.contains(REFUSAL_MESSAGE));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_template_carries_topic_restriction() {
        let prompt = PromptTemplate::assistant().render("", "q");

        assert!(prompt.contains(
            "You are a highly professional AI chatbot for the Mizoram Police Department."
        ));
        assert!(prompt.contains(
            "- **Only answer questions related to police, law enforcement, legal rights, and public safety.**"
        ));
        assert!(prompt.contains(
            "(e.g., about technology, sports, entertainment, politics etc.), firmly respond:**"
        ));
        assert!(prompt.contains(&format!("  \"{REFUSAL_MESSAGE}\"\n")));
        assert!(prompt.contains("- **Never speculate, fabricate, or provide unauthorized legal advice.**"));
        assert!(prompt.contains("- **If you are unsure, suggest contacting Mizoram Police directly.**"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = PromptTemplate::assistant();
        assert_eq!(template.render("c", "q"), template.render("c", "q"));
    }

    #[test]
    fn test_user_braces_not_expanded() {
        let prompt = PromptTemplate::new("C={context} Q={question}").render("{question}", "{context}?");
        assert_eq!(prompt, "C={question} Q={context}?");
    }

    #[test]
    fn test_unknown_and_unclosed_braces_kept() {
        let template = PromptTemplate::new("{other} {question} {");
        assert_eq!(template.render("", "q"), "{other} q {");
    }

    #[test]
    fn test_build_context_joins_passages() {
        let passages = vec![
            RetrievedPassage::new("First passage", 0.9),
            RetrievedPassage::new("Second passage", 0.5),
        ];
        assert_eq!(build_context(&passages), "First passage\n\nSecond passage");
        assert_eq!(build_context(&[]), "");
    }
}
