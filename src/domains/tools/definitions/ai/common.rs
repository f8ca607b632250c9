//! Prompt assembly and rendering shared by the AI tools.

use tracing::debug;

use crate::domains::providers::InferenceProvider;
use crate::domains::tools::ToolError;
use crate::domains::tools::format::clip_context;

pub const SYSTEM_PROMPT: &str = "You are a helpful financial analyst assistant. Provide concise, data-driven insights based on the provided portfolio and stock data.";

/// `question` echoed in structured output when the caller asked none.
pub const GENERAL_ANALYSIS: &str = "General analysis";

/// Build the user message from a context summary.
///
/// With a question, the model answers it; without one it follows the tool's
/// default `instructions`.
pub fn build_prompt(context: &str, question: Option<&str>, instructions: &str) -> String {
    match question {
        Some(question) => format!(
            "Here is the data:\n\n{context}\n\nQuestion: {question}\n\nProvide a concise, data-driven answer."
        ),
        None => format!("{context}\n\n{instructions}"),
    }
}

/// Clip the context, run one completion and return the trimmed answer.
pub async fn run_analysis(
    inference: &dyn InferenceProvider,
    context: String,
    question: Option<&str>,
    instructions: &str,
) -> Result<String, ToolError> {
    let context = clip_context(context);
    let prompt = build_prompt(&context, question, instructions);
    debug!("Sending {} character prompt", prompt.len());
    let answer = inference.complete(SYSTEM_PROMPT, &prompt).await?;
    Ok(answer.trim().to_string())
}

/// `# <title>` page with the question, the analysis and a one-line footer.
pub fn analysis_markdown(title: &str, question: Option<&str>, analysis: &str, footer: &str) -> String {
    let mut lines = vec![format!("# {title}"), String::new()];
    if let Some(question) = question {
        lines.push(format!("**Question**: {question}"));
        lines.push(String::new());
    }
    lines.push("## Analysis".to_string());
    lines.push(String::new());
    lines.push(analysis.to_string());
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(format!("*{footer}*"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::providers::fake::FakeInference;
    use crate::domains::tools::format::CONTEXT_LIMIT;

    #[test]
    fn test_prompt_with_and_without_question() {
        let with = build_prompt("CTX", Some("Is it cheap?"), "Do things");
        assert!(with.contains("CTX"));
        assert!(with.contains("Question: Is it cheap?"));
        assert!(!with.contains("Do things"));

        let without = build_prompt("CTX", None, "Do things");
        assert_eq!(without, "CTX\n\nDo things");
    }

    #[tokio::test]
    async fn test_context_is_bounded() {
        let inference = FakeInference::replying("  answer \n");
        let answer = run_analysis(&inference, "z".repeat(CONTEXT_LIMIT * 3), None, "Go")
            .await
            .unwrap();
        assert_eq!(answer, "answer");

        let prompt = &inference.prompts()[0];
        assert_eq!(prompt.matches('z').count(), CONTEXT_LIMIT);
    }

    #[test]
    fn test_markdown_layout() {
        let text = analysis_markdown("AI Analysis: X", None, "Fine.", "Based on 3 holdings");
        assert!(text.starts_with("# AI Analysis: X\n\n## Analysis\n\nFine."));
        assert!(text.ends_with("---\n*Based on 3 holdings*"));
    }
}
