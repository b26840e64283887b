//! Prompt templates for Primer.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for answering a question from retrieved context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Rendered with `{{context}}` and `{{question}}`.
    pub template: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            template: r#"
You are a helpful AI assistant helping a student understand the material.
Use the following context (from a YouTube video or PDF) to answer the question.
If the context does not contain enough information, say so clearly and do NOT invent or guess.

When answering:
- Avoid repeating words, sentences, or phrases from the context unless necessary.
- Avoid restating the question.
- Do not repeat information already provided.
- Do not hallucinate or introduce details not supported by the context.
- Keep the answer concise, focused, and accurate.

Context:
{{context}}

Question: {{question}}

Helpful Answer:
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Each `{{name}}` in the template is substituted once; inserted values are
    /// never scanned for further placeholders. Unknown names are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            match after.find("}}").and_then(|end| vars.get(&after[..end]).map(|v| (end, v))) {
                Some((end, value)) => {
                    result.push_str(value);
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_has_placeholders() {
        let prompts = Prompts::default();
        assert!(prompts.rag.template.contains("{{context}}"));
        assert!(prompts.rag.template.contains("{{question}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inserted_values() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "what is {{context}}?".to_string());
        vars.insert("context".to_string(), "CTX mentions {{question}}".to_string());

        let result = Prompts::render("C: {{context}}\nQ: {{question}}", &vars);
        assert_eq!(result, "C: CTX mentions {{question}}\nQ: what is {{context}}?");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Ada".to_string());

        assert_eq!(
            Prompts::render("{{greeting}} {{name}} {{ {{name}}}", &vars),
            "{{greeting}} Ada {{ Ada}"
        );
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("course".to_string(), "Physics 101".to_string());
        custom.insert("question".to_string(), "ignored".to_string());

        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is inertia?".to_string());

        let rendered = prompts.render_with_custom("{{course}}: {{question}}", &vars);
        assert_eq!(rendered, "Physics 101: What is inertia?");
    }

    #[test]
    fn test_load_custom_rag_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "template = \"Q: {{question}}\\nC: {{context}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.template, "Q: {{question}}\nC: {{context}}");
    }
}
