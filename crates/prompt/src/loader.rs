//! Prompt loader for YAML prompt definitions.
//!
//! Built-in definitions are compiled into the binary. A file named
//! `<id>.yml` under `.copilot/prompts/` in the workspace replaces the
//! built-in definition with the same id.

use crate::types::{PromptDefinition, PromptSource};
use copilot_core::config::STATE_DIR;
use copilot_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Prompt used by the answer generator.
pub const GENERATE_PROMPT_ID: &str = "support.generate";

/// Prompt used by the judge.
pub const JUDGE_PROMPT_ID: &str = "support.judge";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        GENERATE_PROMPT_ID,
        include_str!("../prompts/support.generate.yml"),
    ),
    (JUDGE_PROMPT_ID, include_str!("../prompts/support.judge.yml")),
];

/// Load a prompt definition by ID.
///
/// A workspace override wins over the built-in definition.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.copilot/`
/// * `prompt_id` - Prompt identifier (e.g., "support.generate")
///
/// # Example
/// ```no_run
/// use copilot_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (prompt, source) = load_prompt(Path::new("."), "support.judge")?;
/// println!("Loaded prompt: {} from {:?}", prompt.title, source);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(
    workspace_path: &Path,
    prompt_id: &str,
) -> AppResult<(PromptDefinition, PromptSource)> {
    let prompt_file = override_path(workspace_path, prompt_id);

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }

        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok((definition, PromptSource::Workspace));
    }

    let definition = builtin_prompt(prompt_id)?;
    tracing::debug!("Using built-in prompt: {}", definition.id);
    Ok((definition, PromptSource::Builtin))
}

/// Parse one of the compiled-in prompt definitions.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, contents) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_prompt(contents, &format!("built-in {}", prompt_id))
}

fn override_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(STATE_DIR)
        .join("prompts")
        .join(format!("{}.yml", prompt_id))
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.api_version.is_empty() {
        return Err(AppError::Prompt(
            "Prompt apiVersion cannot be empty".to_string(),
        ));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, content: &str) {
        let prompts_dir = dir.join(".copilot/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_builtin_prompts_parse() {
        let generate = builtin_prompt(GENERATE_PROMPT_ID).unwrap();
        assert!(generate.output.is_json());
        assert!(generate.system.unwrap().contains("CITE_KEY"));

        let judge = builtin_prompt(JUDGE_PROMPT_ID).unwrap();
        assert!(judge.template.contains("{{answer_json}}"));
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let (prompt, source) = load_prompt(temp_dir.path(), JUDGE_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, JUDGE_PROMPT_ID);
        assert_eq!(source, PromptSource::Builtin);
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            JUDGE_PROMPT_ID,
            r#"
id: support.judge
title: "Lenient judge"
apiVersion: "1.0"
template: "Q: {{question}}"
output:
  format: json
"#,
        );

        let (prompt, source) = load_prompt(temp_dir.path(), JUDGE_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Lenient judge");
        assert_eq!(source, PromptSource::Workspace);
    }

    #[test]
    fn test_override_id_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            GENERATE_PROMPT_ID,
            r#"
id: something.else
title: "Wrong"
apiVersion: "1.0"
template: "x"
output:
  format: text
"#,
        );

        let err = load_prompt(temp_dir.path(), GENERATE_PROMPT_ID).unwrap_err();
        assert!(err.to_string().contains("expected 'support.generate'"));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), GENERATE_PROMPT_ID, "invalid: yaml: content:");

        let result = load_prompt(temp_dir.path(), GENERATE_PROMPT_ID);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }
}
