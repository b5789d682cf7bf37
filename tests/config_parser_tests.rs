//! Agent definition parsing tests
//!
//! Covers the frontmatter formats agent authors actually write: comma
//! separated and YAML list tools, folded descriptions, comments, quoted
//! strings and unknown extra keys.

use cyro::agents::config::{parse, parse_file, DEFAULT_VERSION};
use cyro::{AgentConfig, CyroError, OutputSchema};
use rstest::rstest;
use schemars::JsonSchema;
use serde::Deserialize;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Deserialize, JsonSchema)]
#[allow(dead_code)]
struct MockResult {
    answer: String,
    confidence: f64,
}

#[test]
fn test_valid_frontmatter_parsing() {
    let content = r#"---
name: test-agent
description: A test agent for unit testing
version: 2.0
tools: filesystem, git, web
---

You are a test agent. Your role is to help with testing and validation tasks.

## Instructions
- Follow test protocols
- Validate inputs carefully
- Provide clear feedback
"#;

    let config = AgentConfig::from_markdown(content, None).unwrap();

    assert_eq!(config.metadata.name(), "test-agent");
    assert_eq!(config.metadata.description(), "A test agent for unit testing");
    assert_eq!(config.metadata.version(), "2.0");
    assert_eq!(
        config.tools,
        Some(vec!["filesystem".into(), "git".into(), "web".into()])
    );
    assert!(config.system_prompt.starts_with("You are a test agent"));
    assert!(config.system_prompt.contains("## Instructions"));
    assert!(config.system_prompt.ends_with("Provide clear feedback"));
}

#[test]
fn test_minimal_definition() {
    let content = "---\nname: minimal-agent\ndescription: Minimal test agent\n---\n\nBasic system prompt content.";

    let config = AgentConfig::from_markdown(content, None).unwrap();

    assert_eq!(config.metadata.name(), "minimal-agent");
    assert_eq!(config.metadata.description(), "Minimal test agent");
    assert_eq!(config.metadata.version(), DEFAULT_VERSION);
    assert_eq!(config.tools, None);
    assert_eq!(config.system_prompt, "Basic system prompt content.");
    assert_eq!(config.color, None);
    assert_eq!(config.model, None);
    assert_eq!(config.instructions, None);
}

#[rstest]
#[case("---\ndescription: Agent without name\n---\n\nSystem prompt.", "name")]
#[case("---\nname: no-description-agent\n---\n\nSystem prompt.", "description")]
#[case("---\ntools: web\n---\n\nSystem prompt.", "name")]
fn test_missing_required_field(#[case] content: &str, #[case] field: &str) {
    match parse(content, None) {
        Err(CyroError::MissingField(missing)) => assert_eq!(missing, field),
        other => panic!("expected MissingField({field}), got {other:?}"),
    }
}

#[rstest]
#[case("# Not YAML frontmatter\n\nThis doesn't have proper frontmatter.")]
#[case("")]
#[case("---\nname: unterminated\ndescription: never closed\n")]
#[case("  ---\nname: indented\ndescription: x\n---\nbody")]
fn test_missing_frontmatter_is_malformed(#[case] content: &str) {
    assert!(matches!(
        parse(content, None),
        Err(CyroError::MalformedDocument(_))
    ));
}

#[test]
fn test_invalid_yaml_is_syntax_error() {
    let content = "---\nname: invalid-yaml-agent\ndescription: Agent with invalid YAML\ntools: [unclosed list\ninvalid_syntax: }\n---\n\nSystem prompt.";

    let err = parse(content, None).unwrap_err();
    assert!(matches!(err, CyroError::FrontmatterSyntax(_)));
    assert!(err.to_string().starts_with("Invalid YAML frontmatter"));
}

#[rstest]
#[case("tools: ", None)]
#[case("tools: filesystem", Some(vec!["filesystem"]))]
#[case("tools: filesystem , git,  web  , execution", Some(vec!["filesystem", "git", "web", "execution"]))]
#[case("tools: \"filesystem, git: advanced\"", Some(vec!["filesystem", "git: advanced"]))]
#[case("tools: [filesystem, git]", Some(vec!["filesystem", "git"]))]
#[case("tools:\n  - filesystem\n  - git\n  - web", Some(vec!["filesystem", "git", "web"]))]
#[case("tools: a,,b,", Some(vec!["a", "b"]))]
fn test_tools_normalization(#[case] line: &str, #[case] expected: Option<Vec<&str>>) {
    let content = format!("---\nname: tools-agent\ndescription: d\n{}\n---\n\nSystem prompt.", line);

    let config = parse(&content, None).unwrap();
    let expected = expected.map(|v| v.into_iter().map(String::from).collect::<Vec<_>>());
    assert_eq!(config.tools, expected);
}

#[test]
fn test_result_type_is_attached() {
    let content = "---\nname: typed-agent\ndescription: Agent with result type\n---\n\nSystem prompt.";

    let config = parse(content, Some(OutputSchema::of::<MockResult>())).unwrap();

    let schema = config.result_type.unwrap();
    assert_eq!(schema.name, "MockResult");
    assert!(schema.schema["properties"]["confidence"].is_object());
    assert_eq!(config.metadata.name(), "typed-agent");
}

#[test]
fn test_bytes_input() {
    let content: &[u8] =
        b"---\nname: bytes-agent\ndescription: Agent from bytes input\n---\n\nSystem prompt from bytes.";

    let config = parse(content, None).unwrap();

    assert_eq!(config.metadata.name(), "bytes-agent");
    assert_eq!(config.system_prompt, "System prompt from bytes.");
}

#[test]
fn test_multiline_system_prompt() {
    let content = r#"---
name: multiline-agent
description: Agent with multiline prompt
---

You are a specialized agent with multiple responsibilities:

1. **Primary Function**: Handle complex analysis tasks
2. **Secondary Function**: Provide detailed explanations
3. **Constraints**:
   - Always validate inputs
   - Provide structured responses

## Examples

- Question: "How do I optimize this?"
- Answer: "First analyze the current state..."

Remember to be thorough and accurate."#;

    let prompt = parse(content, None).unwrap().system_prompt;

    assert!(prompt.starts_with("You are a specialized agent"));
    assert!(prompt.contains("**Primary Function**"));
    assert!(prompt.contains("   - Always validate inputs"));
    assert!(prompt.contains("## Examples"));
    assert!(prompt.ends_with("Remember to be thorough and accurate."));
}

#[test]
fn test_empty_body_is_accepted() {
    let config = parse("---\nname: quiet\ndescription: no prompt\n---\n", None).unwrap();
    assert_eq!(config.system_prompt, "");
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::with_suffix(".md").unwrap();
    write!(
        file,
        "---\nname: file-agent\ndescription: Agent loaded from file\n---\n\nFile-based system prompt."
    )
    .unwrap();

    let config = AgentConfig::from_file(file.path(), Some(OutputSchema::of::<MockResult>())).unwrap();

    assert_eq!(config.metadata.name(), "file-agent");
    assert_eq!(config.system_prompt, "File-based system prompt.");
    assert!(config.result_type.is_some());
}

#[test]
fn test_from_file_nonexistent_path() {
    let path = std::path::Path::new("/nonexistent/path/agent.md");

    match parse_file(path, None) {
        Err(CyroError::FileNotFound(missing)) => assert_eq!(missing, path),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn test_extra_keys_are_ignored() {
    let content = r#"---
name: complex-agent
description: Agent with complex YAML values
version: 1.5
tools: filesystem, git, web, execution, search
custom_field: some_value
metadata:
  tags: [ai, coding, automation]
  settings:
    timeout: 30
    retries: 3
---

Complex agent system prompt with multiple sections."#;

    let config = parse(content, None).unwrap();

    assert_eq!(config.metadata.name(), "complex-agent");
    assert_eq!(config.metadata.version(), "1.5");
    let tools = config.tools.unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools.last().map(String::as_str), Some("search"));
}

#[test]
fn test_folded_description() {
    let content = r#"---
name: multiline-yaml-agent
description: >
  This is a multiline description
  that spans multiple lines
tools:
  - filesystem
  - git
custom_config:
  key2: "value with: colon"
---

System prompt content."#;

    let config = parse(content, None).unwrap();

    assert_eq!(
        config.metadata.description(),
        "This is a multiline description that spans multiple lines\n"
    );
    assert_eq!(config.tools, Some(vec!["filesystem".into(), "git".into()]));
}

#[test]
fn test_quoted_strings_with_colons() {
    let content = "---\nname: quoted-agent\ndescription: \"Agent with: colons in description\"\n---\n\nSystem prompt.";

    let config = parse(content, None).unwrap();
    assert_eq!(
        config.metadata.description(),
        "Agent with: colons in description"
    );
}

#[test]
fn test_comments_and_special_chars() {
    let content = r#"---
# This is a comment
name: special-char-agent  # Agent with special chars
description: "Agent with émojis 🤖 and special chars: @#$%"
tools:
  - filesystem  # File operations
  - git        # Version control
version: "2.0"  # Updated version
---

System prompt with special chars: 你好世界"#;

    let config = parse(content, None).unwrap();

    assert_eq!(config.metadata.name(), "special-char-agent");
    assert!(config.metadata.description().contains("émojis 🤖"));
    assert_eq!(config.tools, Some(vec!["filesystem".into(), "git".into()]));
    assert_eq!(config.metadata.version(), "2.0");
    assert!(config.system_prompt.ends_with("你好世界"));
}

#[test]
fn test_optional_color_model_and_instructions() {
    let content = r#"---
name: colored-agent
description: Agent with color and model specified
color: blue
model: gpt-4
instructions: Keep answers short.
tools: [filesystem, git]
---

System prompt with color and model."#;

    let config = parse(content, None).unwrap();

    assert_eq!(config.color.as_deref(), Some("blue"));
    assert_eq!(config.model.as_deref(), Some("gpt-4"));
    assert_eq!(config.instructions.as_deref(), Some("Keep answers short."));
    assert_eq!(config.tools, Some(vec!["filesystem".into(), "git".into()]));
}

#[rstest]
#[case("0.9")]
#[case("1.10")]
#[case("v1.0")]
#[case("latest")]
fn test_bad_versions_are_rejected(#[case] version: &str) {
    let content = format!("---\nname: a\ndescription: b\nversion: \"{}\"\n---\n", version);
    assert!(matches!(
        parse(&content, None),
        Err(CyroError::InvalidMetadata(_))
    ));
}

#[test]
fn test_name_and_description_round_trip_exactly() {
    let content = "---\nname: \"  Mixed-Case Agent \"\ndescription: \"Keeps  spacing\"\n---\nx";
    let config = parse(content, None).unwrap();
    assert_eq!(config.metadata.name(), "  Mixed-Case Agent ");
    assert_eq!(config.metadata.description(), "Keeps  spacing");
}
