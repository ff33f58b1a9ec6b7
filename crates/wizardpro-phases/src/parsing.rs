//! Best-effort extraction of structured data from model output
//!
//! Nothing here fails: when the expected shape is absent the caller gets an
//! empty map or `None` and decides how to degrade.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// `# File: path` (or `// File:`, `-- File:`, `--- File:`) followed by a fenced block
static FILE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims)^(?:[#/-]+\s*File:|--- File:)\s*([\w/.\-]+)\s*\n```(?:\w+)?\s*\n(.*?)\n```")
        .expect("static regex")
});

static SIMPLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(\w+)?\s*\n(.*?)\n```").expect("static regex"));

static YAML_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```yaml\s*(.*?)\s*```").expect("static regex"));

/// Fenced blocks labelled with a file path, keyed by path.
///
/// The first block for a path wins; later duplicates are ignored.
#[must_use]
pub fn file_blocks(text: &str) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    for caps in FILE_BLOCK.captures_iter(text) {
        let path = caps[1].trim().to_string();
        if files.contains_key(&path) {
            warn!(path = %path, "Multiple blocks for file; using the first");
            continue;
        }
        debug!(path = %path, "Parsed file block");
        files.insert(path, caps[2].trim().to_string());
    }
    files
}

/// Unlabelled fenced blocks keyed by lowercased language tag (`unknown`
/// when absent). The first block per language wins.
#[must_use]
pub fn simple_blocks(text: &str) -> BTreeMap<String, String> {
    let mut blocks = BTreeMap::new();
    for caps in SIMPLE_BLOCK.captures_iter(text) {
        let lang = caps
            .get(1)
            .map_or_else(|| "unknown".to_string(), |m| m.as_str().to_lowercase());
        blocks
            .entry(lang)
            .or_insert_with(|| caps[2].trim().to_string());
    }
    blocks
}

/// First ```` ```yaml ```` block, parsed into JSON values.
///
/// Returns `None` when there is no block or it is not valid YAML.
#[must_use]
pub fn yaml_block(text: &str) -> Option<serde_json::Value> {
    let Some(caps) = YAML_BLOCK.captures(text) else {
        debug!("No YAML block in output");
        return None;
    };
    match serde_yaml::from_str::<serde_json::Value>(&caps[1]) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "YAML block did not parse");
            None
        }
    }
}

/// Remove a surrounding ```` ```json ```` fence, if any
#[must_use]
pub fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```json") {
        Some(inner) => inner.strip_suffix("```").unwrap_or(inner).trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_blocks_with_various_markers() {
        let text = "\
Here is the project.

# File: src/app.py
```python
print('hi')
```

// File: web/index.js
```
console.log(1);
```

--- File: README.md
```markdown
# Demo
```
";
        let files = file_blocks(text);
        assert_eq!(files.len(), 3);
        assert_eq!(files["src/app.py"], "print('hi')");
        assert_eq!(files["web/index.js"], "console.log(1);");
        assert_eq!(files["README.md"], "# Demo");
    }

    #[test]
    fn test_file_blocks_first_occurrence_wins() {
        let text = "# File: a.py\n```python\nfirst\n```\n# File: a.py\n```python\nsecond\n```\n";
        let files = file_blocks(text);
        assert_eq!(files.len(), 1);
        assert_eq!(files["a.py"], "first");
    }

    #[test]
    fn test_file_marker_must_start_a_line() {
        let text = "see # File: a.py\n```python\nx\n```\n";
        assert!(file_blocks(text).is_empty());
    }

    #[test]
    fn test_simple_blocks_keyed_by_language() {
        let text = "```Python\nprint(1)\n```\n\n```\nplain\n```\n\n```python\nignored\n```\n";
        let blocks = simple_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks["python"], "print(1)");
        assert_eq!(blocks["unknown"], "plain");
    }

    #[test]
    fn test_yaml_block_parses_mapping() {
        let text = "Results:\n```yaml\ntest_results:\n  - name: login\n    result: pass\nbugs_found: []\n```\n";
        let value = yaml_block(text).unwrap();
        assert_eq!(
            value,
            json!({"test_results": [{"name": "login", "result": "pass"}], "bugs_found": []})
        );
    }

    #[test]
    fn test_yaml_block_missing_or_invalid() {
        assert!(yaml_block("no fences here").is_none());
        assert!(yaml_block("```yaml\nkey: [unclosed\n```").is_none());
    }

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_json_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fence("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_json_fence("```json\n{}"), "{}");
    }
}
