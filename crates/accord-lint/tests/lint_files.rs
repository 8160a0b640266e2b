use accord_lint::{lint_directory, lint_file, lint_json, LintOptions};
use std::io::Write;
use tempfile::TempDir;

const VALID: &str = r#"{
  "consumer": {"name": "web"},
  "provider": {"name": "orders"},
  "interactions": [
    {
      "description": "fetch an order",
      "request": {"method": "GET", "path": "/orders/1"},
      "response": {
        "status": 200,
        "body": {"id": 1, "items": [{"sku": "A1"}]},
        "matchingRules": {
          "body": {
            "$.id": {"matchers": [{"match": "integer"}]},
            "$.items": {"matchers": [{"match": "type", "min": 1}]}
          }
        }
      }
    }
  ]
}"#;

const BROKEN: &str = r#"{
  "messages": [
    {
      "description": "order created",
      "contents": {"id": 1},
      "matchingRules": {
        "body": {"$.id": {"matchers": [{"match": "regex", "regex": "[0-9"}]}}
      }
    }
  ]
}"#;

fn write(dir: &TempDir, name: &str, content: &str) {
    let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

#[test]
fn test_valid_contract_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "orders.json", VALID);
    let result = lint_file(&dir.path().join("orders.json"), &LintOptions::default());
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    assert_eq!(result.files_checked, 1);
}

#[test]
fn test_directory_collects_issues_from_every_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a_valid.json", VALID);
    write(&dir, "b_broken.json", BROKEN);
    write(&dir, "notes.txt", "not a contract");

    let result = lint_directory(dir.path(), &LintOptions::default());
    assert_eq!(result.files_checked, 2);
    assert_eq!(result.errors, 1);
    assert_eq!(result.issues[0].code, "E009");
    assert_eq!(
        result.issues[0].location.as_deref(),
        Some("messages[0].matchingRules.body.$.id.matchers[0]")
    );
}

#[test]
fn test_invalid_json() {
    let result = lint_json("{not json", "inline.json", &LintOptions::default());
    assert_eq!(result.codes(), vec!["E002"]);
}

#[test]
fn test_missing_file() {
    let result = lint_file(std::path::Path::new("/no/such/contract.json"), &LintOptions::default());
    assert_eq!(result.codes(), vec!["E001"]);
}
