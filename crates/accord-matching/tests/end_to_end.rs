//! End-to-end matching of contract interactions.

use accord_matching::features::{self, Feature};
use accord_matching::{
    match_message, match_request, match_response, Category, DocPath, HttpRequest, HttpResponse,
    MatchingConfig, Message, MismatchKind,
};
use serde_json::{json, Value};
use serial_test::serial;

fn response(value: Value) -> HttpResponse {
    serde_json::from_value(value).unwrap()
}

fn request(value: Value) -> HttpRequest {
    serde_json::from_value(value).unwrap()
}

fn message(value: Value) -> Message {
    serde_json::from_value(value).unwrap()
}

fn typed_list_contract() -> HttpResponse {
    response(json!({
        "status": 200,
        "body": {"a": "matched-by-type:string", "list": [1, 2, 3]},
        "matchingRules": {
            "body": {
                "$.a": {"matchers": [{"match": "type"}]},
                "$.list": {"matchers": [{"match": "eachValue", "rules": [{"match": "type"}]}]}
            }
        }
    }))
}

#[test]
#[serial]
fn test_type_and_each_value_rules_accept_conforming_body() {
    let expected = typed_list_contract();
    let actual = response(json!({"status": 200, "body": {"a": "hello", "list": [9, 8, 7]}}));

    let result = match_response(&expected, &actual, &MatchingConfig::default());
    assert!(result.all_matched(), "{:?}", result);
}

#[test]
#[serial]
fn test_type_rule_reports_single_mismatch() {
    let expected = typed_list_contract();
    let actual = response(json!({"status": 200, "body": {"a": 5, "list": [9, 8, 7]}}));

    let result = match_response(&expected, &actual, &MatchingConfig::default());
    assert_eq!(result.mismatch_count(), 1);
    let mismatch = &result.for_category(Category::Body)[0];
    assert_eq!(mismatch.path, DocPath::root().field("a"));
    assert_eq!(mismatch.path.to_string(), "$.a");
    assert_eq!(mismatch.kind, MismatchKind::Body);
}

#[test]
#[serial]
fn test_each_value_rejects_wrong_element_type() {
    let expected = typed_list_contract();
    let actual = response(json!({"status": 200, "body": {"a": "x", "list": [9, "eight", 7]}}));

    let result = match_response(&expected, &actual, &MatchingConfig::default());
    let mismatches = result.for_category(Category::Body);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].path.to_string(), "$.list[1]");
}

#[test]
#[serial]
fn test_response_status_headers_and_body() {
    let expected = response(json!({
        "status": 200,
        "headers": {"Content-Type": "application/json"},
        "body": {"id": 1, "name": "widget"},
        "matchingRules": {
            "status": {"matchers": [{"match": "statusCode", "status": "success"}]},
            "body": {"$.id": {"matchers": [{"match": "integer"}]}}
        }
    }));

    let actual = response(json!({
        "status": 201,
        "headers": {"content-type": "application/json; charset=utf-8", "X-Trace": "abc"},
        "body": {"id": 42, "name": "widget", "extra": true}
    }));
    let result = match_response(&expected, &actual, &MatchingConfig::default());
    assert!(result.all_matched(), "{:?}", result);

    let actual = response(json!({
        "status": 500,
        "headers": {"Content-Type": "application/json"},
        "body": {"id": "1", "name": "widget"}
    }));
    let result = match_response(&expected, &actual, &MatchingConfig::default());
    assert_eq!(result.for_category(Category::Status).len(), 1);
    assert_eq!(result.for_category(Category::Body).len(), 1);
    assert!(result.for_category(Category::Header).is_empty());
}

#[test]
#[serial]
fn test_request_rejects_unexpected_keys_by_default() {
    let expected = request(json!({
        "method": "POST",
        "path": "/orders",
        "headers": {"Content-Type": "application/json"},
        "body": {"item": "book"}
    }));
    let actual = request(json!({
        "method": "post",
        "path": "/orders",
        "headers": {"Content-Type": "application/json"},
        "body": {"item": "book", "coupon": "FREE"}
    }));

    let result = match_request(&expected, &actual, &MatchingConfig::default());
    assert_eq!(result.mismatch_count(), 1);
    assert!(result.for_category(Category::Method).is_empty());

    let config = MatchingConfig {
        allow_unexpected_keys: Some(true),
        ..MatchingConfig::default()
    };
    assert!(match_request(&expected, &actual, &config).all_matched());
}

#[test]
#[serial]
fn test_request_query_and_path_rules() {
    let expected = request(json!({
        "method": "GET",
        "path": "/orders/1",
        "query": {"page": ["1"]},
        "matchingRules": {
            "path": {"matchers": [{"match": "regex", "regex": "/orders/\\d+"}]},
            "query": {"page": {"matchers": [{"match": "regex", "regex": "\\d+"}]}}
        }
    }));

    let actual = request(json!({
        "method": "GET",
        "path": "/orders/77",
        "query": "page=3"
    }));
    assert!(match_request(&expected, &actual, &MatchingConfig::default()).all_matched());

    let actual = request(json!({
        "method": "GET",
        "path": "/orders/abc",
        "query": "page=3&debug=true"
    }));
    let result = match_request(&expected, &actual, &MatchingConfig::default());
    assert_eq!(result.for_category(Category::Path).len(), 1);
    let query = result.for_category(Category::Query);
    assert_eq!(query.len(), 1);
    assert_eq!(query[0].path.to_string(), "debug");
}

#[test]
#[serial]
fn test_ignore_order_with_permuted_actual() {
    let expected = response(json!({
        "body": {"items": [{"id": 1}, {"id": 2}, {"id": 3}]},
        "matchingRules": {"body": {"$.items": {"matchers": [{"match": "ignore-order"}]}}}
    }));
    let actual = response(json!({"body": {"items": [{"id": 3}, {"id": 1}, {"id": 2}]}}));
    assert!(match_response(&expected, &actual, &MatchingConfig::default()).all_matched());

    let actual = response(json!({"body": {"items": [{"id": 3}, {"id": 9}, {"id": 2}]}}));
    let result = match_response(&expected, &actual, &MatchingConfig::default());
    let mismatches = result.for_category(Category::Body);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].path.to_string(), "$.items[1].id");
}

#[test]
#[serial]
fn test_values_rule_follows_toggle() {
    let expected = response(json!({
        "body": {"prices": {"apple": 1.5}},
        "matchingRules": {"body": {"$.prices": {"matchers": [{"match": "values"}]}}}
    }));
    let actual = response(json!({"body": {"prices": {"pear": 2.5, "plum": 0.5}}}));

    features::reset();
    assert!(!match_response(&expected, &actual, &MatchingConfig::default()).all_matched());

    let mut config = MatchingConfig::default();
    config
        .features
        .insert(Feature::UseValuesMatcher.name().to_string(), true);
    config.install_features().unwrap();
    let result = match_response(&expected, &actual, &config);
    features::reset();
    assert!(result.all_matched(), "{:?}", result);
}

#[test]
#[serial]
fn test_message_contents_and_metadata() {
    let expected = message(json!({
        "contents": {"orderId": 10, "status": "NEW"},
        "metadata": {"contentType": "application/json", "topic": "orders"},
        "matchingRules": {
            "body": {"$.orderId": {"matchers": [{"match": "type"}]}},
            "metadata": {"topic": {"matchers": [{"match": "regex", "regex": "orders(-.*)?"}]}}
        }
    }));

    let actual = message(json!({
        "contents": {"orderId": 99, "status": "NEW"},
        "metadata": {"topic": "orders-eu"}
    }));
    assert!(match_message(&expected, &actual, &MatchingConfig::default()).all_matched());

    let actual = message(json!({
        "contents": {"orderId": 99, "status": "SHIPPED"},
        "metadata": {"topic": "payments"}
    }));
    let result = match_message(&expected, &actual, &MatchingConfig::default());
    assert_eq!(result.for_category(Category::Content).len(), 1);
    assert_eq!(result.for_category(Category::Metadata).len(), 1);
}

#[test]
#[serial]
fn test_body_type_mismatch() {
    let expected = response(json!({
        "headers": {"Content-Type": "application/json"},
        "body": {"a": 1}
    }));
    let actual = response(json!({
        "headers": {"Content-Type": "text/html"},
        "body": "<html></html>"
    }));
    let result = match_response(&expected, &actual, &MatchingConfig::default());
    let mismatches = result.for_category(Category::Body);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].kind, MismatchKind::BodyType);
}

#[test]
#[serial]
fn test_mismatches_serialize_for_reports() {
    let expected = typed_list_contract();
    let actual = response(json!({"status": 200, "body": {"a": 5, "list": [9]}}));
    let result = match_response(&expected, &actual, &MatchingConfig::default());
    let report = serde_json::to_value(&result).unwrap();
    let body = report["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["category"] == "body")
        .unwrap();
    assert_eq!(body["mismatches"][0]["path"], "$.a");
    assert_eq!(body["mismatches"][0]["kind"], "body");
}
