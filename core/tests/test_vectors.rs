//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed values (not raw strings)
//! avoids false negatives from field-ordering differences.

use taskboard_core::{Filters, HttpMethod, HttpResponse, TaskPage, TaskboardClient};

const BASE_URL: &str = "http://localhost:5000";

fn client() -> TaskboardClient {
    TaskboardClient::new(BASE_URL)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

// ---------------------------------------------------------------------------
// List tasks
// ---------------------------------------------------------------------------

#[test]
fn list_tasks_test_vectors() {
    let raw = include_str!("../../test-vectors/list_tasks.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let filters: Filters = pairs(&case["filters"]).into_iter().collect();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_list_tasks(&filters);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert_eq!(req.query, pairs(&expected_req["query"]), "{name}: query");
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        let page = c.parse_list_tasks(simulated(case)).unwrap();
        let expected: TaskPage = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(page, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Error normalization
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = case["expected_message"].as_str().unwrap();

        // Every parser shares the same normalization.
        let via_login = c.parse_login(simulated(case)).unwrap_err();
        let via_list = c.parse_list_tasks(simulated(case)).unwrap_err();
        let via_delete = c.parse_delete_task(simulated(case)).unwrap_err();

        for err in [via_login, via_list, via_delete] {
            assert_eq!(err.to_string(), expected, "{name}");
            assert_eq!(err.status(), case["simulated_response"]["status"].as_u64().map(|s| s as u16), "{name}");
        }
    }
}
