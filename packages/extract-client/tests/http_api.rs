//! HTTP transport against a mock search server.

use extract_client::{
    Clause, ClientConfig, Combine, ExtractApi, ExtractError, ExtractId, ExtractRequest,
    HttpExtractApi, PaginationStyle, RemoteState, SearchRequest,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> HttpExtractApi {
    HttpExtractApi::new(&ClientConfig::new(server.uri())).unwrap()
}

fn clause() -> Clause {
    Clause {
        combine: Some(Combine::And),
        ..Clause::new("Demographics", "sex", "Equals", "Male")
    }
}

#[tokio::test]
async fn test_search_posts_page_number_on_first_clause() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/extract/"))
        .and(body_json(json!([{
            "column": "Demographics",
            "field": "sex",
            "queryType": "Equals",
            "query": "Male",
            "combine": "and",
            "page_number": 2
        }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object_list": [{"id": 11}, {"id": 12}],
            "page_number": 2,
            "total_pages": 3,
            "has_next": true,
            "has_previous": true,
            "columns": ["id"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api(&server)
        .search(&SearchRequest::new(vec![clause()], 2))
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.page_number, Some(2));
    assert!(page.has_next_page());
    assert!(page.has_previous_page());
    assert_eq!(page.extra.get("columns"), Some(&json!(["id"])));
}

#[tokio::test]
async fn test_search_envelope_style() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/extract/"))
        .and(body_json(json!({
            "page": 1,
            "criteria": [{
                "column": "Demographics",
                "field": "sex",
                "queryType": "Equals",
                "query": "Male",
                "combine": "and"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object_list": []})))
        .expect(1)
        .mount(&server)
        .await;

    let request = SearchRequest::new(vec![clause()], 0).with_style(PaginationStyle::Envelope);
    let page = api(&server).search(&request).await.unwrap();

    assert!(page.is_empty());
}

#[tokio::test]
async fn test_submit_sends_json_strings() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/extract/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"extract_id": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ExtractRequest {
        criteria: serde_json::to_string(&[clause()]).unwrap(),
        data_slice: json!({"Demographics": ["sex"]}).to_string(),
    };
    let submitted = api(&server).submit_extract(&request).await.unwrap();
    assert_eq!(submitted.extract_id, Some(ExtractId::from("abc123")));

    let received = server.received_requests().await.unwrap();
    let body: Value = received[0].body_json().unwrap();
    let criteria: Value = serde_json::from_str(body["criteria"].as_str().unwrap()).unwrap();
    let data_slice: Value = serde_json::from_str(body["data_slice"].as_str().unwrap()).unwrap();

    assert_eq!(criteria[0]["queryType"], "Equals");
    assert_eq!(criteria[0]["combine"], "and");
    assert_eq!(data_slice, json!({"Demographics": ["sex"]}));
}

#[tokio::test]
async fn test_submit_without_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/extract/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let request = ExtractRequest {
        criteria: "[]".into(),
        data_slice: "{}".into(),
    };
    let submitted = api(&server).submit_extract(&request).await.unwrap();
    assert!(submitted.extract_id.is_none());
}

#[tokio::test]
async fn test_status_and_download() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/extract/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "SUCCESS"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/extract/download/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id,sex\n1,Male\n".to_vec()))
        .mount(&server)
        .await;

    let api = api(&server);
    let id = ExtractId::from("abc123");

    let status = api.extract_status(&id).await.unwrap();
    assert_eq!(status.state, RemoteState::Success);

    let artifact = api.download_extract(&id).await.unwrap();
    assert_eq!(&artifact[..], b"id,sex\n1,Male\n");
    assert_eq!(
        api.download_url(&id),
        format!("{}/search/extract/download/abc123", server.uri())
    );
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/extract/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = api(&server)
        .search(&SearchRequest::new(vec![clause()], 1))
        .await
        .unwrap_err();

    match err {
        ExtractError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
