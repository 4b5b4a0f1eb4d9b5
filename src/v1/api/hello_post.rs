#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use log::error;

use crate::utils::errors::HttpResult;
use crate::utils::demo_utils::{self, timestamp_str, RequestDebug};

// Response messages.
const RECEIVED_MSG : &str = "data received";
const BAD_JSON_MSG : &str = "invalid JSON data";

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct HelloPostApi;

// Any JSON value is accepted and echoed back.  The body is parsed from
// the raw bytes whatever the Content-Type header says.
pub struct ReqHelloPost<'a>
{
    data: &'a serde_json::Value,
}

#[derive(Object, Debug)]
pub struct RespHelloPost
{
    message: String,
    #[oai(rename = "receivedData")]
    received_data: serde_json::Value,
    timestamp: String,
    status: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqHelloPost<'_> {
    type Req = serde_json::Value;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:\n    ");
        s.push_str(&self.data.to_string());
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DemoResponse {
    #[oai(status = 200)]
    Http200(Json<RespHelloPost>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
}

fn make_http_200(resp: RespHelloPost) -> DemoResponse {
    DemoResponse::Http200(Json(resp))
}
fn make_http_400(msg: String) -> DemoResponse {
    DemoResponse::Http400(Json(HttpResult::new(msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl HelloPostApi {
    #[oai(path = "/hello", method = "post")]
    async fn post_hello(&self, http_req: &Request, body: Vec<u8>) -> DemoResponse {
        // A body that isn't JSON is the client's fault on this endpoint.
        let data: serde_json::Value = match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                error!("ERROR: unparsable hello payload: {}", e);
                return make_http_400(BAD_JSON_MSG.to_string());
            }
        };

        demo_utils::debug_request(http_req, &ReqHelloPost {data: &data});
        make_http_200(RespHelloPost::new(data))
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespHelloPost {
    fn new(received_data: serde_json::Value) -> Self {
        Self {message: RECEIVED_MSG.to_string(), received_data,
              timestamp: timestamp_str(), status: "success".to_string()}
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::http::StatusCode;
    use serde_json::json;

    use crate::v1::api::test_support::{read_json, seeded_client};

    #[tokio::test]
    async fn posted_json_is_echoed() {
        let cli = seeded_client();
        let payload = json!({"greeting": "hi", "nested": {"n": [1, 2, 3]}});
        let resp = cli.post("/api/hello").body_json(&payload).send().await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], RECEIVED_MSG);
        assert_eq!(body["receivedData"], payload);
        assert_eq!(body["status"], "success");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn scalar_json_is_accepted() {
        let cli = seeded_client();
        let resp = cli.post("/api/hello").body_json(&json!(42)).send().await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["receivedData"], 42);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let cli = seeded_client();
        let resp = cli.post("/api/hello")
            .content_type("application/json")
            .body("{not json")
            .send()
            .await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": BAD_JSON_MSG}));
    }

    #[tokio::test]
    async fn empty_body_is_400() {
        let cli = seeded_client();
        let (status, body) = read_json(cli.post("/api/hello").send().await).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": BAD_JSON_MSG}));
    }

    #[tokio::test]
    async fn json_without_content_type_is_echoed() {
        let cli = seeded_client();
        let resp = cli.post("/api/hello").body(r#"{"a":1}"#).send().await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["receivedData"], json!({"a": 1}));
    }

    #[tokio::test]
    async fn json_sent_as_text_plain_is_echoed() {
        let cli = seeded_client();
        let resp = cli.post("/api/hello")
            .content_type("text/plain;charset=UTF-8")
            .body(r#"["x", null, true]"#)
            .send()
            .await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["receivedData"], json!(["x", null, true]));
    }
}
