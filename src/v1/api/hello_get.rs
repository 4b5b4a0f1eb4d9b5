#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Json, Object };

use crate::utils::demo_utils::timestamp_str;

// The fixed greeting.
pub const HELLO_MESSAGE: &str = "Hello, World!";

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct HelloGetApi;

#[derive(Object, Debug)]
pub struct RespHelloGet
{
    message: String,
    timestamp: String,
    status: String,
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl HelloGetApi {
    #[oai(path = "/hello", method = "get")]
    async fn get_hello(&self) -> Json<RespHelloGet> {
        Json(RespHelloGet::process())
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespHelloGet {
    fn new(message: &str, timestamp: String) -> Self {
        Self {message: message.to_string(), timestamp, status: "success".to_string()}
    }

    fn process() -> Self {
        Self::new(HELLO_MESSAGE, timestamp_str())
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::http::StatusCode;

    use crate::utils::demo_utils::timestamp_str_to_datetime;
    use crate::v1::api::test_support::{read_json, seeded_client};

    #[tokio::test]
    async fn hello_returns_greeting_and_timestamp() {
        let cli = seeded_client();
        let (status, body) = read_json(cli.get("/api/hello").send().await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], HELLO_MESSAGE);
        assert_eq!(body["status"], "success");
        let ts = body["timestamp"].as_str().unwrap();
        assert!(timestamp_str_to_datetime(ts).is_ok(), "bad timestamp {}", ts);
    }
}
