#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use log::error;

use crate::utils::errors::{Errors, HttpResult};
use crate::utils::store_types::User;
use crate::utils::user_store::UserStore;
use crate::utils::demo_utils::{self, coerce_user_id, RequestDebug};
use crate::v1::api::{NOT_FOUND_MSG, SERVER_ERROR_MSG};

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct GetUserApi {
    store: Arc<UserStore>,
}

struct ReqGetUser
{
    id: String,
}

#[derive(Object, Debug)]
pub struct RespGetUser
{
    user: User,
    status: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqGetUser {
    type Req = ReqGetUser;
    fn get_request_info(&self) -> String {
        format!("  Path parameter:\n    id: {}", self.id)
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DemoResponse {
    #[oai(status = 200)]
    Http200(Json<RespGetUser>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespGetUser) -> DemoResponse {
    DemoResponse::Http200(Json(resp))
}
fn make_http_404(msg: String) -> DemoResponse {
    DemoResponse::Http404(Json(HttpResult::new(msg)))
}
fn make_http_500(msg: String) -> DemoResponse {
    DemoResponse::Http500(Json(HttpResult::new(msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl GetUserApi {
    #[oai(path = "/users/:id", method = "get")]
    async fn get_user(&self, http_req: &Request, id: Path<String>) -> DemoResponse {
        let req = ReqGetUser {id: id.0};
        demo_utils::debug_request(http_req, &req);

        // Unparseable ids are simply unknown ids.
        let user_id = match coerce_user_id(&req.id) {
            Some(i) => i,
            None => {
                error!("ERROR: no user matches id segment '{}'.", req.id);
                return make_http_404(NOT_FOUND_MSG.to_string());
            }
        };

        match self.store.find_by_id(user_id) {
            Ok(user) => make_http_200(RespGetUser::new(user)),
            Err(Errors::UserNotFound(i)) => {
                error!("ERROR: user {} not found.", i);
                make_http_404(NOT_FOUND_MSG.to_string())
            },
            Err(e) => {
                error!("ERROR: {}", e);
                make_http_500(SERVER_ERROR_MSG.to_string())
            }
        }
    }
}

impl GetUserApi {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self {store}
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespGetUser {
    fn new(user: User) -> Self {
        Self {user, status: "success".to_string()}
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
    async fn known_id_returns_user() {
        let cli = seeded_client();
        let (status, body) = read_json(cli.get("/api/users/2").send().await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({
            "user": {"id": 2, "name": "Li Si", "email": "lisi@example.com", "role": "user"},
            "status": "success"
        }));
    }

    #[tokio::test]
    async fn unknown_id_is_404() {
        let cli = seeded_client();
        let (status, body) = read_json(cli.get("/api/users/999").send().await).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": NOT_FOUND_MSG}));
    }

    #[tokio::test]
    async fn non_numeric_id_is_404_not_400() {
        let cli = seeded_client();
        for seg in ["abc", "x1", "-"] {
            let (status, body) = read_json(cli.get(format!("/api/users/{}", seg)).send().await).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "segment {}", seg);
            assert_eq!(body["error"], NOT_FOUND_MSG);
        }
    }

    #[tokio::test]
    async fn numeric_prefix_is_coerced() {
        let cli = seeded_client();
        let (status, body) = read_json(cli.get("/api/users/3xyz").send().await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], 3);
    }

    #[tokio::test]
    async fn hex_id_is_coerced() {
        let cli = seeded_client();
        let (status, body) = read_json(cli.get("/api/users/0x2").send().await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Li Si");
    }
}
