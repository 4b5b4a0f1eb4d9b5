#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use log::{error, info};
use serde::Deserialize;

use crate::utils::errors::{Errors, HttpResult};
use crate::utils::store_types::{User, UserPatch};
use crate::utils::user_store::UserStore;
use crate::utils::demo_utils::{self, coerce_user_id, RequestDebug};
use crate::v1::api::{NOT_FOUND_MSG, SERVER_ERROR_MSG};

// Response messages.
const UPDATED_MSG : &str = "user updated successfully";

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct UpdateUserApi {
    store: Arc<UserStore>,
}

// Unknown fields, including an id, are ignored.  The body is parsed from
// the raw bytes whatever the Content-Type header says.
#[derive(Deserialize, Debug)]
pub struct ReqUpdateUser
{
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

#[derive(Object, Debug)]
pub struct RespUpdateUser
{
    message: String,
    user: User,
    status: String,
}

// Path id plus the unparsed body, for the debug log.
struct ReqUpdateUserInfo<'a>
{
    id: &'a str,
    body: &'a [u8],
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqUpdateUserInfo<'_> {
    type Req = ReqUpdateUser;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Path parameter:\n    id: ");
        s.push_str(self.id);
        s.push_str("\n  Request body:\n    ");
        s.push_str(&String::from_utf8_lossy(self.body));
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DemoResponse {
    #[oai(status = 200)]
    Http200(Json<RespUpdateUser>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespUpdateUser) -> DemoResponse {
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
impl UpdateUserApi {
    #[oai(path = "/users/:id", method = "put")]
    async fn update_user(&self, http_req: &Request, id: Path<String>, body: Vec<u8>) -> DemoResponse {
        demo_utils::debug_request(http_req, &ReqUpdateUserInfo {id: &id.0, body: &body});

        // -------------------- Locate User --------------------------
        // The record must exist before the body is even looked at, so an
        // unknown id is a 404 whatever the body contains.
        let user_id = match coerce_user_id(&id.0) {
            Some(i) => i,
            None => {
                error!("ERROR: no user matches id segment '{}'.", id.0);
                return make_http_404(NOT_FOUND_MSG.to_string());
            }
        };
        match self.store.find_by_id(user_id) {
            Ok(_) => (),
            Err(Errors::UserNotFound(i)) => {
                error!("ERROR: user {} not found for update.", i);
                return make_http_404(NOT_FOUND_MSG.to_string());
            },
            Err(e) => {
                error!("ERROR: {}", e);
                return make_http_500(SERVER_ERROR_MSG.to_string());
            }
        }

        // -------------------- Parse Body ---------------------------
        // Body parse failures on user mutations are reported as server errors.
        let req: ReqUpdateUser = match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                error!("ERROR: unparsable update user payload: {}", e);
                return make_http_500(SERVER_ERROR_MSG.to_string());
            }
        };

        // -------------------- Process Request ----------------------
        // The record can still vanish to a concurrent delete in between.
        match self.store.update(user_id, &req.into_patch()) {
            Ok(user) => {
                info!("User {} updated.", user.id);
                make_http_200(RespUpdateUser::new(user))
            },
            Err(Errors::UserNotFound(i)) => {
                error!("ERROR: user {} not found for update.", i);
                make_http_404(NOT_FOUND_MSG.to_string())
            },
            Err(e) => {
                error!("ERROR: {}", e);
                make_http_500(SERVER_ERROR_MSG.to_string())
            }
        }
    }
}

impl UpdateUserApi {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self {store}
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl ReqUpdateUser {
    fn into_patch(self) -> UserPatch {
        UserPatch::new(self.name, self.email, self.role)
    }
}

impl RespUpdateUser {
    fn new(user: User) -> Self {
        Self {message: UPDATED_MSG.to_string(), user, status: "success".to_string()}
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

    use crate::v1::api::test_support::{client_for, read_json, seeded_client};

    #[tokio::test]
    async fn role_only_update_leaves_other_fields() {
        let store = Arc::new(UserStore::new());
        let cli = client_for(store.clone());
        let resp = cli.put("/api/users/2")
            .body_json(&json!({"role": "admin", "id": 77}))
            .send()
            .await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], UPDATED_MSG);
        assert_eq!(body["status"], "success");
        assert_eq!(body["user"],
                   json!({"id": 2, "name": "Li Si", "email": "lisi@example.com", "role": "admin"}));
        assert_eq!(store.find_by_id(2).unwrap(), User::new(2, "Li Si", "lisi@example.com", "admin"));
        assert!(store.find_by_id(77).is_err());
    }

    #[tokio::test]
    async fn update_is_visible_to_later_reads() {
        let cli = seeded_client();
        let resp = cli.put("/api/users/1")
            .body_json(&json!({"name": "Zhang San Feng", "email": "zsf@example.com"}))
            .send()
            .await;
        assert_eq!(resp.0.status(), StatusCode::OK);

        let (_, body) = read_json(cli.get("/api/users/1").send().await).await;
        assert_eq!(body["user"],
                   json!({"id": 1, "name": "Zhang San Feng", "email": "zsf@example.com", "role": "admin"}));
    }

    #[tokio::test]
    async fn unknown_or_unparseable_id_is_404() {
        let cli = seeded_client();
        for path in ["/api/users/999", "/api/users/nope"] {
            let resp = cli.put(path).body_json(&json!({"role": "admin"})).send().await;
            let (status, body) = read_json(resp).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "path {}", path);
            assert_eq!(body, json!({"error": NOT_FOUND_MSG}));
        }
    }

    #[tokio::test]
    async fn unknown_id_wins_over_malformed_body() {
        let cli = seeded_client();
        let resp = cli.put("/api/users/999")
            .content_type("application/json")
            .body("{bad")
            .send()
            .await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": NOT_FOUND_MSG}));
    }

    #[tokio::test]
    async fn json_body_is_accepted_whatever_the_content_type() {
        let store = Arc::new(UserStore::new());
        let cli = client_for(store.clone());

        let resp = cli.put("/api/users/3").body(r#"{"role":"admin"}"#).send().await;
        assert_eq!(resp.0.status(), StatusCode::OK);

        let resp = cli.put("/api/users/3")
            .content_type("text/plain;charset=UTF-8")
            .body(r#"{"email":"ww@example.com"}"#)
            .send()
            .await;
        let (status, body) = read_json(resp).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"],
                   json!({"id": 3, "name": "Wang Wu", "email": "ww@example.com", "role": "admin"}));
    }

    #[tokio::test]
    async fn malformed_body_is_500() {
        let store = Arc::new(UserStore::new());
        let cli = client_for(store.clone());
        let resp = cli.put("/api/users/1")
            .content_type("application/json")
            .body("role=admin")
            .send()
            .await;
        let (status, body) = read_json(resp).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": SERVER_ERROR_MSG}));
        assert_eq!(store.find_by_id(1).unwrap().role, "admin");
    }
}
