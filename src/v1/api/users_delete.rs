#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use log::{error, info};

use crate::utils::errors::{Errors, HttpResult};
use crate::utils::store_types::User;
use crate::utils::user_store::UserStore;
use crate::utils::demo_utils::{self, coerce_user_id, RequestDebug};
use crate::v1::api::{NOT_FOUND_MSG, SERVER_ERROR_MSG};

// Response messages.
const DELETED_MSG : &str = "user deleted successfully";

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct DeleteUserApi {
    store: Arc<UserStore>,
}

struct ReqDeleteUser
{
    id: String,
}

#[derive(Object, Debug)]
pub struct RespDeleteUser
{
    message: String,
    #[oai(rename = "deletedUser")]
    deleted_user: User,
    status: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqDeleteUser {
    type Req = ReqDeleteUser;
    fn get_request_info(&self) -> String {
        format!("  Path parameter:\n    id: {}", self.id)
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DemoResponse {
    #[oai(status = 200)]
    Http200(Json<RespDeleteUser>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespDeleteUser) -> DemoResponse {
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
impl DeleteUserApi {
    #[oai(path = "/users/:id", method = "delete")]
    async fn delete_user(&self, http_req: &Request, id: Path<String>) -> DemoResponse {
        let req = ReqDeleteUser {id: id.0};
        demo_utils::debug_request(http_req, &req);

        let user_id = match coerce_user_id(&req.id) {
            Some(i) => i,
            None => {
                error!("ERROR: no user matches id segment '{}'.", req.id);
                return make_http_404(NOT_FOUND_MSG.to_string());
            }
        };

        match self.store.delete(user_id) {
            Ok(user) => {
                info!("User {} '{}' deleted.", user.id, user.name);
                make_http_200(RespDeleteUser::new(user))
            },
            Err(Errors::UserNotFound(i)) => {
                error!("ERROR: user {} not found for delete.", i);
                make_http_404(NOT_FOUND_MSG.to_string())
            },
            Err(e) => {
                error!("ERROR: {}", e);
                make_http_500(SERVER_ERROR_MSG.to_string())
            }
        }
    }
}

impl DeleteUserApi {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self {store}
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespDeleteUser {
    fn new(deleted_user: User) -> Self {
        Self {message: DELETED_MSG.to_string(), deleted_user, status: "success".to_string()}
    }
}
