#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use log::{error, info};
use serde::Deserialize;

use crate::utils::errors::HttpResult;
use crate::utils::store_types::{User, UserInput};
use crate::utils::user_store::UserStore;
use crate::utils::demo_utils::{self, RequestDebug};
use crate::v1::api::{opt_field_info, SERVER_ERROR_MSG};

// Response messages.
const CREATED_MSG  : &str = "user created successfully";
const REQUIRED_MSG : &str = "name and email are required";

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct CreateUserApi {
    store: Arc<UserStore>,
}

// Every field is optional at the parsing level so that missing values
// surface as a validation error instead of a parse error.  The body is
// parsed from the raw bytes whatever the Content-Type header says.
#[derive(Deserialize, Debug)]
pub struct ReqCreateUser
{
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

#[derive(Object, Debug)]
pub struct RespCreateUser
{
    message: String,
    user: User,
    status: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqCreateUser {
    type Req = ReqCreateUser;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str(&opt_field_info("name", &self.name));
        s.push_str(&opt_field_info("email", &self.email));
        s.push_str(&opt_field_info("role", &self.role));
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DemoResponse {
    #[oai(status = 201)]
    Http201(Json<RespCreateUser>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_201(resp: RespCreateUser) -> DemoResponse {
    DemoResponse::Http201(Json(resp))
}
fn make_http_400(msg: String) -> DemoResponse {
    DemoResponse::Http400(Json(HttpResult::new(msg)))
}
fn make_http_500(msg: String) -> DemoResponse {
    DemoResponse::Http500(Json(HttpResult::new(msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl CreateUserApi {
    #[oai(path = "/users", method = "post")]
    async fn create_user(&self, http_req: &Request, body: Vec<u8>) -> DemoResponse {
        // -------------------- Parse Body ---------------------------
        // Body parse failures on user mutations are reported as server errors.
        let req: ReqCreateUser = match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                error!("ERROR: unparsable create user payload: {}", e);
                return make_http_500(SERVER_ERROR_MSG.to_string());
            }
        };

        // Conditional logging depending on log level.
        demo_utils::debug_request(http_req, &req);

        // -------------------- Validate -----------------------------
        let input = match req.validate() {
            Some(input) => input,
            None => {
                error!("ERROR: {}", REQUIRED_MSG);
                return make_http_400(REQUIRED_MSG.to_string());
            }
        };

        // -------------------- Process Request ----------------------
        match self.store.create(input) {
            Ok(user) => {
                info!("User {} '{}' created with role '{}'.", user.id, user.name, user.role);
                make_http_201(RespCreateUser::new(user))
            },
            Err(e) => {
                error!("ERROR: {}", e);
                make_http_500(SERVER_ERROR_MSG.to_string())
            }
        }
    }
}

impl CreateUserApi {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self {store}
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl ReqCreateUser {
    /// Name and email must both be present and non-empty.
    fn validate(self) -> Option<UserInput> {
        match (self.name, self.email) {
            (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() =>
                Some(UserInput::new(name, email, self.role)),
            _ => None,
        }
    }
}

impl RespCreateUser {
    fn new(user: User) -> Self {
        Self {message: CREATED_MSG.to_string(), user, status: "success".to_string()}
    }
}
