#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use log::{debug, error};

use crate::utils::errors::HttpResult;
use crate::utils::store_types::User;
use crate::utils::user_store::UserStore;
use crate::v1::api::SERVER_ERROR_MSG;

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct ListUsersApi {
    store: Arc<UserStore>,
    list_delay: Duration,
}

#[derive(Object, Debug)]
pub struct RespListUsers
{
    users: Vec<User>,
    total: u64,
    status: String,
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DemoResponse {
    #[oai(status = 200)]
    Http200(Json<RespListUsers>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespListUsers) -> DemoResponse {
    DemoResponse::Http200(Json(resp))
}
fn make_http_500(msg: String) -> DemoResponse {
    DemoResponse::Http500(Json(HttpResult::new(msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl ListUsersApi {
    #[oai(path = "/users", method = "get")]
    async fn list_users(&self) -> DemoResponse {
        // Simulated latency, always outside the store lock.
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }

        match self.store.list() {
            Ok(users) => {
                debug!("Listing {} users.", users.len());
                make_http_200(RespListUsers::new(users))
            },
            Err(e) => {
                error!("ERROR: {}", e);
                make_http_500(SERVER_ERROR_MSG.to_string())
            }
        }
    }
}

impl ListUsersApi {
    pub fn new(store: Arc<UserStore>, list_delay: Duration) -> Self {
        Self {store, list_delay}
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespListUsers {
    fn new(users: Vec<User>) -> Self {
        Self {total: users.len() as u64, users, status: "success".to_string()}
    }
}
