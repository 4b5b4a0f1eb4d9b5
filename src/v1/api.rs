#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use poem::Route;
use poem_openapi::OpenApiService;

use crate::utils::user_store::UserStore;

pub mod hello_get;
pub mod hello_post;
pub mod users_create;
pub mod users_delete;
pub mod users_get;
pub mod users_list;
pub mod users_update;
pub mod version;

use hello_get::HelloGetApi;
use hello_post::HelloPostApi;
use users_create::CreateUserApi;
use users_delete::DeleteUserApi;
use users_get::GetUserApi;
use users_list::ListUsersApi;
use users_update::UpdateUserApi;
use version::VersionApi;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Where the API is mounted.
pub const API_PREFIX: &str = "/api";

// Error messages shared by the user endpoints.
pub const NOT_FOUND_MSG    : &str = "user not found";
pub const SERVER_ERROR_MSG : &str = "server error";

// Every endpoint served under API_PREFIX.
pub type DemoEndpoints = (HelloGetApi, HelloPostApi, ListUsersApi, CreateUserApi,
                          GetUserApi, UpdateUserApi, DeleteUserApi, VersionApi);

// ---------------------------------------------------------------------------
// make_api_service:
// ---------------------------------------------------------------------------
/** Build the OpenAPI service.  Every user endpoint shares the one store. */
pub fn make_api_service(store: Arc<UserStore>, list_delay: Duration, title: &str, server_url: &str)
-> OpenApiService<DemoEndpoints, ()> {
    let endpoints = (
        HelloGetApi,
        HelloPostApi,
        ListUsersApi::new(store.clone(), list_delay),
        CreateUserApi::new(store.clone()),
        GetUserApi::new(store.clone()),
        UpdateUserApi::new(store.clone()),
        DeleteUserApi::new(store),
        VersionApi,
    );
    OpenApiService::new(endpoints, title, env!("CARGO_PKG_VERSION")).server(server_url)
}

// ---------------------------------------------------------------------------
// make_routes:
// ---------------------------------------------------------------------------
/** Mount the API, its generated specs and the swagger ui. */
pub fn make_routes(api_service: OpenApiService<DemoEndpoints, ()>) -> Route {
    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();
    let ui = api_service.swagger_ui();

    Route::new()
        .nest(API_PREFIX, api_service)
        .nest("/", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml)
}

// ---------------------------------------------------------------------------
// opt_field_info:
// ---------------------------------------------------------------------------
// One line of a request debug dump for an optional body field.
pub fn opt_field_info(name: &str, value: &Option<String>) -> String {
    match value {
        Some(v) => format!("\n    {}: {}", name, v),
        None => format!("\n    {}: <absent>", name),
    }
}

// ***************************************************************************
//                               Test Support
// ***************************************************************************
#[cfg(test)]
pub mod test_support {
    use super::*;
    use poem::http::StatusCode;
    use poem::test::{TestClient, TestResponse};
    use serde_json::Value;

    /// A client over the full route tree backed by the given store, with
    /// the list delay disabled.
    pub fn client_for(store: Arc<UserStore>) -> TestClient<Route> {
        let service = make_api_service(store, Duration::ZERO, "User Demo Test", "http://localhost/api");
        TestClient::new(make_routes(service))
    }

    pub fn seeded_client() -> TestClient<Route> {
        client_for(Arc::new(UserStore::new()))
    }

    /// Split a response into its status and parsed JSON body.
    pub async fn read_json(resp: TestResponse) -> (StatusCode, Value) {
        let status = resp.0.status();
        let text = resp.0.into_body().into_string().await.expect("readable body");
        let value = serde_json::from_str(&text).unwrap_or_else(|e| panic!("invalid json {:?}: {}", text, e));
        (status, value)
    }
}
