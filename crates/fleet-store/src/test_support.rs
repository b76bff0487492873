use auth_session::{AuthenticatedApiClient, SessionContext, User};
use serde_json::json;

fn user() -> User {
    serde_json::from_value(json!({
        "id": "u1",
        "email": "ada@example.com",
        "name": "Ada",
        "createdAt": "2024-05-01T10:00:00Z"
    }))
    .unwrap()
}

/// Client pointed at a closed port, for tests that never hit the network.
pub(crate) fn offline_api() -> AuthenticatedApiClient {
    AuthenticatedApiClient::new("http://127.0.0.1:9", SessionContext::in_memory())
}

pub(crate) fn signed_in_api(base_url: &str) -> AuthenticatedApiClient {
    let context = SessionContext::in_memory();
    context.commit_login(user(), "a1".to_string(), Some("r1".to_string()));
    AuthenticatedApiClient::new(base_url, context)
}
