//! In-process API stand-ins for tests

use axum::Router;
use ud_models::AuthUser;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn admin() -> AuthUser {
    AuthUser {
        username: "root".into(),
        is_superadmin: true,
    }
}
