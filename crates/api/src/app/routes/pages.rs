use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};

use crewgate_access::landing_path;

use crate::context::AccessContext;

/// Pages behind the edge access layer.
pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/admin", get(admin))
        .route("/dashboard", get(dashboard))
}

/// Role-based landing: operators to the admin area, workspace members to
/// their dashboard, anonymous visitors to sign-in.
pub async fn root(context: Option<Extension<AccessContext>>) -> Redirect {
    match context {
        Some(Extension(context)) => Redirect::to(landing_path(context.record().role())),
        None => Redirect::to("/signin"),
    }
}

pub async fn admin() -> Html<&'static str> {
    Html("<h1>Platform administration</h1>")
}

pub async fn dashboard(Extension(context): Extension<AccessContext>) -> Html<String> {
    Html(format!(
        "<h1>Workspace dashboard</h1><p>signed in as {}</p>",
        context.record().role()
    ))
}

pub async fn signin() -> Html<&'static str> {
    Html("<h1>Sign in</h1><p>Authentication happens upstream; requests arrive here with a principal header.</p>")
}

pub async fn not_permitted() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Html("<h1>Not permitted</h1><p>Your role does not give access to that page.</p>"),
    )
}
