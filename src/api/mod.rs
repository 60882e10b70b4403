//! Local stand-in for the hosted table backend.
//!
//! Serves the subset of the REST dialect the board uses, over a [`Database`]:
//!
//! - `GET    /rest/v1/{table}?select=*&order=col[.asc|.desc]`
//! - `POST   /rest/v1/roadmap_items` (with `Prefer: return=representation`)
//! - `PATCH  /rest/v1/roadmap_items?id=eq.<uuid>`
//! - `DELETE /rest/v1/roadmap_items?id=eq.<uuid>`

mod handlers;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let rest = Router::new().route(
        "/{table}",
        get(handlers::list_rows)
            .post(handlers::insert_row)
            .patch(handlers::update_row)
            .delete(handlers::delete_row),
    );

    Router::new()
        .nest("/rest/v1", rest)
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(db)
}
