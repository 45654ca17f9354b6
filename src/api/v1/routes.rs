/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - open (account 系) と protected (snippets) を merge
 * - auth は protected にだけ route_layer、admission は v1 全体に layer
 *   (外側の admission が先に走るので、bucket 切れは credential の有無に関係なく 429)
 */
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{
    accounts::{change_password, delete_account, login, register},
    snippets::{create_snippet, delete_snippet, get_snippet, list_snippets, update_snippet},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/account", delete(delete_account))
        .route("/account/password", put(change_password));

    let protected = Router::new()
        .route("/snippets", get(list_snippets).post(create_snippet))
        .route(
            "/snippets/{snippet_id}",
            get(get_snippet).put(update_snippet).delete(delete_snippet),
        );
    let protected = middleware::auth::access::apply(protected, state.clone());

    middleware::admission::apply(open.merge(protected), state)
}
