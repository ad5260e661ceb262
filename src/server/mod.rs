mod extract;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{delete, get, post},
    Router,
};

use crate::server::handlers::{bids, health, members, messages, safety, trips};
use crate::{api::API, auth::TokenAuthority, error::Error};

type DynAPI = Arc<dyn API + Send + Sync>;

pub fn app(api: DynAPI, authority: Arc<TokenAuthority>) -> Router {
    Router::new()
        .route("/health", get(health::check))
        .route("/members", post(members::register))
        .route("/members/me", get(members::me))
        .route("/trips", post(trips::create).get(trips::list_mine))
        .route("/trips/open", get(trips::list_open))
        .route("/trips/:id", get(trips::find))
        .route("/trips/:id/bids", post(bids::create).get(bids::list))
        .route("/trips/:id/accept-bid", post(trips::accept_bid))
        .route("/trips/:id/start-en-route", post(trips::start_en_route))
        .route("/trips/:id/arrived", post(trips::mark_arrived))
        .route("/trips/:id/verify-pickup", post(trips::verify_pickup))
        .route("/trips/:id/start-trip", post(trips::start_trip))
        .route("/trips/:id/confirm-payment", post(trips::confirm_payment))
        .route("/trips/:id/complete", post(trips::complete))
        .route("/trips/:id/confirm-completion", post(trips::confirm_completion))
        .route("/trips/:id/cancel", post(trips::cancel))
        .route("/trips/:id/events", get(trips::events))
        .route("/trips/:id/messages", post(messages::create).get(messages::list))
        .route("/bids/mine", get(bids::list_mine))
        .route("/bids/:id/withdraw", post(bids::withdraw))
        .route("/blocks", post(safety::block))
        .route("/blocks/:user_id", delete(safety::unblock))
        .route("/reports", post(safety::report))
        .layer(Extension(api))
        .layer(Extension(authority))
}

pub async fn serve<T: API + Sync + Send + 'static>(
    api: Arc<T>,
    authority: TokenAuthority,
    addr: SocketAddr,
) -> Result<(), Error> {
    let app = app(api as DynAPI, Arc::new(authority));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| crate::error::unexpected_error(err.to_string()))
}
