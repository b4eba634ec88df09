//! Admin API over the routing configuration.
//!
//! Wallet proxy upserts and removals are gated by `ConfigService::is_owned_by`
//! here, before the core mutation runs. Roster replacement (`PUT .../wallets`)
//! and batch sync establish ownership themselves and carry no per-wallet check.

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;

pub use error::{ApiError, ApiResult};

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/wallets", get(list_wallets))
        .route("/wallets/lookup", post(lookup_wallets))
        .route("/owners/{owner}/wallets", get(get_owner_wallets).put(put_owner_wallets))
        .route(
            "/owners/{owner}/wallets/{wallet}/proxy",
            put(put_wallet_proxy).delete(delete_wallet_proxy),
        )
        .route("/owners/{owner}/sync", post(sync_owner))
        .route("/relayer/nonce", post(relayer_nonce))
        .with_state(state)
}
