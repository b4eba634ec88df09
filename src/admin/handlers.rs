use axum::{
    extract::{FromRequest, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

use crate::admin::error::{ApiError, ApiResult};
use crate::dispatch::OutboundRequest;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{normalize_address, ConfigService, ProxySpec, StorageResult, WalletProxy};

/// JSON body extractor whose rejections come back as `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub addresses: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerWalletsRequest {
    #[serde(default)]
    pub wallets: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct WalletProxyRequest {
    #[serde(default)]
    pub proxy: Option<ProxySpec>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub items: Option<Vec<WalletProxy>>,
}

#[derive(Debug, Deserialize)]
pub struct NonceRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OwnerWallets {
    pub owner: String,
    pub wallets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RemovedWallet {
    pub address: String,
    pub removed: bool,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn list_wallets(State(state): State<AppState>) -> ApiResult<Json<Vec<WalletProxy>>> {
    let wallets = with_service(&state, |service| service.list_all()).await?;
    Ok(Json(wallets))
}

pub async fn lookup_wallets(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LookupRequest>,
) -> ApiResult<Json<Vec<WalletProxy>>> {
    let addresses = body
        .addresses
        .ok_or_else(|| ApiError::Validation("missing addresses".into()))?;
    let wallets = with_service(&state, move |service| service.list_by_addresses(&addresses)).await?;
    Ok(Json(wallets))
}

pub async fn get_owner_wallets(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> ApiResult<Json<Vec<WalletProxy>>> {
    let owner = require_address(&state, "owner", &owner)?;
    let wallets = with_service(&state, move |service| service.get_by_owner(&owner)).await?;
    Ok(Json(wallets))
}

pub async fn put_owner_wallets(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    ApiJson(body): ApiJson<OwnerWalletsRequest>,
) -> ApiResult<Json<OwnerWallets>> {
    let owner = require_address(&state, "owner", &owner)?;
    let wallets = body
        .wallets
        .ok_or_else(|| ApiError::Validation("missing wallets".into()))?;
    for wallet in &wallets {
        require_address(&state, "wallet", wallet)?;
    }

    let wallets = with_service(&state, move |service| {
        service.update_owner(&owner, &wallets)?;
        Ok(OwnerWallets {
            wallets: service.owner_wallets(&owner)?,
            owner: normalize_address(&owner),
        })
    })
    .await?;
    Ok(Json(wallets))
}

pub async fn put_wallet_proxy(
    State(state): State<AppState>,
    Path((owner, wallet)): Path<(String, String)>,
    ApiJson(body): ApiJson<WalletProxyRequest>,
) -> ApiResult<Json<WalletProxy>> {
    let owner = require_address(&state, "owner", &owner)?;
    let wallet = require_address(&state, "wallet", &wallet)?;
    let proxy = body
        .proxy
        .ok_or_else(|| ApiError::Validation("missing proxy".into()))?;

    authorize(&state, &owner, &wallet).await?;

    let stored = with_service(&state, move |service| {
        service.update_wallet(&wallet, proxy.clone())?;
        Ok(WalletProxy {
            address: normalize_address(&wallet),
            proxy,
        })
    })
    .await?;
    Ok(Json(stored))
}

pub async fn delete_wallet_proxy(
    State(state): State<AppState>,
    Path((owner, wallet)): Path<(String, String)>,
) -> ApiResult<Json<RemovedWallet>> {
    let owner = require_address(&state, "owner", &owner)?;
    let wallet = require_address(&state, "wallet", &wallet)?;

    authorize(&state, &owner, &wallet).await?;

    let removed = with_service(&state, move |service| {
        Ok(RemovedWallet {
            removed: service.remove_wallet(&wallet)?,
            address: normalize_address(&wallet),
        })
    })
    .await?;
    Ok(Json(removed))
}

pub async fn sync_owner(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    ApiJson(body): ApiJson<SyncRequest>,
) -> ApiResult<Json<Vec<WalletProxy>>> {
    let owner = require_address(&state, "owner", &owner)?;
    let items = body
        .items
        .ok_or_else(|| ApiError::Validation("missing items".into()))?;
    for item in items.iter().filter(|item| !item.address.trim().is_empty()) {
        require_address(&state, "wallet", &item.address)?;
    }

    let wallets = with_service(&state, move |service| {
        service.batch_sync(&owner, &items)?;
        service.get_by_owner(&owner)
    })
    .await?;
    Ok(Json(wallets))
}

/// Fetch the relayer nonce for `address`, leaving through that wallet's proxy.
pub async fn relayer_nonce(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NonceRequest>,
) -> ApiResult<Json<Value>> {
    let address = body.address.unwrap_or_default();
    let address = require_address(&state, "address", &address)?;
    let kind = body
        .kind
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| "SAFE".to_string());

    let base = state.settings.relayer.url.trim_end_matches('/');
    let url = Url::parse_with_params(
        &format!("{}/nonce", base),
        [("address", address.as_str()), ("type", kind.as_str())],
    )
    .map_err(|e| ApiError::Internal(format!("relayer URL: {}", e)))?;

    let response = state
        .relay
        .fetch_by_wallet_until(
            OutboundRequest::get(url.as_str()),
            Some(&address),
            state.shutdown.signalled(),
        )
        .await?;

    let status = response.status();
    let data: Value = response.json().await.unwrap_or_else(|_| json!({}));
    if !status.is_success() {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("nonce request failed")
            .to_string();
        tracing::warn!(status = status.as_u16(), address = %address, "Relayer rejected nonce request");
        return Err(ApiError::Upstream { status, message });
    }
    Ok(Json(data))
}

/// Reject unless `owner` owns `wallet`.
async fn authorize(state: &AppState, owner: &str, wallet: &str) -> ApiResult<()> {
    let (o, w) = (owner.to_string(), wallet.to_string());
    let owned = with_service(state, move |service| service.is_owned_by(&o, &w)).await?;
    if owned {
        return Ok(());
    }

    metrics::record_authorization_denied();
    tracing::warn!(owner = %owner, wallet = %wallet, "Wallet mutation rejected: not owner");
    Err(ApiError::Authorization {
        owner: normalize_address(owner),
        wallet: normalize_address(wallet),
    })
}

/// Trimmed, non-empty address; hex-checked when strict addresses are enabled.
fn require_address(state: &AppState, field: &str, value: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("missing {}", field)));
    }
    if state.settings.admin.strict_addresses {
        value
            .parse::<alloy::primitives::Address>()
            .map_err(|e| ApiError::Validation(format!("invalid {} '{}': {}", field, value, e)))?;
    }
    Ok(value.to_string())
}

/// Run a storage-backed service call off the async runtime.
async fn with_service<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&ConfigService) -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service: Arc<ConfigService> = state.config_service.clone();
    let result = tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(result?)
}
