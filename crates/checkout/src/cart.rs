//! Cart synchronization: one authoritative fetch, many subscribing surfaces.
//!
//! Several independent surfaces (navbar dropdown, floating button, checkout
//! page) all render the same remote cart. Instead of each surface fetching
//! on its own lifecycle, [`CartBinder`] owns a single cached fetch and
//! republishes the latest [`CartState`] through a watch channel.
//! Near-simultaneous fetches collapse into one in-flight request via
//! `moka`; mutations elsewhere in the app call [`CartBinder::refresh`]
//! explicitly - the server pushes nothing.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument};

use mercato_core::{Money, ProductId, VariantId};

use crate::api::{ApiClient, ApiError};

const CART_ENDPOINT: &str = "checkout/calculate-delivery-fee";
const CART_CACHE_KEY: &str = "cart";

/// How long a snapshot is considered fresh. Long enough to collapse
/// mount storms from several surfaces, short enough that ordinary
/// navigation re-fetches.
const CART_TTL: Duration = Duration::from_secs(30);

/// One product/variant/quantity/price tuple within the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
}

/// Read-only projection of the remote cart.
///
/// Replaced wholesale on every fetch, never mutated field-by-field. The
/// backend owns all three totals; `total == subtotal + delivery_fee` holds
/// as returned and the client never recomputes the delivery fee.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl CartSnapshot {
    /// Whether the cart holds no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Latest cart state published to subscribing surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CartState {
    /// No fetch has completed yet.
    #[default]
    Unloaded,
    /// The most recent fetch succeeded.
    Ready(CartSnapshot),
    /// The most recent fetch failed. Surfaces render the last-known
    /// snapshot when present, or an explicit empty state - never a crash.
    Unavailable { last_known: Option<CartSnapshot> },
}

/// Cart fetch failure.
#[derive(Debug, Clone, Error)]
pub enum CartError {
    /// Shared across coalesced callers, hence the `Arc`.
    #[error("cart fetch failed: {0}")]
    Fetch(#[source] Arc<ApiError>),
}

/// Binds the remote cart resource to any number of UI surfaces.
///
/// Cheap to clone; all clones share the same cache and watch channel.
#[derive(Clone)]
pub struct CartBinder {
    inner: Arc<CartBinderInner>,
}

struct CartBinderInner {
    api: ApiClient,
    cache: Cache<String, CartSnapshot>,
    state: watch::Sender<CartState>,
}

impl CartBinder {
    /// Create a new binder over the given API client.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CART_TTL)
            .build();
        let (state, _) = watch::channel(CartState::Unloaded);

        Self {
            inner: Arc::new(CartBinderInner { api, cache, state }),
        }
    }

    /// Subscribe to cart state updates.
    ///
    /// A surface holds the receiver for as long as it is visible and drops
    /// it on dismissal; late-arriving responses only ever publish through
    /// the channel, so they cannot touch a dismissed surface.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// The most recently published state.
    #[must_use]
    pub fn current(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Fetch the cart, collapsing concurrent calls into one request.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Fetch` when the request fails; the published
    /// state keeps the last-known snapshot in that case.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<CartSnapshot, CartError> {
        let inner = &self.inner;

        if let Some(snapshot) = inner.cache.get(CART_CACHE_KEY).await {
            debug!("cache hit for cart");
            return Ok(snapshot);
        }

        let result = inner
            .cache
            .try_get_with(CART_CACHE_KEY.to_string(), fetch_cart(&inner.api))
            .await;

        match result {
            Ok(snapshot) => {
                inner.state.send_replace(CartState::Ready(snapshot.clone()));
                Ok(snapshot)
            }
            Err(err) => {
                let last_known = match &*inner.state.borrow() {
                    CartState::Ready(snapshot) => Some(snapshot.clone()),
                    CartState::Unavailable { last_known } => last_known.clone(),
                    CartState::Unloaded => None,
                };
                inner
                    .state
                    .send_replace(CartState::Unavailable { last_known });
                Err(CartError::Fetch(err))
            }
        }
    }

    /// Drop the cached snapshot so the next fetch hits the network.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate(CART_CACHE_KEY).await;
    }

    /// Re-fetch after a mutation elsewhere in the app.
    ///
    /// # Errors
    ///
    /// Same failure semantics as [`CartBinder::snapshot`].
    pub async fn refresh(&self) -> Result<CartSnapshot, CartError> {
        self.invalidate().await;
        self.snapshot().await
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct CartEnvelope {
    data: CartData,
}

#[derive(Debug, Deserialize)]
struct CartData {
    items: Vec<WireLineItem>,
    subtotal: Money,
    delivery_fee: Money,
    total: Money,
}

#[derive(Debug, Deserialize)]
struct WireLineItem {
    product_id: ProductId,
    variant_id: VariantId,
    name: String,
    #[serde(default)]
    image: Option<String>,
    unit_price: Money,
    quantity: u32,
}

async fn fetch_cart(api: &ApiClient) -> Result<CartSnapshot, ApiError> {
    let envelope: CartEnvelope = api.get(CART_ENDPOINT).await?;
    Ok(convert_cart(envelope.data))
}

fn convert_cart(data: CartData) -> CartSnapshot {
    CartSnapshot {
        items: data
            .items
            .into_iter()
            .map(|item| LineItem {
                product_id: item.product_id,
                variant_id: item.variant_id,
                name: item.name,
                image: item.image,
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect(),
        subtotal: data.subtotal,
        delivery_fee: data.delivery_fee,
        total: data.total,
    }
}
