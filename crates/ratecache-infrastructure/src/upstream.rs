//! The upstream pricing oracle client (C3).
//!
//! Batch-oriented by design: `fetch_batch` is the only call that ever talks
//! to the wire, and `fetch_single` — used by the request path — is just a
//! one-element batch with a nested lookup, so C4's quota accounting treats
//! every code path identically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{instrument, warn};

use ratecache_domain::{Hotel, Period, Rate, RateRequest, Room};

use crate::error::Result;

/// The nested `period -> hotel -> room -> rate` mapping the upstream
/// contract returns. Missing tuples are simply absent, never a null entry.
#[derive(Debug, Default, Clone)]
pub struct RateMap(HashMap<Period, HashMap<Hotel, HashMap<Room, Rate>>>);

impl RateMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rate for a tuple.
    pub fn insert(&mut self, request: RateRequest, rate: Rate) {
        self.0
            .entry(request.period)
            .or_default()
            .entry(request.hotel)
            .or_default()
            .insert(request.room, rate);
    }

    /// Look up a tuple's rate, if the upstream recognized it.
    pub fn get(&self, request: &RateRequest) -> Option<&Rate> {
        self.0.get(&request.period)?.get(&request.hotel)?.get(&request.room)
    }

    /// Whether the upstream returned no rates at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Abstraction over the upstream pricing oracle, so the engine can be
/// tested without a live HTTP dependency.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetch rates for a batch of tuples in one round trip. MUST NOT raise:
    /// any transport, decoding, or non-success status is logged and
    /// reported as an empty [`RateMap`], never a per-item error.
    async fn fetch_batch(&self, requests: &[RateRequest]) -> RateMap;

    /// Fetch a single tuple's rate, implemented as a one-element batch.
    async fn fetch_single(&self, request: RateRequest) -> Option<Rate> {
        self.fetch_batch(std::slice::from_ref(&request))
            .await
            .get(&request)
            .cloned()
    }
}

#[derive(Serialize)]
struct AttributeRecord {
    period: Period,
    hotel: Hotel,
    room: Room,
}

#[derive(Serialize)]
struct BatchRequestBody {
    attributes: Vec<AttributeRecord>,
}

#[derive(Deserialize)]
struct RateRecord {
    period: Period,
    hotel: Hotel,
    room: Room,
    rate: String,
}

#[derive(Deserialize)]
struct BatchResponseBody {
    rates: Vec<RateRecord>,
}

/// [`UpstreamClient`] backed by `reqwest`.
pub struct HttpUpstreamClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpUpstreamClient {
    /// Build a client pointed at `base_url`, presenting `token` as a bearer
    /// credential and bounding every call to `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    async fn fetch_batch_inner(&self, requests: &[RateRequest]) -> Result<RateMap> {
        let body = BatchRequestBody {
            attributes: requests
                .iter()
                .map(|r| AttributeRecord {
                    period: r.period,
                    hotel: r.hotel,
                    room: r.room,
                })
                .collect(),
        };

        let response = self
            .http
            .post(format!("{}/pricing", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: BatchResponseBody = response.json().await?;
        let mut map = RateMap::new();
        for record in parsed.rates {
            map.insert(
                RateRequest::new(record.period, record.hotel, record.room),
                Rate::new(record.rate),
            );
        }
        Ok(map)
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    #[instrument(skip(self, requests))]
    async fn fetch_batch(&self, requests: &[RateRequest]) -> RateMap {
        if requests.is_empty() {
            return RateMap::new();
        }
        match self.fetch_batch_inner(requests).await {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, count = requests.len(), "upstream batch call failed");
                RateMap::new()
            }
        }
    }
}
