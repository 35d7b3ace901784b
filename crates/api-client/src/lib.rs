use crate::auth::sign_request;
use crate::responses::{RawAccountInfo, RawAccountSummary, RawBalance, RawOrder, RawPosition, RawTrade, VenueErrorBody};
use async_trait::async_trait;
use chrono::Utc;
use configuration::settings::{ApiConfig, HttpSettings};
use core_types::{FetchError, TimeRange};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

mod auth;
pub mod fetcher;
pub mod normalize;
pub mod responses;
pub mod sim;

// --- Public API ---
pub use fetcher::Fetcher;
pub use normalize::Normalized;
pub use sim::SimClient;

/// The generic, abstract interface for the trading venue.
///
/// This trait is the contract the rest of the system programs against; the
/// live, testnet, and simulated backends are all implementations of it.
/// Every call returns venue-shaped raw records; normalization into the
/// stable internal types happens one layer up, in the [`Fetcher`].
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetches current account balances and margin state. (Authenticated)
    async fn get_account_summary(&self) -> Result<RawAccountSummary, FetchError>;

    /// Fetches all current positions, flat ones included. (Authenticated)
    async fn get_positions(&self) -> Result<Vec<RawPosition>, FetchError>;

    /// Fetches all currently open orders. (Authenticated)
    async fn get_open_orders(&self) -> Result<Vec<RawOrder>, FetchError>;

    /// Fetches executed trades, optionally restricted to a time window.
    /// (Authenticated)
    async fn get_trade_history(
        &self,
        range: Option<TimeRange>,
    ) -> Result<Vec<RawTrade>, FetchError>;
}

/// A concrete implementation of [`ExchangeClient`] for Binance USD-M futures.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    api_secret: String,
}

impl BinanceClient {
    pub fn new(live_mode: bool, api_config: &ApiConfig, http: &HttpSettings) -> Self {
        let (base_url, keys) = if live_mode {
            ("https://fapi.binance.com".to_string(), &api_config.production)
        } else {
            (
                "https://testnet.binancefuture.com".to_string(),
                &api_config.testnet,
            )
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-MBX-APIKEY",
            HeaderValue::from_str(&keys.key).expect("Invalid API Key"),
        );

        Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(http.timeout_secs))
                .build()
                .expect("Failed to build reqwest client"),
            base_url,
            api_secret: keys.secret.clone(),
        }
    }

    async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &mut BTreeMap<&str, String>,
    ) -> Result<T, FetchError> {
        params.insert("timestamp", Utc::now().timestamp_millis().to_string());

        let query_string =
            serde_qs::to_string(params).map_err(|e| FetchError::Decode(e.to_string()))?;
        let signature = sign_request(&self.api_secret, &query_string);

        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, path, query_string, signature
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| FetchError::Decode(e.to_string()))
        } else {
            Err(classify_failure(status, &text))
        }
    }
}

/// Maps a request-level reqwest failure onto the shared taxonomy. Timeouts,
/// connect failures, and broken transfers are all retryable.
fn transport_error(err: reqwest::Error) -> FetchError {
    FetchError::Transient(err.to_string())
}

/// Binance error codes that indicate rejected credentials rather than a
/// malformed request.
const AUTH_ERROR_CODES: [i64; 3] = [-1022, -2014, -2015];

/// Turns a non-2xx venue response into the matching error variant. Auth
/// failures are separated out so the fetcher never retries them.
fn classify_failure(status: StatusCode, body: &str) -> FetchError {
    match serde_json::from_str::<VenueErrorBody>(body) {
        Ok(venue) => {
            if status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
                || AUTH_ERROR_CODES.contains(&venue.code)
            {
                FetchError::Auth(venue.msg)
            } else {
                FetchError::Venue {
                    code: venue.code,
                    message: venue.msg,
                }
            }
        }
        Err(_) => FetchError::Venue {
            code: i64::from(status.as_u16()),
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn get_account_summary(&self) -> Result<RawAccountSummary, FetchError> {
        // The summary combines two venue endpoints: per-asset wallet
        // balances and the account-wide margin state.
        let balances: Vec<RawBalance> = self
            .get_signed("/fapi/v2/balance", &mut BTreeMap::new())
            .await?;
        let account: RawAccountInfo = self
            .get_signed("/fapi/v2/account", &mut BTreeMap::new())
            .await?;

        let wallet = balances
            .iter()
            .find(|b| b.asset == "USDT")
            .or_else(|| balances.first())
            .ok_or_else(|| FetchError::Decode("venue returned no balance entries".to_string()))?;

        Ok(RawAccountSummary {
            balance: wallet.balance.clone(),
            total_unrealized_profit: account.total_unrealized_profit,
            total_margin_balance: account.total_margin_balance,
            available_balance: account.available_balance,
        })
    }

    async fn get_positions(&self) -> Result<Vec<RawPosition>, FetchError> {
        // positionRisk, not the account endpoint: it is the one that
        // actually reports a mark price per position.
        self.get_signed("/fapi/v2/positionRisk", &mut BTreeMap::new())
            .await
    }

    async fn get_open_orders(&self) -> Result<Vec<RawOrder>, FetchError> {
        self.get_signed("/fapi/v1/openOrders", &mut BTreeMap::new())
            .await
    }

    async fn get_trade_history(
        &self,
        range: Option<TimeRange>,
    ) -> Result<Vec<RawTrade>, FetchError> {
        let mut params = BTreeMap::new();
        if let Some(range) = range {
            params.insert("startTime", range.start.timestamp_millis().to_string());
            params.insert("endTime", range.end.timestamp_millis().to_string());
        }
        self.get_signed("/fapi/v1/userTrades", &mut params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_codes_classify_as_auth() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"code": -2015, "msg": "Invalid API-key, IP, or permissions for action."}"#,
        );
        assert!(matches!(err, FetchError::Auth(_)));
    }

    #[test]
    fn unauthorized_status_classifies_as_auth() {
        let err = classify_failure(StatusCode::UNAUTHORIZED, r#"{"code": -1000, "msg": "x"}"#);
        assert!(matches!(err, FetchError::Auth(_)));
    }

    #[test]
    fn other_venue_errors_keep_their_code() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"code": -1121, "msg": "Invalid symbol."}"#,
        );
        assert_eq!(
            err,
            FetchError::Venue {
                code: -1121,
                message: "Invalid symbol.".to_string()
            }
        );
    }

    #[test]
    fn unparsable_error_body_falls_back_to_http_status() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, FetchError::Venue { code: 502, .. }));
    }
}
