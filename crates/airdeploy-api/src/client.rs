// Hand-crafted async HTTP client for the controller control-plane API.
//
// Base path: /api/
// Auth: X-API-KEY header

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::types;

const PAGE_LIMIT: i32 = 200;

// ── Error response shape from the control plane ──────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the control-plane REST API.
///
/// Uses API-key authentication and communicates via JSON REST endpoints
/// under `/api/v1/`. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ControlPlaneClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `X-API-KEY` as a default header on every request.
    pub fn from_api_key(
        base_url: &str,
        api_key: &secrecy::SecretString,
        transport: &crate::TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("X-API-KEY", key_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Build the base URL ending in `/api/`.
    ///
    /// `https://host` and `https://host/api` both become `https://host/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append `segments` to the base URL, percent-encoding each one as a
    /// single path segment. Ids can never climb out of their endpoint.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(Error::InvalidId {
                id: (*bad).to_owned(),
            });
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn get_no_response(&self, path: &[&str]) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_empty(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_empty(resp).await
    }

    async fn put_no_response(&self, path: &[&str]) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).send().await?;
        self.handle_empty(resp).await
    }

    async fn delete(&self, path: &[&str]) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidApiKey;
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Error::RateLimited { retry_after_secs };
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            Error::Api {
                status: status.as_u16(),
                message: err.message.unwrap_or_else(|| status.to_string()),
                code: err.code,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect all pages into a single `Vec<T>`.
    pub async fn paginate_all<T, F, Fut>(&self, limit: i32, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(i64, i32) -> Fut,
        Fut: Future<Output = Result<types::Page<T>, Error>>,
    {
        let mut all = Vec::new();
        let mut offset: i64 = 0;

        loop {
            let page = fetch(offset, limit).await?;
            let received = page.data.len();
            all.extend(page.data);

            let limit_usize = usize::try_from(limit).unwrap_or(0);
            if received == 0
                || received < limit_usize
                || i64::try_from(all.len()).unwrap_or(i64::MAX) >= page.total_count
            {
                break;
            }

            offset += i64::try_from(received).unwrap_or(i64::MAX);
        }

        Ok(all)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Sites ────────────────────────────────────────────────────────

    pub async fn list_sites(
        &self,
        offset: i64,
        limit: i32,
    ) -> Result<types::Page<types::SiteResponse>, Error> {
        self.get_with_params(
            &["v1", "sites"],
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn list_all_sites(&self) -> Result<Vec<types::SiteResponse>, Error> {
        self.paginate_all(PAGE_LIMIT, |off, lim| self.list_sites(off, lim))
            .await
    }

    // ── Device groups ────────────────────────────────────────────────

    pub async fn list_device_groups(
        &self,
        site_id: &str,
        offset: i64,
        limit: i32,
    ) -> Result<types::Page<types::DeviceGroupResponse>, Error> {
        self.get_with_params(
            &["v1", "sites", site_id, "device-groups"],
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn list_all_device_groups(
        &self,
        site_id: &str,
    ) -> Result<Vec<types::DeviceGroupResponse>, Error> {
        self.paginate_all(PAGE_LIMIT, |off, lim| {
            self.list_device_groups(site_id, off, lim)
        })
        .await
    }

    // ── Profiles ─────────────────────────────────────────────────────

    pub async fn list_profiles(
        &self,
        device_group_id: &str,
        offset: i64,
        limit: i32,
    ) -> Result<types::Page<types::ProfileResponse>, Error> {
        self.get_with_params(
            &["v1", "device-groups", device_group_id, "profiles"],
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn list_all_profiles(
        &self,
        device_group_id: &str,
    ) -> Result<Vec<types::ProfileResponse>, Error> {
        self.paginate_all(PAGE_LIMIT, |off, lim| {
            self.list_profiles(device_group_id, off, lim)
        })
        .await
    }

    /// Fetch a single profile. A 404 is reported as `Ok(None)`.
    pub async fn get_profile(
        &self,
        profile_id: &str,
    ) -> Result<Option<types::ProfileResponse>, Error> {
        match self.get(&["v1", "profiles", profile_id]).await {
            Ok(profile) => Ok(Some(profile)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ── Networks ─────────────────────────────────────────────────────

    pub async fn create_network(
        &self,
        body: &types::NetworkCreateRequest,
    ) -> Result<types::NetworkResponse, Error> {
        self.post(&["v1", "networks"], body).await
    }

    // ── Assignments ──────────────────────────────────────────────────

    pub async fn assign_network(&self, profile_id: &str, network_id: &str) -> Result<(), Error> {
        self.put_no_response(&["v1", "profiles", profile_id, "networks", network_id])
            .await
    }

    pub async fn unassign_network(&self, profile_id: &str, network_id: &str) -> Result<(), Error> {
        self.delete(&["v1", "profiles", profile_id, "networks", network_id])
            .await
    }

    /// Whether `network_id` is currently attached to `profile_id`.
    /// 200 means attached, 404 means not attached.
    pub async fn is_network_assigned(
        &self,
        profile_id: &str,
        network_id: &str,
    ) -> Result<bool, Error> {
        match self
            .get_no_response(&["v1", "profiles", profile_id, "networks", network_id])
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ── Sync ─────────────────────────────────────────────────────────

    pub async fn sync_profiles(&self, profile_ids: &[String]) -> Result<(), Error> {
        self.post_no_response(
            &["v1", "profiles", "sync"],
            &types::SyncProfilesRequest { profile_ids },
        )
        .await
    }

    pub async fn sync_profile(&self, profile_id: &str) -> Result<(), Error> {
        self.post_no_response(
            &["v1", "profiles", profile_id, "sync"],
            &serde_json::json!({}),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_api_suffix() {
        let url = ControlPlaneClient::normalize_base_url("https://10.0.0.1:8443").unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.1:8443/api/");
    }

    #[test]
    fn base_url_with_api_suffix_is_kept() {
        let url = ControlPlaneClient::normalize_base_url("https://ctrl.example/api/").unwrap();
        assert_eq!(url.as_str(), "https://ctrl.example/api/");
    }

    #[test]
    fn base_url_with_prefix_path() {
        let url = ControlPlaneClient::normalize_base_url("https://ctrl.example/proxy").unwrap();
        assert_eq!(url.as_str(), "https://ctrl.example/proxy/api/");
    }

    fn client() -> ControlPlaneClient {
        ControlPlaneClient::from_reqwest("https://ctrl.example", reqwest::Client::new()).unwrap()
    }

    #[test]
    fn ids_are_escaped_as_single_segments() {
        let url = client().url(&["v1", "sites", "a/b?c#d", "device-groups"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ctrl.example/api/v1/sites/a%2Fb%3Fc%23d/device-groups"
        );
    }

    #[test]
    fn dot_segments_are_rejected() {
        for id in ["", ".", ".."] {
            let result = client().url(&["v1", "profiles", id]);
            assert!(
                matches!(result, Err(Error::InvalidId { .. })),
                "expected InvalidId for {id:?}, got: {result:?}"
            );
        }
    }
}
