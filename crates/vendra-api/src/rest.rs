// Async HTTP client for the backend's table REST API (PostgREST dialect).
//
// Base path: /rest/v1/<table>
// Auth: `apikey` header plus `Authorization: Bearer <access token or key>`

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;

const PREFER_REPRESENTATION: &str = "return=representation";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Error code the backend uses when a single-object request matched no rows.
const NO_ROWS_CODE: &str = "PGRST116";

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the table REST API.
///
/// Every row-returning call deserializes straight into the caller's type;
/// mapping wire rows to domain records is the caller's concern. No retries,
/// no caching: each method is exactly one HTTP round trip.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from the project URL, public API key and optional session token.
    ///
    /// Injects `apikey` and `Authorization` as default headers. Without a
    /// session token the API key doubles as the bearer token.
    pub fn new(
        project_url: &str,
        api_key: &SecretString,
        access_token: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();

        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("apikey", key_value);

        let bearer = access_token.unwrap_or(api_key);
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", bearer.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid access token header value: {e}"),
            })?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(project_url)?;

        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(project_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(project_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: crate::transport::DEFAULT_TIMEOUT.as_secs(),
        })
    }

    /// Build the base URL ending in `/rest/v1/`.
    ///
    /// Accepts either the bare project URL or one already pointing at the
    /// REST root.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/rest/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/rest/v1/"));
        }

        Ok(url)
    }

    /// The REST root every table path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(table)?)
    }

    // ── Table operations ─────────────────────────────────────────────

    /// Fetch every row of `table`, sorted by `order` (e.g. `"created_at.desc"`).
    pub async fn select_all<T: DeserializeOwned>(
        &self,
        table: &str,
        order: &str,
    ) -> Result<Vec<T>, Error> {
        let url = self.url(table)?;
        debug!("GET {url} order={order}");

        let req = self
            .http
            .get(url)
            .query(&[("select", "*"), ("order", order)]);
        let resp = self.send(req).await?;
        self.handle_response(table, resp).await
    }

    /// Fetch the single row where `column = value`.
    ///
    /// A "no rows" answer is an absence, not an error.
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<T>, Error> {
        let url = self.url(table)?;
        debug!("GET {url} {column}=eq.{value}");

        let req = self
            .http
            .get(url)
            .header(ACCEPT, SINGLE_OBJECT)
            .query(&[("select", "*".to_owned()), (column, format!("eq.{value}"))]);
        let resp = self.send(req).await?;

        match self.handle_response(table, resp).await {
            Ok(row) => Ok(Some(row)),
            Err(Error::NoRows { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert one row and return the stored representation.
    pub async fn insert<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("POST {url}");

        let req = self
            .http
            .post(url)
            .header("Prefer", PREFER_REPRESENTATION)
            .header(ACCEPT, SINGLE_OBJECT)
            .json(body);
        let resp = self.send(req).await?;
        self.handle_response(table, resp).await
    }

    /// Patch the row with the given id and return the stored representation.
    ///
    /// Fails with [`Error::NoRows`] when no row has that id.
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.update_where(table, "id", id, body).await
    }

    /// Patch the single row where `column = value` and return it.
    ///
    /// Fails with [`Error::NoRows`] when nothing matches.
    pub async fn update_where<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        column: &str,
        value: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("PATCH {url} {column}=eq.{value}");

        let req = self
            .http
            .patch(url)
            .header("Prefer", PREFER_REPRESENTATION)
            .header(ACCEPT, SINGLE_OBJECT)
            .query(&[(column, format!("eq.{value}"))])
            .json(body);
        let resp = self.send(req).await?;
        self.handle_response(table, resp).await
    }

    /// Delete the row with the given id.
    ///
    /// Fails with [`Error::NoRows`] when no row has that id.
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), Error> {
        let url = self.url(table)?;
        debug!("DELETE {url} id=eq.{id}");

        let req = self
            .http
            .delete(url)
            .header("Prefer", PREFER_REPRESENTATION)
            .query(&[("id", format!("eq.{id}"))]);
        let resp = self.send(req).await?;

        let removed: Vec<serde_json::Value> = self.handle_response(table, resp).await?;
        if removed.is_empty() {
            return Err(Error::NoRows {
                table: table.to_owned(),
            });
        }
        Ok(())
    }

    // ── Response handling ────────────────────────────────────────────

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        req.send().await.map_err(|e| self.transport_error(e))
    }

    /// The client-wide timeout also covers reading the body, so both the
    /// send and the body read report it with the configured duration.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(e)
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        table: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await.map_err(|e| self.transport_error(e))?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(table, status, resp).await)
        }
    }

    async fn parse_error(table: &str, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        if parsed
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == NO_ROWS_CODE)
        {
            return Error::NoRows {
                table: table.to_owned(),
            };
        }

        let message = match parsed.as_ref().and_then(|e| e.message.clone()) {
            Some(message) => message,
            None if raw.is_empty() => status.to_string(),
            None => raw,
        };

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication { message };
        }

        let (code, details, hint) = parsed.map_or((None, None, None), |e| (e.code, e.details, e.hint));
        Error::Backend {
            message,
            code,
            details,
            hint,
            status: status.as_u16(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_appends_rest_root() {
        let url = RestClient::normalize_base_url("https://abc.example.co").unwrap();
        assert_eq!(url.as_str(), "https://abc.example.co/rest/v1/");
    }

    #[test]
    fn base_url_keeps_existing_rest_root() {
        let url = RestClient::normalize_base_url("https://abc.example.co/rest/v1/").unwrap();
        assert_eq!(url.as_str(), "https://abc.example.co/rest/v1/");
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(matches!(
            RestClient::normalize_base_url("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
