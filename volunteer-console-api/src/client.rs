// https://github.com/hyperium/hyper/blob/master/examples/client.rs
// https://github.com/rustls/tokio-rustls/blob/main/examples/client.rs

use core::time::Duration;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST};
use http::uri::Scheme;
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt as _, Full};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};
use volunteer_console_config::Config;

use crate::error::{ApiError, Result};
use crate::session::Session;

const JSON: &str = "application/json";

/// Typed client of the volunteer-management REST backend.
///
/// Cheap to clone. Clones share the [`Session`], so a 401 seen by one is seen by all.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Uri,
    session: Session,
    timeout: Duration,
    tls: Arc<ClientConfig>,
}

pub(crate) enum Body {
    Empty,
    Raw { bytes: Bytes, content_type: String },
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_session(config, Session::new(config.token.clone()))
    }

    pub fn with_session(config: &Config, session: Session) -> Result<Self> {
        let base: Uri = config.api_url.trim_end_matches('/').parse()?;
        if base.host().is_none() {
            return Err(ApiError::MissingHost);
        }

        let mut root_cert_store = RootCertStore::empty();
        root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls = ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        Ok(Self {
            base,
            session,
            timeout: config.request_timeout(),
            tls: Arc::new(tls),
        })
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let body = self.execute(method, path, Body::Empty).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn submit<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(method, path, json_body(body)?).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// For endpoints whose answer the console ignores.
    pub(crate) async fn call(&self, method: Method, path: &str) -> Result<()> {
        self.execute(method, path, Body::Empty).await?;
        Ok(())
    }

    pub(crate) async fn call_with<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<()> {
        self.execute(method, path, json_body(body)?).await?;
        Ok(())
    }

    pub(crate) async fn execute(&self, method: Method, path: &str, body: Body) -> Result<Bytes> {
        let Some(token) = self.session.token() else {
            return Err(ApiError::NotAuthenticated);
        };
        let uri = self.uri(path)?;
        let authority = uri.authority().ok_or(ApiError::MissingHost)?.to_string();
        let path_and_query = uri
            .path_and_query()
            .map_or_else(|| "/".to_owned(), ToString::to_string);

        let request = Request::builder()
            .method(method.clone())
            .uri(path_and_query)
            .header(HOST, authority)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, JSON);
        let request = match body {
            Body::Empty => request.body(Full::new(Bytes::new()))?,
            Body::Raw {
                bytes,
                content_type,
            } => request
                .header(CONTENT_TYPE, content_type)
                .body(Full::new(bytes))?,
        };

        debug!(%method, %uri, "request");
        let (status, body) = tokio::time::timeout(self.timeout, self.dispatch(&uri, request))
            .await
            .map_err(|_elapsed| ApiError::Timeout(self.timeout))??;
        debug!(%method, %uri, %status, "response");

        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }

    fn uri(&self, path: &str) -> Result<Uri> {
        let base_path = self.base.path().trim_end_matches('/');
        let mut parts = self.base.clone().into_parts();
        parts.path_and_query = Some(format!("{base_path}{path}").parse()?);
        Uri::from_parts(parts).map_err(|err| ApiError::HyperHttp(err.into()))
    }

    async fn dispatch(
        &self,
        uri: &Uri,
        request: Request<Full<Bytes>>,
    ) -> Result<(StatusCode, Bytes)> {
        let host = uri.host().ok_or(ApiError::MissingHost)?;
        let https = uri.scheme() == Some(&Scheme::HTTPS);
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });

        let stream = TcpStream::connect((host, port)).await?;
        if https {
            let connector = TlsConnector::from(Arc::clone(&self.tls));
            let server_name = ServerName::try_from(host.to_owned())
                .map_err(|_| ApiError::InvalidServerName(host.to_owned()))?;
            let stream = connector.connect(server_name, stream).await?;
            send(TokioIo::new(stream), request).await
        } else {
            send(TokioIo::new(stream), request).await
        }
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<Body> {
    Ok(Body::Raw {
        bytes: Bytes::from(serde_json::to_vec(body)?),
        content_type: JSON.to_owned(),
    })
}

pub(crate) fn with_query<Q: Serialize + ?Sized>(path: &str, query: &Q) -> Result<String> {
    let query = serde_urlencoded::to_string(query)?;
    if query.is_empty() {
        Ok(path.to_owned())
    } else {
        Ok(format!("{path}?{query}"))
    }
}

async fn send<I>(io: I, request: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes)>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(io).await?;
    tokio::task::spawn(async move {
        if let Err(err) = connection.await {
            warn!("connection failed: {err}");
        }
    });

    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, body))
}
