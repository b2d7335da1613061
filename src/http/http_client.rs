use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Request, Response, Uri, Version};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::http::executor::Executor;
use crate::http::http_client_config::HttpClientConfig;
use crate::http::http_request::HttpRequest;
use crate::http::http_response::HttpResponse;

pub struct HttpClient {
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Self {
        HttpClient {
            config: Arc::new(config),
        }
    }

    /// Sends an HTTP request to the server, automatically selecting the appropriate protocol and transport.
    ///
    /// If the URL scheme is `"http"`, HTTP/1.1 will be used for the request.
    ///
    /// If the URL scheme is `"https"`, a secure TLS connection is established and ALPN is used to determine whether to use HTTP/2 or HTTP/1.1 for the request.
    pub async fn send<T: AsRef<str>>(&self, url: T, request: HttpRequest) -> anyhow::Result<HttpResponse> {
        let uri = url.as_ref().parse::<Uri>()?;
        let scheme = match uri.scheme_str() {
            Some(scheme) => scheme,
            None => return Err(anyhow::anyhow!("URL is missing a scheme.")),
        };

        match scheme {
            "http" => self.send_tcp(uri, request).await,
            "https" => self.send_tls(uri, request).await,
            _ => Err(anyhow::anyhow!("Unsupported scheme: {}", scheme)),
        }
    }

    async fn send_tcp(&self, uri: Uri, request: HttpRequest) -> anyhow::Result<HttpResponse> {
        let host = match uri.host() {
            Some(host) => host,
            None => return Err(anyhow::anyhow!("Invalid URL.")),
        };
        let port = uri.port_u16().unwrap_or(80);

        let stream = TcpStream::connect((host, port)).await?;
        let io = TokioIo::new(stream);

        let (mut sender, connection) = hyper::client::conn::http1::handshake(io).await?;

        tokio::spawn(async move {
            connection.await
        });

        let req = Self::build_request(&uri, request, Version::HTTP_11)?;
        let res = sender.send_request(req).await?;
        Self::build_response(res).await
    }

    async fn send_tls(&self, uri: Uri, request: HttpRequest) -> anyhow::Result<HttpResponse> {
        let host = match uri.host() {
            Some(host) => host,
            None => return Err(anyhow::anyhow!("Invalid URL.")),
        };
        let port = uri.port_u16().unwrap_or(443);
        let domain = rustls::pki_types::ServerName::try_from(host.to_string())?;

        let tls_config = self.config.tls_config.clone();
        let tcp_stream = TcpStream::connect((host, port)).await?;
        let tls_connector = TlsConnector::from(Arc::new(tls_config));
        let tls_stream = tls_connector.connect(domain, tcp_stream).await?;
        let protocol = tls_stream.get_ref().1.alpn_protocol();

        match protocol.as_deref() {
            Some(b"h2") => {
                let io = TokioIo::new(tls_stream);
                let (mut sender, connection) = hyper::client::conn::http2::Builder::new(Executor).handshake(io).await?;

                tokio::spawn(async move {
                    connection.await
                });

                let req = Self::build_request(&uri, request, Version::HTTP_2)?;
                let res = sender.send_request(req).await?;
                Self::build_response(res).await
            }
            _ => {
                let io = TokioIo::new(tls_stream);
                let (mut sender, connection) = hyper::client::conn::http1::handshake(io).await?;

                tokio::spawn(async move {
                    connection.await
                });

                let req = Self::build_request(&uri, request, Version::HTTP_11)?;
                let res = sender.send_request(req).await?;
                Self::build_response(res).await
            }
        }
    }

    fn build_request(uri: &Uri, request: HttpRequest, version: Version) -> anyhow::Result<Request<Full<Bytes>>> {
        let mut req: Request<Full<Bytes>> = match version {
            Version::HTTP_2 => {
                Request::builder()
                    .version(Version::HTTP_2)
                    .method(request.method.as_str())
                    .uri(uri.clone())
                    .body(Full::new(Bytes::new()))?
            }
            Version::HTTP_11 => {
                let authority = match uri.authority() {
                    Some(authority) => authority,
                    None => return Err(anyhow::anyhow!("Invalid URL.")),
                };
                // The request target must keep the query string intact.
                let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

                Request::builder()
                    .version(Version::HTTP_11)
                    .method(request.method.as_str())
                    .uri(path_and_query)
                    .header(hyper::header::HOST, authority.as_str())
                    .body(Full::new(Bytes::new()))?
            }
            _ => return Err(anyhow::anyhow!("Unsupported HTTP version")),
        };

        for (key, value) in request.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())?;
            let header_value = HeaderValue::from_str(&value)?;
            req.headers_mut().insert(header_name, header_value);
        }

        Ok(req)
    }

    async fn build_response(res: Response<Incoming>) -> anyhow::Result<HttpResponse> {
        let (parts, body) = res.into_parts();
        let mut response = HttpResponse::new();
        response.status = parts.status.as_u16();

        for (key, value) in parts.headers {
            if let Some(key) = key {
                response.headers.insert(key.to_string(), value.to_str()?.to_string());
            }
        }

        response.body = body.collect().await?.to_bytes().to_vec();

        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        HttpClient::new(HttpClientConfig::new())
    }
}
