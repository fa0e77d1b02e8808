//! Client-certificate relay
//!
//! Chromium has no per-context API for presenting a PKCS#12 client identity,
//! so the browser is launched against a local HTTP proxy. `CONNECT` tunnels
//! to a registered origin are intercepted: the browser side is terminated
//! with a self-signed certificate for that host (certificate errors are
//! suppressed at launch) and the connection is re-originated upstream over
//! TLS presenting the client identity. Every other tunnel is forwarded blind.
//!
//! ```text
//! browser ──CONNECT host:443──▶ relay ──TLS + client cert──▶ origin
//!          ◀── TLS (self-signed) ──┘
//! ```

use crate::error::{CmdbError, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::io::{copy_bidirectional, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Upper bound on a proxy request head
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// TLS endpoints for one intercepted origin
#[derive(Clone)]
struct OriginRoute {
    /// Host name used for SNI and the interception certificate
    host: String,
    /// Terminates the browser side with a self-signed certificate
    acceptor: tokio_native_tls::TlsAcceptor,
    /// Connects upstream presenting the client identity
    connector: tokio_native_tls::TlsConnector,
    /// Number of live registrations for this origin
    registrations: usize,
}

type Routes = Arc<RwLock<HashMap<String, OriginRoute>>>;

/// Local proxy that presents a client certificate to registered origins
pub struct ClientCertRelay {
    addr: SocketAddr,
    routes: Routes,
    accept_task: JoinHandle<()>,
}

impl ClientCertRelay {
    /// Bind on an ephemeral loopback port and start accepting connections
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let routes: Routes = Arc::new(RwLock::new(HashMap::new()));

        let accept_routes = Arc::clone(&routes);
        let accept_task = tokio::spawn(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Relay accept failed: {}", e);
                        continue;
                    }
                };
                let routes = Arc::clone(&accept_routes);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, routes).await {
                        debug!("Relay connection from {} ended: {}", peer, e);
                    }
                });
            }
        });

        info!("Client certificate relay listening on {}", addr);
        Ok(Self {
            addr,
            routes,
            accept_task,
        })
    }

    /// Address the browser's `--proxy-server` points at
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Present `pkcs12` to the origin at `authority` (`host:port`)
    ///
    /// The returned guard keeps the registration alive; the origin reverts to
    /// a blind tunnel once every guard for it is dropped.
    pub fn register(&self, authority: &str, pkcs12_der: &[u8], passphrase: &str) -> Result<RelayRegistration> {
        let (host, _port) = split_authority(authority)?;

        let mut routes = self
            .routes
            .write()
            .map_err(|_| CmdbError::Relay("route table poisoned".to_string()))?;

        if let Some(route) = routes.get_mut(authority) {
            route.registrations += 1;
        } else {
            let route = build_route(&host, pkcs12_der, passphrase)?;
            routes.insert(authority.to_string(), route);
            info!("Client certificate registered for {}", authority);
        }

        Ok(RelayRegistration {
            authority: authority.to_string(),
            routes: Arc::clone(&self.routes),
        })
    }

    /// Whether a client certificate is currently presented to `authority`
    pub fn is_registered(&self, authority: &str) -> bool {
        self.routes
            .read()
            .map(|routes| routes.contains_key(authority))
            .unwrap_or(false)
    }

    /// Stop accepting connections
    pub fn stop(self) {
        info!("Stopping client certificate relay on {}", self.addr);
        self.accept_task.abort();
    }
}

impl Drop for ClientCertRelay {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Keeps a client certificate registered for one origin
pub struct RelayRegistration {
    authority: String,
    routes: Routes,
}

impl Drop for RelayRegistration {
    fn drop(&mut self) {
        let Ok(mut routes) = self.routes.write() else {
            return;
        };
        let remove = match routes.get_mut(&self.authority) {
            Some(route) if route.registrations > 1 => {
                route.registrations -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if remove {
            routes.remove(&self.authority);
            debug!("Client certificate unregistered for {}", self.authority);
        }
    }
}

fn build_route(host: &str, pkcs12_der: &[u8], passphrase: &str) -> Result<OriginRoute> {
    let client_identity = native_tls::Identity::from_pkcs12(pkcs12_der, passphrase)
        .map_err(|e| CmdbError::Config(format!("Cannot load client certificate: {}", e)))?;
    let connector = native_tls::TlsConnector::builder()
        .identity(client_identity)
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| CmdbError::Relay(format!("Cannot build upstream TLS connector: {}", e)))?;

    let rcgen::CertifiedKey { cert, signing_key } =
        rcgen::generate_simple_self_signed(vec![host.to_string()])
            .map_err(|e| CmdbError::Relay(format!("Cannot generate interception certificate: {}", e)))?;
    let server_identity =
        native_tls::Identity::from_pkcs8(cert.pem().as_bytes(), signing_key.serialize_pem().as_bytes())
            .map_err(|e| CmdbError::Relay(format!("Cannot load interception certificate: {}", e)))?;
    let acceptor = native_tls::TlsAcceptor::new(server_identity)
        .map_err(|e| CmdbError::Relay(format!("Cannot build TLS acceptor: {}", e)))?;

    Ok(OriginRoute {
        host: host.to_string(),
        acceptor: tokio_native_tls::TlsAcceptor::from(acceptor),
        connector: tokio_native_tls::TlsConnector::from(connector),
        registrations: 1,
    })
}

/// A parsed proxy request head
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRequest {
    /// `CONNECT host:port`
    Connect { authority: String },
    /// Plain HTTP request in absolute form; `head` is rewritten for a single exchange
    Forward { authority: String, head: String },
}

impl ProxyRequest {
    /// Parse a request head (request line plus headers, CRLF terminated)
    pub fn parse(head: &str) -> Result<Self> {
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default();
        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CmdbError::Relay(format!("malformed request line: {:?}", request_line)));
        };

        if method.eq_ignore_ascii_case("CONNECT") {
            let authority = if target.contains(':') {
                target.to_string()
            } else {
                format!("{}:443", target)
            };
            split_authority(&authority)?;
            return Ok(ProxyRequest::Connect { authority });
        }

        let url = Url::parse(target)
            .map_err(|e| CmdbError::Relay(format!("proxy request is not absolute-form ({}): {}", target, e)))?;
        if url.scheme() != "http" {
            return Err(CmdbError::Relay(format!("unsupported proxy scheme: {}", url.scheme())));
        }
        let host = url
            .host_str()
            .ok_or_else(|| CmdbError::Relay(format!("no host in {}", target)))?;
        let authority = format!("{}:{}", host, url.port_or_known_default().unwrap_or(80));

        let mut rewritten = format!("{} {} {}\r\n", method, target, version);
        for line in lines.filter(|l| !l.is_empty()) {
            let name = line.split(':').next().unwrap_or_default().trim();
            if name.eq_ignore_ascii_case("connection") || name.eq_ignore_ascii_case("proxy-connection") {
                continue;
            }
            rewritten.push_str(line);
            rewritten.push_str("\r\n");
        }
        rewritten.push_str("Connection: close\r\n\r\n");

        Ok(ProxyRequest::Forward {
            authority,
            head: rewritten,
        })
    }
}

fn split_authority(authority: &str) -> Result<(String, u16)> {
    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| CmdbError::Relay(format!("authority without port: {}", authority)))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| CmdbError::Relay(format!("invalid port in {}", authority)))?;
    if host.is_empty() {
        return Err(CmdbError::Relay(format!("authority without host: {}", authority)));
    }
    Ok((host.trim_start_matches('[').trim_end_matches(']').to_string(), port))
}

async fn read_head<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut limited = reader.take(MAX_HEAD_BYTES as u64);
    let mut head = Vec::new();
    loop {
        let read = limited.read_until(b'\n', &mut head).await?;
        if head.ends_with(b"\r\n\r\n") || head.ends_with(b"\n\n") {
            break;
        }
        if limited.limit() == 0 {
            return Err(CmdbError::Relay("request head too large".to_string()));
        }
        if read == 0 {
            return Err(CmdbError::Relay("connection closed before request head".to_string()));
        }
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

async fn handle_connection(stream: TcpStream, routes: Routes) -> Result<()> {
    let mut reader = BufReader::new(stream);
    let head = read_head(&mut reader).await?;

    let request = match ProxyRequest::parse(&head) {
        Ok(request) => request,
        Err(e) => {
            let mut client = reader.into_inner();
            let _ = client.write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n").await;
            return Err(e);
        }
    };

    match request {
        ProxyRequest::Connect { authority } => {
            let route = routes
                .read()
                .map_err(|_| CmdbError::Relay("route table poisoned".to_string()))?
                .get(&authority)
                .cloned();

            // The client waits for the 200 before sending, so nothing is buffered
            let mut client = reader.into_inner();
            let mut upstream = match TcpStream::connect(&authority).await {
                Ok(upstream) => upstream,
                Err(e) => {
                    let _ = client.write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n").await;
                    return Err(e.into());
                }
            };
            client
                .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
                .await?;

            match route {
                Some(route) => intercept(client, upstream, &authority, route).await,
                None => {
                    copy_bidirectional(&mut client, &mut upstream).await?;
                    Ok(())
                }
            }
        }
        ProxyRequest::Forward { authority, head } => {
            let leftover = reader.buffer().to_vec();
            let mut client = reader.into_inner();
            let mut upstream = TcpStream::connect(&authority).await?;
            upstream.write_all(head.as_bytes()).await?;
            upstream.write_all(&leftover).await?;
            copy_bidirectional(&mut client, &mut upstream).await?;
            Ok(())
        }
    }
}

async fn intercept(client: TcpStream, upstream: TcpStream, authority: &str, route: OriginRoute) -> Result<()> {
    debug!("Intercepting tunnel to {}", authority);

    let mut browser_side = route
        .acceptor
        .accept(client)
        .await
        .map_err(|e| CmdbError::Relay(format!("browser TLS handshake for {} failed: {}", authority, e)))?;
    let mut origin_side = route
        .connector
        .connect(&route.host, upstream)
        .await
        .map_err(|e| CmdbError::Relay(format!("upstream TLS handshake with {} failed: {}", authority, e)))?;

    copy_bidirectional(&mut browser_side, &mut origin_side).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect() {
        let req = ProxyRequest::parse("CONNECT demo.u-system.tech:443 HTTP/1.1\r\nHost: demo.u-system.tech:443\r\n\r\n")
            .unwrap();
        assert_eq!(
            req,
            ProxyRequest::Connect {
                authority: "demo.u-system.tech:443".to_string()
            }
        );
    }

    #[test]
    fn test_parse_connect_defaults_port() {
        let req = ProxyRequest::parse("CONNECT cmdb.internal HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(
            req,
            ProxyRequest::Connect {
                authority: "cmdb.internal:443".to_string()
            }
        );
    }

    #[test]
    fn test_parse_forward_rewrites_connection_headers() {
        let head = "GET http://cdn.local:8080/app.js HTTP/1.1\r\nHost: cdn.local:8080\r\nProxy-Connection: keep-alive\r\nAccept: */*\r\n\r\n";
        let ProxyRequest::Forward { authority, head } = ProxyRequest::parse(head).unwrap() else {
            panic!("expected forward request");
        };
        assert_eq!(authority, "cdn.local:8080");
        assert!(head.starts_with("GET http://cdn.local:8080/app.js HTTP/1.1\r\n"));
        assert!(head.contains("Accept: */*\r\n"));
        assert!(!head.to_ascii_lowercase().contains("proxy-connection"));
        assert!(head.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ProxyRequest::parse("hello\r\n\r\n").is_err());
        assert!(ProxyRequest::parse("GET /relative HTTP/1.1\r\n\r\n").is_err());
        assert!(ProxyRequest::parse("CONNECT host:notaport HTTP/1.1\r\n\r\n").is_err());
    }

    #[test]
    fn test_split_authority() {
        assert_eq!(split_authority("example.com:443").unwrap(), ("example.com".to_string(), 443));
        assert_eq!(split_authority("[::1]:8443").unwrap(), ("::1".to_string(), 8443));
        assert!(split_authority(":443").is_err());
    }

    #[tokio::test]
    async fn test_read_head_stops_at_blank_line() {
        let raw = b"CONNECT cmdb.internal:443 HTTP/1.1\r\nHost: cmdb.internal:443\r\n\r\nTLS bytes";
        let mut reader = &raw[..];
        let head = read_head(&mut reader).await.unwrap();
        assert_eq!(head, "CONNECT cmdb.internal:443 HTTP/1.1\r\nHost: cmdb.internal:443\r\n\r\n");
        assert_eq!(reader, b"TLS bytes");
    }

    #[tokio::test]
    async fn test_read_head_bounds_a_line_without_newline() {
        let raw = vec![b'a'; MAX_HEAD_BYTES * 4];
        let mut reader = &raw[..];
        let err = read_head(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert_eq!(reader.len(), MAX_HEAD_BYTES * 3);
    }

    #[tokio::test]
    async fn test_read_head_reports_early_close() {
        let mut reader = &b"GET http://cdn.local/ HTTP/1.1\r\n"[..];
        let err = read_head(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("closed before request head"));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_pkcs12() {
        let relay = ClientCertRelay::start().await.unwrap();
        let err = relay
            .register("demo.u-system.tech:443", b"definitely not pkcs12", "")
            .err()
            .unwrap();
        assert!(matches!(err, CmdbError::Config(_)));
        assert!(!relay.is_registered("demo.u-system.tech:443"));
        relay.stop();
    }

    #[tokio::test]
    async fn test_blind_tunnel_forwards_bytes() {
        let echo = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let echo_addr = echo.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = echo.accept().await.unwrap();
            let mut buf = [0u8; 4];
            sock.read_exact(&mut buf).await.unwrap();
            sock.write_all(&buf).await.unwrap();
        });

        let relay = ClientCertRelay::start().await.unwrap();
        let mut client = TcpStream::connect(relay.local_addr()).await.unwrap();
        client
            .write_all(format!("CONNECT {} HTTP/1.1\r\n\r\n", echo_addr).as_bytes())
            .await
            .unwrap();

        let mut reader = BufReader::new(client);
        let mut status = String::new();
        reader.read_line(&mut status).await.unwrap();
        assert!(status.starts_with("HTTP/1.1 200"));
        let mut blank = String::new();
        reader.read_line(&mut blank).await.unwrap();

        let mut client = reader.into_inner();
        client.write_all(b"ping").await.unwrap();
        let mut reply = [0u8; 4];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"ping");
        relay.stop();
    }
}
