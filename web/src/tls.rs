//! TLS termination for the HTTPS listener.

use std::{future::Future, io, path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use rustls::{
    ServerConfig,
    crypto::{CryptoProvider, ring},
    pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject},
};
use snippetbox_config::TlsConfig;
use tokio::{
    net::TcpListener,
    sync::watch,
    time::{sleep, timeout},
};
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not read {path}: {source}")]
    Pem {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },
    #[error("no certificate found in {0}")]
    NoCertificate(PathBuf),
    #[error(transparent)]
    Rustls(#[from] rustls::Error),
}

/// The `ring` provider restricted to the X25519 and P-256 key exchange groups.
pub fn crypto_provider() -> CryptoProvider {
    CryptoProvider {
        kx_groups: vec![ring::kx_group::X25519, ring::kx_group::SECP256R1],
        ..ring::default_provider()
    }
}

pub fn server_config(config: &TlsConfig) -> Result<ServerConfig, Error> {
    let pem_error = |path: &PathBuf| {
        let path = path.clone();
        move |source| Error::Pem { path, source }
    };

    let certs = CertificateDer::pem_file_iter(&config.cert_path)
        .map_err(pem_error(&config.cert_path))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(pem_error(&config.cert_path))?;
    if certs.is_empty() {
        return Err(Error::NoCertificate(config.cert_path.clone()));
    }
    let key = PrivateKeyDer::from_pem_file(&config.key_path).map_err(pem_error(&config.key_path))?;

    let mut server_config = ServerConfig::builder_with_provider(Arc::new(crypto_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(server_config)
}

pub fn acceptor(config: &TlsConfig) -> Result<TlsAcceptor, Error> {
    Ok(TlsAcceptor::from(Arc::new(server_config(config)?)))
}

/// Accepts TLS connections until `shutdown` resolves, then waits for open
/// connections to finish their in-flight requests.
pub async fn serve(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Router,
    header_read_timeout: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let (signal_tx, signal_rx) = watch::channel(());
    let (close_tx, close_rx) = watch::channel(());

    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    handle_accept_error(err).await;
                    continue;
                }
            },
            _ = &mut shutdown => {
                debug!("no longer accepting connections");
                break;
            }
        };

        let acceptor = acceptor.clone();
        let service = TowerToHyperService::new(router.clone());
        let mut signal_rx = signal_rx.clone();
        let close_rx = close_rx.clone();

        tokio::spawn(async move {
            // A client that never finishes the handshake is dropped like one
            // that never finishes its request headers.
            let stream = match timeout(header_read_timeout, acceptor.accept(stream)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(err)) => {
                    debug!("tls handshake with {} failed: {}", peer, err);
                    return;
                }
                Err(_) => {
                    debug!("tls handshake with {} timed out", peer);
                    return;
                }
            };

            let mut builder = Builder::new(TokioExecutor::new());
            builder
                .http1()
                .timer(TokioTimer::new())
                .header_read_timeout(header_read_timeout);

            let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
            tokio::pin!(conn);

            loop {
                tokio::select! {
                    result = conn.as_mut() => {
                        if let Err(err) = result {
                            debug!("connection with {} closed: {}", peer, err);
                        }
                        break;
                    }
                    _ = signal_rx.changed() => {
                        conn.as_mut().graceful_shutdown();
                    }
                }
            }

            drop(close_rx);
        });
    }

    drop(close_rx);
    drop(listener);

    // Every connection task holds a receiver; `closed` resolves once all are gone.
    let _ = signal_tx.send(());
    info!(
        "waiting for {} connections to close",
        close_tx.receiver_count()
    );
    close_tx.closed().await;
}

/// Per-connection errors are retried right away. Anything else (e.g. running
/// out of file descriptors) backs off for a second before accepting again.
async fn handle_accept_error(err: io::Error) {
    if matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    ) {
        debug!("connection closed before it was accepted: {}", err);
        return;
    }

    error!("failed to accept connection: {:?}", err);
    sleep(Duration::from_secs(1)).await;
}

#[cfg(test)]
mod tests {
    use rustls::NamedGroup;

    use super::*;

    #[test]
    fn only_modern_key_exchange_groups_are_offered() {
        let groups: Vec<NamedGroup> = crypto_provider()
            .kx_groups
            .iter()
            .map(|group| group.name())
            .collect();

        assert_eq!(groups, vec![NamedGroup::X25519, NamedGroup::secp256r1]);
    }

    fn fixture_tls_config() -> TlsConfig {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tls");

        TlsConfig {
            cert_path: fixtures.join("cert.pem"),
            key_path: fixtures.join("key.pem"),
        }
    }

    #[tokio::test]
    async fn silent_clients_are_dropped_after_the_header_read_timeout() {
        use tokio::{io::AsyncReadExt, net::TcpStream, sync::oneshot};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let acceptor = acceptor(&fixture_tls_config()).unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(
            listener,
            acceptor,
            Router::new(),
            Duration::from_millis(200),
            async move {
                let _ = stop_rx.await;
            },
        ));

        // Connect and never send a ClientHello.
        let mut client = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 16];
        let read = timeout(Duration::from_secs(3), client.read(&mut buf))
            .await
            .expect("the server kept a silent connection open");

        assert!(
            matches!(read, Ok(0) | Err(_)),
            "expected the connection to be closed, got {read:?}"
        );

        let _ = stop_tx.send(());
        timeout(Duration::from_secs(3), server)
            .await
            .expect("the server did not shut down")
            .unwrap();
    }

    #[test]
    fn fixture_certificate_is_accepted() {
        let config = server_config(&fixture_tls_config()).unwrap();

        assert_eq!(
            config.alpn_protocols,
            vec![b"h2".to_vec(), b"http/1.1".to_vec()]
        );
    }

    #[test]
    fn missing_certificate_files_are_reported() {
        let err = server_config(&TlsConfig {
            cert_path: "does/not/exist/cert.pem".into(),
            key_path: "does/not/exist/key.pem".into(),
        })
        .unwrap_err();

        assert!(
            matches!(err, Error::Pem { ref path, .. } if path.ends_with("cert.pem")),
            "got {err:?}"
        );
    }
}
