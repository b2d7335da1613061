use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use webpki_roots::TLS_SERVER_ROOTS;

use crate::http::crypto::Crypto;

pub struct HttpClientConfig {
    pub verify_tls: bool,
    pub tls_config: ClientConfig,
    root_cert_store: RootCertStore,
}

impl HttpClientConfig {
    /// Creates a new instance with a default set of trusted root CAs.
    ///
    /// By default, the client trusts the system native root certs in addition to Mozilla root certificates provided by the
    /// [`webpki_roots`](https://docs.rs/webpki-roots) crate.
    pub fn new() -> Self {
        let mut root_cert_store = RootCertStore::empty();
        root_cert_store.extend(TLS_SERVER_ROOTS.iter().cloned());
        let native_certs = rustls_native_certs::load_native_certs();
        for cert in native_certs.certs {
            if let Err(error) = root_cert_store.add(cert) {
                tracing::warn!("failed to add native cert to root store: {:?}", error);
            }
        }
        for error in native_certs.errors {
            tracing::warn!("failed to load native cert: {:?}", error);
        }

        if let Err(error) = Crypto::install_crypto_provider() {
            tracing::warn!("failed to install crypto provider: {:?}", error);
        }

        let tls_config = Self::build_tls_config(&root_cert_store, true);

        HttpClientConfig {
            verify_tls: true,
            tls_config,
            root_cert_store,
        }
    }

    /// Toggles TLS certificate verification.
    ///
    /// When disabled, server certificates are accepted without chain or
    /// hostname validation and a warning is logged instead of an error
    /// being propagated. Intended for test installations with self-signed
    /// certificates.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self.tls_config = Self::build_tls_config(&self.root_cert_store, verify);
        if !verify {
            tracing::warn!("TLS certificate verification is disabled");
        }
        self
    }

    fn build_tls_config(root_cert_store: &RootCertStore, verify: bool) -> ClientConfig {
        let mut tls_config = if verify {
            ClientConfig::builder()
                .with_root_certificates(root_cert_store.clone())
                .with_no_client_auth()
        } else {
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(Crypto::no_verification()))
                .with_no_client_auth()
        };
        tls_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
        tls_config
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        HttpClientConfig::new()
    }
}
