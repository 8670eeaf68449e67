use ::rustls::ServerConfig;
use ::rustls::crypto::ring;
use ::std::sync::Arc;

use crate::CertificateBundle;
use crate::Result;
use crate::ServerError;

/// Builds the rustls server configuration out of a generated PEM bundle.
pub(crate) fn new_tls_server_config(certificate: &CertificateBundle) -> Result<Arc<ServerConfig>> {
    // rustls refuses to pick a crypto provider on its own when more than
    // one is linked into the binary.
    let _ = ring::default_provider().install_default();

    let certs = ::rustls_pemfile::certs(&mut certificate.cert.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ServerError::Tls(Box::new(err)))?;
    let key = ::rustls_pemfile::private_key(&mut certificate.key.as_bytes())
        .map_err(|err| ServerError::Tls(Box::new(err)))?
        .ok_or_else(|| ServerError::Tls("no private key found in the generated bundle".into()))?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

#[cfg(test)]
mod test_new_tls_server_config {
    use super::*;

    use crate::CertificateOptions;
    use crate::certificate::generate;

    #[test]
    fn it_should_accept_a_generated_bundle() {
        let bundle = generate(&CertificateOptions::default()).unwrap();

        let config = new_tls_server_config(&bundle);

        assert!(config.is_ok());
    }

    #[test]
    fn it_should_reject_a_bundle_without_a_key() {
        let mut bundle = generate(&CertificateOptions::default()).unwrap();
        bundle.key = String::new();

        let result = new_tls_server_config(&bundle);

        assert!(matches!(result, Err(ServerError::Tls(_))));
    }
}
