use ::rcgen::BasicConstraints;
use ::rcgen::CertificateParams;
use ::rcgen::DnType;
use ::rcgen::ExtendedKeyUsagePurpose;
use ::rcgen::IsCa;
use ::rcgen::KeyPair;
use ::rcgen::KeyUsagePurpose;
use ::rcgen::SanType;
use ::std::net::IpAddr;
use ::std::net::Ipv4Addr;
use ::std::net::Ipv6Addr;

use crate::Result;

pub(crate) const DEFAULT_SUBJECT: &str = "localhost";

const CA_COMMON_NAME: &str = "local-test-server CA";

/// The options handed through to the certificate provider, untouched.
#[derive(Debug, Clone, Default)]
pub struct CertificateOptions {
    /// The subject to embed in the generated leaf certificate.
    ///
    /// **Defaults** to `localhost`.
    pub common_name: Option<String>,
}

/// The key material backing a server's https listener, as PEM strings.
///
/// A fresh bundle is generated for every server. To validate the https
/// connection without turning certificate checks off, configure your
/// client to trust [`CaKeyPair::cert`] from [`ca_keys`](Self::ca_keys).
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    /// The server's private key.
    pub key: String,

    /// The server's leaf certificate,
    /// signed by [`ca_keys`](Self::ca_keys).
    pub cert: String,

    /// The throwaway certificate authority which signed
    /// [`cert`](Self::cert).
    pub ca_keys: CaKeyPair,
}

/// The key pair of the certificate authority backing a
/// [`CertificateBundle`].
#[derive(Debug, Clone)]
pub struct CaKeyPair {
    /// The authority's private key.
    pub key: String,

    /// The authority's certificate, for clients to trust.
    pub cert: String,
}

/// Generates a throwaway certificate authority, and a leaf certificate
/// signed by it for the requested subject.
///
/// The leaf always carries SANs for `localhost` and the loopback IPs,
/// so clients reaching the server as `localhost` can validate it even
/// when a custom subject was asked for.
pub(crate) fn generate(options: &CertificateOptions) -> Result<CertificateBundle> {
    let subject = options.common_name.as_deref().unwrap_or(DEFAULT_SUBJECT);

    let mut ca_params = CertificateParams::new(Vec::new())?;
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    ca_params
        .distinguished_name
        .push(DnType::CommonName, CA_COMMON_NAME);

    let ca_key = KeyPair::generate()?;
    let ca_cert = ca_params.self_signed(&ca_key)?;

    let mut subject_names = vec![subject.to_string()];
    if subject != DEFAULT_SUBJECT {
        subject_names.push(DEFAULT_SUBJECT.to_string());
    }

    let mut leaf_params = CertificateParams::new(subject_names)?;
    leaf_params
        .distinguished_name
        .push(DnType::CommonName, subject);
    leaf_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    leaf_params
        .subject_alt_names
        .push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    leaf_params
        .subject_alt_names
        .push(SanType::IpAddress(IpAddr::V6(Ipv6Addr::LOCALHOST)));

    let key = KeyPair::generate()?;
    let cert = leaf_params.signed_by(&key, &ca_cert, &ca_key)?;

    Ok(CertificateBundle {
        key: key.serialize_pem(),
        cert: cert.pem(),
        ca_keys: CaKeyPair {
            key: ca_key.serialize_pem(),
            cert: ca_cert.pem(),
        },
    })
}

#[cfg(test)]
mod test_generate {
    use super::*;

    #[test]
    fn it_should_produce_pem_encoded_material() {
        let bundle = generate(&CertificateOptions::default()).unwrap();

        assert!(bundle.key.contains("BEGIN PRIVATE KEY"));
        assert!(bundle.cert.starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(bundle.ca_keys.key.contains("BEGIN PRIVATE KEY"));
        assert!(bundle.ca_keys.cert.starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn it_should_sign_the_leaf_with_a_separate_ca() {
        let bundle = generate(&CertificateOptions::default()).unwrap();

        assert_ne!(bundle.cert, bundle.ca_keys.cert);
        assert_ne!(bundle.key, bundle.ca_keys.key);
    }

    #[test]
    fn it_should_generate_a_fresh_bundle_every_time() {
        let first = generate(&CertificateOptions::default()).unwrap();
        let second = generate(&CertificateOptions::default()).unwrap();

        assert_ne!(first.cert, second.cert);
    }

    #[test]
    fn it_should_accept_a_custom_subject() {
        let options = CertificateOptions {
            common_name: Some("foo.bar".to_string()),
        };

        let bundle = generate(&options).unwrap();

        assert!(bundle.cert.starts_with("-----BEGIN CERTIFICATE-----"));
    }
}
