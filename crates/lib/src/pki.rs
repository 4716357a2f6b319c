//! Private key and certificate generation.
//!
//! [`RcgenPki`] writes a self-signed CA and an admin certificate signed by it:
//!
//! ```text
//! <path>/ca.crt
//! <path>/ca.key
//! <path>/admin.crt
//! <path>/admin.key
//! ```
//!
//! All material is generated in memory before anything touches the disk, so a
//! rejected SAN leaves no files behind.

use std::io;
use std::path::{Path, PathBuf};

use rcgen::{
  BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair,
  KeyUsagePurpose,
};
use thiserror::Error;
use tracing::info;

use crate::consts::{FILE_MODE, KEY_MODE};
use crate::files;

/// SANs every admin certificate is valid for.
pub const DEFAULT_SANS: &[&str] = &["localhost", "127.0.0.1"];

pub const CA_CERT: &str = "ca.crt";
pub const CA_KEY: &str = "ca.key";
pub const ADMIN_CERT: &str = "admin.crt";
pub const ADMIN_KEY: &str = "admin.key";

#[derive(Debug, Error)]
pub enum PkiError {
  #[error("failed to generate certificate: {0}")]
  Generate(#[from] rcgen::Error),

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Generates a key/certificate bundle valid for a set of SANs.
pub trait PkiGenerator: Send + Sync {
  fn generate(&self, path: &Path, sans: &[String]) -> Result<(), PkiError>;
}

/// Default [`PkiGenerator`] backed by rcgen.
#[derive(Debug, Clone, Copy, Default)]
pub struct RcgenPki;

struct Bundle {
  ca_cert: String,
  ca_key: String,
  admin_cert: String,
  admin_key: String,
}

impl PkiGenerator for RcgenPki {
  fn generate(&self, path: &Path, sans: &[String]) -> Result<(), PkiError> {
    let bundle = generate_bundle(sans)?;

    let write = |name: &str, content: &str, mode: u32| -> Result<(), PkiError> {
      let target = path.join(name);
      files::write_with_mode(&target, content.as_bytes(), mode).map_err(|e| PkiError::Write {
        path: target,
        source: e.source,
      })
    };

    write(CA_CERT, &bundle.ca_cert, FILE_MODE)?;
    write(CA_KEY, &bundle.ca_key, KEY_MODE)?;
    write(ADMIN_CERT, &bundle.admin_cert, FILE_MODE)?;
    write(ADMIN_KEY, &bundle.admin_key, KEY_MODE)?;

    info!(path = %path.display(), sans = sans.len(), "generated pki");
    Ok(())
  }
}

fn generate_bundle(sans: &[String]) -> Result<Bundle, PkiError> {
  let mut names: Vec<String> = DEFAULT_SANS.iter().map(|s| s.to_string()).collect();
  for san in sans {
    if !names.contains(san) {
      names.push(san.clone());
    }
  }

  // SANs are validated here, before any key material exists.
  let mut admin_params = CertificateParams::new(names)?;
  admin_params.distinguished_name = distinguished_name("provkit-admin");
  admin_params.is_ca = IsCa::NoCa;
  admin_params.key_usages = vec![KeyUsagePurpose::DigitalSignature, KeyUsagePurpose::KeyEncipherment];
  admin_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth, ExtendedKeyUsagePurpose::ClientAuth];

  let ca_key = KeyPair::generate()?;
  let mut ca_params = CertificateParams::default();
  ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
  ca_params.distinguished_name = distinguished_name("provkit-ca");
  ca_params.key_usages = vec![
    KeyUsagePurpose::KeyCertSign,
    KeyUsagePurpose::CrlSign,
    KeyUsagePurpose::DigitalSignature,
  ];
  let ca_cert = ca_params.self_signed(&ca_key)?;
  let ca_cert_pem = ca_cert.pem();
  let ca_key_pem = ca_key.serialize_pem();
  let issuer = Issuer::new(ca_params, ca_key);

  let admin_key = KeyPair::generate()?;
  let admin_cert = admin_params.signed_by(&admin_key, &issuer)?;

  Ok(Bundle {
    ca_cert: ca_cert_pem,
    ca_key: ca_key_pem,
    admin_cert: admin_cert.pem(),
    admin_key: admin_key.serialize_pem(),
  })
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
  let mut name = DistinguishedName::new();
  name.push(DnType::CommonName, common_name);
  name
}
