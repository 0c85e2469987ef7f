use std::fmt::Debug;
use std::fmt::Display;

use camino::Utf8PathBuf;
use cryptoki::types::AuthPin;
use tracing::warn;

use crate::curve::curve_by_name;
use crate::template::ec_template_for_curve;
use crate::template::rsa_template;
use crate::template::KeyFamily;
use crate::template::KeyTemplate;
use crate::KeygenError;

/// Length of the `CKA_ID` generated when none is given.
pub const DEFAULT_ID_LEN: usize = 20;

/// How to reach the token the keypair is generated on.
#[derive(Debug, Clone)]
pub struct CryptokiConfig {
    pub module_path: Utf8PathBuf,
    pub slot: u64,
    pub pin: SecretString,
}

impl CryptokiConfig {
    pub fn new(
        module_path: impl Into<Utf8PathBuf>,
        slot: u64,
        pin: SecretString,
    ) -> Result<Self, KeygenError> {
        let module_path = module_path.into();
        if module_path.as_str().is_empty() {
            return Err(KeygenError::Configuration(
                "path to the PKCS#11 module must not be empty".into(),
            ));
        }
        if pin.0.is_empty() {
            return Err(KeygenError::Configuration("PIN must not be empty".into()));
        }

        Ok(Self {
            module_path,
            slot,
            pin,
        })
    }
}

/// A secret string that should not be printed by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(string: String) -> Self {
        Self(string)
    }
}

impl From<SecretString> for AuthPin {
    fn from(value: SecretString) -> Self {
        AuthPin::new(value.0.into())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        SecretString::new(value)
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}

/// Key parameters as given by the user, not validated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOptions {
    pub family: KeyFamily,
    pub label: String,
    /// RSA only.
    pub modulus_bits: Option<u32>,
    /// ECDSA only.
    pub curve: Option<String>,
    /// `CKA_ID` as hex digits. A random one is generated if not set.
    pub id: Option<String>,
}

impl KeyOptions {
    /// Validates the options and builds the template of the keypair.
    ///
    /// Never talks to the token.
    pub fn template(&self) -> Result<KeyTemplate, KeygenError> {
        if self.label.is_empty() {
            return Err(KeygenError::Configuration("label must not be empty".into()));
        }

        let template = match self.family {
            KeyFamily::Rsa => {
                if let Some(curve) = &self.curve {
                    warn!(%curve, "Curve is ignored for RSA keys");
                }
                let modulus_bits = match self.modulus_bits {
                    Some(bits) if bits > 0 => bits,
                    _ => {
                        return Err(KeygenError::Configuration(
                            "RSA keys need a modulus bit length greater than 0".into(),
                        ))
                    }
                };
                rsa_template(&self.label, modulus_bits)?
            }

            KeyFamily::Ec => {
                if let Some(modulus_bits) = self.modulus_bits {
                    warn!(modulus_bits, "Modulus bit length is ignored for ECDSA keys");
                }
                let Some(curve) = &self.curve else {
                    return Err(KeygenError::Configuration("ECDSA keys need a curve".into()));
                };
                let curve = curve_by_name(curve).map_err(|_| {
                    KeygenError::Configuration(format!("curve not supported: {curve}"))
                })?;
                ec_template_for_curve(&self.label, curve)?
            }
        };

        let id = match &self.id {
            Some(id) => parse_id(id)?,
            None => rand::random::<[u8; DEFAULT_ID_LEN]>().to_vec(),
        };

        Ok(template.with_id(id))
    }
}

/// Parses id provided as a sequence of bytes encoded as pair of hex digits without `0x` prefix,
/// optionally separated by spaces.
pub fn parse_id(id_hexstr: &str) -> Result<Vec<u8>, KeygenError> {
    let id_hexstr = id_hexstr.trim();
    let invalid = |msg: String| KeygenError::Configuration(format!("invalid id: {msg}"));

    if id_hexstr.is_empty() {
        return Err(invalid("ID must not be empty".into()));
    }

    let mut bytes = Vec::new();
    let mut chars = id_hexstr.char_indices();
    while let Some((i1, c1)) = chars.next() {
        if c1.is_whitespace() {
            continue;
        }

        if !c1.is_ascii_hexdigit() {
            return Err(invalid(format!("{c1} is not a hex digit")));
        }

        let Some((i2, c2)) = chars.next() else {
            return Err(invalid(format!("expected hex digit after {c1}")));
        };
        if !c2.is_ascii_hexdigit() {
            return Err(invalid(format!("expected hex digit after {c1}")));
        }

        let num = u8::from_str_radix(&id_hexstr[i1..=i2], 16)
            .map_err(|e| invalid(format!("failed to parse {}: {e}", &id_hexstr[i1..=i2])))?;
        bytes.push(num);
    }

    Ok(bytes)
}
