//! Mechanism and attribute templates submitted to the token to generate a keypair.
//!
//! Building a template never touches the token, so every invalid parameter is reported before a
//! session is even opened and no half-created keypair can be left behind.

use std::os::raw::c_ulong;

use cryptoki::mechanism::Mechanism;
use cryptoki::object::Attribute;
use cryptoki::object::AttributeType;
use tracing::warn;

use crate::curve::curve_by_name;
use crate::curve::CurveSpec;
use crate::KeygenError;

/// Public exponent of every generated RSA key (65537), big-endian.
pub const RSA_PUBLIC_EXPONENT: [u8; 3] = [0x01, 0x00, 0x01];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec,
}

/// Validated parameters of the key to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    Rsa { modulus_bits: u32 },
    Ec { curve: &'static CurveSpec },
}

impl KeySpec {
    pub fn family(&self) -> KeyFamily {
        match self {
            KeySpec::Rsa { .. } => KeyFamily::Rsa,
            KeySpec::Ec { .. } => KeyFamily::Ec,
        }
    }
}

/// Everything `C_GenerateKeyPair` needs.
#[derive(Debug, Clone)]
pub struct KeyTemplate {
    pub key: KeySpec,
    pub mechanism: Mechanism<'static>,
    pub public: Vec<Attribute>,
    pub private: Vec<Attribute>,
}

pub fn rsa_template(label: &str, modulus_bits: u32) -> Result<KeyTemplate, KeygenError> {
    if modulus_bits == 0 {
        return Err(KeygenError::Configuration(
            "RSA modulus bit length must be greater than 0".into(),
        ));
    }
    if modulus_bits < 2048 {
        warn!(modulus_bits, "RSA keys shorter than 2048 bits are considered weak");
    }

    Ok(KeyTemplate {
        key: KeySpec::Rsa { modulus_bits },
        mechanism: Mechanism::RsaPkcsKeyPairGen,
        public: vec![
            Attribute::Label(label.into()),
            Attribute::Token(true),
            Attribute::Verify(true),
            // u64 or u32 depending on the platform
            Attribute::ModulusBits(c_ulong::from(modulus_bits).into()),
            Attribute::PublicExponent(RSA_PUBLIC_EXPONENT.to_vec()),
        ],
        private: private_template(label),
    })
}

pub fn ec_template(label: &str, curve_name: &str) -> Result<KeyTemplate, KeygenError> {
    let curve = curve_by_name(curve_name)?;
    ec_template_for_curve(label, curve)
}

pub fn ec_template_for_curve(
    label: &str,
    curve: &'static CurveSpec,
) -> Result<KeyTemplate, KeygenError> {
    let ec_params = curve.ec_params_der()?;

    Ok(KeyTemplate {
        key: KeySpec::Ec { curve },
        mechanism: Mechanism::EccKeyPairGen,
        public: vec![
            Attribute::Label(label.into()),
            Attribute::Token(true),
            Attribute::Verify(true),
            Attribute::EcParams(ec_params),
        ],
        private: private_template(label),
    })
}

/// The private key can sign but never leaves the token in plaintext.
fn private_template(label: &str) -> Vec<Attribute> {
    vec![
        Attribute::Label(label.into()),
        Attribute::Token(true),
        Attribute::Sensitive(true),
        Attribute::Extractable(false),
        Attribute::Sign(true),
    ]
}

impl KeyTemplate {
    /// Sets the same `CKA_ID` on both objects of the keypair.
    ///
    /// Some tools (e.g. `p11tool`) only pair the public and private key objects if they share an id.
    pub fn with_id(mut self, id: Vec<u8>) -> Self {
        self.public.push(Attribute::Id(id.clone()));
        self.private.push(Attribute::Id(id));
        self
    }

    pub fn id(&self) -> Option<&[u8]> {
        match self.public_attribute(AttributeType::Id) {
            Some(Attribute::Id(id)) => Some(id),
            _ => None,
        }
    }

    pub fn public_attribute(&self, attribute: AttributeType) -> Option<&Attribute> {
        find_attribute(&self.public, attribute)
    }

    pub fn private_attribute(&self, attribute: AttributeType) -> Option<&Attribute> {
        find_attribute(&self.private, attribute)
    }
}

fn find_attribute(attributes: &[Attribute], attribute: AttributeType) -> Option<&Attribute> {
    attributes.iter().find(|a| a.attribute_type() == attribute)
}
