use rsa::pkcs8::EncodePublicKey;
use rsa::BigUint;

use crate::curve::CurveSpec;
use crate::curve::NamedCurve;
use crate::KeygenError;

/// Largest RSA modulus accepted when encoding, in bits.
const RSA_MAX_MODULUS_BITS: usize = 16384;

/// Public key of a keypair generated on the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa {
        modulus: BigUint,
        exponent: BigUint,
    },
    Ec {
        curve: &'static CurveSpec,
        x: BigUint,
        y: BigUint,
    },
}

impl PublicKey {
    /// Returns the uncompressed SEC1 encoding (`0x04 || X || Y`) of an EC key, `None` for RSA keys.
    pub fn ec_point(&self) -> Result<Option<Vec<u8>>, KeygenError> {
        let PublicKey::Ec { curve, x, y } = self else {
            return Ok(None);
        };

        let size = curve.field_size();
        let mut point = Vec::with_capacity(1 + 2 * size);
        point.push(0x04);
        for coordinate in [x, y] {
            let bytes = coordinate.to_bytes_be();
            if bytes.len() > size {
                return Err(KeygenError::Encoding(format!(
                    "coordinate is wider than {size} bytes of a {curve} field element"
                )));
            }
            point.resize(point.len() + size - bytes.len(), 0);
            point.extend_from_slice(&bytes);
        }

        Ok(Some(point))
    }

    /// Encodes the key as a DER SubjectPublicKeyInfo.
    pub fn to_public_key_der(&self) -> Result<Vec<u8>, KeygenError> {
        let document = match self {
            PublicKey::Rsa { modulus, exponent } => {
                let pubkey = rsa::RsaPublicKey::new_with_max_size(
                    modulus.clone(),
                    exponent.clone(),
                    RSA_MAX_MODULUS_BITS,
                )
                .map_err(|e| encoding_error("RSA", e))?;
                pubkey.to_public_key_der()
            }

            PublicKey::Ec { curve, .. } => {
                let point = self.ec_point()?.unwrap_or_default();
                match curve.curve {
                    NamedCurve::P224 => p224::PublicKey::from_sec1_bytes(&point)
                        .map_err(|e| encoding_error(curve.name, e))?
                        .to_public_key_der(),
                    NamedCurve::P256 => p256::PublicKey::from_sec1_bytes(&point)
                        .map_err(|e| encoding_error(curve.name, e))?
                        .to_public_key_der(),
                    NamedCurve::P384 => p384::PublicKey::from_sec1_bytes(&point)
                        .map_err(|e| encoding_error(curve.name, e))?
                        .to_public_key_der(),
                    NamedCurve::P521 => p521::PublicKey::from_sec1_bytes(&point)
                        .map_err(|e| encoding_error(curve.name, e))?
                        .to_public_key_der(),
                }
            }
        };

        let document = document.map_err(|e| encoding_error("SubjectPublicKeyInfo", e))?;
        Ok(document.into_vec())
    }

    /// Encodes the key as a PEM `PUBLIC KEY` block.
    pub fn to_pem(&self) -> Result<String, KeygenError> {
        let pubkey_pem = pem::Pem::new("PUBLIC KEY", self.to_public_key_der()?);
        let config = pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF);
        Ok(pem::encode_config(&pubkey_pem, config))
    }
}

fn encoding_error(what: &str, error: impl std::fmt::Display) -> KeygenError {
    KeygenError::Encoding(format!("{what}: {error}"))
}
