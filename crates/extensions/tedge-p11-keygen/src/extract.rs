//! Rebuilds the public key of a freshly generated keypair from the attributes of its public key
//! object.

use asn1_rs::FromDer as _;
use asn1_rs::OctetString;
use cryptoki::object::Attribute;
use cryptoki::object::AttributeType;
use cryptoki::object::KeyType;
use cryptoki::object::ObjectClass;
use rsa::BigUint;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::curve::CurveSpec;
use crate::public_key::PublicKey;
use crate::token::KeyPairToken;
use crate::KeygenError;

/// Leading byte of an uncompressed SEC1 point.
const SEC1_UNCOMPRESSED: u8 = 0x04;

/// Reads the modulus and the public exponent of an RSA public key object.
pub fn rsa_public_key<T: KeyPairToken>(
    token: &T,
    object: T::Object,
) -> Result<PublicKey, KeygenError> {
    let attrs = token.get_attributes(
        object,
        &[AttributeType::Modulus, AttributeType::PublicExponent],
    )?;
    trace!(?attrs);

    let mut modulus = None;
    let mut exponent = None;
    for attr in attrs {
        match attr {
            Attribute::Modulus(value) if !value.is_empty() => modulus = Some(value),
            Attribute::PublicExponent(value) if !value.is_empty() => exponent = Some(value),
            other => warn!(got = ?other, "Got unexpected attribute"),
        }
    }

    let (modulus, exponent) = match (modulus, exponent) {
        (Some(modulus), Some(exponent)) => (modulus, exponent),
        (None, Some(_)) => return Err(missing("CKA_MODULUS")),
        (Some(_), None) => return Err(missing("CKA_PUBLIC_EXPONENT")),
        (None, None) => return Err(missing("CKA_MODULUS and CKA_PUBLIC_EXPONENT")),
    };

    let modulus = BigUint::from_bytes_be(&modulus);
    let exponent = BigUint::from_bytes_be(&exponent);
    if exponent.bits() > 64 {
        return Err(KeygenError::AttributeRetrieval(format!(
            "public exponent is {} bits long, at most 64 are supported",
            exponent.bits()
        )));
    }
    debug!(modulus_bits = modulus.bits(), %exponent, "Read RSA public key");

    Ok(PublicKey::Rsa { modulus, exponent })
}

/// Reads the point of an EC public key object generated on `curve`.
///
/// `CKA_CLASS` and `CKA_KEY_TYPE` are only used to check that the object is what we asked the
/// token to generate.
pub fn ec_public_key<T: KeyPairToken>(
    token: &T,
    object: T::Object,
    curve: &'static CurveSpec,
) -> Result<PublicKey, KeygenError> {
    let attrs = token.get_attributes(
        object,
        &[
            AttributeType::Class,
            AttributeType::KeyType,
            AttributeType::EcPoint,
        ],
    )?;
    trace!(?attrs);

    let mut ec_point = None;
    for attr in attrs {
        match attr {
            Attribute::Class(class) if class != ObjectClass::PUBLIC_KEY => {
                return Err(KeygenError::AttributeRetrieval(format!(
                    "expected a public key object, got {class}"
                )));
            }
            Attribute::KeyType(key_type) if key_type != KeyType::EC => {
                return Err(KeygenError::AttributeRetrieval(format!(
                    "expected an EC key, got {key_type}"
                )));
            }
            Attribute::EcPoint(value) => ec_point = Some(value),
            _ => {}
        }
    }

    let ec_point = ec_point.ok_or_else(|| missing("CKA_EC_POINT"))?;
    let (x, y) = decode_ec_point(curve, &ec_point)?;

    Ok(PublicKey::Ec { curve, x, y })
}

/// Decodes the value of `CKA_EC_POINT` into affine coordinates.
///
/// Current PKCS #11 says the attribute holds the SEC1 uncompressed point (`0x04 || X || Y`), but
/// PKCS #11 v2.20 specified it to be stored in a DER-encoded OCTET STRING, and tokens implementing
/// it are still around. The raw encoding is tried first, then the DER-wrapped one.
/// <http://docs.oasis-open.org/pkcs11/pkcs11-curr/v2.40/os/pkcs11-curr-v2.40-os.html#_ftn1>
pub fn decode_ec_point(
    curve: &CurveSpec,
    value: &[u8],
) -> Result<(BigUint, BigUint), KeygenError> {
    if let Some(coordinates) = decode_uncompressed_point(curve, value) {
        return Ok(coordinates);
    }

    debug!(%curve, "CKA_EC_POINT is not an uncompressed point, trying to unwrap a DER OCTET STRING");
    let (rest, wrapped) = OctetString::from_der(value).map_err(|e| {
        KeygenError::InvalidEcPoint(format!(
            "neither an uncompressed {curve} point nor a DER OCTET STRING: {e}"
        ))
    })?;
    if !rest.is_empty() {
        return Err(KeygenError::InvalidEcPoint(format!(
            "{} trailing bytes after the DER OCTET STRING",
            rest.len()
        )));
    }

    let wrapped = wrapped.as_cow();
    if wrapped.is_empty() {
        return Err(KeygenError::InvalidEcPoint(
            "DER OCTET STRING is empty".into(),
        ));
    }

    decode_uncompressed_point(curve, wrapped).ok_or_else(|| {
        KeygenError::InvalidEcPoint(format!(
            "DER OCTET STRING doesn't contain an uncompressed {curve} point"
        ))
    })
}

fn decode_uncompressed_point(curve: &CurveSpec, point: &[u8]) -> Option<(BigUint, BigUint)> {
    let size = curve.field_size();
    let (&tag, coordinates) = point.split_first()?;
    if tag != SEC1_UNCOMPRESSED || coordinates.len() != 2 * size || !curve.contains_point(point) {
        return None;
    }

    let (x, y) = coordinates.split_at(size);
    Some((BigUint::from_bytes_be(x), BigUint::from_bytes_be(y)))
}

fn missing(attribute: &str) -> KeygenError {
    KeygenError::AttributeRetrieval(format!("token didn't return {attribute}"))
}
