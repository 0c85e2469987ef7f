//! Test doubles shared by the unit tests.

use std::cell::RefCell;

use asn1_rs::OctetString;
use asn1_rs::ToDer;
use cryptoki::object::Attribute;
use cryptoki::object::AttributeType;
use p256::elliptic_curve::sec1::ToEncodedPoint;

use crate::curve::NamedCurve;
use crate::template::KeyTemplate;
use crate::token::KeyPairToken;
use crate::KeygenError;

pub const PUBLIC_KEY_OBJECT: u64 = 42;

/// A token that "generates" a keypair whose public key object has a fixed set of attributes.
pub struct FakeToken {
    attributes: Vec<Attribute>,
    pub generated: RefCell<Vec<KeyTemplate>>,
}

impl FakeToken {
    pub fn with_attributes(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            generated: RefCell::new(Vec::new()),
        }
    }
}

impl KeyPairToken for FakeToken {
    type Object = u64;

    fn generate_key_pair(&self, template: &KeyTemplate) -> Result<u64, KeygenError> {
        self.generated.borrow_mut().push(template.clone());
        Ok(PUBLIC_KEY_OBJECT)
    }

    fn get_attributes(
        &self,
        object: u64,
        attributes: &[AttributeType],
    ) -> Result<Vec<Attribute>, KeygenError> {
        assert_eq!(object, PUBLIC_KEY_OBJECT);
        Ok(self
            .attributes
            .iter()
            .filter(|a| attributes.contains(&a.attribute_type()))
            .cloned()
            .collect())
    }
}

/// An uncompressed point of `curve`, derived from a fixed private scalar.
pub fn sample_point(curve: NamedCurve) -> Vec<u8> {
    let point = match curve {
        NamedCurve::P224 => p224::SecretKey::from_slice(&[0x11; 28])
            .unwrap()
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        NamedCurve::P256 => p256::SecretKey::from_slice(&[0x11; 32])
            .unwrap()
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        NamedCurve::P384 => p384::SecretKey::from_slice(&[0x11; 48])
            .unwrap()
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        NamedCurve::P521 => p521::SecretKey::from_slice(&[0x01; 66])
            .unwrap()
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
    };
    assert_eq!(point.len(), 1 + 2 * curve.spec().field_size());
    point
}

/// Wraps a point the way PKCS #11 v2.20 tokens return `CKA_EC_POINT`.
pub fn wrap_in_octet_string(point: &[u8]) -> Vec<u8> {
    OctetString::new(point).to_der_vec().unwrap()
}
