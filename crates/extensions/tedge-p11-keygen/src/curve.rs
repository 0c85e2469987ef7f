//! Registry of the named elliptic curves a key can be generated on.
//!
//! Lookups always go through [`NamedCurve`] (or the curve name), never through the curve
//! parameters themselves. The parameters (field prime, order, generator, coefficients) live in the
//! RustCrypto crate of each curve and are only reached when a point has to be validated.

use std::fmt::Display;

use asn1_rs::Oid;
use asn1_rs::ToDer;

use crate::KeygenError;

// oIDs for curves defined here: https://datatracker.ietf.org/doc/html/rfc5480#section-2.1.1.1
const SECP224R1_OID: &str = "1.3.132.0.33";
const SECP256R1_OID: &str = "1.2.840.10045.3.1.7";
const SECP384R1_OID: &str = "1.3.132.0.34";
const SECP521R1_OID: &str = "1.3.132.0.35";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCurve {
    P224,
    P256,
    P384,
    P521,
}

impl NamedCurve {
    pub fn spec(self) -> &'static CurveSpec {
        match self {
            NamedCurve::P224 => &P224,
            NamedCurve::P256 => &P256,
            NamedCurve::P384 => &P384,
            NamedCurve::P521 => &P521,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CurveSpec {
    pub curve: NamedCurve,
    pub name: &'static str,
    /// Size of the underlying field in bits.
    pub bits: u16,
    pub dotted_oid: &'static str,
}

static P224: CurveSpec = CurveSpec {
    curve: NamedCurve::P224,
    name: "P224",
    bits: 224,
    dotted_oid: SECP224R1_OID,
};

static P256: CurveSpec = CurveSpec {
    curve: NamedCurve::P256,
    name: "P256",
    bits: 256,
    dotted_oid: SECP256R1_OID,
};

static P384: CurveSpec = CurveSpec {
    curve: NamedCurve::P384,
    name: "P384",
    bits: 384,
    dotted_oid: SECP384R1_OID,
};

static P521: CurveSpec = CurveSpec {
    curve: NamedCurve::P521,
    name: "P521",
    bits: 521,
    dotted_oid: SECP521R1_OID,
};

/// All supported curves.
pub static CURVES: [&CurveSpec; 4] = [&P224, &P256, &P384, &P521];

pub fn curve_by_name(name: &str) -> Result<&'static CurveSpec, KeygenError> {
    CURVES
        .iter()
        .copied()
        .find(|c| c.name == name)
        .ok_or_else(|| KeygenError::UnsupportedCurve(name.to_string()))
}

pub fn curve_by_oid(oid: &Oid) -> Result<&'static CurveSpec, KeygenError> {
    let oid = oid.to_id_string();
    CURVES
        .iter()
        .copied()
        .find(|c| c.dotted_oid == oid)
        .ok_or(KeygenError::UnknownCurve(oid))
}

pub fn oid_for(curve: NamedCurve) -> Result<Oid<'static>, KeygenError> {
    curve.spec().oid()
}

impl CurveSpec {
    pub fn oid(&self) -> Result<Oid<'static>, KeygenError> {
        let unknown = || KeygenError::UnknownCurve(self.dotted_oid.to_string());
        let components = self
            .dotted_oid
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .map_err(|_| unknown())?;
        Oid::from(&components).map_err(|_| unknown())
    }

    /// Value of `CKA_EC_PARAMS` selecting this curve.
    ///
    /// Of the choices allowed for the attribute, only the DER-encoded `namedCurve` oID is used.
    /// <https://docs.oasis-open.org/pkcs11/pkcs11-curr/v3.0/os/pkcs11-curr-v3.0-os.html#_Toc30061181>
    pub fn ec_params_der(&self) -> Result<Vec<u8>, KeygenError> {
        self.oid()?
            .to_der_vec()
            .map_err(|e| KeygenError::Encoding(format!("curve oID {}: {e}", self.dotted_oid)))
    }

    /// Width in bytes of a single affine coordinate.
    pub fn field_size(&self) -> usize {
        usize::from(self.bits).div_ceil(8)
    }

    /// Returns true if `point` is a SEC1-encoded point lying on this curve.
    pub fn contains_point(&self, point: &[u8]) -> bool {
        match self.curve {
            NamedCurve::P224 => p224::PublicKey::from_sec1_bytes(point).is_ok(),
            NamedCurve::P256 => p256::PublicKey::from_sec1_bytes(point).is_ok(),
            NamedCurve::P384 => p384::PublicKey::from_sec1_bytes(point).is_ok(),
            NamedCurve::P521 => p521::PublicKey::from_sec1_bytes(point).is_ok(),
        }
    }
}

impl Display for CurveSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use asn1_rs::Any;
    use asn1_rs::FromDer;
    use assert_matches::assert_matches;
    use std::collections::HashSet;
    use test_case::test_case;

    use super::*;

    #[test_case("P224", "1.3.132.0.33")]
    #[test_case("P256", "1.2.840.10045.3.1.7")]
    #[test_case("P384", "1.3.132.0.34")]
    #[test_case("P521", "1.3.132.0.35")]
    fn curve_oid_survives_der_round_trip(name: &str, expected_oid: &str) {
        let curve = curve_by_name(name).unwrap();

        let der = curve.ec_params_der().unwrap();
        let (rest, any) = Any::from_der(&der).unwrap();
        assert!(rest.is_empty());
        let oid = any.as_oid().unwrap();

        assert_eq!(oid.to_id_string(), expected_oid);
        assert_eq!(curve_by_oid(&oid).unwrap(), curve);
        assert_eq!(
            oid_for(curve.curve).unwrap().to_id_string(),
            oid.to_id_string()
        );
    }

    #[test]
    fn p256_params_are_der_encoded_named_curve() {
        let der = curve_by_name("P256").unwrap().ec_params_der().unwrap();
        assert_eq!(
            der,
            [0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07]
        );
    }

    #[test]
    fn registry_is_a_bijection() {
        let names: HashSet<_> = CURVES.iter().map(|c| c.name).collect();
        let oids: HashSet<_> = CURVES.iter().map(|c| c.dotted_oid).collect();
        let curves: HashSet<_> = CURVES.iter().map(|c| c.curve).collect();
        assert_eq!(names.len(), CURVES.len());
        assert_eq!(oids.len(), CURVES.len());
        assert_eq!(curves.len(), CURVES.len());

        for curve in CURVES {
            assert_eq!(curve.curve.spec(), curve);
            assert_eq!(curve_by_name(curve.name).unwrap(), curve);
        }
    }

    #[test_case("P192")]
    #[test_case("p256")]
    #[test_case("secp256r1")]
    #[test_case("")]
    fn unsupported_names_are_rejected(name: &str) {
        assert_matches!(
            curve_by_name(name),
            Err(KeygenError::UnsupportedCurve(n)) if n == name
        );
    }

    #[test]
    fn unknown_oid_is_rejected() {
        // secp192r1
        let oid = Oid::from(&[1, 2, 840, 10045, 3, 1, 1]).unwrap();
        assert_matches!(
            curve_by_oid(&oid),
            Err(KeygenError::UnknownCurve(oid)) if oid == "1.2.840.10045.3.1.1"
        );
    }

    #[test]
    fn field_sizes() {
        let sizes: Vec<_> = CURVES.iter().map(|c| c.field_size()).collect();
        assert_eq!(sizes, [28, 32, 48, 66]);
    }
}
