//! Generates an RSA or EC keypair on a PKCS #11 token and exports its public key.
//!
//! The private key never leaves the token. The public key is read back from the attributes of the
//! public key object and encoded as a DER SubjectPublicKeyInfo, usually wrapped in a PEM
//! `PUBLIC KEY` block:
//!
//! ```text
//! KeyOptions --template()--> KeyTemplate --generate--> public key object --extract--> PublicKey
//! ```
//!
//! All the parameters are validated while building the template, before a session with the token
//! is opened.

pub mod config;
pub mod curve;
mod error;
pub mod extract;
pub mod public_key;
pub mod template;
pub mod token;

#[cfg(test)]
mod testing;

pub use config::CryptokiConfig;
pub use config::KeyOptions;
pub use config::SecretString;
pub use curve::CurveSpec;
pub use curve::NamedCurve;
pub use error::KeygenError;
pub use public_key::PublicKey;
pub use template::KeyFamily;
pub use template::KeySpec;
pub use template::KeyTemplate;
pub use token::CryptokiToken;
pub use token::KeyPairToken;

use tracing::instrument;

/// Generates a keypair from an already validated template and returns its public key.
#[instrument(skip_all, fields(key = ?template.key))]
pub fn generate_public_key<T: KeyPairToken>(
    token: &T,
    template: &KeyTemplate,
) -> Result<PublicKey, KeygenError> {
    let public_key_object = token.generate_key_pair(template)?;

    match template.key {
        KeySpec::Rsa { .. } => extract::rsa_public_key(token, public_key_object),
        KeySpec::Ec { curve } => extract::ec_public_key(token, public_key_object, curve),
    }
}

/// Validates the options, then generates the keypair.
///
/// The token is left untouched if the options are invalid.
pub fn create_key<T: KeyPairToken>(
    token: &T,
    options: &KeyOptions,
) -> Result<PublicKey, KeygenError> {
    let template = options.template()?;
    generate_public_key(token, &template)
}
