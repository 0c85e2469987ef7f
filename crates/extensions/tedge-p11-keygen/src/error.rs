/// Every way key generation can fail.
///
/// None of these are recovered from: the first error aborts the whole operation.
#[derive(thiserror::Error, Debug)]
pub enum KeygenError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{context}")]
    TokenInit {
        context: &'static str,
        #[source]
        source: cryptoki::error::Error,
    },

    #[error("Didn't find a slot with id {0} containing a token. The device may be disconnected.")]
    SlotNotFound(u64),

    #[error("Curve not supported: {0}")]
    UnsupportedCurve(String),

    #[error("Unknown curve oID: {0}")]
    UnknownCurve(String),

    #[error("Failed to generate keypair")]
    KeyGeneration(#[source] cryptoki::error::Error),

    #[error("Object with this id already exists on the token")]
    DuplicateObjectId,

    #[error("Couldn't retrieve public key attributes: {0}")]
    AttributeRetrieval(String),

    #[error("Failed to read attributes of the public key object")]
    AttributeQuery(#[source] cryptoki::error::Error),

    #[error("Invalid CKA_EC_POINT value: {0}")]
    InvalidEcPoint(String),

    #[error("Failed to encode the public key: {0}")]
    Encoding(String),
}
