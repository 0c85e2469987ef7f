//! Session with a PKCS #11 token, through the cryptoki crate.
//!
//! Reference:
//! - PKCS#11: <https://docs.oasis-open.org/pkcs11/pkcs11-base/v2.40/os/pkcs11-base-v2.40-os.html>

use std::fmt::Debug;

use camino::Utf8Path;
use cryptoki::context::CInitializeArgs;
use cryptoki::context::CInitializeFlags;
use cryptoki::context::Pkcs11;
use cryptoki::object::Attribute;
use cryptoki::object::AttributeType;
use cryptoki::object::ObjectHandle;
use cryptoki::session::Session;
use cryptoki::session::UserType;
use cryptoki::types::AuthPin;
use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::trace;

use crate::config::CryptokiConfig;
use crate::template::KeyTemplate;
use crate::KeygenError;

/// The token operations needed to generate a keypair and read back its public key.
pub trait KeyPairToken {
    /// Token-scoped reference to an object, valid only for the current session.
    type Object: Copy + Debug;

    /// Generates a keypair from the template, returning the public key object.
    fn generate_key_pair(&self, template: &KeyTemplate) -> Result<Self::Object, KeygenError>;

    /// Reads attributes of an object.
    ///
    /// Attributes the object doesn't have are left out of the result, so callers must match the
    /// returned attributes by type.
    fn get_attributes(
        &self,
        object: Self::Object,
        attributes: &[AttributeType],
    ) -> Result<Vec<Attribute>, KeygenError>;
}

/// A read-write session, logged in as the normal user, on a token of a loaded PKCS #11 module.
///
/// The session is closed when this is dropped.
pub struct CryptokiToken {
    session: Session,
}

impl CryptokiToken {
    #[instrument(skip_all)]
    pub fn open(config: &CryptokiConfig) -> Result<Self, KeygenError> {
        let pkcs11 = load(&config.module_path)?;
        pkcs11
            .initialize(CInitializeArgs::new(CInitializeFlags::OS_LOCKING_OK))
            .map_err(init_error("Failed to initialize PKCS#11 module"))?;

        let slot = pkcs11
            .get_slots_with_token()
            .map_err(init_error("Failed to list slots"))?
            .into_iter()
            .find(|s| s.id() == config.slot)
            .ok_or(KeygenError::SlotNotFound(config.slot))?;
        let slot_info = pkcs11
            .get_slot_info(slot)
            .map_err(init_error("Failed to get slot info"))?;
        let token_info = pkcs11
            .get_token_info(slot)
            .map_err(init_error("Failed to get token info"))?;
        debug!(?slot_info, ?token_info, "Selected slot");

        // NOTE: when writing to HSM, session must always be rw
        let session = pkcs11
            .open_rw_session(slot)
            .map_err(init_error("Failed to open a session"))?;

        let pin = AuthPin::from(config.pin.clone());
        session
            .login(UserType::User, Some(&pin))
            .map_err(init_error("Failed to log in to the token"))?;
        let session_info = session
            .get_session_info()
            .map_err(init_error("Failed to get session info"))?;
        debug!(?session_info, "Opened a read-write session");

        Ok(Self { session })
    }
}

impl KeyPairToken for CryptokiToken {
    type Object = ObjectHandle;

    fn generate_key_pair(&self, template: &KeyTemplate) -> Result<ObjectHandle, KeygenError> {
        if let Some(id) = template.id() {
            let objects = self
                .session
                .find_objects(&[Attribute::Id(id.to_vec())])
                .map_err(KeygenError::KeyGeneration)?;
            if !objects.is_empty() {
                return Err(KeygenError::DuplicateObjectId);
            }
        }

        trace!(
            pub_key_template = ?template.public,
            priv_key_template = ?template.private,
            "Generating keypair"
        );
        let (pub_handle, _priv_handle) = self
            .session
            .generate_key_pair(&template.mechanism, &template.public, &template.private)
            .map_err(KeygenError::KeyGeneration)?;
        info!(key = ?template.key, "Generated a new keypair on the token");

        Ok(pub_handle)
    }

    fn get_attributes(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeType],
    ) -> Result<Vec<Attribute>, KeygenError> {
        self.session
            .get_attributes(object, attributes)
            .map_err(KeygenError::AttributeQuery)
    }
}

fn load(module_path: &Utf8Path) -> Result<Pkcs11, KeygenError> {
    debug!(%module_path, "Loading PKCS#11 module");
    // can fail with Pkcs11(GeneralError, GetFunctionList) if P11_KIT_SERVER_ADDRESS is wrong
    Pkcs11::new(module_path).map_err(init_error("Failed to load PKCS#11 dynamic object"))
}

fn init_error(context: &'static str) -> impl FnOnce(cryptoki::error::Error) -> KeygenError {
    move |source| KeygenError::TokenInit { context, source }
}
