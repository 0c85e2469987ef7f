//! Generates a keypair on a PKCS#11 token and prints its public key in PEM format.
//!
//! Logs go to stderr, so stdout only ever contains the PEM block.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use clap::ValueEnum;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use tedge_p11_keygen::CryptokiConfig;
use tedge_p11_keygen::CryptokiToken;
use tedge_p11_keygen::KeyFamily;
use tedge_p11_keygen::KeyOptions;
use tedge_p11_keygen::SecretString;

/// Generate a keypair on a PKCS#11 token and export its public key.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(version)]
pub struct Args {
    /// The path to the PKCS#11 module.
    #[arg(long)]
    module: Utf8PathBuf,

    /// Type of the keypair.
    #[arg(long = "type", value_enum)]
    key_type: KeyType,

    /// Id of the slot holding the token.
    #[arg(long, default_value_t = 0)]
    slot: u64,

    /// User PIN of the token.
    #[arg(long, env = "TEDGE_P11_PIN", hide_env_values = true)]
    pin: String,

    /// Label of the keypair objects.
    #[arg(long)]
    label: String,

    /// Size of the RSA modulus in bits (RSA only).
    #[arg(long)]
    modulus_bits: Option<u32>,

    /// Curve of the key: P224, P256, P384 or P521 (ECDSA only).
    #[arg(long)]
    curve: Option<String>,

    /// CKA_ID of the keypair objects, as hex digits optionally separated by spaces.
    ///
    /// A random 20-byte id is used if not provided.
    #[arg(long)]
    id: Option<String>,

    /// Write the public key to this file instead of stdout.
    #[arg(long)]
    output: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyType {
    #[value(name = "RSA")]
    Rsa,
    #[value(name = "ECDSA")]
    Ecdsa,
}

impl From<KeyType> for KeyFamily {
    fn from(value: KeyType) -> Self {
        match value {
            KeyType::Rsa => KeyFamily::Rsa,
            KeyType::Ecdsa => KeyFamily::Ec,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    let options = KeyOptions {
        family: args.key_type.into(),
        label: args.label,
        modulus_bits: args.modulus_bits,
        curve: args.curve,
        id: args.id,
    };
    let template = options.template()?;
    let cryptoki_config =
        CryptokiConfig::new(args.module, args.slot, SecretString::new(args.pin))?;
    info!(?cryptoki_config, key = ?template.key, "Using cryptoki configuration");

    let token = CryptokiToken::open(&cryptoki_config).context("Failed to open the token")?;
    let public_key = tedge_p11_keygen::generate_public_key(&token, &template)?;
    let pubkey_pem = public_key.to_pem()?;

    // the keypair exists on the token at this point, so the public key must not get lost
    match &args.output {
        Some(outfile) => match std::fs::write(outfile, &pubkey_pem) {
            Ok(()) => info!(path = %outfile, "Saved the public key"),
            Err(e) => {
                warn!(?e, path = %outfile, "Failed to save the public key to file");
                print!("{pubkey_pem}");
            }
        },
        None => print!("{pubkey_pem}"),
    }

    Ok(())
}
