mod tests {
    use predicates::prelude::*;

    const MISSING_MODULE: &str = "/nonexistent/libpkcs11-module.so";

    fn keygen_command<I, S>(args: I) -> Result<assert_cmd::Command, Box<dyn std::error::Error>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = assert_cmd::Command::cargo_bin("tedge-p11-keygen")?;
        cmd.env_remove("TEDGE_P11_PIN");
        cmd.env_remove("RUST_LOG");
        cmd.args(args);
        Ok(cmd)
    }

    #[test]
    fn run_help() -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = keygen_command(["--help"])?;

        cmd.assert()
            .success()
            .stdout(predicate::str::contains("--modulus-bits"))
            .stdout(predicate::str::contains("--curve"));

        Ok(())
    }

    #[test]
    fn unsupported_curve_is_rejected_before_loading_the_module(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = keygen_command([
            "--module",
            MISSING_MODULE,
            "--type",
            "ECDSA",
            "--pin",
            "123456",
            "--label",
            "my-key",
            "--curve",
            "P192",
        ])?;

        cmd.assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("curve not supported: P192"))
            .stderr(predicate::str::contains("Failed to load PKCS#11").not());

        Ok(())
    }

    #[test]
    fn rsa_without_modulus_bits_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = keygen_command([
            "--module",
            MISSING_MODULE,
            "--type",
            "RSA",
            "--pin",
            "123456",
            "--label",
            "my-key",
        ])?;

        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("modulus bit length"))
            .stderr(predicate::str::contains("Failed to load PKCS#11").not());

        Ok(())
    }

    #[test]
    fn invalid_id_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = keygen_command([
            "--module",
            MISSING_MODULE,
            "--type",
            "ECDSA",
            "--pin",
            "123456",
            "--label",
            "my-key",
            "--curve",
            "P256",
            "--id",
            "0x01",
        ])?;

        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("invalid id"));

        Ok(())
    }

    #[test]
    fn unknown_key_type_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = keygen_command([
            "--module",
            MISSING_MODULE,
            "--type",
            "DSA",
            "--pin",
            "123456",
            "--label",
            "my-key",
        ])?;

        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("invalid value 'DSA'"));

        Ok(())
    }

    #[test]
    fn pin_is_required() -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = keygen_command([
            "--module",
            MISSING_MODULE,
            "--type",
            "ECDSA",
            "--label",
            "my-key",
            "--curve",
            "P256",
        ])?;

        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("--pin"));

        Ok(())
    }

    #[test]
    fn valid_options_reach_the_module_and_pin_is_not_logged(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = keygen_command([
            "--module",
            MISSING_MODULE,
            "--type",
            "ECDSA",
            "--label",
            "my-key",
            "--curve",
            "P256",
        ])?;
        cmd.env("TEDGE_P11_PIN", "s3cr3t-pin");

        cmd.assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Failed to load PKCS#11 dynamic object"))
            .stderr(predicate::str::contains("s3cr3t-pin").not());

        Ok(())
    }
}
