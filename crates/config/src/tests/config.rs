use camino::Utf8PathBuf;
use gatt_attest_primitives::event_log::event_type;
use rand::thread_rng;
use tempdir::TempDir;

use super::*;

fn home() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new("gatt-attest").unwrap();
    let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();

    (tmp, dir)
}

fn sample_config() -> ConfigFile {
    ConfigFile::new(
        AttestationKey::generate(&mut thread_rng()),
        MeasurementConfig::new(
            PcrBank::Sha384,
            vec![PcrIndex::BOOT_LOADER, PcrIndex::KERNEL],
        ),
        CharacteristicConfig::new(Duration::from_millis(1_500), 185, 16),
    )
}

#[tokio::test]
async fn test_config_round_trip() -> EyreResult<()> {
    let (_tmp, dir) = home();
    let config = sample_config();

    assert!(!ConfigFile::exists(&dir), "fresh home has no config");

    config.save(&dir).await?;
    assert!(ConfigFile::exists(&dir), "config was written");

    let loaded = ConfigFile::load(&dir).await?;

    assert_eq!(
        loaded.attestation_key.public_key(),
        config.attestation_key.public_key()
    );
    assert_eq!(loaded.measurement.bank, PcrBank::Sha384);
    assert_eq!(
        loaded.measurement.pcr_select,
        vec![PcrIndex::BOOT_LOADER, PcrIndex::KERNEL]
    );
    assert_eq!(loaded.characteristic.nonce_ttl, Duration::from_millis(1_500));
    assert_eq!(loaded.mtu().get(), 185);

    let chr = loaded.chr_config();
    assert_eq!(chr.selection, loaded.measurement.pcr_select);
    assert_eq!(chr.nonce_history, 16);

    Ok(())
}

#[tokio::test]
async fn test_characteristic_section_is_optional() -> EyreResult<()> {
    let (_tmp, dir) = home();
    let key = AttestationKey::generate(&mut thread_rng());

    let content = format!(
        "attestation_key = {}\n\n[measurement]\nbank = \"sha256\"\npcr_select = [0, 8]\n",
        serde_json::to_string(&key)?
    );
    write(dir.join(CONFIG_FILE), content).await?;

    let loaded = ConfigFile::load(&dir).await?;

    assert_eq!(loaded.chr_config().nonce_ttl, Duration::from_secs(30));
    assert_eq!(loaded.mtu(), Mtu::DEFAULT);

    Ok(())
}

#[tokio::test]
async fn test_invalid_pcr_index_is_rejected() -> EyreResult<()> {
    let (_tmp, dir) = home();
    let key = AttestationKey::generate(&mut thread_rng());

    let content = format!(
        "attestation_key = {}\n\n[measurement]\nbank = \"sha256\"\npcr_select = [8, 24]\n",
        serde_json::to_string(&key)?
    );
    write(dir.join(CONFIG_FILE), content).await?;

    assert!(
        ConfigFile::load(&dir).await.is_err(),
        "PCR 24 does not exist"
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_event_log_starts_empty() -> EyreResult<()> {
    let (_tmp, dir) = home();

    let log = load_event_log(&dir, PcrBank::Sha256).await?;

    assert!(log.entries().is_empty(), "nothing measured yet");
    assert_eq!(log.pcr(PcrIndex::KERNEL), PcrBank::Sha256.zero().as_slice());

    Ok(())
}

#[tokio::test]
async fn test_event_log_round_trip() -> EyreResult<()> {
    let (_tmp, dir) = home();

    let mut log = MeasurementLog::new(PcrBank::Sha256);
    let _ = log.measure(PcrIndex::KERNEL, event_type::IPL, b"vmlinuz".to_vec());
    let _ = log.measure(PcrIndex::APPLICATION, event_type::ACTION, b"app".to_vec());

    save_event_log(&dir, &log).await?;
    let loaded = load_event_log(&dir, PcrBank::Sha256).await?;

    assert_eq!(loaded, log);

    Ok(())
}

#[tokio::test]
async fn test_event_log_bank_mismatch() -> EyreResult<()> {
    let (_tmp, dir) = home();

    save_event_log(&dir, &MeasurementLog::new(PcrBank::Sha256)).await?;

    assert!(
        load_event_log(&dir, PcrBank::Sha384).await.is_err(),
        "log measured into another bank"
    );

    Ok(())
}

#[tokio::test]
async fn test_tampered_event_log_is_rejected() -> EyreResult<()> {
    let (_tmp, dir) = home();

    let mut log = MeasurementLog::new(PcrBank::Sha256);
    let _ = log.measure(PcrIndex::KERNEL, event_type::IPL, b"vmlinuz".to_vec());
    save_event_log(&dir, &log).await?;

    let path = dir.join(EVENT_LOG_FILE);
    let tampered = read_to_string(&path)
        .await?
        .replace(&hex::encode(b"vmlinuz"), &hex::encode(b"rootkit"));
    write(&path, tampered).await?;

    assert!(
        load_event_log(&dir, PcrBank::Sha256).await.is_err(),
        "data no longer matches its digest"
    );

    Ok(())
}

async fn load_with_selection(pcr_select: &str) -> EyreResult<ConfigFile> {
    let (_tmp, dir) = home();
    let key = AttestationKey::generate(&mut thread_rng());

    let content = format!(
        "attestation_key = {}\n\n[measurement]\nbank = \"sha256\"\npcr_select = {pcr_select}\n",
        serde_json::to_string(&key)?
    );
    write(dir.join(CONFIG_FILE), content).await?;

    ConfigFile::load(&dir).await
}

#[tokio::test]
async fn test_unusable_selection_is_rejected() -> EyreResult<()> {
    assert!(
        load_with_selection("[]").await.is_err(),
        "empty selection"
    );
    assert!(
        load_with_selection("[8, 8]").await.is_err(),
        "duplicate selection"
    );
    assert!(
        load_with_selection("[8, 10]").await.is_ok(),
        "distinct selection"
    );

    Ok(())
}

#[test]
fn test_oversized_nonce_history_is_rejected() {
    let mut config = sample_config();
    assert!(config.validate().is_ok(), "sample config is valid");

    config.characteristic.nonce_history = usize::MAX;
    assert!(config.validate().is_err(), "history bound exceeded");

    config.characteristic.nonce_history = MAX_NONCE_HISTORY;
    assert!(config.validate().is_ok(), "bound is inclusive");
}
