//! Backup Integration Tests
//!
//! End-to-end coverage of the backup codec through the public API.
//!
//! ## Test Categories
//!
//! 1. **Golden Tests** - Envelopes produced outside this crate decode correctly
//! 2. **Round Trip** - Export followed by restore returns the same state
//! 3. **Format Policy** - Each decoder fails the way its format requires
//! 4. **Import** - Restores applied to the stores
//! 5. **Config & Files** - Environment overrides and backup files on disk

use once_cell::sync::Lazy;
use sentinel::{
    AesCipher, BackupCodec, BackupConfig, Cipher, MemoryDojo, MemoryPrefs, MemoryStore, PayloadShape,
    PubKeyCollection, PubKeyModel, PubKeyType, Restored, Scheme,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

const XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
const YPUB: &str = "ypub6QqdH2c5z7967BioGSfAWFHM1EHzHPBZK7wrND3ZpEWFtzmCqvsD1bgpaE6pSAPkiSKhkuWPCJV6mZTSNMd2tK8xYTcJ48585pZecmSUzWp";
const ZPUB: &str = "zpub6jftahH18ngZxUuv6oSniLNrBCSSE1B4EEU59bwTCEt8x6aS6b2mdfLxbS4QS53g85SWWP6wexqeer516433gYpZQoJie2tcMYdJ1SYYYAL";
const ZPUB2: &str = "zpub6mwJaQaUE3oZ763dJZKRbNUxW1znc5f4uqty7hKaAS5RKNscWpZrkohNNhd7BNxD8Hj5NceNPbujdF3935mRkSHHcS6yZLnpsUkrK1XoMLr";
const ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

// Samourai export, version 1, PBKDF2-SHA1 x5000, ISO10126 padding.
// Password "samourai-test".
const SAMOURAI_BACKUP: &str = r#"{"version": 1, "time": 1600000000000, "payload": "JM6s9e637Lyy7LCJlG5CR0c9CD4Lj7OmalhLsHzxiTyGEhUaWxI+Hi55kx6ffwm8nxaAXQirRoY5cHseCCxmhwFUhIW5kn8jwYFqP/VbI0isWVhEImzkwEff5QGhDC/4gkQufaYIBIzivVaU+ok35Dh8DZWhdct0T87zLj8SLlgfcy9/VdIDgcA7b968lZz/kgu96xJ0h6FRVikSs/vhFPiNf39v557cHQuYyJlkNQx6FVg0uwFvsdfFV0WTw3pykD2IcciARlJonjElXt7NC6b3Pwj6P/HDW0N1SsYCa7i3/xJdyrVSh19lX8bhGMzuYNIHh+zo6ZOi6hm7/bvzNDEzviCj7dzwImtIxiraby9YtE/sbPzsiBYG8xskJRu2HJiNHnpjg9uIqymq5B6tXLlTv2ekJNglM2/Twvcp6D4GJJlwKJim65RDsG1bMISdQ9WcCjOC+2SYsW2BjCGZ/2EfOdPOgu16ztx5yv0ZEooEdUmdNDueQERWAsAc8xBAG/8af7rPEXBSUPo2xPBQ7YA2A/7pfSi8XTl2iIHnlya1oC76NcV/JWwBqsPtpwJBLLeNCWAH2w+BJyZa96QjUeY/ab/8VNtNL/4c9qGF01ASOZlsEiu8poyFQE/x51Q0nm6V2PSb7aArTmOWMrOnkAUhu10zUx55qqssTZS8HPHCfsslUP/yi6E8pfMUwj9cw88ZS5SxjarCK1uTSfeiplG6TOQU+td4kqrCBQccvcuyuMWNXukpjZIgSNEB6mOxT2W3UgfAHS25gz0RQZrjDa23rWskyEd5Zu56VwZFNWzoYZLQeDK10PZXoDzZc57lvL58/eQ68HKtOYp2U4Tn7o0GzKwqBoet40uycarMtct2eoVcUqaqdmcUQJugI0yXdNwJCE3ydSMe8DOH25+wcExF9F2xVlDtdLfk7zhhyr/3brmNid4zYSsu0R1ED9g/zh5f6g0IDxm4b0KTxKj2Muu6nsKH5OJi9Jb32Wfew8NBUJuSbZLb3Lw1qOGL8dm723T6CkvOtt31U7TO+gLj31OmMXbrRksDACqzE9DMi+Zd8/DuY35ZDtqiFXdXjWK8UQ9OCqjCrjDKCbQ0nT9RwJsVqpWWPQqWEzOZSjNEvjz/wj+uWFrq7QyotVCKaFd5mHlNqN7aS8d3xt/XHbxwejKtQ4Rz5+hDwRh5vFpMDZU="}"#;

// Current Sentinel export, version 2, PBKDF2-SHA256 x15000.
// Password "sentinel-test".
const SENTINEL_BACKUP: &str = r#"{"version": 2, "time": 1700000000000, "payload": "aRkkyIcpALhRSMkgbYHNBGegPT23gyA1OmzuW35fm01VQLlPoxIrm5MTx3kponuYUV0B/E2aXHrf8+8KnRVw2Jd2GKAIdHlQKdFrwlVJWo8pn4qObSmOjK/IZPuiigiJB8NT2FW1itc214GnM/PLi+X70rWQfPEWAMu4dDDEszXZMh/Q5TQEKOP4v36fhl/MHx68AOYMzPk9HGLdpT3wQHAdqHDryHUPAQ4njFF/5Zr1HbtOhJph4qhNucAA9Ohrl2SYEzxCM4SVTIk3xVE6nU75UUvBJWjpYqcbuXrC36VMGF6qWcaB4WvA/bOw+DYyuwTybWJv2ddvq+z+NAxmjXf70g4CcBlV2UDsY43+N9Ca3eOmFmx9Y74jHvzZJyYEvzcd3zAfljkCAGHvFgpaVCnA56yAelpmzPQNLYi6n67PXR0gkN3A9R9vKESTY7yOKw/4l2mIxp0QU7KCzM4LX1iyDhvOK1ipCQKti/isL5qlMlvONyuQOrFF6kAP+XFJwyzdWKAaFggBs+PQqCDUTgm7YFkiNrxKiZgZAJVIsBbkXtR4Lstzi83+gPlPugalSwMKqv5qDlNmc/aLdtCm/98BCxC2lX2Zo959ZIzxzvxnapBuai68wxz5nqOkizTkSCF4DZ0cP1wqzYUE1U/P2OzkiMBFwMX+gdOHX+UAnS3cxAb9EbJeEGk5f+hvPz000gjIVN/2bCXV2sDVmIpAiQ=="}"#;

// Flat legacy export, version 1. One zpub sits in `xpubs`, the dojo has no apikey.
// Password "legacy-test".
const LEGACY_BACKUP: &str = r#"{"version": 1, "time": 1500000000000, "payload": "T3C3Tm2MEfjqmgxUVoKXOpw1KAk1Ip3fJJImOngH6ULQ3tZrT0qQ1VbfAXxs21tV+WeDepLfQzYF2bn2WgsZ/QAjhSUjecJ/PzvSelDCMeW4ZHCR/wvfJziDNwKwkYD7MJ2zI/qgcMQQcY5jcXS5SCkfGEL8B4oLXdgvuMy7X/Vi7R+45sBaIGFGiTtZDFz9MqGNXGScK29gsHxluLpzekHkK77ALfZflfYP8sVzwDWCXjUtTGaT+5+l7JLaxK2/isQgj76zzGm1L/es3sDtzSOf/4uAeCpbX4WdI1Ud+Jz/z7yXEE0Av40kAEQQvFkZHg4U6Ge+BJiq3PNeWEbBBOjSZV5TB06ZN76GAlGvwuCAGf78HVgwI3voy2ut0HJQBHBq1koxc4Ciez9646ZhqVxsh4iZVrhuBhQpQBWSrKsDPpV7rNIJt666PgGdfj7H2sVejyqENHxYlxplZzDKC4Hyb+UXPxz77cHtKCPKVEDU+UiPDLHu+o9o9kG9nUgd4tCWUgpFml/tIJ+fK4HjS2l6lmxwJrM4ltsxlw4tjEnOtpA7U3215iaq9FlXTcJ3eE2OaDougCKEZ4qXs8Grhd/ZrmgQGI5X7+aOs+zXJecN+DnOZVzADz5y5upmeINc5OzGzSswNSPclfDS85Sn80JDhudjnkeM3PoQAeGWxqMpdhpURqx0ijqPMzvChagkvSog4T/WMpZtdn4U6LqnRseE2HpDqJULulR6mh74GHozhnpK2Mc53jpXD1bV5/NzNw3jKZ+ufok0y8NZNwZwJLrZe9HyxEaQSkO0eQr8/5M0X8OPFGWLudSgFpd+EIUTmv6olVqG9W2jnZn6LuPYcbfSaOONu8IJzUjsDmC8b9Q="}"#;

// Flat legacy export, version 2: PBKDF2-SHA256 but only x5000, as old app
// releases wrote them. Carries a bech32 address in `legacy` and a valid dojo.
// Password "legacy-v2-test".
const LEGACY_V2_BACKUP: &str = r#"{"version": 2, "time": 1550000000000, "payload": "/w3ImgrA8p55zSB4HLBhN6e9Z7pmZqscFYZuFELhaUWdhcCn+sBceX0mXYc1nIXW3YKgWsgObe9viGCcko8LfOncNJriL0tsVJfFau1uylwQ/FPcXBU8NhON0Xe8gD6WWmjAKFILkkgIbA52vTlXpQAJmGJbCkz1++6ecw7tlYQ9yGfNtSbthA0JwOpSfeG1vkpVaD7YQfDQCSn+kScwAzocmIuw4oEPsZ034HbiKJKVfnVElo3kuP0bLRRwrRtINwqUmDugtiss1aI07FdcmrO1VJgC/ZRHQT5fs1V282CQ09B+AADUG3omawiy34mGPlp5AE7L/qfWYuzbv+dv7iSUi5md9YtdBqT15McGOw0LDXPEMZbBDyXkO9ral2WHADr6UGWdqXxWVAH9M+W8xl3MgNrRIHqv9Ikhr9DaSea+0vN1UGj418F5vfMeMo1SnXs7JLn/TH/mm5cjVU9c41jIqRkF9KxpVrIrsKMF+wlnUIf7TgI1G6pc4HMhNDXgP85Zei8BV+rJ1P47SrvtDv28f24Mp+uZW+i7c3n36+nY2w55j5wyIXIuA6UtN6UE"}"#;
const BECH32_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

/// Codec over empty in-memory stores with production iteration counts.
fn reader() -> BackupCodec {
    BackupCodec::with_defaults(Arc::new(MemoryStore::new()), Arc::new(MemoryPrefs::new()), Arc::new(MemoryDojo::new()))
}

fn fast_config() -> BackupConfig {
    BackupConfig::default().with_legacy_iterations(10).with_sha256_iterations(20)
}

fn fast_codec(collections: Vec<PubKeyCollection>, prefs: Value, dojo: MemoryDojo) -> BackupCodec {
    BackupCodec::new(
        fast_config(),
        Arc::new(AesCipher::new()),
        Arc::new(MemoryStore::with_collections(collections)),
        Arc::new(MemoryPrefs::from_value(prefs)),
        Arc::new(dojo),
    )
}

/// Envelope around `plaintext` encrypted the way Samourai does, at test speed.
fn samourai_envelope(plaintext: &str, password: &str) -> String {
    let ct = AesCipher::new().encrypt(plaintext, password, Scheme::Legacy, 10).unwrap();
    json!({"version": 1, "time": 0, "payload": ct}).to_string()
}

// ============================================================================
// 1. GOLDEN TESTS
// ============================================================================

mod golden_tests {
    use super::*;

    #[test]
    fn test_samourai_export_decodes() {
        let collection = reader().decrypt_and_parse_samourai_payload(SAMOURAI_BACKUP, "samourai-test").unwrap();

        assert_eq!(collection.label, "My Samourai wallet");
        assert!(collection.is_import_from_wallet);

        let got: Vec<(&str, &str, Option<PubKeyType>, i64, i64)> = collection
            .pubs
            .iter()
            .map(|p| (p.pub_key.as_str(), p.label.as_str(), p.kind, p.change_index, p.account_index))
            .collect();
        assert_eq!(
            got,
            vec![
                (XPUB, "Deposit BIP44 PUB", Some(PubKeyType::Bip44), 4, 12),
                (YPUB, "Deposit BIP49 PUB", Some(PubKeyType::Bip49), 0, 1),
                (ZPUB, "Deposit BIP84 PUB", Some(PubKeyType::Bip84), 2, 7),
                (ZPUB2, "Premix PUB", Some(PubKeyType::Bip84), 0, 0),
                // index 1 holds a broken zpub and is skipped; labels follow position
                (ZPUB2, "Bad Bank PUB", Some(PubKeyType::Bip84), 0, 3),
            ]
        );
        assert!(collection.pubs.iter().all(|p| p.fingerprint.as_deref() == Some("b3b8f6d2")));
    }

    #[test]
    fn test_sentinel_export_decodes() {
        let restored = reader().decrypt_sentinel(SENTINEL_BACKUP, "sentinel-test").unwrap();

        assert_eq!(restored.collections.len(), 1);
        let c = &restored.collections[0];
        assert_eq!(c.id, "5f0c1e0a-0000-4000-8000-000000000001");
        assert_eq!(c.label, "Cold storage");
        assert_eq!(c.last_refreshed, 1_700_000_000_000);
        assert_eq!(c.pubs, vec![PubKeyModel::new(ZPUB, "Vault", PubKeyType::Bip84)]);
        assert_eq!(restored.prefs, json!({"fiat": "EUR", "exchange": "kraken"}));
        assert_eq!(restored.dojo.unwrap()["pairing"]["url"], "http://dojo.onion/v2");
    }

    #[test]
    fn test_legacy_export_decodes() {
        let restored = reader().decrypt_sentinel_legacy(LEGACY_BACKUP, "legacy-test").unwrap();

        let got: Vec<(&str, &str, Option<PubKeyType>)> =
            restored.pub_keys.iter().map(|p| (p.pub_key.as_str(), p.label.as_str(), p.kind)).collect();
        assert_eq!(
            got,
            vec![
                (XPUB, "Spending", Some(PubKeyType::Bip44)),
                (YPUB, "Savings", Some(PubKeyType::Bip49)),
                (ZPUB, "Vault", Some(PubKeyType::Bip84)),
            ]
        );
        // plain addresses have no key type and fail the `legacy` array check
        assert!(!restored.pub_keys.iter().any(|p| p.pub_key == ADDRESS));
        // pairing without apikey fails validation
        assert_eq!(restored.dojo, None);
    }

    #[test]
    fn test_legacy_export_keeps_addresses_when_enabled() {
        let codec = BackupCodec::new(
            BackupConfig::default().with_legacy_addresses(true),
            Arc::new(AesCipher::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryPrefs::new()),
            Arc::new(MemoryDojo::new()),
        );
        let restored = codec.decrypt_sentinel_legacy(LEGACY_BACKUP, "legacy-test").unwrap();
        assert_eq!(restored.pub_keys.len(), 4);
        assert_eq!(restored.pub_keys[3], PubKeyModel::new(ADDRESS, "Genesis", PubKeyType::Address));
    }

    #[test]
    fn test_legacy_v2_export_decodes() {
        let restored = reader().decrypt_sentinel_legacy(LEGACY_V2_BACKUP, "legacy-v2-test").unwrap();

        assert_eq!(
            restored.pub_keys,
            vec![
                PubKeyModel::new(XPUB, "Spending", PubKeyType::Bip44),
                PubKeyModel::new(ZPUB, "Vault", PubKeyType::Bip84),
            ]
        );
        assert!(!restored.pub_keys.iter().any(|p| p.pub_key == BECH32_ADDRESS));
        assert_eq!(restored.dojo.unwrap()["pairing"]["apikey"], "k3y");
    }

    #[test]
    fn test_legacy_v2_is_not_a_sentinel_pairing() {
        // SHA-256 x15000 does not open it; only the legacy count does
        assert!(reader().decrypt_sentinel(LEGACY_V2_BACKUP, "legacy-v2-test").is_err());
    }

    #[test]
    fn test_restore_detects_each_golden_shape() {
        let codec = reader();
        let cases = [
            (SENTINEL_BACKUP, "sentinel-test", PayloadShape::Sentinel),
            (LEGACY_BACKUP, "legacy-test", PayloadShape::Legacy),
            (LEGACY_V2_BACKUP, "legacy-v2-test", PayloadShape::Legacy),
            (SAMOURAI_BACKUP, "samourai-test", PayloadShape::Samourai),
        ];
        for (backup, password, shape) in cases {
            assert_eq!(codec.restore(backup, password).unwrap().shape(), shape);
        }
    }
}

// ============================================================================
// 2. ROUND TRIP
// ============================================================================

mod round_trip_tests {
    use super::*;

    fn two_collections() -> Vec<PubKeyCollection> {
        let mut hot = PubKeyCollection::new("Hot")
            .with_pubs(vec![PubKeyModel::new(ZPUB, "Mobile", PubKeyType::Bip84).with_indexes(3, 9)]);
        hot.balance = 120_000;
        let cold = PubKeyCollection::new("Cold").with_pubs(vec![
            PubKeyModel::new(XPUB, "Paper", PubKeyType::Bip44),
            PubKeyModel::new(ADDRESS, "Donations", PubKeyType::Address),
        ]);
        vec![hot, cold]
    }

    #[test]
    fn test_export_restore_round_trip() {
        let collections = two_collections();
        let prefs = json!({"fiat": "USD", "theme": "dark", "notifications": true});
        let dojo = json!({"pairing": {"url": "http://abc.onion/v2", "apikey": "s3cret"}});
        let codec = fast_codec(collections.clone(), prefs.clone(), MemoryDojo::with_payload(dojo.to_string()));

        let backup = codec.export("round trip").unwrap();
        let envelope: Value = serde_json::from_str(&backup).unwrap();
        assert_eq!(envelope["version"], 2);

        match codec.restore(&backup, "round trip").unwrap() {
            Restored::Sentinel(r) => {
                assert_eq!(r.collections, collections);
                assert_eq!(r.prefs, prefs);
                assert_eq!(r.dojo, Some(dojo));
            }
            other => panic!("expected sentinel restore, got {:?}", other.shape()),
        }
    }

    #[test]
    fn test_version_one_export_round_trip() {
        let codec = BackupCodec::new(
            fast_config().with_version_code(1),
            Arc::new(AesCipher::new()),
            Arc::new(MemoryStore::with_collections(two_collections())),
            Arc::new(MemoryPrefs::new()),
            Arc::new(MemoryDojo::new()),
        );
        let backup = codec.export("pw").unwrap();

        // the payload opens with the legacy scheme only
        let envelope: Value = serde_json::from_str(&backup).unwrap();
        let payload = envelope["payload"].as_str().unwrap();
        assert!(AesCipher::new().decrypt(payload, "pw", Scheme::Legacy, 10).is_ok());

        let restored = codec.decrypt_sentinel(&backup, "pw").unwrap();
        assert_eq!(restored.collections.len(), 2);
        assert_eq!(restored.dojo, None);
    }
}

// ============================================================================
// 3. FORMAT POLICY
// ============================================================================

mod policy_tests {
    use super::*;

    #[test]
    fn test_sentinel_wrong_password_is_error() {
        assert!(reader().decrypt_sentinel(SENTINEL_BACKUP, "nope").is_err());
    }

    #[test]
    fn test_sentinel_decoder_rejects_legacy_layout() {
        assert!(reader().decrypt_sentinel(LEGACY_BACKUP, "legacy-test").is_err());
    }

    #[test]
    fn test_sentinel_missing_envelope_keys() {
        let codec = reader();
        for backup in [r#"{"payload": "abc"}"#, r#"{"version": 2}"#, r#"{}"#] {
            assert!(matches!(
                codec.decrypt_sentinel(backup, "pw"),
                Err(sentinel::BackupError::InvalidPayload)
            ));
        }
    }

    #[test]
    fn test_samourai_failures_are_none() {
        let codec = fast_codec(vec![], json!({}), MemoryDojo::new());
        let cases = [
            ("no wallet", samourai_envelope(r#"{"accounts": []}"#, "pw"), "pw"),
            ("not json", samourai_envelope("plain text", "pw"), "pw"),
            ("wrong password", samourai_envelope(r#"{"wallet": {"fingerprint": "ab"}}"#, "pw"), "other"),
            ("no envelope", "garbage".to_string(), "pw"),
        ];
        for (name, backup, password) in cases {
            assert!(codec.decrypt_and_parse_samourai_payload(&backup, password).is_none(), "{name}");
        }
    }

    #[test]
    fn test_samourai_decoder_ignores_sha256_backups() {
        assert!(reader().decrypt_and_parse_samourai_payload(SENTINEL_BACKUP, "sentinel-test").is_none());
    }

    #[test]
    fn test_legacy_drops_mismatch_without_error() {
        let codec = fast_codec(vec![], json!({}), MemoryDojo::new());
        let plaintext = json!({"bip84": [{(XPUB): "misplaced"}, {(ZPUB): "kept"}], "legacy": [{"not an address": "x"}]});
        // version 2 legacy backups pair SHA-256 with the legacy iteration count
        let ct = AesCipher::new().encrypt(&plaintext.to_string(), "pw", Scheme::Sha256, 10).unwrap();
        let backup = json!({"version": 2, "time": 0, "payload": ct}).to_string();

        let restored = codec.decrypt_sentinel_legacy(&backup, "pw").unwrap();
        assert_eq!(restored.pub_keys, vec![PubKeyModel::new(ZPUB, "kept", PubKeyType::Bip84)]);
    }

    #[test]
    fn test_legacy_v2_at_app_iteration_count() {
        let plaintext = json!({"bip84": [{(ZPUB): "vault"}]}).to_string();
        let ct = AesCipher::new().encrypt(&plaintext, "pw", Scheme::Sha256, 5_000).unwrap();
        let backup = json!({"version": 2, "time": 0, "payload": ct}).to_string();

        let codec = reader();
        let restored = codec.decrypt_sentinel_legacy(&backup, "pw").unwrap();
        assert_eq!(restored.pub_keys, vec![PubKeyModel::new(ZPUB, "vault", PubKeyType::Bip84)]);
        match codec.restore(&backup, "pw").unwrap() {
            Restored::Legacy(r) => assert_eq!(r.pub_keys.len(), 1),
            other => panic!("expected legacy restore, got {:?}", other.shape()),
        }
    }
}

// ============================================================================
// 4. IMPORT
// ============================================================================

mod import_tests {
    use super::*;
    use sentinel::{CollectionStore, DojoStore, Importer};

    #[tokio::test]
    async fn test_restore_and_replace() {
        let store = Arc::new(MemoryStore::with_collections(vec![PubKeyCollection::new("stale")]));
        store.seed_cache(vec![json!({"txid": "aa"})], vec![json!({"txid": "aa", "vout": 0})]).unwrap();
        let prefs = Arc::new(MemoryPrefs::from_value(json!({"fiat": "USD", "pin": true})));
        let dojo = Arc::new(MemoryDojo::new());
        let importer = Importer::new(store.clone(), store.clone(), store.clone(), prefs.clone(), dojo.clone());

        let restored = reader().restore(SENTINEL_BACKUP, "sentinel-test").unwrap();
        let summary = importer.apply(restored, true).await.unwrap();

        assert_eq!((summary.collections, summary.pub_keys), (1, 1));
        assert!(summary.prefs && summary.dojo && summary.replaced);
        let labels: Vec<String> = store.collections().into_iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["Cold storage"]);
        assert_eq!((store.tx_count(), store.utxo_count()), (0, 0));
        // prefs merge over existing keys
        assert_eq!(prefs.get("fiat"), Some(json!("EUR")));
        assert_eq!(prefs.get("pin"), Some(json!(true)));
        assert!(dojo.is_enabled());
    }

    #[tokio::test]
    async fn test_samourai_merge_keeps_existing() {
        let store = Arc::new(MemoryStore::with_collections(vec![PubKeyCollection::new("mine")]));
        let importer = Importer::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(MemoryPrefs::new()),
            Arc::new(MemoryDojo::new()),
        );

        let collection = reader().decrypt_and_parse_samourai_payload(SAMOURAI_BACKUP, "samourai-test").unwrap();
        let summary = importer.apply(Restored::Samourai(collection), false).await.unwrap();

        assert_eq!(summary.pub_keys, 5);
        assert!(!summary.prefs && !summary.dojo);
        assert_eq!(store.collections().len(), 2);
    }
}

// ============================================================================
// 5. CONFIG & FILES
// ============================================================================

mod config_file_tests {
    use super::*;
    use sentinel::{read_backup_file, Envelope};
    use std::io::Write;

    #[test]
    fn test_backup_file_with_trailing_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", LEGACY_BACKUP).unwrap();

        let text = read_backup_file(file.path()).unwrap();
        assert_eq!(reader().restore(&text, "legacy-test").unwrap().shape(), PayloadShape::Legacy);
    }

    #[test]
    fn test_missing_backup_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            read_backup_file(dir.path().join("absent.txt")),
            Err(sentinel::BackupError::Io(_))
        ));
    }

    #[test]
    fn test_env_selects_export_version() {
        let _guard = lock_env();
        std::env::set_var("SENTINEL_BACKUP_VERSION", "1");
        let config = BackupConfig::from_env().with_legacy_iterations(10).with_sha256_iterations(20);
        std::env::remove_var("SENTINEL_BACKUP_VERSION");

        let codec = BackupCodec::new(
            config,
            Arc::new(AesCipher::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryPrefs::new()),
            Arc::new(MemoryDojo::new()),
        );
        let backup = codec.export("pw").unwrap();
        assert_eq!(Envelope::parse(&backup).unwrap().version, 1);
        assert!(codec.decrypt_sentinel(&backup, "pw").is_ok());
    }
}
