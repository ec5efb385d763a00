// ═══════════════════════════════════════════════════════════════════
// Storage Tests — key-value stores, state document, import/export
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use holdings_core::errors::CoreError;
use holdings_core::models::asset::AssetCandidate;
use holdings_core::models::holding::Holding;
use holdings_core::models::portfolio::Portfolio;
use holdings_core::models::settings::{Fiat, Settings};
use holdings_core::storage::format::{self, EXPORT_FILE_NAME, STATE_KEY};
use holdings_core::storage::manager::StorageManager;
use holdings_core::storage::store::{FileStore, KeyValueStore, MemoryStore};

fn sample_portfolio() -> Portfolio {
    let mut btc = Holding::new(&AssetCandidate::new("bitcoin", "BTC", "Bitcoin"), 0.5, 20_000.0);
    btc.price = 30_000.0;
    btc.value = 15_000.0;
    btc.change_24h = 2.5;
    btc.spark_7d = vec![29_000.0, 29_500.5, 30_000.0];
    btc.icon = "https://img.test/btc.png".into();
    btc.detail_refreshed_at = Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());

    let eth = Holding::new(&AssetCandidate::new("ethereum", "ETH", "Ethereum"), 2.0, 1_500.0);

    Portfolio {
        settings: Settings {
            fiat: Fiat::Usd,
            refresh_mins: 10,
            show_spark: false,
            show_badges: true,
        },
        items: vec![btc, eth],
    }
}

// ═══════════════════════════════════════════════════════════════════
// Key-value stores
// ═══════════════════════════════════════════════════════════════════

mod memory_store {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("k").unwrap();
    }
}

mod file_store {
    use super::*;

    #[test]
    fn creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let store = FileStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[test]
    fn set_get_remove() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::open(tmp.path()).unwrap();

        assert_eq!(store.get(STATE_KEY).unwrap(), None);
        store.set(STATE_KEY, r#"{"items":[]}"#).unwrap();
        assert_eq!(store.get(STATE_KEY).unwrap().as_deref(), Some(r#"{"items":[]}"#));
        assert!(tmp.path().join("holdings.v4.json").is_file());

        store.remove(STATE_KEY).unwrap();
        assert_eq!(store.get(STATE_KEY).unwrap(), None);
        store.remove(STATE_KEY).unwrap();
    }

    #[test]
    fn values_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        FileStore::open(tmp.path()).unwrap().set("a", "1").unwrap();
        let reopened = FileStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::open(tmp.path()).unwrap();
        for key in ["", "../x", "a/b", "a\\b", ".hidden"] {
            assert!(
                matches!(store.set(key, "v"), Err(CoreError::Storage(_))),
                "key {key:?} should be rejected"
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// State document
// ═══════════════════════════════════════════════════════════════════

mod document {
    use super::*;

    #[test]
    fn round_trip() {
        let p = sample_portfolio();
        let text = format::serialize(&p).unwrap();
        assert_eq!(format::deserialize(&text).unwrap(), p);
    }

    #[test]
    fn empty_round_trip() {
        let p = Portfolio::default();
        let text = format::serialize(&p).unwrap();
        assert_eq!(format::deserialize(&text).unwrap(), p);
    }

    #[test]
    fn field_names() {
        let text = format::serialize(&sample_portfolio()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(v["fiat"], "usd");
        assert_eq!(v["refreshMins"], 10);
        assert_eq!(v["showSpark"], false);
        assert_eq!(v["showBadges"], true);

        let btc = &v["items"][0];
        assert_eq!(btc["avgCost"], 20_000.0);
        assert_eq!(btc["change24h"], 2.5);
        assert_eq!(btc["spark7d"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn settings_default_when_absent() {
        let p = format::deserialize(r#"{"items":[]}"#).unwrap();
        assert_eq!(p.settings, Settings::default());
    }

    #[test]
    fn pretty_export_is_indented() {
        let text = format::serialize_pretty(&sample_portfolio()).unwrap();
        assert!(text.contains("\n  \"items\""));
        assert_eq!(
            format::deserialize(&text).unwrap(),
            format::deserialize(&format::serialize(&sample_portfolio()).unwrap()).unwrap()
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"{"items":[
            {"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":1},
            {"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":2}
        ]}"#;
        assert!(format::deserialize(text).is_err());
    }

    #[test]
    fn export_file_name() {
        assert_eq!(EXPORT_FILE_NAME, "holdings-v4-export.json");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Import merge
// ═══════════════════════════════════════════════════════════════════

mod import {
    use super::*;

    #[test]
    fn document_without_items_is_rejected() {
        let current = sample_portfolio();
        let err = format::merge_import(&current, r#"{"fiat":"eur"}"#).unwrap_err();
        match err {
            CoreError::ImportFormat(msg) => assert!(msg.contains("items")),
            other => panic!("Expected ImportFormat, got {other:?}"),
        }
    }

    #[test]
    fn null_items_is_rejected() {
        let err = format::merge_import(&Portfolio::default(), r#"{"items":null}"#).unwrap_err();
        assert!(matches!(err, CoreError::ImportFormat(_)));
    }

    #[test]
    fn malformed_input_is_rejected() {
        for text in ["not json", "[1,2,3]", "42", r#"{"items":"nope"}"#] {
            let err = format::merge_import(&Portfolio::default(), text).unwrap_err();
            assert!(
                matches!(err, CoreError::ImportFormat(_)),
                "{text:?} gave {err:?}"
            );
            assert!(err.is_user_facing());
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"{"items":[
            {"id":"a","symbol":"A","name":"A","amount":1},
            {"id":"a","symbol":"A","name":"A","amount":1}
        ]}"#;
        let err = format::merge_import(&Portfolio::default(), text).unwrap_err();
        assert!(matches!(err, CoreError::ImportFormat(_)));
    }

    fn import_error(text: &str) -> String {
        match format::merge_import(&sample_portfolio(), text).unwrap_err() {
            CoreError::ImportFormat(msg) => msg,
            other => panic!("Expected ImportFormat, got {other:?}"),
        }
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let msg = import_error(r#"{"refreshMins":0,"items":[]}"#);
        assert!(msg.contains("Refresh interval"), "{msg}");
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        for amount in ["-5", "0"] {
            let text = format!(
                r#"{{"items":[{{"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":{amount}}}]}}"#
            );
            let msg = import_error(&text);
            assert!(msg.contains("bitcoin") && msg.contains("Amount"), "{amount}: {msg}");
        }
    }

    #[test]
    fn negative_avg_cost_is_rejected() {
        let msg = import_error(
            r#"{"items":[{"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":1,"avgCost":-100}]}"#,
        );
        assert!(msg.contains("Average cost"), "{msg}");
    }

    #[test]
    fn rejected_import_leaves_current_state_alone() {
        let current = sample_portfolio();
        let text = r#"{"refreshMins":0,"items":[{"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":-5,"avgCost":-100}]}"#;
        assert!(format::merge_import(&current, text).is_err());
        assert!(current.settings.validate().is_ok());
        assert_eq!(current, sample_portfolio());
    }

    #[test]
    fn zero_avg_cost_is_accepted() {
        let merged = format::merge_import(
            &Portfolio::default(),
            r#"{"items":[{"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":1,"avgCost":0}]}"#,
        )
        .unwrap();
        assert_eq!(merged.items[0].avg_cost, 0.0);
    }

    #[test]
    fn imported_fields_replace_current_ones() {
        let current = sample_portfolio();
        let text = r#"{
            "fiat": "eur",
            "items": [{"id":"cardano","symbol":"ADA","name":"Cardano","amount":100,"avgCost":0.4}]
        }"#;
        let merged = format::merge_import(&current, text).unwrap();

        assert_eq!(merged.settings.fiat, Fiat::Eur);
        assert_eq!(merged.ids(), vec!["cardano"]);
        assert_eq!(merged.items[0].avg_cost, 0.4);
    }

    #[test]
    fn absent_fields_keep_current_values() {
        let current = sample_portfolio();
        let merged = format::merge_import(&current, r#"{"items":[]}"#).unwrap();

        assert!(merged.items.is_empty());
        assert_eq!(merged.settings, current.settings);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let merged =
            format::merge_import(&Portfolio::default(), r#"{"items":[],"theme":"dark"}"#).unwrap();
        assert_eq!(merged, Portfolio::default());
    }
}

// ═══════════════════════════════════════════════════════════════════
// StorageManager
// ═══════════════════════════════════════════════════════════════════

mod manager {
    use super::*;

    #[test]
    fn missing_document_loads_default() {
        let store = MemoryStore::new();
        assert_eq!(StorageManager::load(&store).unwrap(), Portfolio::default());
    }

    #[test]
    fn corrupt_document_loads_default() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, "{ this is not json").unwrap();
        assert_eq!(StorageManager::load(&store).unwrap(), Portfolio::default());
    }

    #[test]
    fn out_of_range_document_loads_default() {
        for text in [
            r#"{"refreshMins":0,"items":[]}"#,
            r#"{"items":[{"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":-5}]}"#,
            r#"{"items":[{"id":"bitcoin","symbol":"BTC","name":"Bitcoin","amount":1,"avgCost":-100}]}"#,
        ] {
            let mut store = MemoryStore::new();
            store.set(STATE_KEY, text).unwrap();
            assert_eq!(StorageManager::load(&store).unwrap(), Portfolio::default(), "{text}");
        }
    }

    #[test]
    fn save_then_load() {
        let mut store = MemoryStore::new();
        let p = sample_portfolio();
        StorageManager::save(&mut store, &p).unwrap();
        assert_eq!(StorageManager::load(&store).unwrap(), p);
    }

    #[test]
    fn export_and_import_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(EXPORT_FILE_NAME);
        let p = sample_portfolio();

        StorageManager::export_to_file(&p, &path).unwrap();
        let imported = StorageManager::import_from_file(&Portfolio::default(), &path).unwrap();
        assert_eq!(imported, p);
    }

    #[test]
    fn import_of_missing_file_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let err = StorageManager::import_from_file(&Portfolio::default(), tmp.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
