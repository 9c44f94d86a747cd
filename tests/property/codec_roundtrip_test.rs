use std::collections::BTreeSet;

use proptest::prelude::*;
use quicktabs::services::storage_codec::{StorageCodec, StorageCodecTrait};
use quicktabs::types::quick_tab::{Position, QuickTabRecord, Size, Visibility};

fn arb_record() -> impl Strategy<Value = QuickTabRecord> {
    (
        "[a-z0-9]{1,12}",
        "https://[a-z]{1,10}\\.com(/[a-z]{0,8})?",
        ".{0,20}",
        -1i64..10_000,
        (-5000.0f64..5000.0, -5000.0f64..5000.0),
        (50.0f64..4000.0, 50.0f64..4000.0),
        any::<bool>(),
        prop::collection::btree_set(0i64..100, 0..4),
        prop::collection::btree_set(0i64..100, 0..4),
    )
        .prop_map(
            |(id, url, title, origin, (left, top), (width, height), minimized, soloed, muted)| {
                QuickTabRecord {
                    id,
                    url,
                    title,
                    origin_tab_id: origin,
                    position: Position { left, top },
                    size: Size { width, height },
                    visibility: Visibility { minimized },
                    soloed_on_tabs: soloed,
                    muted_on_tabs: muted,
                }
            },
        )
}

fn arb_records() -> impl Strategy<Value = Vec<QuickTabRecord>> {
    prop::collection::vec(arb_record(), 0..8).prop_map(|mut records| {
        // Ids are unique by construction in the real system.
        let mut seen = BTreeSet::new();
        records.retain(|r| seen.insert(r.id.clone()));
        records
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(records in arb_records()) {
        let codec = StorageCodec::new();
        let envelope = codec.encode(&records);
        let raw = serde_json::to_value(&envelope).unwrap();

        let decoded = codec.decode(&raw).unwrap();
        prop_assert_eq!(decoded, records);
    }

    #[test]
    fn encode_stamps_fresh_metadata(records in arb_records()) {
        let codec = StorageCodec::new();
        let a = codec.encode(&records);
        let b = codec.encode(&records);

        prop_assert!(!a.save_id.is_empty());
        prop_assert_ne!(a.save_id, b.save_id);
        prop_assert!(a.timestamp > 0);
    }

    #[test]
    fn envelope_json_roundtrip_preserves_every_field(records in arb_records()) {
        let codec = StorageCodec::new();
        let envelope = codec.encode(&records);

        let raw = serde_json::to_string(&envelope).unwrap();
        let back: quicktabs::types::envelope::PersistedStateEnvelope =
            serde_json::from_str(&raw).unwrap();

        prop_assert_eq!(back, envelope);
    }

    #[test]
    fn legacy_container_decode_recovers_all_records(records in arb_records()) {
        let codec = StorageCodec::new();
        let tabs: Vec<serde_json::Value> = records
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect();
        let raw = serde_json::json!({
            "containers": { "firefox-default": { "tabs": tabs } }
        });

        let decoded = codec.decode(&raw).unwrap();
        prop_assert_eq!(decoded, records);
    }
}
