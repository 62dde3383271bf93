use osprofiles_store::{SplitData, combine_split_data, profile_model, split_record};
use proptest::prelude::*;

#[profile_model]
#[derive(Clone, Default, PartialEq)]
struct Mixed {
    label: String,
    count: i64,
    #[security(secure)]
    secret: String,
    #[security(secure)]
    pin: Option<u32>,
    #[security(temporary)]
    scratch: Vec<String>,
    ratio: Option<bool>,
}

prop_compose! {
    fn mixed()(
        label in ".*",
        count in any::<i64>(),
        secret in ".*",
        pin in proptest::option::of(any::<u32>()),
        scratch in proptest::collection::vec(".*", 0..4),
        ratio in proptest::option::of(any::<bool>()),
    ) -> Mixed {
        Mixed { label, count, secret, pin, scratch, ratio }
    }
}

proptest! {
    #[test]
    fn split_then_merge_reproduces_record(record in mixed()) {
        let split = split_record(&record).unwrap();
        let merged: Mixed = combine_split_data(&split, true, Mixed::default);
        prop_assert_eq!(merged, record);
    }

    #[test]
    fn persisted_tiers_reload_without_temporary(record in mixed()) {
        let split = split_record(&record).unwrap();
        let secure = split.serialize_secure().unwrap();
        let plaintext = split.serialize_plaintext().unwrap();

        let reloaded = SplitData::from_artifacts(Some(&secure), Some(&plaintext)).unwrap();
        let merged: Mixed = combine_split_data(&reloaded, true, Mixed::default);

        prop_assert_eq!(&merged.secret, &record.secret);
        prop_assert_eq!(merged.count, record.count);
        prop_assert!(merged.scratch.is_empty());
    }
}
