//! Tests for the identifier newtypes and scopes in beast-common.
//!
//! This test suite covers:
//! - Newtype wrappers implementing expected traits (Display, Debug, Serialize, Deserialize)
//! - Persisted form of identifiers (strings) and lenient input (numbers)
//! - Identifiers used as map keys

use std::collections::{BTreeMap, HashMap};
use beast_common::types::*;

#[cfg(test)]
mod newtype_trait_tests {
    use super::*;

    #[test]
    fn test_channel_id_implements_expected_traits() {
        let channel_id = ChannelId(123456789);

        // Test Debug
        let debug_str = format!("{:?}", channel_id);
        assert_eq!(debug_str, "ChannelId(123456789)");

        // Test Display
        let display_str = format!("{}", channel_id);
        assert_eq!(display_str, "123456789");

        // Test PartialEq and Eq
        assert_eq!(channel_id, ChannelId(123456789));
        assert_ne!(channel_id, ChannelId(987654321));

        // Test Hash - can be used in HashMap
        let mut map = HashMap::new();
        map.insert(channel_id, "test_channel");
        assert_eq!(map.get(&channel_id), Some(&"test_channel"));
    }

    #[test]
    fn test_ids_serialize_as_strings() {
        let user_id = UserId(987654321098765432);

        let serialized = serde_json::to_string(&user_id).unwrap();
        assert_eq!(serialized, "\"987654321098765432\"");

        let deserialized: UserId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, user_id);
    }

    #[test]
    fn test_ids_accept_numbers() {
        let guild: GuildId = serde_json::from_str("42").unwrap();
        assert_eq!(guild, GuildId(42));

        assert!(serde_json::from_str::<GuildId>("-1").is_err());
        assert!(serde_json::from_str::<GuildId>("\"abc\"").is_err());
    }

    #[test]
    fn test_ids_as_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(GuildId(2), "b");
        map.insert(GuildId(1), "a");

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"1":"a","2":"b"}"#);

        let back: BTreeMap<GuildId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&GuildId(2)).map(String::as_str), Some("b"));
    }

    #[test]
    fn test_from_str_trims() {
        assert_eq!(" 77 ".parse::<RoleId>().unwrap(), RoleId(77));
    }
}

#[cfg(test)]
mod scope_tests {
    use super::*;

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(Scope::Guild(GuildId(5)).to_string(), "guild 5");
    }

    #[test]
    fn test_guild_and_global_scopes_differ() {
        assert_ne!(Scope::Global, Scope::Guild(GuildId(1)));
        assert_ne!(Scope::Global.key(), Scope::Guild(GuildId(1)).key());
    }
}
