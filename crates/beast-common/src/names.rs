//! Command-name normalization.
//!
//! Disabled-command lists are only reliable if the same normalization runs on
//! insert and on lookup, so every caller goes through [`normalize_command_name`].

/// Normalize a user-supplied command name.
///
/// Trims, strips leading slashes, lowercases and collapses inner whitespace so
/// that `"/Ping"`, `"PING"` and `" ping "` all become `"ping"`, and
/// `"/Owner   List"` becomes the compound form `"owner list"`.
#[must_use]
pub fn normalize_command_name(raw: &str) -> String {
    raw.trim_start_matches(|c: char| c == '/' || c.is_whitespace())
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The compound `"name subcommand"` key for an invocation.
#[must_use]
pub fn compound_command_name(name: &str, subcommand: Option<&str>) -> Option<String> {
    subcommand.map(|sub| normalize_command_name(&format!("{name} {sub}")))
}

/// Normalize every entry in place, drop empties and duplicates, keep first-seen order.
pub fn normalize_command_list(list: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::with_capacity(list.len());
    let normalized: Vec<String> = list
        .iter()
        .map(|entry| normalize_command_name(entry))
        .filter(|entry| !entry.is_empty() && seen.insert(entry.clone()))
        .collect();
    *list = normalized;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_variants_collapse_to_one_name() {
        for raw in ["/Ping", "PING", "ping", "  //ping  "] {
            assert_eq!(normalize_command_name(raw), "ping");
        }
    }

    #[test]
    fn test_compound_names() {
        assert_eq!(normalize_command_name("/Owner   List"), "owner list");
        assert_eq!(
            compound_command_name("owner", Some("List")),
            Some("owner list".to_string())
        );
        assert_eq!(compound_command_name("ping", None), None);
    }

    #[test]
    fn test_list_normalization_dedupes() {
        let mut list = vec![
            "/Ping".to_string(),
            "ping".to_string(),
            "  ".to_string(),
            "PURGE".to_string(),
        ];
        normalize_command_list(&mut list);
        assert_eq!(list, vec!["ping".to_string(), "purge".to_string()]);
    }

    #[test]
    fn test_unicode_names_lowercase() {
        assert_eq!(normalize_command_name("/WÜRFELN"), "würfeln");
    }

    proptest! {
        #[test]
        fn test_normalization_is_idempotent(raw in "[ /]{0,3}[A-Za-z]{1,10}( [A-Za-z]{1,8})?[ ]{0,2}") {
            let once = normalize_command_name(&raw);
            prop_assert_eq!(normalize_command_name(&once), once.clone());
            prop_assert!(!once.starts_with('/'));
            prop_assert_eq!(once.to_lowercase(), once);
        }
    }
}
