//! Message catalogue backed by Fluent bundles.

use crate::error::{I18nError, I18nResult};
use crate::locale::Locale;
use fluent::{FluentArgs, FluentResource};
use fluent_bundle::concurrent::FluentBundle;
use std::collections::HashMap;
use tracing::{debug, warn};

type Bundle = FluentBundle<FluentResource>;

/// Named arguments interpolated into a message.
pub type MessageArgs<'a> = [(&'a str, String)];

/// All loaded locales plus the locale used when a lookup misses.
pub struct Catalog {
    bundles: HashMap<Locale, Bundle>,
    fallback: Locale,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("locales", &self.bundles.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl Catalog {
    /// Build a catalogue from the resources compiled into the crate.
    ///
    /// # Errors
    ///
    /// Fails when an embedded resource does not parse.
    pub fn embedded(fallback: Locale) -> I18nResult<Self> {
        let mut catalog = Self {
            bundles: HashMap::new(),
            fallback,
        };
        for locale in Locale::all() {
            catalog.add_source(locale, locale.resource())?;
        }
        Ok(catalog)
    }

    /// Parse `source` and add it to the bundle of `locale`.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::FluentParseError`] on syntax errors and
    /// [`I18nError::BundleError`] when a message id is defined twice.
    pub fn add_source(&mut self, locale: Locale, source: &str) -> I18nResult<()> {
        let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
            I18nError::FluentParseError {
                locale: locale.code().to_string(),
                errors: errors.iter().map(|e| format!("{e:?}")).collect(),
            }
        })?;

        let bundle = match self.bundles.entry(locale) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let mut bundle = FluentBundle::new_concurrent(vec![locale.to_language_identifier()?]);
                bundle.set_use_isolating(false);
                entry.insert(bundle)
            }
        };

        bundle.add_resource(resource).map_err(|errors| I18nError::BundleError {
            locale: locale.code().to_string(),
            errors: errors.iter().map(|e| format!("{e:?}")).collect(),
        })?;
        debug!(locale = locale.code(), "Loaded Fluent resource");
        Ok(())
    }

    /// The locale used when a message is missing from the requested one.
    #[must_use]
    pub const fn fallback(&self) -> Locale {
        self.fallback
    }

    /// Whether `locale` defines `key`.
    #[must_use]
    pub fn has_message(&self, locale: Locale, key: &str) -> bool {
        self.bundles
            .get(&locale)
            .is_some_and(|bundle| bundle.has_message(key))
    }

    /// Format `key` in exactly `locale`, without fallback.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::MessageNotFound`] when the message or its value is
    /// missing and [`I18nError::MessageFormatError`] when an argument is unset.
    pub fn format(&self, locale: Locale, key: &str, args: &MessageArgs<'_>) -> I18nResult<String> {
        let not_found = || I18nError::MessageNotFound {
            key: key.to_string(),
        };
        let bundle = self.bundles.get(&locale).ok_or_else(not_found)?;
        let pattern = bundle
            .get_message(key)
            .and_then(|message| message.value())
            .ok_or_else(not_found)?;

        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, value.as_str());
        }

        let mut errors = Vec::new();
        let formatted = bundle.format_pattern(pattern, Some(&fluent_args), &mut errors);
        if !errors.is_empty() {
            return Err(I18nError::MessageFormatError {
                key: key.to_string(),
                errors: errors.iter().map(|e| format!("{e:?}")).collect(),
            });
        }
        Ok(formatted.into_owned())
    }

    /// Translate `key`, falling back to the fallback locale and finally to the
    /// key itself so a reply is always produced.
    #[must_use]
    pub fn tr(&self, locale: Locale, key: &str, args: &MessageArgs<'_>) -> String {
        match self.format(locale, key, args) {
            Ok(text) => text,
            Err(err) => {
                if locale != self.fallback {
                    if let Ok(text) = self.format(self.fallback, key, args) {
                        debug!(key, locale = locale.code(), "Message served from fallback locale");
                        return text;
                    }
                }
                warn!(key, error = %err, "Untranslated message");
                key.to_string()
            }
        }
    }

    /// Message ids defined for `locale`, sorted.
    #[must_use]
    pub fn message_ids(locale: Locale) -> Vec<String> {
        use fluent_syntax::ast::Entry;
        let mut ids: Vec<String> = fluent_syntax::parser::parse(locale.resource())
            .map_or_else(|(resource, _)| resource, |resource| resource)
            .body
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Message(message) => Some(message.id.name.to_string()),
                _ => None,
            })
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut catalog = Catalog {
            bundles: HashMap::new(),
            fallback: Locale::German,
        };
        catalog
            .add_source(Locale::German, "hello = Hallo { $name }!\nonly-de = Nur deutsch\n")
            .unwrap();
        catalog
            .add_source(Locale::English, "hello = Hello { $name }!\n")
            .unwrap();
        catalog
    }

    #[test]
    fn test_format_with_args() {
        let catalog = catalog();
        let args = [("name", "Krampus".to_string())];
        assert_eq!(catalog.tr(Locale::English, "hello", &args), "Hello Krampus!");
        assert_eq!(catalog.tr(Locale::German, "hello", &args), "Hallo Krampus!");
    }

    #[test]
    fn test_fallback_chain() {
        let catalog = catalog();
        assert_eq!(catalog.tr(Locale::English, "only-de", &[]), "Nur deutsch");
        assert_eq!(catalog.tr(Locale::English, "missing-key", &[]), "missing-key");
    }

    #[test]
    fn test_missing_argument_is_an_error() {
        let catalog = catalog();
        assert!(matches!(
            catalog.format(Locale::English, "hello", &[]),
            Err(I18nError::MessageFormatError { .. })
        ));
    }

    #[test]
    fn test_duplicate_message_rejected() {
        let mut catalog = catalog();
        let err = catalog.add_source(Locale::English, "hello = again\n").unwrap_err();
        assert!(matches!(err, I18nError::BundleError { .. }));
    }

    #[test]
    fn test_parse_error() {
        let mut catalog = catalog();
        let err = catalog.add_source(Locale::English, "= broken").unwrap_err();
        assert!(matches!(err, I18nError::FluentParseError { .. }));
    }
}
