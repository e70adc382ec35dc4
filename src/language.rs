//! Language packs for voice commands
//!
//! A language pack maps every command to a list of regular expressions,
//! matched against the whole normalized transcript. Patterns may capture:
//! - `level`: heading level, a digit or a word listed in `numbers`
//! - `ancestor`: region that scopes links, translated through `regions`
//!
//! The en-GB pack is built in. Other languages are loaded on demand from
//! `{translations_path}/{lang}.json`, where the path is a directory or an
//! http(s) base URL.

use crate::config::DEFAULT_LANGUAGE;
use crate::error::LanguageError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

const BUILTIN_PACK: &str = include_str!("../lang/en-GB.json");

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Commands a language pack can express
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    ReadHeaders,
    ReadLinks,
    ReadCurrentElement,
    ReadNextElement,
    ReadPreviousElement,
    GoToLink,
    ReadMain,
    SearchMain,
    ReadPageTitle,
    ReadPageSummary,
    GoToPreviousPage,
    GoToNextPage,
    GoToHomepage,
}

impl CommandKind {
    /// Matching order used when a transcript fits several commands
    pub const ALL: [CommandKind; 13] = [
        CommandKind::ReadHeaders,
        CommandKind::ReadLinks,
        CommandKind::ReadCurrentElement,
        CommandKind::ReadNextElement,
        CommandKind::ReadPreviousElement,
        CommandKind::GoToLink,
        CommandKind::ReadMain,
        CommandKind::SearchMain,
        CommandKind::ReadPageTitle,
        CommandKind::ReadPageSummary,
        CommandKind::GoToPreviousPage,
        CommandKind::GoToNextPage,
        CommandKind::GoToHomepage,
    ];
}

/// Translation file as stored on disk
#[derive(Debug, Deserialize)]
struct TranslationFile {
    lang: String,
    #[serde(default)]
    numbers: BTreeMap<String, u8>,
    #[serde(default)]
    regions: BTreeMap<String, String>,
    commands: BTreeMap<CommandKind, Vec<String>>,
}

/// A transcript matched against a language pack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    pub kind: CommandKind,
    pub level: Option<u8>,
    pub ancestor: Option<String>,
}

/// Compiled command patterns for one language
#[derive(Debug)]
pub struct LanguagePack {
    lang: String,
    numbers: BTreeMap<String, u8>,
    regions: BTreeMap<String, String>,
    commands: BTreeMap<CommandKind, Vec<Regex>>,
}

impl LanguagePack {
    /// Parse and compile a translation file
    pub fn from_json(json: &str) -> Result<Self, LanguageError> {
        let file: TranslationFile =
            serde_json::from_str(json).map_err(|e| LanguageError::Invalid {
                lang: "unknown".to_string(),
                reason: e.to_string(),
            })?;

        let mut commands = BTreeMap::new();
        for (kind, patterns) in file.commands {
            let compiled = patterns
                .iter()
                .map(|pattern| compile_pattern(kind, pattern))
                .collect::<Result<Vec<_>, _>>()?;
            commands.insert(kind, compiled);
        }

        if commands.values().all(Vec::is_empty) {
            return Err(LanguageError::Invalid {
                lang: file.lang,
                reason: "no command patterns".to_string(),
            });
        }

        Ok(Self {
            lang: file.lang,
            numbers: file
                .numbers
                .into_iter()
                .map(|(word, n)| (word.to_lowercase(), n))
                .collect(),
            regions: file
                .regions
                .into_iter()
                .map(|(word, region)| (word.to_lowercase(), region))
                .collect(),
            commands,
        })
    }

    /// The built-in en-GB pack
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_PACK).expect("built-in language pack is valid")
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Number of patterns across all commands
    pub fn pattern_count(&self) -> usize {
        self.commands.values().map(Vec::len).sum()
    }

    /// Find the first command whose pattern matches the whole text
    ///
    /// A pattern whose `level` capture is not a known number is skipped.
    pub fn find(&self, text: &str) -> Option<CommandMatch> {
        for kind in CommandKind::ALL {
            let Some(patterns) = self.commands.get(&kind) else {
                continue;
            };
            for pattern in patterns {
                let Some(caps) = pattern.captures(text) else {
                    continue;
                };

                let level = match caps.name("level") {
                    Some(word) => match self.level(word.as_str()) {
                        Some(level) => Some(level),
                        None => continue,
                    },
                    None => None,
                };
                let ancestor = caps
                    .name("ancestor")
                    .map(|region| self.region(region.as_str()));

                return Some(CommandMatch {
                    kind,
                    level,
                    ancestor,
                });
            }
        }
        None
    }

    /// Heading level spoken as a digit or a number word
    fn level(&self, word: &str) -> Option<u8> {
        let word = word.trim().to_lowercase();
        word.parse::<u8>()
            .ok()
            .or_else(|| self.numbers.get(&word).copied())
            .filter(|level| (1..=6).contains(level))
    }

    /// Region name as understood by content locators
    fn region(&self, word: &str) -> String {
        let word = word.trim().to_lowercase();
        self.regions.get(&word).cloned().unwrap_or(word)
    }
}

fn compile_pattern(kind: CommandKind, pattern: &str) -> Result<Regex, LanguageError> {
    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| LanguageError::Pattern {
            command: format!("{:?}", kind),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Loaded language packs, keyed by language tag
pub struct LanguageStore {
    packs: RwLock<HashMap<String, Arc<LanguagePack>>>,
}

impl LanguageStore {
    /// A store holding the built-in pack
    pub fn new() -> Self {
        let builtin = LanguagePack::builtin();
        let mut packs = HashMap::new();
        packs.insert(builtin.lang().to_string(), Arc::new(builtin));
        Self {
            packs: RwLock::new(packs),
        }
    }

    pub fn is_loaded(&self, lang: &str) -> bool {
        self.read().contains_key(lang)
    }

    pub fn get(&self, lang: &str) -> Option<Arc<LanguagePack>> {
        self.read().get(lang).cloned()
    }

    /// Pack for `lang`, falling back to the default language
    pub fn resolve(&self, lang: &str) -> Arc<LanguagePack> {
        if let Some(pack) = self.get(lang) {
            return pack;
        }
        tracing::warn!(
            "Language {:?} is not loaded, using {}",
            lang,
            DEFAULT_LANGUAGE
        );
        match self.get(DEFAULT_LANGUAGE) {
            Some(pack) => pack,
            None => Arc::new(LanguagePack::builtin()),
        }
    }

    /// Register a pack under `lang`
    pub fn insert(&self, lang: &str, pack: LanguagePack) -> Arc<LanguagePack> {
        let pack = Arc::new(pack);
        self.packs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(lang.to_string(), Arc::clone(&pack));
        pack
    }

    /// Fetch `{translations_path}/{lang}.json` and register it
    pub async fn load(
        &self,
        translations_path: &str,
        lang: &str,
    ) -> Result<Arc<LanguagePack>, LanguageError> {
        let json = fetch_translation(translations_path, lang).await?;
        let pack = LanguagePack::from_json(&json).map_err(|e| match e {
            LanguageError::Invalid { reason, .. } => LanguageError::Invalid {
                lang: lang.to_string(),
                reason,
            },
            other => other,
        })?;
        tracing::debug!(
            "Loaded language {} ({} patterns)",
            lang,
            pack.pattern_count()
        );
        Ok(self.insert(lang, pack))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<LanguagePack>>> {
        self.packs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LanguageStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of a translation file
pub fn translation_location(translations_path: &str, lang: &str) -> String {
    if translations_path.is_empty() {
        format!("{}.json", lang)
    } else {
        format!("{}/{}.json", translations_path.trim_end_matches('/'), lang)
    }
}

async fn fetch_translation(translations_path: &str, lang: &str) -> Result<String, LanguageError> {
    let location = translation_location(translations_path, lang);
    tracing::debug!("Fetching translation from {}", location);

    if location.starts_with("http://") || location.starts_with("https://") {
        let url = location.clone();
        let body = tokio::task::spawn_blocking(move || -> Result<String, String> {
            ureq::get(&url)
                .timeout(FETCH_TIMEOUT)
                .call()
                .map_err(|e| match e {
                    ureq::Error::Status(code, _) => format!("Server returned {}", code),
                    ureq::Error::Transport(t) => format!("Request failed: {}", t),
                })?
                .into_string()
                .map_err(|e| format!("Failed to read response: {}", e))
        })
        .await
        .map_err(|e| e.to_string())
        .and_then(|body| body);

        return body.map_err(|reason| LanguageError::Fetch {
            path: location,
            reason,
        });
    }

    tokio::fs::read_to_string(Path::new(&location))
        .await
        .map_err(|e| LanguageError::Fetch {
            path: location,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRENCH: &str = r#"{
        "lang": "fr-FR",
        "numbers": { "deux": 2 },
        "regions": { "pied de page": "footer" },
        "commands": {
            "read_headers": [
                "lire les titres",
                "lire les titres de niveau (?P<level>\\w+)"
            ],
            "read_links": ["lire les liens (?:dans|du) (?:le )?(?P<ancestor>.+)"],
            "read_next_element": ["suivant"]
        }
    }"#;

    fn find(pack: &LanguagePack, text: &str) -> Option<CommandMatch> {
        pack.find(text)
    }

    #[test]
    fn test_builtin_pack() {
        let pack = LanguagePack::builtin();
        assert_eq!(pack.lang(), "en-GB");
        for kind in CommandKind::ALL {
            assert!(
                pack.commands.get(&kind).is_some_and(|p| !p.is_empty()),
                "no pattern for {:?}",
                kind
            );
        }
    }

    #[test]
    fn test_builtin_phrases() {
        let pack = LanguagePack::builtin();
        let cases = [
            ("read headers", CommandKind::ReadHeaders),
            ("read links", CommandKind::ReadLinks),
            ("next", CommandKind::ReadNextElement),
            ("previous", CommandKind::ReadPreviousElement),
            ("repeat", CommandKind::ReadCurrentElement),
            ("follow link", CommandKind::GoToLink),
            ("read main content", CommandKind::ReadMain),
            ("skip to main content", CommandKind::SearchMain),
            ("what is the title of the page", CommandKind::ReadPageTitle),
            ("summary", CommandKind::ReadPageSummary),
            ("go back", CommandKind::GoToPreviousPage),
            ("go forward", CommandKind::GoToNextPage),
            ("go home", CommandKind::GoToHomepage),
        ];
        for (text, kind) in cases {
            assert_eq!(find(&pack, text).map(|m| m.kind), Some(kind), "{}", text);
        }
    }

    #[test]
    fn test_level_capture() {
        let pack = LanguagePack::builtin();
        assert_eq!(find(&pack, "read level two headers").unwrap().level, Some(2));
        assert_eq!(find(&pack, "read level 3 headings").unwrap().level, Some(3));
        assert_eq!(find(&pack, "read h1").unwrap().level, Some(1));
        assert_eq!(find(&pack, "read headers").unwrap().level, None);
        // Not a heading level
        assert_eq!(find(&pack, "read level nine headers"), None);
    }

    #[test]
    fn test_ancestor_capture() {
        let pack = LanguagePack::builtin();
        let found = find(&pack, "read links in the navigation").unwrap();
        assert_eq!(found.kind, CommandKind::ReadLinks);
        assert_eq!(found.ancestor.as_deref(), Some("nav"));

        let found = find(&pack, "read links in the #content").unwrap();
        assert_eq!(found.ancestor.as_deref(), Some("#content"));
    }

    #[test]
    fn test_matching_is_anchored_and_case_insensitive() {
        let pack = LanguagePack::builtin();
        assert_eq!(
            find(&pack, "READ HEADERS").map(|m| m.kind),
            Some(CommandKind::ReadHeaders)
        );
        assert_eq!(find(&pack, "please read headers now"), None);
    }

    #[test]
    fn test_custom_pack() {
        let pack = LanguagePack::from_json(FRENCH).unwrap();
        assert_eq!(pack.lang(), "fr-FR");
        assert_eq!(pack.pattern_count(), 4);
        assert_eq!(
            find(&pack, "lire les titres de niveau deux").unwrap().level,
            Some(2)
        );
        assert_eq!(
            find(&pack, "lire les liens du pied de page")
                .unwrap()
                .ancestor
                .as_deref(),
            Some("footer")
        );
        assert_eq!(find(&pack, "read headers"), None);
    }

    #[test]
    fn test_invalid_packs() {
        assert!(matches!(
            LanguagePack::from_json("not json"),
            Err(LanguageError::Invalid { .. })
        ));
        assert!(matches!(
            LanguagePack::from_json(r#"{"lang": "xx", "commands": {"next": ["x"]}}"#),
            Err(LanguageError::Invalid { .. })
        ));
        assert!(matches!(
            LanguagePack::from_json(r#"{"lang": "xx", "commands": {"read_headers": ["(unclosed"]}}"#),
            Err(LanguageError::Pattern { .. })
        ));
        assert!(matches!(
            LanguagePack::from_json(r#"{"lang": "xx", "commands": {"read_headers": []}}"#),
            Err(LanguageError::Invalid { .. })
        ));
    }

    #[test]
    fn test_translation_location() {
        assert_eq!(translation_location("", "it-IT"), "it-IT.json");
        assert_eq!(translation_location("/srv/lang/", "it-IT"), "/srv/lang/it-IT.json");
        assert_eq!(
            translation_location("https://example.org/lang", "it-IT"),
            "https://example.org/lang/it-IT.json"
        );
    }

    #[test]
    fn test_store_fallback() {
        let store = LanguageStore::new();
        assert!(store.is_loaded("en-GB"));
        assert!(!store.is_loaded("fr-FR"));
        assert_eq!(store.resolve("fr-FR").lang(), "en-GB");
    }

    #[tokio::test]
    async fn test_store_loads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fr-FR.json"), FRENCH).unwrap();
        let path = dir.path().to_string_lossy().to_string();

        let store = LanguageStore::new();
        let pack = store.load(&path, "fr-FR").await.unwrap();
        assert_eq!(pack.lang(), "fr-FR");
        assert!(store.is_loaded("fr-FR"));
        assert_eq!(store.resolve("fr-FR").lang(), "fr-FR");
    }

    #[tokio::test]
    async fn test_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();

        let store = LanguageStore::new();
        let err = store.load(&path, "de-DE").await.unwrap_err();
        assert!(matches!(err, LanguageError::Fetch { .. }));
        assert!(!store.is_loaded("de-DE"));
    }
}
