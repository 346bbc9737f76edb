//! [`RulesetIndex`]: the merged definitions, variables and translations of one project root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rulemap_core::{Definition, DefinitionLookup, RuleType, Translation, Translations, Variables};
use serde_json::Value;
use tracing::debug;

use crate::policy::{check_for_logic_overrides, is_target_for_source_rule};

use super::merge::deep_merge;

/// Per-file merge discipline shared by every index implementation.
///
/// Each `merge_*` call replaces the previous contribution of the same file
/// in that category and recomputes the category's aggregate from the live
/// contributions.
pub trait RulesetStore {
    fn merge_definitions(&mut self, file: &Path, definitions: Vec<Definition>);
    fn merge_variables(&mut self, file: &Path, variables: Variables);
    fn merge_translations(&mut self, file: &Path, translations: Vec<Translation>);

    /// Candidates for `key` that an identifier found at `source` may refer to.
    fn definitions_by_name(&self, key: &str, source: Option<&RuleType>) -> Vec<DefinitionLookup>;

    /// Text of `key` in the configured locale, or a "not found" sentinel.
    fn translation(&self, key: &str) -> String;

    /// Number of files with a live definitions contribution.
    fn definition_file_count(&self) -> usize;
}

/// One file's contribution to one category.
#[derive(Debug, Clone)]
struct FilePart<T> {
    file: PathBuf,
    content: T,
}

/// Replace `file`'s entry in `parts` (moving it to the end) with `content`.
fn replace_part<T>(parts: &mut Vec<FilePart<T>>, file: &Path, content: T) {
    parts.retain(|part| part.file != file);
    parts.push(FilePart {
        file: file.to_path_buf(),
        content,
    });
}

/// Merged index for a single project root.
#[derive(Debug, Clone)]
pub struct RulesetIndex {
    locale: String,
    ruleset_files: Vec<FilePart<Vec<Definition>>>,
    variable_files: Vec<FilePart<Variables>>,
    translation_files: Vec<FilePart<Vec<Translation>>>,
    definitions_lookup: HashMap<String, Vec<DefinitionLookup>>,
    variables: Variables,
    translations: Translations,
}

impl RulesetIndex {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ruleset_files: Vec::new(),
            variable_files: Vec::new(),
            translation_files: Vec::new(),
            definitions_lookup: HashMap::new(),
            variables: Variables::new(),
            translations: Translations::new(),
        }
    }

    /// Every candidate named `name`, unfiltered.
    pub fn definitions(&self, name: &str) -> &[DefinitionLookup] {
        self.definitions_lookup
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of distinct definition names.
    pub fn name_count(&self) -> usize {
        self.definitions_lookup.len()
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Number of distinct files with a live contribution in any category.
    pub fn file_count(&self) -> usize {
        let mut files: Vec<&Path> = self
            .ruleset_files
            .iter()
            .map(|part| part.file.as_path())
            .chain(self.variable_files.iter().map(|part| part.file.as_path()))
            .chain(self.translation_files.iter().map(|part| part.file.as_path()))
            .collect();
        files.sort();
        files.dedup();
        files.len()
    }

    /// Files whose live contribution defines `name`.
    pub fn files_defining(&self, name: &str) -> Vec<PathBuf> {
        self.ruleset_files
            .iter()
            .filter(|part| part.content.iter().any(|def| def.name == name))
            .map(|part| part.file.clone())
            .collect()
    }

    fn rebuild_definitions(&mut self) {
        let mut lookup: HashMap<String, Vec<DefinitionLookup>> = HashMap::new();
        for part in &self.ruleset_files {
            for definition in &part.content {
                lookup
                    .entry(definition.name.clone())
                    .or_default()
                    .push(definition.clone().into_lookup(part.file.clone()));
            }
        }
        self.definitions_lookup = lookup;
    }

    fn rebuild_variables(&mut self) {
        let merged = self
            .variable_files
            .iter()
            .fold(Value::Object(Variables::new()), |acc, part| {
                deep_merge(&acc, &Value::Object(part.content.clone()))
            });
        self.variables = match merged {
            Value::Object(map) => map,
            _ => Variables::new(),
        };
    }

    fn rebuild_translations(&mut self) {
        let mut translations = Translations::new();
        for part in &self.translation_files {
            for translation in &part.content {
                translations
                    .entry(translation.language.clone())
                    .or_default()
                    .insert(translation.key.clone(), translation.value.clone());
            }
        }
        self.translations = translations;
    }
}

impl RulesetStore for RulesetIndex {
    fn merge_definitions(&mut self, file: &Path, definitions: Vec<Definition>) {
        replace_part(&mut self.ruleset_files, file, definitions);
        self.rebuild_definitions();
    }

    fn merge_variables(&mut self, file: &Path, variables: Variables) {
        replace_part(&mut self.variable_files, file, variables);
        self.rebuild_variables();
    }

    fn merge_translations(&mut self, file: &Path, translations: Vec<Translation>) {
        replace_part(&mut self.translation_files, file, translations);
        self.rebuild_translations();
    }

    fn definitions_by_name(&self, key: &str, source: Option<&RuleType>) -> Vec<DefinitionLookup> {
        let resolved = check_for_logic_overrides(key, source);
        let candidates = self.definitions(&resolved.key);
        debug!(
            key,
            lookup = %resolved.key,
            target = ?resolved.target,
            candidates = candidates.len(),
            "definitions by name"
        );

        candidates
            .iter()
            .filter(|candidate| match (&resolved.target, source) {
                (Some(target), _) => candidate.rule_type == *target,
                (None, Some(source)) => is_target_for_source_rule(source, &candidate.rule_type),
                (None, None) => true,
            })
            .cloned()
            .collect()
    }

    fn translation(&self, key: &str) -> String {
        self.translations
            .get(&self.locale)
            .and_then(|strings| strings.get(key))
            .cloned()
            .unwrap_or_else(|| format!("{key} not found in {} translations", self.locale))
    }

    fn definition_file_count(&self) -> usize {
        self.ruleset_files.len()
    }
}
