//! matcher.rs - Compilation and application of replacement rules.
//!
//! This module converts a validated `RuleSet` into `CompiledRules`, which are
//! optimized for repeated application to span text: regex patterns are built
//! once, literal needles are pre-lowered. Rules are applied in the order they
//! were added; later rules see the output of earlier rules.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use regex::RegexBuilder;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::config::RuleSet;
use crate::errors::{RedactError, Result};

/// A single compiled replacement rule, ready for application.
#[derive(Debug)]
pub struct CompiledRule {
    matcher: RuleMatcher,
    replace: String,
}

#[derive(Debug)]
enum RuleMatcher {
    Regex(regex::Regex),
    Literal {
        find: String,
        find_lowered: String,
        case_insensitive: bool,
    },
}

/// The full ordered set of compiled rules for one run.
#[derive(Debug, Default)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
}

lazy_static! {
    /// A thread-safe, global cache for compiled rules, keyed by a hash of
    /// the ordered rule list. Compiling the same rule set twice (e.g. when
    /// constructing more than one engine) is served from here.
    static ref COMPILED_RULES_CACHE: RwLock<HashMap<u64, Arc<CompiledRules>>> =
        RwLock::new(HashMap::new());
}

fn hash_rules(rule_set: &RuleSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    rule_set.rules().hash(&mut hasher);
    hasher.finish()
}

/// Gets a `CompiledRules` instance from the cache or compiles it if absent.
pub fn get_or_compile_rules(rule_set: &RuleSet) -> Result<Arc<CompiledRules>> {
    let cache_key = hash_rules(rule_set);
    {
        let cache = COMPILED_RULES_CACHE.read().unwrap();
        if let Some(rules) = cache.get(&cache_key) {
            debug!("Serving compiled rules from cache for key {}", cache_key);
            return Ok(Arc::clone(rules));
        }
    }

    let compiled = Arc::new(compile_rules(rule_set)?);
    COMPILED_RULES_CACHE
        .write()
        .unwrap()
        .insert(cache_key, Arc::clone(&compiled));
    Ok(compiled)
}

/// Compiles a `RuleSet` into `CompiledRules`. Regex failures are reported
/// per-pattern; this runs before any document is opened.
pub fn compile_rules(rule_set: &RuleSet) -> Result<CompiledRules> {
    debug!("Compiling {} replacement rules.", rule_set.len());
    let mut compiled = Vec::with_capacity(rule_set.len());

    for rule in rule_set.rules() {
        let matcher = if rule.is_regex {
            let regex = RegexBuilder::new(&rule.find)
                .case_insensitive(rule.case_insensitive)
                .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
                .build()
                .map_err(|e| RedactError::RuleCompilation(rule.find.clone(), e))?;
            RuleMatcher::Regex(regex)
        } else {
            RuleMatcher::Literal {
                find: rule.find.clone(),
                find_lowered: rule.find.to_lowercase(),
                case_insensitive: rule.case_insensitive,
            }
        };
        compiled.push(CompiledRule {
            matcher,
            replace: rule.replace.clone(),
        });
    }

    Ok(CompiledRules { rules: compiled })
}

impl CompiledRules {
    /// Applies every rule, in order, to `text`. Returns the resulting text
    /// and whether it differs from the input. Unchanged text must never be
    /// mutated downstream, so callers key off the `changed` flag.
    pub fn apply(&self, text: &str) -> (String, bool) {
        let mut result = text.to_string();
        for rule in &self.rules {
            result = rule.apply(&result);
        }
        let changed = result != text;
        (result, changed)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl CompiledRule {
    fn apply(&self, text: &str) -> String {
        match &self.matcher {
            RuleMatcher::Regex(regex) => regex.replace_all(text, self.replace.as_str()).into_owned(),
            RuleMatcher::Literal {
                find,
                find_lowered,
                case_insensitive,
            } => {
                if *case_insensitive {
                    replace_literal_ci(text, find_lowered, &self.replace)
                } else {
                    text.replace(find.as_str(), &self.replace)
                }
            }
        }
    }
}

/// A mapper from byte indices in the lowercased form of a string back to
/// char-boundary byte indices in the original string.
struct LoweredIndexMapper {
    lowered: String,
    map: Vec<usize>,
}

impl LoweredIndexMapper {
    fn new(original: &str) -> Self {
        let mut lowered = String::with_capacity(original.len());
        let mut map: Vec<usize> = Vec::with_capacity(original.len() + 1);
        for (orig_index, ch) in original.char_indices() {
            for lower_ch in ch.to_lowercase() {
                let start = lowered.len();
                lowered.push(lower_ch);
                for _ in start..lowered.len() {
                    map.push(orig_index);
                }
            }
        }
        map.push(original.len());
        Self { lowered, map }
    }

    fn map_index(&self, lowered_index: usize) -> usize {
        let idx = lowered_index.min(self.map.len().saturating_sub(1));
        self.map[idx]
    }
}

/// Case-insensitive literal replacement: scans the lowercased haystack for
/// the lowercased needle, splices `replace` into the original string at the
/// mapped positions, and preserves the original casing of everything outside
/// the matches. Matches are leftmost, non-overlapping; replacement text is
/// not re-scanned.
fn replace_literal_ci(text: &str, find_lowered: &str, replace: &str) -> String {
    if find_lowered.is_empty() {
        return text.to_string();
    }
    let mapper = LoweredIndexMapper::new(text);
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0usize;
    let mut scan_pos = 0usize;

    while let Some(found) = mapper.lowered[scan_pos..].find(find_lowered) {
        let match_start = scan_pos + found;
        let match_end = match_start + find_lowered.len();
        let orig_start = mapper.map_index(match_start);
        let orig_end = mapper.map_index(match_end);

        result.push_str(&text[last_end..orig_start]);
        result.push_str(replace);
        last_end = orig_end;
        scan_pos = match_end;
    }

    result.push_str(&text[last_end..]);
    result
}
