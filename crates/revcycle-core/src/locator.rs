//! Schema location: resolve a logical object or column name to the real
//! name present in a live backend, tolerating case, accent and substring
//! variance.
//!
//! Resolution order:
//! 1. exact raw match of the target;
//! 2. exact match after normalization, target first then aliases in order;
//! 3. substring match of normalized names in either direction, same order.
//!
//! Absence is an expected outcome (fresh installations start empty), so
//! resolution returns `Option`, never an error.

use crate::normalize::normalize;

/// How a name was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Normalized,
    Substring,
}

/// A resolved real name plus the rule that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub name: String,
    pub kind: MatchKind,
}

/// Locate `target` (or one of its `aliases`) among `existing` names.
pub fn locate<A, E>(target: &str, aliases: &[A], existing: &[E]) -> Option<Located>
where
    A: AsRef<str>,
    E: AsRef<str>,
{
    if let Some(hit) = existing.iter().find(|e| e.as_ref() == target) {
        return Some(Located {
            name: hit.as_ref().to_string(),
            kind: MatchKind::Exact,
        });
    }

    let candidates: Vec<String> = std::iter::once(target)
        .chain(aliases.iter().map(AsRef::as_ref))
        .map(normalize)
        .filter(|c| !c.is_empty())
        .collect();
    let normalized: Vec<String> = existing.iter().map(|e| normalize(e.as_ref())).collect();

    for candidate in &candidates {
        if let Some(idx) = normalized.iter().position(|n| n == candidate) {
            return Some(Located {
                name: existing[idx].as_ref().to_string(),
                kind: MatchKind::Normalized,
            });
        }
    }

    for candidate in &candidates {
        let hit = normalized
            .iter()
            .position(|n| !n.is_empty() && (n.contains(candidate.as_str()) || candidate.contains(n.as_str())));
        if let Some(idx) = hit {
            return Some(Located {
                name: existing[idx].as_ref().to_string(),
                kind: MatchKind::Substring,
            });
        }
    }

    None
}

/// Resolve a logical object name to the real object name, if any.
pub fn resolve<A, E>(target: &str, aliases: &[A], existing: &[E]) -> Option<String>
where
    A: AsRef<str>,
    E: AsRef<str>,
{
    locate(target, aliases, existing).map(|l| l.name)
}

/// Resolve a logical column against a dataset's column list.
/// Same algorithm as [`resolve`], scoped to columns.
pub fn resolve_column<A, E>(target: &str, aliases: &[A], columns: &[E]) -> Option<String>
where
    A: AsRef<str>,
    E: AsRef<str>,
{
    resolve(target, aliases, columns)
}
