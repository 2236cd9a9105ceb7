use crate::api::ItemMetadata;

use super::rules::Rule;

/// Rules that match the item, in the caller's rule order. Every rule is
/// evaluated independently: no deduplication, no stop at first match.
pub fn matching_rules<'r>(metadata: &ItemMetadata, rules: &'r [Rule]) -> Vec<&'r Rule> {
    rules
        .iter()
        .filter(|rule| rule_matches(metadata, rule))
        .collect()
}

/// A rule matches iff every enabled predicate holds. Predicates are
/// case-sensitive substring checks against the provider's native header
/// casing; a disabled predicate is vacuously satisfied, so a rule with
/// both flags off matches everything.
fn rule_matches(metadata: &ItemMetadata, rule: &Rule) -> bool {
    if rule.sender_match && !metadata.sender.contains(&rule.sender) {
        return false;
    }

    if rule.subject_match && !metadata.subject.contains(&rule.subject) {
        return false;
    }

    true
}
