use std::collections::BTreeMap;

use serde::Serialize;

/// Existing generated pages keyed by the chunk index parsed from their title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedPages<P> {
    pub by_index: BTreeMap<usize, P>,
    /// Titles that use the template but do not follow the naming pattern.
    /// They are never updated or deleted.
    pub unexpected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan<P> {
    pub create: Vec<usize>,
    pub update: Vec<(usize, P)>,
    pub delete: Vec<(usize, P)>,
}

impl<P> ReconcilePlan<P> {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// `prefix` followed by a canonical decimal index (`0`, `12`, never `012`).
pub fn parse_chunk_index(title: &str, prefix: &str) -> Option<usize> {
    let rest = title.trim().strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if rest.len() > 1 && rest.starts_with('0') {
        return None;
    }
    rest.parse().ok()
}

/// Sort discovered page titles into indexed pages and unexpected ones.
pub fn observe_pages<I>(titles: I, prefix: &str) -> ObservedPages<String>
where
    I: IntoIterator<Item = String>,
{
    let mut observed = ObservedPages::default();
    for title in titles {
        match parse_chunk_index(&title, prefix) {
            Some(index) if !observed.by_index.contains_key(&index) => {
                observed.by_index.insert(index, title);
            }
            _ => observed.unexpected.push(title),
        }
    }
    observed
}

/// Diff the desired chunk indices against the observed pages. `observed` is
/// consumed: every matched index is removed, and whatever remains is stale.
pub fn reconcile<P, I>(desired: I, mut observed: BTreeMap<usize, P>) -> ReconcilePlan<P>
where
    I: IntoIterator<Item = usize>,
{
    let mut plan = ReconcilePlan {
        create: Vec::new(),
        update: Vec::new(),
        delete: Vec::new(),
    };
    for index in desired {
        match observed.remove(&index) {
            Some(page) => plan.update.push((index, page)),
            None => plan.create.push(index),
        }
    }
    plan.delete = observed.into_iter().collect();
    plan
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::{observe_pages, parse_chunk_index, reconcile};

    fn observed(indices: &[usize]) -> BTreeMap<usize, String> {
        indices
            .iter()
            .map(|index| (*index, format!("Data:Recipes/{index}")))
            .collect()
    }

    #[test]
    fn chunk_index_requires_exact_pattern() {
        assert_eq!(parse_chunk_index("Data:Recipes/0", "Data:Recipes/"), Some(0));
        assert_eq!(parse_chunk_index("Data:Recipes/17", "Data:Recipes/"), Some(17));
        assert_eq!(parse_chunk_index("Data:Recipes/017", "Data:Recipes/"), None);
        assert_eq!(parse_chunk_index("Data:Recipes/", "Data:Recipes/"), None);
        assert_eq!(parse_chunk_index("Data:Recipes/3/doc", "Data:Recipes/"), None);
        assert_eq!(parse_chunk_index("Data:Recipes", "Data:Recipes/"), None);
        assert_eq!(parse_chunk_index("Data:Items/3", "Data:Recipes/"), None);
    }

    #[test]
    fn unexpected_titles_are_set_aside() {
        let pages = observe_pages(
            vec![
                "Data:Recipes/1".to_string(),
                "Data:Recipes".to_string(),
                "Data:Recipes/sandbox".to_string(),
                "Data:Recipes/0".to_string(),
            ],
            "Data:Recipes/",
        );
        assert_eq!(pages.by_index.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(
            pages.unexpected,
            vec!["Data:Recipes".to_string(), "Data:Recipes/sandbox".to_string()]
        );
    }

    #[test]
    fn three_chunks_against_four_pages() {
        let plan = reconcile(0..3, observed(&[0, 1, 2, 3]));
        assert!(plan.create.is_empty());
        assert_eq!(
            plan.update.iter().map(|(index, _)| *index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(plan.delete, vec![(3, "Data:Recipes/3".to_string())]);
    }

    #[test]
    fn set_identities_hold_for_mixed_inputs() {
        let cases: [(&[usize], &[usize]); 5] = [
            (&[], &[]),
            (&[0, 1, 2], &[]),
            (&[], &[0, 4]),
            (&[0, 1, 2, 3], &[2, 3, 7, 9]),
            (&[5], &[5]),
        ];
        for (desired, existing) in cases {
            let plan = reconcile(desired.iter().copied(), observed(existing));
            let desired_set = desired.iter().copied().collect::<BTreeSet<_>>();
            let existing_set = existing.iter().copied().collect::<BTreeSet<_>>();
            let create = plan.create.iter().copied().collect::<BTreeSet<_>>();
            let update = plan.update.iter().map(|(i, _)| *i).collect::<BTreeSet<_>>();
            let delete = plan.delete.iter().map(|(i, _)| *i).collect::<BTreeSet<_>>();

            assert_eq!(create, &desired_set - &existing_set);
            assert_eq!(update, &desired_set & &existing_set);
            assert_eq!(delete, &existing_set - &desired_set);
            assert_eq!(&create | &update, desired_set);
            assert!(delete.is_disjoint(&desired_set));
        }
    }

    #[test]
    fn empty_desired_set_deletes_everything_observed() {
        let plan = reconcile(std::iter::empty(), observed(&[0, 1]));
        assert!(plan.create.is_empty() && plan.update.is_empty());
        assert_eq!(plan.delete.len(), 2);
        assert!(!plan.is_noop());
    }
}
