//! In-memory wiki used by the sync driver tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use anyhow::Result;

use crate::mediawiki::{
    NS_MAIN, NS_TEMPLATE, PageRef, RemotePage, WikiApiError, WikiReadApi, WikiWriteApi,
    normalize_title,
};
use crate::template::find_all;

pub(crate) const NS_USER: i32 = 2;
pub(crate) const NS_DATA: i32 = 3002;

#[derive(Debug, Default)]
pub(crate) struct MockApi {
    pub(crate) pages: BTreeMap<String, String>,
    pub(crate) edits: Vec<(String, String, String)>,
    pub(crate) deleted: Vec<String>,
    pub(crate) purged: Vec<String>,
    /// Failures handed out, in order, to the next calls touching a title.
    pub(crate) failures: BTreeMap<String, VecDeque<WikiApiError>>,
    pub(crate) logged_in: bool,
    pub(crate) request_count: usize,
    /// Existence checks report nothing, as if pages appeared after the check.
    pub(crate) existence_lags: bool,
}

impl MockApi {
    pub(crate) fn with_pages<'a>(pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(title, content)| (canonical_title(title), content.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn fail_next(&mut self, title: &str, error: WikiApiError) {
        self.failures
            .entry(title.to_string())
            .or_default()
            .push_back(error);
    }

    pub(crate) fn edited_titles(&self) -> Vec<&str> {
        self.edits.iter().map(|(title, _, _)| title.as_str()).collect()
    }

    fn stored(&self, title: &str) -> Option<&String> {
        self.pages.get(&canonical_title(title))
    }

    fn take_failure(&mut self, title: &str) -> Result<()> {
        match self.failures.get_mut(title).and_then(VecDeque::pop_front) {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

pub(crate) fn namespace_of(title: &str) -> i32 {
    match title.split_once(':').map(|(prefix, _)| prefix) {
        Some("Data") => NS_DATA,
        Some("User") => NS_USER,
        Some("Template") => NS_TEMPLATE,
        _ => NS_MAIN,
    }
}

/// First-letter case folding the way a default wiki stores titles.
pub(crate) fn canonical_title(title: &str) -> String {
    let title = normalize_title(title);
    match title.split_once(':') {
        Some((prefix, rest)) if namespace_of(&title) != NS_MAIN => {
            format!("{prefix}:{}", upper_first(rest))
        }
        _ => upper_first(&title),
    }
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl WikiReadApi for MockApi {
    fn pages_using_template(
        &mut self,
        template: &str,
        namespace: Option<i32>,
    ) -> Result<Vec<PageRef>> {
        self.request_count += 1;
        Ok(self
            .pages
            .iter()
            .filter(|(_, content)| !find_all(content, template).is_empty())
            .map(|(title, _)| PageRef {
                title: title.clone(),
                namespace: namespace_of(title),
            })
            .filter(|page| namespace.is_none_or(|namespace| page.namespace == namespace))
            .collect())
    }

    fn get_page_contents(&mut self, titles: &[String]) -> Result<Vec<RemotePage>> {
        self.request_count += 1;
        Ok(titles
            .iter()
            .filter_map(|title| {
                self.stored(title).map(|content| RemotePage {
                    title: canonical_title(title),
                    namespace: namespace_of(title),
                    page_id: 1,
                    revision_id: 1,
                    timestamp: "2026-01-01T00:00:00Z".to_string(),
                    content: content.clone(),
                })
            })
            .collect())
    }

    fn existing_titles(&mut self, titles: &[String]) -> Result<BTreeSet<String>> {
        self.request_count += 1;
        if self.existence_lags {
            return Ok(BTreeSet::new());
        }
        Ok(titles
            .iter()
            .filter(|title| self.stored(title).is_some())
            .map(|title| normalize_title(title))
            .collect())
    }

    fn namespace_id(&mut self, name: &str) -> Result<Option<i32>> {
        self.request_count += 1;
        Ok([("Data", NS_DATA), ("User", NS_USER), ("Template", NS_TEMPLATE)]
            .into_iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
            .map(|(_, id)| id))
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

impl WikiWriteApi for MockApi {
    fn login(&mut self, _username: &str, _password: &str) -> Result<()> {
        self.request_count += 1;
        self.logged_in = true;
        Ok(())
    }

    fn edit_page(&mut self, title: &str, content: &str, summary: &str) -> Result<()> {
        self.request_count += 1;
        self.take_failure(title)?;
        self.pages.insert(canonical_title(title), content.to_string());
        self.edits
            .push((title.to_string(), content.to_string(), summary.to_string()));
        Ok(())
    }

    fn create_page(&mut self, title: &str, content: &str, summary: &str) -> Result<()> {
        self.request_count += 1;
        self.take_failure(title)?;
        if self.stored(title).is_some() {
            return Err(WikiApiError::Api {
                code: "articleexists".to_string(),
                info: "The article you tried to create has been created already.".to_string(),
            }
            .into());
        }
        self.pages.insert(canonical_title(title), content.to_string());
        self.edits
            .push((title.to_string(), content.to_string(), summary.to_string()));
        Ok(())
    }

    fn delete_page(&mut self, title: &str, _reason: &str) -> Result<()> {
        self.request_count += 1;
        self.take_failure(title)?;
        self.pages.remove(&canonical_title(title));
        self.deleted.push(title.to_string());
        Ok(())
    }

    fn purge_page(&mut self, title: &str) -> Result<()> {
        self.request_count += 1;
        self.take_failure(title)?;
        self.purged.push(title.to_string());
        Ok(())
    }
}
