//! Param source backed by the current page URL.

use std::sync::RwLock;

use url::Url;

use crate::ports::ParamSource;

/// Reads identity hints from the query string of a navigation URL.
///
/// The URL can be replaced with [`PageUrlParams::navigate`]; the next
/// (re)connect picks up the new parameters.
#[derive(Debug)]
pub struct PageUrlParams {
    page: RwLock<Url>,
}

impl PageUrlParams {
    pub fn new(page_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            page: RwLock::new(Url::parse(page_url)?),
        })
    }

    /// Replaces the page URL, keeping the old one if `page_url` is invalid.
    pub fn navigate(&self, page_url: &str) -> Result<(), url::ParseError> {
        let url = Url::parse(page_url)?;
        match self.page.write() {
            Ok(mut page) => *page = url,
            Err(poisoned) => *poisoned.into_inner() = url,
        }
        Ok(())
    }

    pub fn page_url(&self) -> String {
        match self.page.read() {
            Ok(page) => page.to_string(),
            Err(poisoned) => poisoned.into_inner().to_string(),
        }
    }
}

impl ParamSource for PageUrlParams {
    fn get(&self, key: &str) -> Option<String> {
        let lookup = |page: &Url| {
            page.query_pairs()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.into_owned())
        };
        match self.page.read() {
            Ok(page) => lookup(&*page),
            Err(poisoned) => lookup(&*poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{TASK_KEY, USER_KEY};

    #[test]
    fn reads_user_and_task() {
        let params = PageUrlParams::new("https://app.example.com/study?user=u1&task=t1").unwrap();
        assert_eq!(params.get(USER_KEY).as_deref(), Some("u1"));
        assert_eq!(params.get(TASK_KEY).as_deref(), Some("t1"));
        assert_eq!(params.get("other"), None);
    }

    #[test]
    fn first_value_wins_and_values_are_decoded() {
        let params = PageUrlParams::new("https://h/?user=a%20b&user=second").unwrap();
        assert_eq!(params.get(USER_KEY).as_deref(), Some("a b"));
    }

    #[test]
    fn empty_value_is_returned_as_empty() {
        let params = PageUrlParams::new("https://h/?task=").unwrap();
        assert_eq!(params.get(TASK_KEY).as_deref(), Some(""));
    }

    #[test]
    fn navigate_replaces_query() {
        let params = PageUrlParams::new("https://h/?user=u1").unwrap();
        params.navigate("https://h/next?user=u9&task=t2").unwrap();
        assert_eq!(params.get(USER_KEY).as_deref(), Some("u9"));
        assert_eq!(params.get(TASK_KEY).as_deref(), Some("t2"));
    }

    #[test]
    fn invalid_navigation_keeps_previous_page() {
        let params = PageUrlParams::new("https://h/?user=u1").unwrap();
        assert!(params.navigate("not a url").is_err());
        assert_eq!(params.page_url(), "https://h/?user=u1");
    }
}
