//! List screens keep their search and page in the route's query string.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::ListParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub q: String,
    pub page: u32,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            page: 1,
        }
    }
}

impl TableQuery {
    /// A new search always restarts at the first page.
    pub fn set_search(&mut self, q: impl Into<String>) {
        let q = q.into();
        if q != self.q {
            self.q = q;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn to_params(&self) -> ListParams {
        ListParams::new().search(self.q.clone()).page(self.page)
    }
}

/// Prints as `application/x-www-form-urlencoded`, the form browsers use
/// for route query strings.
impl fmt::Display for TableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page = self.page.to_string();
        let pairs = [("q", self.q.as_str()), ("page", page.as_str())];
        let encoded = serde_urlencoded::to_string(&pairs).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

/// Lenient parse: unknown keys are ignored and bad values fall back to the
/// defaults. Accepts an optional leading `?`. A repeated key keeps its last
/// value.
impl FromStr for TableQuery {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(s.trim_start_matches('?')).unwrap_or_else(|e| {
                tracing::debug!("unreadable query string {s:?}: {e}");
                Vec::new()
            });

        let mut query = TableQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "q" => query.q = value,
                "page" => query.page = value.parse::<u32>().unwrap_or(1).max(1),
                _ => {}
            }
        }
        Ok(query)
    }
}

/// Shared query of one list screen. The search box writes through
/// [`TableFilter::callback`]; the table reads through [`TableFilter::subscribe`].
#[derive(Clone)]
pub struct TableFilter {
    tx: Arc<watch::Sender<TableQuery>>,
}

impl TableFilter {
    pub fn new(initial: TableQuery) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn query(&self) -> TableQuery {
        self.tx.borrow().clone()
    }

    pub fn set_search(&self, q: impl Into<String>) {
        let q = q.into();
        self.tx.send_if_modified(|query| {
            let before = query.clone();
            query.set_search(q);
            *query != before
        });
    }

    pub fn set_page(&self, page: u32) {
        self.tx.send_if_modified(|query| {
            let before = query.page;
            query.set_page(page);
            query.page != before
        });
    }

    /// Settle callback for a search coordinator.
    pub fn callback(&self) -> impl Fn(String) + Send + Sync + 'static {
        let filter = self.clone();
        move |term| filter.set_search(term)
    }

    pub fn subscribe(&self) -> watch::Receiver<TableQuery> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchCoordinator, SearchOptions};
    use std::time::Duration;

    #[test]
    fn test_query_string_parses_and_prints() {
        let query: TableQuery = "?q=jo%C3%A3o+silva&page=3&sort=name".parse().unwrap();
        assert_eq!(query.q, "joão silva");
        assert_eq!(query.page, 3);
        assert_eq!(query.to_string(), "q=jo%C3%A3o+silva&page=3");

        let fallback: TableQuery = "page=zero".parse().unwrap();
        assert_eq!(fallback, TableQuery::default());
    }

    #[test]
    fn test_reserved_characters_survive_the_query_string() {
        let query = TableQuery {
            q: "a&b=c+d 100%".to_string(),
            page: 2,
        };
        let printed = query.to_string();
        assert_eq!(printed, "q=a%26b%3Dc%2Bd+100%25&page=2");
        assert_eq!(printed.parse::<TableQuery>().unwrap(), query);

        // Lone `%` and empty pairs are tolerated.
        let odd: TableQuery = "q=50%&&page=2&page=4".parse().unwrap();
        assert_eq!(odd.q, "50%");
        assert_eq!(odd.page, 4);
    }

    #[test]
    fn test_new_search_resets_page() {
        let mut query = TableQuery {
            q: "ana".to_string(),
            page: 4,
        };
        query.set_search("ana");
        assert_eq!(query.page, 4);
        query.set_search("bia");
        assert_eq!(query.page, 1);
        assert_eq!(query.to_params(), ListParams::new().search("bia"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_search_updates_filter() {
        let filter = TableFilter::new(TableQuery {
            q: String::new(),
            page: 2,
        });
        let mut rx = filter.subscribe();
        let search = SearchCoordinator::spawn(
            SearchOptions::new(Duration::from_millis(500)).on_settle(filter.callback()),
        );

        search.set_term("maria");
        tokio::time::sleep(Duration::from_millis(600)).await;

        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            TableQuery {
                q: "maria".to_string(),
                page: 1
            }
        );
    }
}
