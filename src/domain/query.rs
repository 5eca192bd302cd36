//! Query construction for the remote list endpoint.
//!
//! Two layers, matching who owns which knobs:
//!
//! - [`QueryState`] is what a screen holds: free-text search, one filter
//!   chip, and a sort preference. It lives for the duration of a screen
//!   instance and is never persisted.
//! - [`BookQuery`] is the wire-level parameter set of `GET /books`, a
//!   superset of what screens use (it also carries `author` and `theme`
//!   narrowing). [`QueryState::to_query`] maps one into the other.
//!
//! Both layers are pure: building parameters has no side effects and no
//! error cases.

/// Filter chip selected on the list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// No read/favorite narrowing.
    #[default]
    All,
    /// Only books marked as read.
    Read,
    /// Only books not marked as read.
    Unread,
    /// Only books marked as favorite.
    Favorite,
}

/// Field the list is sorted by, when a sort is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Author,
    Theme,
}

impl SortField {
    /// Wire value for the `sort` parameter.
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Author => "author",
            Self::Theme => "theme",
        }
    }
}

/// Direction of an active sort. Ascending unless the user flips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Wire value for the `order` parameter.
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Screen-level query state: search text, filter chip, sort preference.
///
/// Mutated only by user interaction; the controller debounces changes before
/// turning the state into a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    /// Free-text search input, used verbatim apart from trimming.
    pub text: String,

    /// Selected filter chip.
    pub filter: Filter,

    /// Active sort field, `None` when the list uses server default order.
    pub sort_field: Option<SortField>,

    /// Sort direction, only meaningful while `sort_field` is set.
    pub sort_order: SortOrder,
}

impl QueryState {
    /// Lowers the screen state into wire-level list parameters.
    ///
    /// Emission rules:
    /// - `q` only when the trimmed text is non-empty;
    /// - `read=true` for [`Filter::Read`], `read=false` for
    ///   [`Filter::Unread`], omitted for `All`/`Favorite`;
    /// - `favorite=true` for [`Filter::Favorite`], omitted otherwise
    ///   (`favorite=false` is never emitted);
    /// - `sort` and `order` only when a sort field is set.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelfsync::domain::{Filter, QueryState, SortField};
    ///
    /// let state = QueryState {
    ///     text: "tolkien".to_string(),
    ///     filter: Filter::All,
    ///     sort_field: Some(SortField::Name),
    ///     ..QueryState::default()
    /// };
    /// let params = state.to_query().params();
    /// assert_eq!(
    ///     params,
    ///     vec![
    ///         ("q", "tolkien".to_string()),
    ///         ("sort", "name".to_string()),
    ///         ("order", "asc".to_string()),
    ///     ]
    /// );
    /// ```
    #[must_use]
    pub fn to_query(&self) -> BookQuery {
        let text = self.text.trim();
        BookQuery {
            text: (!text.is_empty()).then(|| text.to_string()),
            author: None,
            theme: None,
            read: match self.filter {
                Filter::Read => Some(true),
                Filter::Unread => Some(false),
                Filter::All | Filter::Favorite => None,
            },
            favorite: (self.filter == Filter::Favorite).then_some(true),
            sort: self.sort_field.map(|field| (field, self.sort_order)),
        }
    }
}

/// Wire-level parameters of the list endpoint.
///
/// Each field is emitted only when present, so the default value produces an
/// empty parameter list (the unfiltered catalog).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookQuery {
    /// Full-text search term (`q`).
    pub text: Option<String>,

    /// Exact author narrowing (`author`).
    pub author: Option<String>,

    /// Exact theme narrowing (`theme`).
    pub theme: Option<String>,

    /// Read-flag narrowing (`read`).
    pub read: Option<bool>,

    /// Favorite-flag narrowing (`favorite`).
    pub favorite: Option<bool>,

    /// Active sort, emitted as the `sort` and `order` parameter pair.
    pub sort: Option<(SortField, SortOrder)>,
}

impl BookQuery {
    /// Renders the query as ordered key/value pairs for the request URL.
    ///
    /// Empty strings count as absent; parameter order is stable, which keeps
    /// request logs and tests deterministic.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(text) = non_empty(&self.text) {
            params.push(("q", text.to_string()));
        }
        if let Some(author) = non_empty(&self.author) {
            params.push(("author", author.to_string()));
        }
        if let Some(read) = self.read {
            params.push(("read", read.to_string()));
        }
        if let Some(favorite) = self.favorite {
            params.push(("favorite", favorite.to_string()));
        }
        if let Some(theme) = non_empty(&self.theme) {
            params.push(("theme", theme.to_string()));
        }
        if let Some((field, order)) = self.sort {
            params.push(("sort", field.as_param().to_string()));
            params.push(("order", order.as_param().to_string()));
        }
        params
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str, filter: Filter) -> QueryState {
        QueryState {
            text: text.to_string(),
            filter,
            ..QueryState::default()
        }
    }

    fn keys(state: &QueryState) -> Vec<&'static str> {
        state.to_query().params().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn favorite_filter_never_emits_read() {
        assert_eq!(keys(&state("", Filter::Favorite)), vec!["favorite"]);
    }

    #[test]
    fn read_filters_never_emit_favorite() {
        let read = state("", Filter::Read).to_query();
        assert_eq!(read.read, Some(true));
        assert!(read.favorite.is_none());

        let unread = state("", Filter::Unread).to_query();
        assert_eq!(unread.read, Some(false));
        assert!(unread.favorite.is_none());
    }

    #[test]
    fn all_filter_emits_neither_flag() {
        assert!(keys(&state("", Filter::All)).is_empty());
    }

    #[test]
    fn text_is_trimmed_and_empty_text_is_absent() {
        assert!(keys(&state("   ", Filter::All)).is_empty());

        let params = state("  dune ", Filter::All).to_query().params();
        assert_eq!(params, vec![("q", "dune".to_string())]);
    }

    #[test]
    fn sort_and_order_only_with_sort_field() {
        let mut s = state("", Filter::All);
        assert!(!keys(&s).contains(&"order"));

        s.sort_field = Some(SortField::Author);
        s.sort_order = SortOrder::Desc;
        let params = s.to_query().params();
        assert_eq!(
            params,
            vec![
                ("sort", "author".to_string()),
                ("order", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn default_order_is_ascending() {
        let mut s = state("", Filter::All);
        s.sort_field = Some(SortField::Name);
        let params = s.to_query().params();
        assert!(params.contains(&("order", "asc".to_string())));
    }

    #[test]
    fn search_with_sort_matches_expected_param_set() {
        let s = QueryState {
            text: "tolkien".to_string(),
            filter: Filter::All,
            sort_field: Some(SortField::Name),
            sort_order: SortOrder::Asc,
        };
        assert_eq!(
            s.to_query().params(),
            vec![
                ("q", "tolkien".to_string()),
                ("sort", "name".to_string()),
                ("order", "asc".to_string()),
            ]
        );
    }

    #[test]
    fn wire_query_emits_author_and_theme_when_set() {
        let query = BookQuery {
            author: Some("Frank Herbert".to_string()),
            theme: Some("science-fiction".to_string()),
            ..BookQuery::default()
        };
        assert_eq!(
            query.params(),
            vec![
                ("author", "Frank Herbert".to_string()),
                ("theme", "science-fiction".to_string()),
            ]
        );
    }
}
