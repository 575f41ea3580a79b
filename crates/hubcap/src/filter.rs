//! path-prefix filters deciding which nodes are built and which are collected
//!
//! A filter string holds one or more alternatives separated by `,`. Each alternative is a path of
//! names separated by `.`, e.g. `production.app,staging`. An empty string matches the whole tree.

pub const PATH_SEPARATOR: char = '.';
pub const ALTERNATIVE_SEPARATOR: char = ',';

/// One path prefix
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter(Vec<String>);

impl Filter {
    pub fn parse(path: &str) -> Self {
        Self(
            path.split(PATH_SEPARATOR)
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// `history` and this filter agree on every position up to the shorter of the two
    fn matches<S: AsRef<str>>(&self, history: &[S]) -> bool {
        self.0
            .iter()
            .zip(history)
            .all(|(segment, name)| segment == name.as_ref())
    }

    fn reaches<S: AsRef<str>>(&self, history: &[S]) -> bool {
        history.len() >= self.0.len() && self.matches(history)
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(&PATH_SEPARATOR.to_string()))
    }
}

/// Set of alternative [Filter]s, a node passes if any one of them matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters(Vec<Filter>);

impl Filters {
    pub fn parse(filter_string: &str) -> Self {
        filter_string.split(ALTERNATIVE_SEPARATOR).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.0.iter()
    }

    /// Whether a node with this history should evaluate its body
    #[tracing::instrument(level = "trace", skip_all, ret)]
    pub fn processable<S: AsRef<str>>(&self, history: &[S]) -> bool {
        self.0.iter().any(|filter| filter.matches(history))
    }

    /// Whether a node with this history should be registered in the hub's flat lists
    #[tracing::instrument(level = "trace", skip_all, ret)]
    pub fn collectable<S: AsRef<str>>(&self, history: &[S]) -> bool {
        self.0.iter().any(|filter| filter.reaches(history))
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self(vec![Filter::default()])
    }
}

impl<'a> FromIterator<&'a str> for Filters {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut filters: Vec<Filter> = Vec::new();
        for filter in iter
            .into_iter()
            .flat_map(|s| s.split(ALTERNATIVE_SEPARATOR))
            .map(Filter::parse)
        {
            if !filters.contains(&filter) {
                filters.push(filter);
            }
        }

        if filters.is_empty() {
            filters.push(Filter::default());
        }

        Self(filters)
    }
}

impl std::fmt::Display for Filters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let alternatives: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&alternatives.join(&ALTERNATIVE_SEPARATOR.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse() {
        assert_eq!(Filter::parse("").segments(), &[] as &[String]);
        assert_eq!(Filter::parse("a.b").segments(), &["a", "b"]);
        assert_eq!(Filter::parse("a..b.").segments(), &["a", "b"]);

        let filters = Filters::parse("a.b,c");
        assert_eq!(filters.iter().count(), 2);
        assert_eq!(filters.to_string(), "a.b,c");
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filters = Filters::parse("");
        let histories: [Vec<&str>; 3] = [vec![], vec!["a"], vec!["a", "b", "c"]];
        for history in histories {
            assert!(filters.processable(history.as_slice()));
            assert!(filters.collectable(history.as_slice()));
        }
    }

    #[test]
    fn processable_along_matching_path() {
        let filters = Filters::parse("production.app");

        assert!(filters.processable::<&str>(&[]));
        assert!(filters.processable(&["production"]));
        assert!(filters.processable(&["production", "app"]));
        assert!(filters.processable(&["production", "app", "app-1"]));

        assert!(!filters.processable(&["staging"]));
        assert!(!filters.processable(&["production", "db"]));
    }

    #[test]
    fn collectable_only_at_or_below_filter_depth() {
        let filters = Filters::parse("production.app");

        assert!(!filters.collectable::<&str>(&[]));
        assert!(!filters.collectable(&["production"]));
        assert!(filters.collectable(&["production", "app"]));
        assert!(filters.collectable(&["production", "app", "app-1"]));
        assert!(!filters.collectable(&["production", "db", "db-1"]));
    }

    #[test]
    fn alternatives_are_or_ed() {
        let filters: Filters = ["production.db", "staging"].into_iter().collect();

        assert!(filters.collectable(&["staging", "app"]));
        assert!(filters.collectable(&["production", "db"]));
        assert!(filters.processable(&["production"]));
        assert!(!filters.collectable(&["production"]));
        assert!(!filters.processable(&["vagrant"]));
    }
}
