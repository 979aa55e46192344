use crate::core::chips::{self, ActiveChip};
use crate::core::codec;
use crate::core::facets::{Facets, Mutation};
use crate::domain::model::{FilterState, Visit};
use crate::domain::ports::Navigator;

/// A listing page: the only place filter state meets the URL.
#[derive(Debug, Clone)]
pub struct ListingPage {
    base_path: String,
    facets: Facets,
    state: FilterState,
}

impl ListingPage {
    pub fn new(base_path: &str, facets: Facets) -> Self {
        Self {
            base_path: base_path.to_string(),
            facets,
            state: FilterState::new(),
        }
    }

    /// Loads the page from its current URL. The path of `url` becomes the
    /// base path of every later navigation.
    pub fn from_url(url: &str, facets: Facets) -> Self {
        let (path, query) = codec::split_url(url);
        let state = codec::decode(facets.schema(), query);
        Self {
            base_path: path.to_string(),
            facets,
            state,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn query(&self) -> String {
        codec::encode(self.facets.schema(), &self.state)
    }

    pub fn url(&self) -> String {
        codec::to_url(&self.base_path, &self.query())
    }

    pub fn chips(&self) -> Vec<ActiveChip> {
        chips::active_chips(&self.facets, &self.state)
    }

    /// Applies a mutation and returns the navigation it calls for.
    pub fn apply(&mut self, mutation: &Mutation) -> Visit {
        self.state = self.facets.apply(&self.state, mutation);
        let visit = Visit::preserving(self.url());
        tracing::info!("Filters changed, visiting {}", visit.url);
        visit
    }

    pub fn navigate<N: Navigator + ?Sized>(&mut self, navigator: &N, mutation: &Mutation) -> Visit {
        let visit = self.apply(mutation);
        navigator.visit(&visit);
        visit
    }

    pub fn set_filter(&mut self, key: &str, value: Option<&str>) -> Visit {
        self.apply(&Mutation::set(key, value))
    }

    pub fn toggle_member(&mut self, key: &str, value: &str) -> Visit {
        self.apply(&Mutation::toggle(key, value))
    }

    pub fn remove_filter(&mut self, key: &str, token: &str) -> Visit {
        self.apply(&Mutation::remove(key, token))
    }

    pub fn clear_all(&mut self) -> Visit {
        self.apply(&Mutation::ClearAll)
    }

    pub fn remove_chip(&mut self, chip: &ActiveChip) -> Visit {
        self.apply(&chip.removal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hierarchy::CategoryHierarchy;
    use crate::domain::schema::FilterSchema;

    #[test]
    fn test_from_url_keeps_path() {
        let facets = Facets::new(FilterSchema::jobs(), CategoryHierarchy::default());
        let mut page = ListingPage::from_url("/jobs?page=4&type=contract#results", facets);
        assert_eq!(page.base_path(), "/jobs");
        assert_eq!(page.url(), "/jobs?page=4&type=contract");

        let visit = page.toggle_member("type", "contract");
        assert_eq!(visit.url, "/jobs");
        assert!(visit.preserve_scroll);
        assert!(visit.preserve_state);
    }

    #[test]
    fn test_store_slug_survives_clear_all() {
        let facets = Facets::new(FilterSchema::store_search(), CategoryHierarchy::default());
        let mut page =
            ListingPage::from_url("/stores/search?store=kola-hub&q=beads&page=2", facets);
        let visit = page.clear_all();
        assert_eq!(visit.url, "/stores/search?store=kola-hub");
    }
}
