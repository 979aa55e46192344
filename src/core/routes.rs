use crate::domain::payload::RouteParams;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::validate_route_path;
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use url::Url;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)(\?)?\}").expect("placeholder pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDef {
    #[serde(default = "default_method")]
    pub method: String,
    /// Path template, e.g. `/user/dashboard/hotels/{hotel}`. `{param?}` is optional.
    pub path: String,
}

fn default_method() -> String {
    "POST".to_string()
}

impl RouteDef {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
        }
    }

    pub fn http_method(&self) -> Result<Method> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            MarketError::InvalidConfigValueError {
                field: "routes.method".to_string(),
                value: self.method.clone(),
                reason: "Not an HTTP method".to_string(),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub name: String,
    pub method: Method,
    pub url: Url,
}

/// Named server routes, the only way the dispatcher builds URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: BTreeMap<String, RouteDef>,
}

impl RouteTable {
    pub fn new(routes: BTreeMap<String, RouteDef>) -> Self {
        Self { routes }
    }

    pub fn with_route(mut self, name: &str, method: &str, path: &str) -> Self {
        self.routes.insert(name.to_string(), RouteDef::new(method, path));
        self
    }

    pub fn get(&self, name: &str) -> Option<&RouteDef> {
        self.routes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, route) in &self.routes {
            // `{param?}` is template syntax, not a query string
            let bare = PLACEHOLDER.replace_all(&route.path, "");
            validate_route_path(&format!("routes.{}", name), &bare)?;
            route.http_method()?;
        }
        Ok(())
    }

    /// Substitutes route parameters into the template and joins it onto
    /// `base`. Parameters the template does not name become query pairs.
    pub fn resolve(&self, base: &Url, name: &str, params: &RouteParams) -> Result<ResolvedRoute> {
        let route = self.routes.get(name).ok_or_else(|| MarketError::UnknownRoute {
            name: name.to_string(),
        })?;
        let method = route.http_method()?;

        let mut url = base.clone();
        let mut used = BTreeSet::new();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                MarketError::InvalidConfigValueError {
                    field: "server.base_url".to_string(),
                    value: base.to_string(),
                    reason: "URL cannot carry a path".to_string(),
                }
            })?;
            segments.pop_if_empty();

            for template in route.path.split('/').filter(|s| !s.is_empty()) {
                let mut segment = String::new();
                let mut last = 0;
                for caps in PLACEHOLDER.captures_iter(template) {
                    let Some(whole) = caps.get(0) else {
                        continue;
                    };
                    let param = &caps[1];
                    let optional = caps.get(2).is_some();
                    segment.push_str(&template[last..whole.start()]);
                    last = whole.end();

                    match params.get(param) {
                        Some(value) => {
                            segment.push_str(value);
                            used.insert(param.to_string());
                        }
                        None if optional => {}
                        None => {
                            return Err(MarketError::MissingRouteParameter {
                                route: name.to_string(),
                                param: param.to_string(),
                            })
                        }
                    }
                }
                segment.push_str(&template[last..]);

                if !segment.is_empty() {
                    segments.push(&segment);
                }
            }
        }

        let extras: Vec<(&String, &String)> =
            params.iter().filter(|(k, _)| !used.contains(*k)).collect();
        if !extras.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in extras {
                pairs.append_pair(key, value);
            }
        }

        tracing::debug!("Resolved route {} to {} {}", name, method, url);
        Ok(ResolvedRoute {
            name: name.to_string(),
            method,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::default()
            .with_route(
                "user.dashboard.hotels.update",
                "put",
                "/user/dashboard/hotels/{hotel}",
            )
            .with_route(
                "user.dashboard.marketplace.destroy",
                "DELETE",
                "/user/dashboard/marketplace/{product}",
            )
            .with_route("jobs.index", "GET", "/jobs/{category?}")
    }

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_substitutes_and_encodes() {
        let base = Url::parse("https://market.example/app/").unwrap();
        let route = table()
            .resolve(&base, "user.dashboard.hotels.update", &params(&[("hotel", "sea view/1")]))
            .unwrap();
        assert_eq!(route.method, Method::PUT);
        assert_eq!(
            route.url.as_str(),
            "https://market.example/app/user/dashboard/hotels/sea%20view%2F1"
        );
    }

    #[test]
    fn test_optional_and_extra_params() {
        let base = Url::parse("https://market.example").unwrap();
        let route = table()
            .resolve(&base, "jobs.index", &params(&[("page", "2")]))
            .unwrap();
        assert_eq!(route.url.as_str(), "https://market.example/jobs?page=2");
    }

    #[test]
    fn test_missing_and_unknown() {
        let base = Url::parse("https://market.example").unwrap();
        assert!(matches!(
            table().resolve(&base, "user.dashboard.marketplace.destroy", &RouteParams::new()),
            Err(MarketError::MissingRouteParameter { .. })
        ));
        assert!(matches!(
            table().resolve(&base, "user.dashboard.cars.update", &RouteParams::new()),
            Err(MarketError::UnknownRoute { .. })
        ));
    }

    #[test]
    fn test_validate() {
        assert!(table().validate().is_ok());
        let bad = RouteTable::default().with_route("broken", "POST", "no-slash");
        assert!(bad.validate().is_err());
        let query = RouteTable::default().with_route("query", "GET", "/jobs?page=2");
        assert!(query.validate().is_err());
    }
}
