use crate::core::facets::Facets;
use crate::core::hierarchy::{Category, CategoryHierarchy};
use crate::core::present::IconSet;
use crate::core::routes::{RouteDef, RouteTable};
use crate::domain::ports::ConfigProvider;
use crate::domain::schema::FilterSchema;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env reference pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub routes: BTreeMap<String, RouteDef>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub icons: IconSet,
    #[serde(default)]
    pub pages: BTreeMap<String, PageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub path: String,
    /// Built-in field set (`jobs`, `store_search`) used when `fields` is empty.
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(flatten)]
    pub schema: FilterSchema,
}

impl PageConfig {
    pub fn resolved_schema(&self) -> Result<FilterSchema> {
        if !self.schema.fields.is_empty() {
            return Ok(self.schema.clone());
        }
        let preset = match self.preset.as_deref() {
            Some("jobs") => FilterSchema::jobs(),
            Some("store_search") => FilterSchema::store_search(),
            Some(other) => {
                return Err(MarketError::InvalidConfigValueError {
                    field: "pages.preset".to_string(),
                    value: other.to_string(),
                    reason: "Known presets: jobs, store_search".to_string(),
                })
            }
            None => return Ok(self.schema.clone()),
        };
        // page-level settings win over the preset's
        let mut schema = preset;
        for key in &self.schema.preserve {
            if !schema.is_preserved(key) {
                schema.preserve.push(key.clone());
            }
        }
        schema.page_key = self.schema.page_key.clone();
        schema.cascade = self.schema.cascade.clone();
        Ok(schema)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(
            "jobs".to_string(),
            PageConfig {
                path: "/jobs".to_string(),
                preset: None,
                schema: FilterSchema::jobs(),
            },
        );
        pages.insert(
            "store_search".to_string(),
            PageConfig {
                path: "/stores/search".to_string(),
                preset: None,
                schema: FilterSchema::store_search(),
            },
        );

        Self {
            server: ServerConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_seconds: default_timeout(),
                headers: BTreeMap::new(),
            },
            routes: BTreeMap::new(),
            categories: Vec::new(),
            icons: IconSet::default(),
            pages,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MARKET_BASE_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_REFERENCE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("server.base_url", &self.server.base_url)?;
        validation::validate_positive_number(
            "server.timeout_seconds",
            self.server.timeout_seconds,
            1,
        )?;

        self.route_table().validate()?;
        self.hierarchy()?;

        for (name, page) in &self.pages {
            validation::validate_route_path(&format!("pages.{}.path", name), &page.path)?;
            let schema = page.resolved_schema()?;
            for field in &schema.fields {
                validation::validate_non_empty_string(
                    &format!("pages.{}.fields.key", name),
                    &field.key,
                )?;
                if schema.is_preserved(&field.key) {
                    return Err(MarketError::InvalidConfigValueError {
                        field: format!("pages.{}.preserve", name),
                        value: field.key.clone(),
                        reason: "A filter field cannot also be a preserved route parameter"
                            .to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(self.routes.clone())
    }

    pub fn hierarchy(&self) -> Result<CategoryHierarchy> {
        CategoryHierarchy::new(self.categories.clone())
    }

    pub fn page(&self, name: &str) -> Result<&PageConfig> {
        self.pages.get(name).ok_or_else(|| MarketError::MissingConfigError {
            field: format!("pages.{}", name),
        })
    }

    pub fn facets(&self, page: &str) -> Result<Facets> {
        let schema = self.page(page)?.resolved_schema()?;
        Ok(Facets::new(schema, self.hierarchy()?))
    }
}

impl ConfigProvider for AppConfig {
    fn base_url(&self) -> &str {
        &self.server.base_url
    }

    fn timeout_seconds(&self) -> u64 {
        self.server.timeout_seconds
    }

    fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.server.headers
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
