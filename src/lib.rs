pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::StdoutNavigator, CliConfig, Command};

pub use adapters::HistoryNavigator;
pub use config::toml_config::AppConfig;
pub use core::{
    chips::ActiveChip,
    dispatcher::{Form, MutationDispatcher, SubmitOptions},
    facets::{Facets, Mutation},
    hierarchy::{Category, CategoryHierarchy},
    page::ListingPage,
    routes::RouteTable,
};
pub use domain::{
    model::{FilterState, FilterValue, Visit},
    payload::{Attachment, FormPayload, PayloadValue, RouteParams, Submitted},
    schema::{FieldKind, FieldSpec, FilterSchema},
};
pub use utils::error::{MarketError, Result, ValidationErrors};
