use anyhow::Context;
use clap::Parser;
use market_facets::config::cli::{build_payload, format_chip};
use market_facets::utils::error::ErrorSeverity;
use market_facets::utils::{logger, validation::Validate};
use market_facets::{
    AppConfig, CliConfig, Command, Form, ListingPage, MarketError, Mutation, MutationDispatcher,
    RouteParams, StdoutNavigator, SubmitOptions,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => AppConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.server.base_url = base_url.clone();
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "{} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("{}", e.user_friendly_message());
        eprintln!("Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4, // validation / input
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: &CliConfig, config: &AppConfig) -> Result<(), MarketError> {
    match &cli.command {
        Command::Submit {
            route,
            params,
            fields,
            lists,
            files,
            force_multipart,
            preserve_scroll,
        } => {
            let dispatcher = MutationDispatcher::new(config, config.route_table())?;
            let form = Form::new(build_payload(fields, lists, files)?);
            let params: RouteParams = params.iter().cloned().collect();

            let mut options = SubmitOptions::new();
            if *force_multipart {
                options = options.force_multipart();
            }
            if *preserve_scroll {
                options = options.preserve_scroll();
            }

            let submitted = form.submit(&dispatcher, route, &params, options).await?;
            tracing::info!("{} accepted with status {}", route, submitted.status);
            println!("{}", submitted.final_url);
            Ok(())
        }
        Command::Chips => {
            let page = load_page(cli, config)?;
            let hierarchy = page.facets().hierarchy();
            for chip in page.chips() {
                println!("{}", format_chip(&chip, &config.icons, hierarchy));
            }
            Ok(())
        }
        Command::Set { key, value } => navigate(cli, config, Mutation::set(key, value.as_deref())),
        Command::Toggle { key, value } => navigate(cli, config, Mutation::toggle(key, value)),
        Command::Remove { key, token } => navigate(cli, config, Mutation::remove(key, token)),
        Command::Clear => navigate(cli, config, Mutation::ClearAll),
    }
}

fn load_page(cli: &CliConfig, config: &AppConfig) -> Result<ListingPage, MarketError> {
    let facets = config.facets(&cli.page)?;
    let url = match &cli.url {
        Some(url) => url.clone(),
        None => config.page(&cli.page)?.path.clone(),
    };
    Ok(ListingPage::from_url(&url, facets))
}

fn navigate(cli: &CliConfig, config: &AppConfig, mutation: Mutation) -> Result<(), MarketError> {
    let mut page = load_page(cli, config)?;
    page.facets().check(&mutation)?;
    page.navigate(&StdoutNavigator, &mutation);
    Ok(())
}
