use futures::future::join_all;
use offer_radar::analyzer::AnalyzerImpl;
use offer_radar::analyzer::filter::FilterValue;
use offer_radar::analyzer::sort::SortKey;
use offer_radar::config::{AppConfig, ViewConfig, load_config};
use offer_radar::lead::verify::search_fallback_url;
use offer_radar::lead::{LeadForm, RestLeadSink, UrlVerifier, submit_form};
use offer_radar::report::summarize;
use offer_radar::source::fetcher::StoreClient;
use offer_radar::source::{OfferSource, RestSource};
use offer_radar::state::page::MUNICIPALITY_FILTER;
use offer_radar::state::{Action, PageState};
use std::fs;
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let store = match StoreClient::new(&config.data_store) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to create data store client: {}", e);
            return;
        }
    };

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("submit-lead") {
        match args.get(2) {
            Some(path) => submit_lead(store, path).await,
            None => error!("Usage: offer-radar submit-lead <form.json>"),
        }
        return;
    }

    let source = RestSource::new(store.clone(), &config.data_store);
    let analyzer = AnalyzerImpl::new();
    let verifier = config.verify_urls.then(|| UrlVerifier::new(store.clone()));

    match source.fetch_municipalities().await {
        Ok(names) => info!("{} municipalities with power offers", names.len()),
        Err(e) => warn!("Municipality list unavailable: {}", e),
    }

    loop {
        info!("Views to process: {}", config.views.len());

        // Views are independent; one failing fetch does not hold up the others.
        let tasks: Vec<_> = config
            .views
            .iter()
            .map(|view| process_view(view, &config, &source, &analyzer, verifier.as_ref()))
            .collect();
        join_all(tasks).await;

        info!("Waiting {}s before the next pass...", config.check_interval_seconds);
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down.");
                break;
            }
        }
    }
}

/// Builds the page state for one configured view, fetches its data and logs
/// the top of the resulting comparison.
async fn process_view(
    view: &ViewConfig,
    config: &AppConfig,
    source: &RestSource,
    analyzer: &AnalyzerImpl,
    verifier: Option<&UrlVerifier>,
) {
    let Some(mut state) = PageState::from_page(&view.page, config.default_consumption_kwh) else {
        warn!("Skipping view {}: not a comparison page", view.page);
        return;
    };
    info!("Processing view: {}", state.page());

    if let Some(municipality) = &view.municipality {
        state.apply(Action::SetFilter(
            MUNICIPALITY_FILTER.to_string(),
            FilterValue::Search(municipality.clone()),
        ));
    }
    for (key, value) in &view.filters {
        state.apply(Action::SetFilter(key.clone(), value.clone()));
    }
    if let Some(sort) = &view.sort {
        match SortKey::parse(sort) {
            Some(key) => {
                state.apply(Action::SetSort(key));
            }
            None => warn!("Unknown sort key `{}` in view {}", sort, view.page),
        }
    }
    if let Some(kwh) = view.annual_consumption_kwh {
        state.apply(Action::SetConsumption(kwh));
    }
    if state.is_business() {
        info!("{} is a business page; visitors get the business lead form", view.page);
    }

    let provider_ticket = state.ticket();
    let providers = source.fetch_providers(state.vertical()).await;
    state.accept_providers(&provider_ticket, providers);

    let Some(ticket) = state.begin_fetch() else {
        info!("{} needs a municipality before offers are fetched", view.page);
        return;
    };
    let result = source
        .fetch_offers(ticket.vertical, ticket.municipality.as_deref())
        .await;
    state.accept_offers(&ticket, result);

    if let Some(e) = &state.data().error {
        warn!("No offers for {}: {}", view.page, e);
        return;
    }

    let results = state.results(analyzer);
    let kwh = state.annual_consumption_kwh();
    info!(
        "{}: {} of {} offers shown ({} providers)",
        state.page(),
        results.len(),
        state.data().offers.len(),
        state.data().providers.len()
    );

    for (rank, offer) in results.iter().take(view.limit).enumerate() {
        let link = match (verifier, offer.url.as_deref()) {
            (Some(verifier), _) => verifier
                .verify(&offer.provider, source.table(offer.vertical()), &offer.id)
                .await
                .or_else(|| offer.url.clone()),
            (None, url) => url.map(str::to_string),
        }
        .unwrap_or_else(|| search_fallback_url(&offer.provider));
        info!("#{} {} → {}", rank + 1, summarize(offer, kwh), link);
    }
}

/// Reads a lead form from `path` and submits it.
async fn submit_lead(store: StoreClient, path: &str) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Cannot read {}: {}", path, e);
            return;
        }
    };
    let form: LeadForm = match serde_json::from_str(&content) {
        Ok(form) => form,
        Err(e) => {
            error!("Invalid lead form {}: {}", path, e);
            return;
        }
    };

    let sink = RestLeadSink::new(store);
    match submit_form(&sink, &form).await {
        Ok(receipt) => info!("Lead accepted at {}", receipt.submitted_at),
        Err(e) => error!("Lead not submitted: {}", e),
    }
}
