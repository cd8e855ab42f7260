use crate::analyzer::filter::{FilterState, FilterValue};
use crate::analyzer::sort::SortKey;
use crate::analyzer::{Analyzer, ComparisonQuery};
use crate::model::{FetchError, Offer, Provider, Vertical};
use crate::state::selection::{Selection, TYPE_PARAM};
use reqwest::Url;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

pub const MUNICIPALITY_FILTER: &str = "municipality";

static ORIGIN: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("valid origin"));

/// Parses a page path such as `/strom?type=spot` into its vertical and URL.
pub fn parse_page(page: &str) -> Option<(Vertical, Url)> {
    let url = ORIGIN.join(page).ok()?;
    let slug = url.path_segments()?.next()?;
    let vertical = Vertical::from_slug(slug)?;
    Some((vertical, url))
}

/// Path and query of `url`, without the origin.
fn page_of(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    SwitchVertical(Vertical),
    /// `None` or `all` clears the chip.
    SelectCategory(Option<String>),
    SelectDuration(u32),
    SetFilter(String, FilterValue),
    ClearFilters,
    SetSort(SortKey),
    SetConsumption(f64),
    /// The browser landed on, or went back to, this page.
    LoadUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Rewrite the current history entry.
    Replace,
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlUpdate {
    pub page: String,
    pub mode: NavigationMode,
}

/// Side effects the caller must carry out after a reducer step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub url: Option<UrlUpdate>,
    pub refetch: bool,
}

/// Identifies the request a response belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub vertical: Vertical,
    pub municipality: Option<String>,
    epoch: u64,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DataState {
    pub offers: Vec<Offer>,
    pub providers: Vec<Provider>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Everything a comparison page holds for one vertical. Mutated only
/// through [`PageState::apply`].
#[derive(Debug, Clone)]
pub struct PageState {
    vertical: Vertical,
    url: Url,
    selection: Selection,
    filters: FilterState,
    sort: SortKey,
    annual_consumption_kwh: f64,
    default_consumption_kwh: f64,
    /// Bumped when the vertical changes; guards provider responses.
    epoch: u64,
    /// Bumped whenever the server-side query changes; guards offer responses.
    generation: u64,
    data: DataState,
}

impl PageState {
    pub fn new(vertical: Vertical, default_consumption_kwh: f64) -> Self {
        let url = ORIGIN
            .join(vertical.slug())
            .unwrap_or_else(|_| ORIGIN.clone());
        Self {
            vertical,
            url,
            selection: Selection::Unset,
            filters: FilterState::new(),
            sort: SortKey::default(),
            annual_consumption_kwh: default_consumption_kwh,
            default_consumption_kwh,
            epoch: 0,
            generation: 0,
            data: DataState::default(),
        }
    }

    /// State for a page URL such as `/strom?type=fixed&duration=12`.
    pub fn from_page(page: &str, default_consumption_kwh: f64) -> Option<Self> {
        let (vertical, _) = parse_page(page)?;
        let mut state = Self::new(vertical, default_consumption_kwh);
        state.apply(Action::LoadUrl(page.to_string()));
        Some(state)
    }

    pub fn vertical(&self) -> Vertical {
        self.vertical
    }

    pub fn page(&self) -> String {
        page_of(&self.url)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    pub fn annual_consumption_kwh(&self) -> f64 {
        self.annual_consumption_kwh
    }

    pub fn data(&self) -> &DataState {
        &self.data
    }

    pub fn municipality(&self) -> Option<&str> {
        self.filters.text(MUNICIPALITY_FILTER)
    }

    /// Business chips send the visitor to the business lead form.
    pub fn is_business(&self) -> bool {
        self.selection.is_business(self.vertical)
    }

    pub fn apply(&mut self, action: Action) -> Transition {
        match action {
            Action::SwitchVertical(vertical) => {
                if vertical == self.vertical {
                    return Transition::default();
                }
                self.reset_to(vertical);
                Transition {
                    url: Some(self.url_update(NavigationMode::Push)),
                    refetch: self.can_fetch(),
                }
            }
            Action::SelectCategory(tag) => {
                let tag = tag.unwrap_or_default();
                match Selection::from_tag(self.vertical, &tag) {
                    Some(selection) => self.select(selection),
                    None => {
                        debug!("Ignoring unknown {} category `{}`", self.vertical, tag);
                        Transition::default()
                    }
                }
            }
            Action::SelectDuration(months) => {
                let next = self.selection.clone().with_duration(self.vertical, months);
                if next == self.selection {
                    return Transition::default();
                }
                self.select(next)
            }
            Action::SetFilter(key, value) => {
                let before = self.municipality().map(str::to_string);
                self.filters.set(key, value);
                Transition {
                    url: None,
                    refetch: self.municipality_changed(before),
                }
            }
            Action::ClearFilters => {
                let before = self.municipality().map(str::to_string);
                self.filters.clear();
                self.sort = SortKey::default();
                let refetch = self.municipality_changed(before);
                let mut transition = self.select(Selection::Unset);
                transition.refetch = refetch;
                transition
            }
            Action::SetSort(key) => {
                self.sort = key.for_vertical(self.vertical);
                Transition::default()
            }
            Action::SetConsumption(kwh) => {
                if kwh.is_finite() && kwh > 0.0 {
                    self.annual_consumption_kwh = kwh;
                } else {
                    warn!("Ignoring consumption {} kWh", kwh);
                }
                Transition::default()
            }
            Action::LoadUrl(page) => self.load_url(&page),
        }
    }

    fn load_url(&mut self, page: &str) -> Transition {
        let Some((vertical, url)) = parse_page(page) else {
            warn!("Not a comparison page: {}", page);
            return Transition::default();
        };

        let switched = vertical != self.vertical;
        if switched {
            self.reset_to(vertical);
        }
        self.url = url;

        match Selection::from_url(vertical, &self.url) {
            Some(Selection::Unset) => self.start_over(),
            None if !self.has_type_param() => self.start_over(),
            Some(selection) => self.selection = selection,
            None => {}
        }

        Transition {
            url: None,
            refetch: switched && self.can_fetch(),
        }
    }

    fn has_type_param(&self) -> bool {
        self.url.query_pairs().any(|(k, _)| k == TYPE_PARAM)
    }

    /// Bare page: selection, filters and sort start over, but power keeps
    /// its municipality.
    fn start_over(&mut self) {
        let municipality = self.municipality().map(str::to_string);
        self.selection = Selection::Unset;
        self.filters.clear();
        self.sort = SortKey::default();
        if let (Vertical::Power, Some(name)) = (self.vertical, municipality) {
            self.filters.set(MUNICIPALITY_FILTER, FilterValue::Search(name));
        }
    }

    fn select(&mut self, selection: Selection) -> Transition {
        self.selection = selection;
        self.selection.write_to(&mut self.url);
        Transition {
            url: Some(self.url_update(NavigationMode::Replace)),
            refetch: false,
        }
    }

    fn reset_to(&mut self, vertical: Vertical) {
        info!("Switching {} → {}", self.vertical, vertical);
        *self = Self {
            epoch: self.epoch + 1,
            generation: self.generation + 1,
            ..Self::new(vertical, self.default_consumption_kwh)
        };
    }

    /// Power offers are fetched per municipality; a change invalidates the
    /// current list.
    fn municipality_changed(&mut self, before: Option<String>) -> bool {
        if self.vertical != Vertical::Power || before.as_deref() == self.municipality() {
            return false;
        }
        self.generation += 1;
        self.data.offers.clear();
        self.can_fetch()
    }

    fn url_update(&self, mode: NavigationMode) -> UrlUpdate {
        UrlUpdate {
            page: self.page(),
            mode,
        }
    }

    /// Power waits for a municipality before fetching offers.
    pub fn can_fetch(&self) -> bool {
        self.vertical != Vertical::Power || self.municipality().is_some()
    }

    /// Marks the page loading and returns the ticket the response must carry.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.can_fetch() {
            debug!("{} waits for a municipality", self.vertical);
            self.data.offers.clear();
            return None;
        }
        self.data.loading = true;
        self.data.error = None;
        Some(self.ticket())
    }

    /// Ticket for a provider request, which does not depend on municipality.
    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            vertical: self.vertical,
            municipality: match self.vertical {
                Vertical::Power => self.municipality().map(str::to_string),
                _ => None,
            },
            epoch: self.epoch,
            generation: self.generation,
        }
    }

    /// Applies an offer response. Responses for an abandoned query are
    /// dropped and `false` is returned.
    pub fn accept_offers(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Offer>, FetchError>,
    ) -> bool {
        if ticket.epoch != self.epoch || ticket.generation != self.generation {
            debug!(
                "Discarding stale {} offers (generation {} vs {})",
                ticket.vertical, ticket.generation, self.generation
            );
            return false;
        }
        self.data.loading = false;
        match result {
            Ok(offers) => {
                self.data.offers = offers
                    .into_iter()
                    .filter(|o| o.vertical() == self.vertical)
                    .collect();
                self.data.error = None;
            }
            Err(e) => {
                warn!("Fetching {} offers failed: {}", self.vertical, e);
                self.data.offers.clear();
                self.data.error = Some(e.to_string());
            }
        }
        true
    }

    pub fn accept_providers(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Provider>, FetchError>,
    ) -> bool {
        if ticket.epoch != self.epoch {
            debug!("Discarding stale {} providers", ticket.vertical);
            return false;
        }
        match result {
            Ok(providers) => self.data.providers = providers,
            Err(e) => warn!("Fetching {} providers failed: {}", self.vertical, e),
        }
        true
    }

    pub fn query(&self) -> ComparisonQuery {
        ComparisonQuery {
            vertical: self.vertical,
            filters: self.filters.clone(),
            category: self.selection.chip(),
            sort: self.sort,
            annual_consumption_kwh: self.annual_consumption_kwh,
        }
    }

    /// Filtered and sorted offers for display.
    pub fn results<A: Analyzer>(&self, analyzer: &A) -> Vec<Offer> {
        analyzer.compare(&self.data.offers, &self.query())
    }
}
