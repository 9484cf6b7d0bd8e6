// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global du tableau de bord
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Le rendu ne lit qu'un &App, la boucle d'événements seule le modifie
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les résultats du worker portent un jeton de génération : un résultat
//   dont le jeton n'est plus le dernier émis est ignoré
// ============================================================================

use std::collections::HashMap;

use tracing::debug;

use crate::api::Fixtures;
use crate::config;
use crate::filter::{self, FilterCriteria, PerformanceBucket};
use crate::loader::StockDetail;
use crate::models::{instrument, sectors_of, ArticleSlot, Instrument, LatestPrices, StockCard, CAC40};

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : cartes des valeurs
    Dashboard,

    /// Vue détail : graphique, jauges et articles de la valeur sélectionnée
    Detail,

    /// Mode saisie de la recherche
    /// - Chaque caractère filtre immédiatement les cartes
    /// - Enter valide, ESC efface la recherche
    Search,
}

// ============================================================================
// Jetons de génération
// ============================================================================
// CONCEPT : Last-write-wins
// - Chaque requête reçoit un jeton strictement croissant
// - On mémorise le dernier jeton émis par vue (cotations, vue détail, carte)
// - Un résultat portant un ancien jeton est obsolète
// ============================================================================

/// Jeton identifiant une requête
pub type Generation = u64;

/// Derniers jetons émis par vue
#[derive(Debug, Default)]
pub struct RequestTracker {
    counter: Generation,
    latest: Generation,
    detail: Generation,
    cards: HashMap<&'static str, Generation>,
}

impl RequestTracker {
    fn bump(&mut self) -> Generation {
        self.counter += 1;
        self.counter
    }

    pub fn start_latest(&mut self) -> Generation {
        self.latest = self.bump();
        self.latest
    }

    pub fn start_detail(&mut self) -> Generation {
        self.detail = self.bump();
        self.detail
    }

    pub fn start_card(&mut self, name: &'static str) -> Generation {
        let token = self.bump();
        self.cards.insert(name, token);
        token
    }

    /// Rend obsolète toute requête de vue détail en cours
    pub fn cancel_detail(&mut self) {
        self.detail = self.bump();
    }

    pub fn is_current_latest(&self, token: Generation) -> bool {
        self.latest == token
    }

    pub fn is_current_detail(&self, token: Generation) -> bool {
        self.detail == token
    }

    pub fn is_current_card(&self, name: &str, token: Generation) -> bool {
        self.cards.get(name) == Some(&token)
    }
}

// ============================================================================
// App
// ============================================================================

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Une carte par valeur du catalogue, dans l'ordre du catalogue
    pub cards: Vec<StockCard>,

    /// Dernières cotations (None tant qu'elles ne sont pas chargées ou si
    /// l'API est injoignable)
    pub latest: Option<LatestPrices>,

    /// Critères de filtrage courants
    pub criteria: FilterCriteria,

    /// Noms des valeurs visibles après filtrage
    pub visible: Vec<&'static str>,

    /// Index de la carte sélectionnée dans `visible`
    pub selected_index: usize,

    /// Période d'historique (jours)
    pub period_days: u32,

    /// Données de la vue détail (None pendant le chargement)
    pub detail: Option<StockDetail>,

    /// Valeur affichée dans la vue détail
    pub detail_instrument: Option<&'static Instrument>,

    /// Article sélectionné dans la vue détail
    pub selected_article: ArticleSlot,

    /// Two-step quit : première pression de 'q' arme, deuxième quitte
    pub confirm_quit: bool,

    /// Chargement des cotations en cours
    pub loading_latest: bool,

    /// Chargement de la vue détail en cours
    pub loading_detail: bool,

    /// Alerte bloquante (doit être fermée avec ESC)
    pub alert: Option<String>,

    /// Jetons des requêtes en cours
    pub requests: RequestTracker,
}

impl App {
    /// Crée l'état initial : toutes les cartes, sans données
    pub fn new(period_days: u32) -> Self {
        let cards: Vec<StockCard> = CAC40.iter().map(StockCard::new).collect();
        let visible = instrument::names();

        Self {
            running: true,
            current_screen: Screen::Dashboard,
            cards,
            latest: None,
            criteria: FilterCriteria::default(),
            visible,
            selected_index: 0,
            period_days,
            detail: None,
            detail_instrument: None,
            selected_article: ArticleSlot::Positive,
            confirm_quit: false,
            loading_latest: false,
            loading_detail: false,
            alert: None,
            requests: RequestTracker::default(),
        }
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Cartes et filtres
    // ========================================================================

    /// Cartes visibles, dans l'ordre du catalogue
    pub fn visible_cards(&self) -> Vec<&StockCard> {
        self.visible
            .iter()
            .filter_map(|name| self.card(name))
            .collect()
    }

    pub fn card(&self, name: &str) -> Option<&StockCard> {
        self.cards.iter().find(|c| c.instrument.name == name)
    }

    fn card_mut(&mut self, name: &str) -> Option<&mut StockCard> {
        self.cards.iter_mut().find(|c| c.instrument.name == name)
    }

    /// Valeur de la carte sélectionnée
    pub fn selected_instrument(&self) -> Option<&'static Instrument> {
        self.visible
            .get(self.selected_index)
            .and_then(|name| instrument::find(name))
    }

    /// Recalcule les valeurs visibles et recale la sélection
    pub fn refresh_visible(&mut self) {
        let names = instrument::names();
        self.visible = filter::filter(&names, &self.criteria, self.latest.as_ref());
        let max_index = self.visible.len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    /// Navigue vers le haut dans les cartes visibles
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Navigue vers le bas dans les cartes visibles
    pub fn navigate_down(&mut self) {
        let max_index = self.visible.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Secteur suivant : tous → premier secteur → … → dernier → tous
    pub fn cycle_sector(&mut self) {
        let sectors: Vec<&str> = sectors_of(CAC40).into_iter().collect();
        let next = match self.criteria.sector.as_deref() {
            None => sectors.first(),
            Some(current) => sectors
                .iter()
                .position(|s| *s == current)
                .and_then(|i| sectors.get(i + 1)),
        };
        self.criteria.sector = next.map(|s| s.to_string());
        self.refresh_visible();
    }

    /// Catégorie de performance suivante
    pub fn cycle_performance(&mut self) {
        self.criteria.performance = PerformanceBucket::cycle(self.criteria.performance);
        self.refresh_visible();
    }

    /// Remet tous les filtres à zéro
    pub fn reset_filters(&mut self) {
        self.criteria.reset();
        self.selected_index = 0;
        self.refresh_visible();
    }

    /// Passe à la période suivante et la retourne
    pub fn next_period(&mut self) -> u32 {
        self.period_days = config::next_period(self.period_days);
        self.period_days
    }

    // ========================================================================
    // Résultats du worker
    // ========================================================================

    /// Démarre le chargement des cotations et retourne son jeton
    pub fn start_latest_load(&mut self) -> Generation {
        self.loading_latest = true;
        self.requests.start_latest()
    }

    /// Applique des cotations
    ///
    /// Les cartes sans cotation retombent sur les données fictives. Retourne
    /// false si le résultat est obsolète.
    pub fn apply_latest(&mut self, token: Generation, latest: Option<LatestPrices>, fixtures: &Fixtures) -> bool {
        if !self.requests.is_current_latest(token) {
            debug!(token, "Discarding stale latest prices");
            return false;
        }

        for card in &mut self.cards {
            let name = card.instrument.name;
            let quote = latest.as_ref().and_then(|l| l.get(name));
            let fresh = StockCard::from_sources(card.instrument, quote, fixtures.fake_stock(name));
            card.last_price = fresh.last_price;
            card.change_percent = fresh.change_percent;
        }

        self.latest = latest;
        self.loading_latest = false;
        self.refresh_visible();
        true
    }

    /// Applique la sparkline d'une carte, false si obsolète
    pub fn apply_sparkline(&mut self, name: &str, token: Generation, prices: Vec<f64>, synthetic: bool) -> bool {
        if !self.requests.is_current_card(name, token) {
            debug!(stock = name, token, "Discarding stale sparkline");
            return false;
        }
        match self.card_mut(name) {
            Some(card) => {
                card.set_sparkline(prices, synthetic);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Vue détail
    // ========================================================================

    /// Ouvre la vue détail de la carte sélectionnée
    ///
    /// Retourne la valeur et le jeton de la requête à lancer.
    pub fn open_detail(&mut self) -> Option<(&'static Instrument, Generation)> {
        let instrument = self.selected_instrument()?;
        self.current_screen = Screen::Detail;
        self.detail = None;
        self.detail_instrument = Some(instrument);
        self.selected_article = ArticleSlot::Positive;
        self.loading_detail = true;
        Some((instrument, self.requests.start_detail()))
    }

    /// Applique le résultat de la vue détail
    ///
    /// Une erreur déclenche l'alerte et ramène au tableau de bord. Le
    /// chargement est arrêté dans tous les cas. Retourne false si obsolète.
    pub fn apply_detail(&mut self, token: Generation, result: Result<StockDetail, String>) -> bool {
        if !self.requests.is_current_detail(token) {
            debug!(token, "Discarding stale detail view");
            return false;
        }

        self.loading_detail = false;
        match result {
            Ok(detail) => self.detail = Some(detail),
            Err(message) => {
                self.close_detail();
                self.raise_alert(message);
            }
        }
        true
    }

    /// Ferme la vue détail
    pub fn close_detail(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.detail = None;
        self.detail_instrument = None;
        self.loading_detail = false;
        self.requests.cancel_detail();
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    pub fn is_on_detail(&self) -> bool {
        self.current_screen == Screen::Detail
    }

    /// Sélectionne un article de la vue détail
    pub fn select_article(&mut self, slot: ArticleSlot) {
        self.selected_article = slot;
    }

    /// URL de l'article sélectionné, si la vue est chargée et qu'il en a une
    pub fn selected_article_url(&self) -> Option<&str> {
        self.detail
            .as_ref()?
            .articles
            .entry(self.selected_article)?
            .url
            .as_deref()
    }

    // ========================================================================
    // Alerte, quit, chargement
    // ========================================================================

    /// Affiche une alerte bloquante
    pub fn raise_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn has_alert(&self) -> bool {
        self.alert.is_some()
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Vérifie si des données sont en cours de chargement
    pub fn is_loading_data(&self) -> bool {
        self.loading_latest || self.loading_detail
    }

    /// Message de chargement à afficher
    pub fn loading_message(&self) -> Option<String> {
        if self.loading_detail {
            let name = self.detail_instrument.map(|i| i.name).unwrap_or("?");
            Some(format!("Chargement de {}...", name))
        } else if self.loading_latest {
            Some(format!("Chargement des cotations ({} jours)...", self.period_days))
        } else {
            None
        }
    }

    // ========================================================================
    // Recherche
    // ========================================================================

    /// Entre en mode recherche
    pub fn start_search(&mut self) {
        self.current_screen = Screen::Search;
    }

    /// Valide la recherche et retourne au tableau de bord
    pub fn submit_search(&mut self) {
        self.current_screen = Screen::Dashboard;
    }

    /// Efface la recherche et retourne au tableau de bord
    pub fn cancel_search(&mut self) {
        self.criteria.search.clear();
        self.current_screen = Screen::Dashboard;
        self.refresh_visible();
    }

    pub fn append_char(&mut self, c: char) {
        self.criteria.search.push(c);
        self.selected_index = 0;
        self.refresh_visible();
    }

    pub fn backspace(&mut self) {
        self.criteria.search.pop();
        self.refresh_visible();
    }

    pub fn is_in_search_mode(&self) -> bool {
        self.current_screen == Screen::Search
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(config::DEFAULT_PERIOD_DAYS)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{CorrelationGauge, CorrelationSource};
    use crate::loader::ArticlePanel;
    use crate::models::{ArticleSummary, ArticlesData, LatestQuote};

    fn detail_for(instrument: &'static Instrument) -> StockDetail {
        let data = ArticlesData {
            negative: Some(ArticleSummary {
                title: Some("Chute".to_string()),
                url: Some("https://example.org/chute".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        StockDetail {
            instrument,
            period_days: 30,
            series: None,
            correlation: CorrelationGauge::new(0.5, CorrelationSource::Api),
            correlation_context: None,
            articles: ArticlePanel::from_data(&data),
        }
    }

    #[test]
    fn test_app_creation() {
        let app = App::default();
        assert!(app.is_running());
        assert_eq!(app.cards.len(), CAC40.len());
        assert_eq!(app.visible.len(), CAC40.len());
        assert_eq!(app.period_days, 30);
        assert!(app.is_on_dashboard());
    }

    #[test]
    fn test_app_quit() {
        let mut app = App::default();
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_navigation() {
        let mut app = App::default();
        app.navigate_up();
        assert_eq!(app.selected_index, 0);

        for _ in 0..100 {
            app.navigate_down();
        }
        assert_eq!(app.selected_index, CAC40.len() - 1);

        // Le filtre recale la sélection
        app.criteria.sector = Some("Luxe".to_string());
        app.refresh_visible();
        assert_eq!(app.selected_index, 2);
        assert_eq!(app.selected_instrument().unwrap().name, "LVMH");
    }

    #[test]
    fn test_sector_cycle_wraps_to_all() {
        let mut app = App::default();
        let count = sectors_of(CAC40).len();

        app.cycle_sector();
        assert!(app.criteria.sector.is_some());
        for _ in 0..count {
            app.cycle_sector();
        }
        assert!(app.criteria.sector.is_none());
        assert_eq!(app.visible.len(), CAC40.len());
    }

    #[test]
    fn test_search_mode_filters_live() {
        let mut app = App::default();
        app.start_search();
        assert!(app.is_in_search_mode());

        for c in "vin".chars() {
            app.append_char(c);
        }
        assert_eq!(app.visible, vec!["Vinci"]);

        app.cancel_search();
        assert!(app.criteria.search.is_empty());
        assert_eq!(app.visible.len(), CAC40.len());
        assert!(app.is_on_dashboard());
    }

    #[test]
    fn test_stale_latest_prices_are_discarded() {
        let mut app = App::default();
        let fixtures = Fixtures::default();
        let old = app.start_latest_load();
        let new = app.start_latest_load();

        let mut prices = LatestPrices::new();
        prices.insert(
            "Airbus".to_string(),
            LatestQuote {
                last_price: Some(150.0),
                price_change: Some(1.5),
                ..Default::default()
            },
        );

        assert!(!app.apply_latest(old, Some(prices.clone()), &fixtures));
        assert!(app.loading_latest);

        assert!(app.apply_latest(new, Some(prices), &fixtures));
        assert!(!app.loading_latest);
        assert_eq!(app.card("Airbus").unwrap().last_price, Some(150.0));
        assert_eq!(app.card("Vinci").unwrap().last_price, None);
    }

    #[test]
    fn test_card_tokens_are_independent() {
        let mut app = App::default();
        let airbus_old = app.requests.start_card("Airbus");
        let axa = app.requests.start_card("AXA");
        let airbus_new = app.requests.start_card("Airbus");

        assert!(!app.apply_sparkline("Airbus", airbus_old, vec![1.0], false));
        assert!(app.apply_sparkline("AXA", axa, vec![2.0, 3.0], true));
        assert!(app.apply_sparkline("Airbus", airbus_new, vec![4.0], false));

        assert!(app.card("AXA").unwrap().sparkline_synthetic);
        assert_eq!(app.card("Airbus").unwrap().sparkline, Some(vec![4.0]));
    }

    #[test]
    fn test_detail_lifecycle() {
        let mut app = App::default();
        let (instrument, token) = app.open_detail().unwrap();
        assert_eq!(instrument.name, "Air Liquide");
        assert!(app.is_on_detail());
        assert!(app.is_loading_data());

        assert!(app.apply_detail(token, Ok(detail_for(instrument))));
        assert!(!app.is_loading_data());

        assert!(app.selected_article_url().is_none());
        app.select_article(ArticleSlot::Negative);
        assert_eq!(app.selected_article_url(), Some("https://example.org/chute"));
    }

    #[test]
    fn test_detail_closed_before_result_is_stale() {
        let mut app = App::default();
        let (instrument, token) = app.open_detail().unwrap();
        app.close_detail();

        assert!(!app.apply_detail(token, Ok(detail_for(instrument))));
        assert!(app.detail.is_none());
        assert!(app.is_on_dashboard());
    }

    #[test]
    fn test_detail_error_raises_alert_and_clears_loading() {
        let mut app = App::default();
        let (_, token) = app.open_detail().unwrap();

        assert!(app.apply_detail(token, Err("Historique indisponible".to_string())));
        assert!(app.has_alert());
        assert!(!app.is_loading_data());
        assert!(app.is_on_dashboard());

        app.dismiss_alert();
        assert!(!app.has_alert());
    }

    #[test]
    fn test_next_period_cycles() {
        let mut app = App::new(90);
        assert_eq!(app.next_period(), 2);
        assert_eq!(app.next_period(), 7);
    }
}
