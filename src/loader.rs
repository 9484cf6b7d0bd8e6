// ============================================================================
// Chargeur de données
// ============================================================================
// Combine l'API, les fixtures et les générateurs de secours pour produire
// ce que l'interface affiche : cotations, sparklines, vue détail
//
// Règle générale : un échec réseau déclenche le repli (warn!) sans jamais
// remonter d'erreur, sauf l'historique de la vue détail dont l'échec devient
// une alerte bloquante.
//
// CONCEPTS RUST :
// 1. tokio::join! : les quatre appels de la vue détail partent en parallèle
// 2. Arc<Fixtures> : fixtures partagées entre toutes les tâches du worker
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, Fixtures};
use crate::indicators::{CorrelationGauge, CorrelationSource, DEFAULT_CORRELATION};
use crate::models::{
    ArticleSlot, ArticleSummary, ArticlesData, CorrelationData, ForecastPoint, Instrument,
    LatestPrices, PricePoint, SentimentPoint,
};
use crate::series::{self, DisplaySeries};
use crate::synthetic;

/// Nombre maximal de mots-clés affichés
pub const MAX_KEYWORDS: usize = 10;

// ============================================================================
// Panneau d'articles
// ============================================================================

/// Un emplacement d'article tel qu'affiché
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleEntry {
    pub slot: ArticleSlot,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub sentiment: Option<f64>,
}

impl ArticleEntry {
    fn placeholder(slot: ArticleSlot, title: &str, description: Option<&str>) -> Self {
        Self {
            slot,
            title: title.to_string(),
            description: description.map(str::to_string),
            url: None,
            sentiment: None,
        }
    }

    fn from_summary(slot: ArticleSlot, article: Option<&ArticleSummary>) -> Self {
        let Some(article) = article else {
            return Self::placeholder(slot, slot.empty_title(), None);
        };

        Self {
            slot,
            title: article
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Titre non disponible".to_string()),
            description: article.visible_description().map(str::to_string),
            url: article.url.clone().filter(|u| !u.trim().is_empty()),
            sentiment: article.sentiment,
        }
    }
}

/// Articles et mots-clés de la vue détail
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePanel {
    /// Trois entrées, dans l'ordre de ArticleSlot::ALL
    pub entries: Vec<ArticleEntry>,
    pub keywords: Vec<String>,
    pub monthly_sentiment: Option<f64>,
    pub article_count: Option<u32>,
}

impl ArticlePanel {
    pub fn from_data(data: &ArticlesData) -> Self {
        Self {
            entries: ArticleSlot::ALL
                .iter()
                .map(|slot| ArticleEntry::from_summary(*slot, data.get(*slot)))
                .collect(),
            keywords: data.keywords.iter().take(MAX_KEYWORDS).cloned().collect(),
            monthly_sentiment: data.monthly_sentiment,
            article_count: data.article_count,
        }
    }

    /// L'API a échoué
    pub fn load_error() -> Self {
        Self::placeholders("Erreur de chargement", Some("Impossible de charger les articles"))
    }

    /// L'API a répondu sans article et aucune synthèse mensuelle n'existe
    pub fn unavailable() -> Self {
        Self::placeholders(
            "Aucun article disponible",
            Some("Données d'articles non disponibles pour cette action"),
        )
    }

    fn placeholders(title: &str, description: Option<&str>) -> Self {
        Self {
            entries: ArticleSlot::ALL
                .iter()
                .map(|slot| ArticleEntry::placeholder(*slot, title, description))
                .collect(),
            keywords: Vec::new(),
            monthly_sentiment: None,
            article_count: None,
        }
    }

    pub fn entry(&self, slot: ArticleSlot) -> Option<&ArticleEntry> {
        self.entries.iter().find(|e| e.slot == slot)
    }
}

// ============================================================================
// Vue détail
// ============================================================================

/// Tout ce que la vue détail affiche pour une valeur
#[derive(Debug, Clone)]
pub struct StockDetail {
    pub instrument: &'static Instrument,
    pub period_days: u32,
    /// None : pas de prix, état "Aucune donnée disponible"
    pub series: Option<DisplaySeries>,
    pub correlation: CorrelationGauge,
    /// Période, date de calcul et dernier écart de sentiment, si l'API les donne
    pub correlation_context: Option<String>,
    pub articles: ArticlePanel,
}

// ============================================================================
// Loader
// ============================================================================

/// Point d'entrée unique des chargements
///
/// Clone bon marché : un clone par tâche du worker.
#[derive(Debug, Clone)]
pub struct Loader {
    client: ApiClient,
    fixtures: Arc<Fixtures>,
}

impl Loader {
    pub fn new(client: ApiClient, fixtures: Arc<Fixtures>) -> Self {
        Self { client, fixtures }
    }

    /// Dernières cotations, None si l'API est injoignable
    #[instrument(skip(self))]
    pub async fn load_latest(&self, period_days: u32) -> Option<LatestPrices> {
        match self.client.latest_prices(period_days).await {
            Ok(prices) => Some(prices),
            Err(e) => {
                warn!(error = ?e, "Latest prices unavailable, falling back to fixtures");
                None
            }
        }
    }

    /// Prix de la sparkline d'une carte
    ///
    /// Retourne (prix, synthétique). Un historique vide ou en erreur est
    /// remplacé par la sparkline générée.
    #[instrument(skip(self))]
    pub async fn load_sparkline(&self, name: &str, period_days: u32) -> (Vec<f64>, bool) {
        match self.client.stock_history(name, period_days).await {
            Ok(points) if !points.is_empty() => {
                (points.iter().map(|p| p.open_price).collect(), false)
            }
            Ok(_) => {
                debug!("Empty history, generating sparkline");
                (synthetic_sparkline(name), true)
            }
            Err(e) => {
                warn!(error = ?e, "Sparkline history unavailable, generating sparkline");
                (synthetic_sparkline(name), true)
            }
        }
    }

    /// Charge la vue détail d'une valeur
    ///
    /// Seul l'échec de l'historique est une erreur.
    #[instrument(skip(self, instrument), fields(stock = instrument.name))]
    pub async fn load_detail(&self, instrument: &'static Instrument, period_days: u32) -> Result<StockDetail> {
        let name = instrument.name;
        let (history, sentiment, correlation, articles) = tokio::join!(
            self.client.stock_history(name, period_days),
            self.client.sentiment_data(name, period_days),
            self.client.correlation_data(name),
            self.load_articles(instrument),
        );

        let history = history.with_context(|| format!("Historique indisponible pour {}", name))?;

        let sentiments = self.resolve_sentiments(instrument, &history, sentiment);
        let (forecast, gauge, correlation_context) = self.resolve_correlation(name, correlation);

        let series = series::assemble(
            &history,
            &forecast,
            sentiments.as_deref(),
            synthetic::seed_for(name),
        );

        info!(
            points = history.len(),
            forecast = forecast.len(),
            has_chart = series.is_some(),
            "Detail view loaded"
        );

        Ok(StockDetail {
            instrument,
            period_days,
            series,
            correlation: gauge,
            correlation_context,
            articles,
        })
    }

    /// Articles d'une valeur, avec repli sur la synthèse mensuelle
    #[instrument(skip(self, instrument), fields(stock = instrument.name))]
    pub async fn load_articles(&self, instrument: &Instrument) -> ArticlePanel {
        let api = self.client.articles_data(instrument.name).await;
        self.resolve_articles(instrument, api)
    }

    /// Choisit la source des articles : API, synthèse mensuelle, ou message
    fn resolve_articles(&self, instrument: &Instrument, api: Result<ArticlesData>) -> ArticlePanel {
        match api {
            Ok(data) if !data.has_no_articles() => ArticlePanel::from_data(&data),
            Ok(data) => match self
                .fixtures
                .monthly_articles(instrument.symbol)
                .filter(|monthly| !monthly.has_no_articles())
            {
                Some(mut monthly) => {
                    debug!("No article from API, using monthly synthesis");
                    if monthly.keywords.is_empty() {
                        monthly.keywords = data.keywords;
                    }
                    ArticlePanel::from_data(&monthly)
                }
                None => ArticlePanel::unavailable(),
            },
            Err(e) => {
                warn!(error = ?e, "Articles unavailable");
                ArticlePanel::load_error()
            }
        }
    }

    /// Sentiment aligné sur l'historique : API, sinon fixtures, sinon None
    /// (l'assembleur génère alors une marche aléatoire)
    fn resolve_sentiments(
        &self,
        instrument: &Instrument,
        history: &[PricePoint],
        api: Result<Vec<SentimentPoint>>,
    ) -> Option<Vec<f64>> {
        let dates: Vec<NaiveDate> = history.iter().map(|p| p.date).collect();

        match api {
            Ok(points) if !points.is_empty() => return Some(align_sentiments(&dates, &points)),
            Ok(_) => debug!("Empty sentiment data from API"),
            Err(e) => warn!(error = ?e, "Sentiment data unavailable"),
        }

        let from_fixtures = self.fixtures.sentiments_for(instrument.symbol, &dates);
        if from_fixtures.is_none() {
            debug!("No sentiment in fixtures, a synthetic walk will be used");
        }
        from_fixtures
    }

    /// Prévisions, jauge de corrélation et contexte du calcul
    fn resolve_correlation(
        &self,
        name: &str,
        api: Result<CorrelationData>,
    ) -> (Vec<ForecastPoint>, CorrelationGauge, Option<String>) {
        let fallback = self
            .fixtures
            .fake_stock(name)
            .and_then(|f| f.correlation)
            .unwrap_or(DEFAULT_CORRELATION);

        match api {
            Ok(data) => {
                let gauge = match data.mean_correlation {
                    Some(value) => CorrelationGauge::new(value, CorrelationSource::Api),
                    None => CorrelationGauge::new(fallback, CorrelationSource::Unavailable),
                };
                let context = correlation_context(&data);
                (data.forecast, gauge, context)
            }
            Err(e) => {
                warn!(error = ?e, "Correlation data unavailable");
                (Vec::new(), CorrelationGauge::new(fallback, CorrelationSource::LoadError), None)
            }
        }
    }
}

/// Ligne affichée sous la jauge : "Période 30j, au 2024-03-08, Δ sentiment +0.12"
///
/// None si l'API n'a fourni aucun de ces champs.
pub fn correlation_context(data: &CorrelationData) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(period) = data.period.as_deref().filter(|p| !p.trim().is_empty()) {
        parts.push(format!("Période {}", period));
    }
    if let Some(last_date) = data.last_date.as_deref().filter(|d| !d.trim().is_empty()) {
        parts.push(format!("au {}", last_date));
    }
    if let Some(delta) = data.last_sentiment_delta {
        parts.push(format!("Δ sentiment {:+.2}", delta));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn synthetic_sparkline(name: &str) -> Vec<f64> {
    synthetic::sparkline_prices(name, synthetic::SPARKLINE_POINTS, synthetic::seed_for(name))
}

/// Aligne les points de sentiment sur les dates de l'historique
///
/// Une date sans sentiment vaut 0.
pub fn align_sentiments(dates: &[NaiveDate], points: &[SentimentPoint]) -> Vec<f64> {
    let by_date: HashMap<NaiveDate, f64> = points.iter().map(|p| (p.date, p.sentiment)).collect();
    dates
        .iter()
        .map(|d| by_date.get(d).copied().unwrap_or(0.0))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures::{FAKE_DATA_FILE, GROUPED_SENTIMENT_FILE, MONTHLY_SYNTHESIS_FILE};
    use crate::config::Config;
    use crate::models::instrument::find;
    use std::path::PathBuf;
    use std::time::Duration;

    fn unreachable_client() -> ApiClient {
        let config = Config {
            api_base_url: "http://127.0.0.1:9".to_string(),
            http_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        ApiClient::new(&config).unwrap()
    }

    fn unreachable_loader() -> Loader {
        Loader::new(unreachable_client(), Arc::new(Fixtures::default()))
    }

    /// Loader dont les fixtures sont lues depuis des fichiers temporaires
    fn loader_with_files(name: &str, files: &[(&str, &str)]) -> Loader {
        let dir: PathBuf = std::env::temp_dir()
            .join(format!("cac40-loader-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            std::fs::write(dir.join(file), content).unwrap();
        }
        let fixtures = Fixtures::load(&dir);
        std::fs::remove_dir_all(&dir).ok();
        Loader::new(unreachable_client(), Arc::new(fixtures))
    }

    fn history(days: &[u32]) -> Vec<PricePoint> {
        days.iter()
            .map(|d| PricePoint { date: date(*d), open_price: 700.0 })
            .collect()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_align_sentiments_fills_missing_dates() {
        let points = vec![
            SentimentPoint { date: date(5), sentiment: 0.4, article_count: 2 },
            SentimentPoint { date: date(9), sentiment: -0.2, article_count: 1 },
        ];
        let aligned = align_sentiments(&[date(4), date(5), date(6)], &points);
        assert_eq!(aligned, vec![0.0, 0.4, 0.0]);
    }

    #[test]
    fn test_article_panel_from_partial_data() {
        let data = ArticlesData {
            positive: Some(ArticleSummary {
                title: Some("Hausse record".to_string()),
                url: Some("https://example.org/a".to_string()),
                description: Some("  ".to_string()),
                sentiment: Some(0.8),
            }),
            keywords: (0..15).map(|i| format!("mot{}", i)).collect(),
            ..Default::default()
        };

        let panel = ArticlePanel::from_data(&data);
        let positive = panel.entry(ArticleSlot::Positive).unwrap();
        assert_eq!(positive.title, "Hausse record");
        assert!(positive.description.is_none());

        let negative = panel.entry(ArticleSlot::Negative).unwrap();
        assert_eq!(negative.title, "Aucun article négatif disponible");
        assert!(negative.url.is_none());

        assert_eq!(panel.keywords.len(), MAX_KEYWORDS);
    }

    #[tokio::test]
    async fn test_articles_failure_shows_error_titles() {
        let loader = unreachable_loader();
        let panel = loader.load_articles(find("LVMH").unwrap()).await;

        assert_eq!(panel.entries.len(), 3);
        for entry in &panel.entries {
            assert_eq!(entry.title, "Erreur de chargement");
            assert_eq!(entry.description.as_deref(), Some("Impossible de charger les articles"));
        }
    }

    #[tokio::test]
    async fn test_detail_history_failure_is_an_error() {
        let loader = unreachable_loader();
        let result = loader.load_detail(find("Airbus").unwrap(), 30).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sparkline_falls_back_to_synthetic() {
        let loader = unreachable_loader();
        let (prices, synthetic) = loader.load_sparkline("Orange", 30).await;

        assert!(synthetic);
        assert_eq!(prices.len(), synthetic::SPARKLINE_POINTS);
        assert_eq!(prices, synthetic_sparkline("Orange"));
    }

    #[tokio::test]
    async fn test_latest_prices_failure_is_none() {
        let loader = unreachable_loader();
        assert!(loader.load_latest(30).await.is_none());
    }

    #[test]
    fn test_correlation_fallback_uses_default() {
        let loader = unreachable_loader();
        let (forecast, gauge, context) =
            loader.resolve_correlation("LVMH", Err(anyhow::anyhow!("boom")));
        assert!(forecast.is_empty());
        assert_eq!(gauge.value, DEFAULT_CORRELATION);
        assert_eq!(gauge.source, CorrelationSource::LoadError);
        assert!(context.is_none());

        let (_, gauge, _) = loader.resolve_correlation("LVMH", Ok(CorrelationData::default()));
        assert_eq!(gauge.source, CorrelationSource::Unavailable);
    }

    #[test]
    fn test_correlation_fallback_uses_fake_data() {
        let loader = loader_with_files(
            "correlation",
            &[(FAKE_DATA_FILE, r#"{"LVMH": {"current_price": 700.0, "correlation": -0.35}}"#)],
        );

        let (_, gauge, _) = loader.resolve_correlation("LVMH", Ok(CorrelationData::default()));
        assert_eq!(gauge.value, -0.35);
        assert_eq!(gauge.source, CorrelationSource::Unavailable);

        let (_, gauge, _) = loader.resolve_correlation("LVMH", Err(anyhow::anyhow!("timeout")));
        assert_eq!(gauge.value, -0.35);
        assert_eq!(gauge.source, CorrelationSource::LoadError);

        // Valeur sans corrélation dans la fixture : défaut
        let (_, gauge, _) = loader.resolve_correlation("Kering", Ok(CorrelationData::default()));
        assert_eq!(gauge.value, DEFAULT_CORRELATION);
    }

    #[test]
    fn test_correlation_from_api_keeps_context() {
        let loader = unreachable_loader();
        let data = CorrelationData {
            mean_correlation: Some(0.21),
            period: Some("30j".to_string()),
            last_date: Some("2024-03-08".to_string()),
            last_sentiment_delta: Some(0.1234),
            ..Default::default()
        };

        let (_, gauge, context) = loader.resolve_correlation("LVMH", Ok(data));
        assert_eq!(gauge.value, 0.21);
        assert_eq!(gauge.source, CorrelationSource::Api);
        assert_eq!(
            context.as_deref(),
            Some("Période 30j, au 2024-03-08, Δ sentiment +0.12")
        );
    }

    #[test]
    fn test_correlation_context_partial_and_empty() {
        let data = CorrelationData {
            last_date: Some("2024-03-08".to_string()),
            period: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(correlation_context(&data).as_deref(), Some("au 2024-03-08"));
        assert!(correlation_context(&CorrelationData::default()).is_none());
    }

    #[test]
    fn test_empty_articles_use_monthly_synthesis() {
        let loader = loader_with_files(
            "monthly",
            &[(
                MONTHLY_SYNTHESIS_FILE,
                r#"[{"ticker": "MC.PA",
                     "article_plus_positif": {"title": "Record", "url": "https://example.org/r"},
                     "sentiment_moyen": 0.3,
                     "nb_articles": 12}]"#,
            )],
        );
        let lvmh = find("LVMH").unwrap();
        let api = ArticlesData {
            keywords: vec!["luxe".to_string(), "ventes".to_string()],
            ..Default::default()
        };

        let panel = loader.resolve_articles(lvmh, Ok(api));

        assert_eq!(panel.entry(ArticleSlot::Positive).unwrap().title, "Record");
        assert_eq!(
            panel.entry(ArticleSlot::Negative).unwrap().title,
            "Aucun article négatif disponible"
        );
        // La synthèse n'a pas de mots-clés : ceux de l'API sont repris
        assert_eq!(panel.keywords, vec!["luxe", "ventes"]);
        assert_eq!(panel.monthly_sentiment, Some(0.3));
        assert_eq!(panel.article_count, Some(12));
    }

    #[test]
    fn test_empty_articles_without_synthesis_are_unavailable() {
        let loader = unreachable_loader();
        let panel = loader.resolve_articles(find("LVMH").unwrap(), Ok(ArticlesData::default()));

        assert_eq!(panel, ArticlePanel::unavailable());
        for entry in &panel.entries {
            assert_eq!(entry.title, "Aucun article disponible");
            assert_eq!(
                entry.description.as_deref(),
                Some("Données d'articles non disponibles pour cette action")
            );
            assert!(entry.url.is_none());
        }
    }

    #[test]
    fn test_articles_from_api_win_over_synthesis() {
        let loader = loader_with_files(
            "api-articles",
            &[(MONTHLY_SYNTHESIS_FILE, r#"[{"ticker": "MC.PA", "article_random": {"title": "Ancien"}}]"#)],
        );
        let api = ArticlesData {
            random: Some(ArticleSummary {
                title: Some("Récent".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let panel = loader.resolve_articles(find("LVMH").unwrap(), Ok(api));
        assert_eq!(panel.entry(ArticleSlot::Random).unwrap().title, "Récent");
    }

    #[test]
    fn test_sentiments_fall_back_to_grouped_fixture() {
        let loader = loader_with_files(
            "sentiment",
            &[(
                GROUPED_SENTIMENT_FILE,
                r#"[{"ticker": "MC.PA", "published_date": "2024-03-04", "sentiment_score_mean": 0.6, "nb_articles": 3}]"#,
            )],
        );
        let lvmh = find("LVMH").unwrap();
        let prices = history(&[1, 4, 5]);

        // 1er mars : rien dans les 7 jours précédents ; 5 mars : repris du 4
        let from_empty = loader.resolve_sentiments(lvmh, &prices, Ok(Vec::new()));
        assert_eq!(from_empty, Some(vec![0.0, 0.6, 0.6]));

        let from_error = loader.resolve_sentiments(lvmh, &prices, Err(anyhow::anyhow!("down")));
        assert_eq!(from_error, from_empty);
    }

    #[test]
    fn test_sentiments_without_any_source_are_none() {
        let loader = unreachable_loader();
        let lvmh = find("LVMH").unwrap();

        assert!(loader.resolve_sentiments(lvmh, &history(&[4, 5]), Ok(Vec::new())).is_none());
    }

    #[test]
    fn test_sentiments_from_api_are_aligned() {
        let loader = unreachable_loader();
        let points = vec![SentimentPoint { date: date(5), sentiment: -0.4, article_count: 1 }];

        let aligned = loader.resolve_sentiments(find("LVMH").unwrap(), &history(&[4, 5]), Ok(points));
        assert_eq!(aligned, Some(vec![0.0, -0.4]));
    }
}
