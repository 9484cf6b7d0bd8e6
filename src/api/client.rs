// ============================================================================
// API Client : serveur de données CAC40
// ============================================================================
// Récupère prix, historique, sentiment, articles et corrélations depuis
// l'API HTTP configurée (CAC40_API_URL)
//
// CONCEPTS RUST :
// 1. async/await : requêtes non-bloquantes
// 2. Generics + DeserializeOwned : une seule fonction get_json pour tous
//    les endpoints
// 3. Serde : structures privées qui collent au JSON de l'API, converties
//    ensuite en structures du domaine (models)
// ============================================================================

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::models::{
    ArticleSummary, ArticlesData, CorrelationData, ForecastPoint, LatestPrices, PricePoint,
    SentimentPoint,
};

// ============================================================================
// Structures pour parser les réponses JSON
// ============================================================================
// Tous les champs sont tolérants : un champ absent donne une valeur vide
// plutôt qu'une erreur de parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct LatestPricesResponse {
    #[serde(default)]
    stocks: LatestPrices,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    open_prices: Vec<RawPricePoint>,
}

#[derive(Debug, Deserialize)]
struct RawPricePoint {
    date: Option<NaiveDate>,
    open_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    #[serde(default)]
    sentiment_data: Vec<RawSentimentPoint>,
}

#[derive(Debug, Deserialize)]
struct RawSentimentPoint {
    date: Option<NaiveDate>,
    sentiment: Option<f64>,
    #[serde(default)]
    nb_articles: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    #[serde(default)]
    articles: Option<ArticlesBlock>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    monthly_sentiment: Option<f64>,
    #[serde(default)]
    nb_articles: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ArticlesBlock {
    #[serde(default)]
    positive: Option<ArticleSummary>,
    #[serde(default)]
    negative: Option<ArticleSummary>,
    #[serde(default)]
    random: Option<ArticleSummary>,
}

#[derive(Debug, Deserialize)]
struct CorrelationResponse {
    #[serde(default)]
    correlation: Option<CorrelationBlock>,
    #[serde(default)]
    forecast: Vec<ForecastPoint>,
    #[serde(default)]
    last_sentiment_delta: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CorrelationBlock {
    #[serde(default)]
    mean_correlation: Option<f64>,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    last_date: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Client de l'API de données
///
/// CONCEPT RUST : Clone bon marché
/// - reqwest::Client contient un Arc interne
/// - Cloner ApiClient partage le même pool de connexions entre les tâches
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Crée un client à partir de la configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cac40-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(config.http_timeout)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Dernières cotations de toutes les valeurs sur `period_days` jours
    #[instrument(skip(self))]
    pub async fn latest_prices(&self, period_days: u32) -> Result<LatestPrices> {
        let days = period_days.to_string();
        let response: LatestPricesResponse = self
            .get_json("get_latest_cac40_prices", &[("period_days", days.as_str())])
            .await?;

        info!(stocks = response.stocks.len(), "Latest prices fetched");
        Ok(response.stocks)
    }

    /// Historique des prix d'ouverture d'une valeur
    #[instrument(skip(self))]
    pub async fn stock_history(&self, stock: &str, days: u32) -> Result<Vec<PricePoint>> {
        let days = days.to_string();
        let response: HistoryResponse = self
            .get_json("get_stock_history", &[("stock", stock), ("days", days.as_str())])
            .await?;

        let total = response.open_prices.len();
        let mut points: Vec<PricePoint> = response
            .open_prices
            .into_iter()
            .filter_map(|raw| match (raw.date, raw.open_price) {
                (Some(date), Some(open_price)) => Some(PricePoint { date, open_price }),
                _ => None,
            })
            .collect();
        points.sort_by_key(|p| p.date);

        if points.len() < total {
            warn!(skipped = total - points.len(), total, "Skipped price points with missing data");
        }

        debug!(points = points.len(), "Stock history parsed");
        Ok(points)
    }

    /// Sentiment journalier d'une valeur
    #[instrument(skip(self))]
    pub async fn sentiment_data(&self, stock_name: &str, days: u32) -> Result<Vec<SentimentPoint>> {
        let days = days.to_string();
        let response: SentimentResponse = self
            .get_json(
                "get_sentiment_data",
                &[("stock_name", stock_name), ("days", days.as_str())],
            )
            .await?;

        let points: Vec<SentimentPoint> = response
            .sentiment_data
            .into_iter()
            .filter_map(|raw| {
                let date = raw.date?;
                let sentiment = raw.sentiment?;
                Some(SentimentPoint {
                    date,
                    sentiment: sentiment.clamp(-1.0, 1.0),
                    article_count: raw.nb_articles.unwrap_or(0),
                })
            })
            .collect();

        debug!(points = points.len(), "Sentiment data parsed");
        Ok(points)
    }

    /// Articles (positif, négatif, aléatoire) et mots-clés d'une valeur
    #[instrument(skip(self))]
    pub async fn articles_data(&self, stock_name: &str) -> Result<ArticlesData> {
        let response: ArticlesResponse = self
            .get_json("get_articles_data", &[("stock_name", stock_name)])
            .await?;

        let (positive, negative, random) = match response.articles {
            Some(block) => (block.positive, block.negative, block.random),
            None => (None, None, None),
        };

        Ok(ArticlesData {
            positive,
            negative,
            random,
            keywords: response.keywords,
            monthly_sentiment: response.monthly_sentiment,
            article_count: response.nb_articles,
        })
    }

    /// Corrélation sentiment / rendement et prévisions
    #[instrument(skip(self))]
    pub async fn correlation_data(&self, stock_name: &str) -> Result<CorrelationData> {
        let response: CorrelationResponse = self
            .get_json("get_correlation_data", &[("stock_name", stock_name)])
            .await?;

        let mut data = CorrelationData {
            forecast: response.forecast,
            last_sentiment_delta: response.last_sentiment_delta,
            ..Default::default()
        };
        if let Some(block) = response.correlation {
            data.mean_correlation = block.mean_correlation;
            data.period = block.period;
            data.last_date = block.last_date;
        }
        data.forecast.sort_by_key(|f| f.horizon_days);

        Ok(data)
    }

    /// Envoie une requête GET et désérialise la réponse JSON
    ///
    /// Retourne une erreur pour toute réponse HTTP hors 2xx.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = build_url(&self.base_url, path, params)?;
        debug!(url = %url, "Sending HTTP request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers {}", path))?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, endpoint = path, "API returned error status");
            anyhow::bail!("L'API a retourné une erreur : HTTP {}", status);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Échec du parsing JSON de {}", path))
    }
}

/// Construit l'URL complète d'un endpoint, paramètres encodés
fn build_url(base_url: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), path);
    Url::parse_with_params(&raw, params).with_context(|| format!("URL invalide : {}", raw))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_names() {
        let url = build_url(
            "http://127.0.0.1:9000/",
            "get_stock_history",
            &[("stock", "Crédit Agricole"), ("days", "30")],
        )
        .unwrap();

        let text = url.as_str();
        assert!(text.starts_with("http://127.0.0.1:9000/get_stock_history?"));
        assert!(text.contains("stock=Cr%C3%A9dit+Agricole"));
        assert!(text.contains("days=30"));
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(build_url("not a url", "x", &[]).is_err());
    }

    #[test]
    fn test_parse_latest_prices() {
        let json = r#"{
            "total_stocks": 2,
            "stocks": {
                "LVMH": {"symbol": "MC.PA", "last_price": 702.1, "price_change": 1.5, "last_update": "2024-03-08"},
                "Kering": {"symbol": "KER.PA"}
            }
        }"#;
        let response: LatestPricesResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.stocks["LVMH"].price_change, Some(1.5));
        assert_eq!(response.stocks["Kering"].last_price, None);
    }

    #[test]
    fn test_parse_correlation() {
        let json = r#"{
            "correlation": {"mean_correlation": 0.21, "period": "30d"},
            "forecast": [{"horizon": 3, "predicted_price": 12.0}, {"horizon": 1, "predicted_price": 11.0}]
        }"#;
        let response: CorrelationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.correlation.unwrap().mean_correlation, Some(0.21));
        assert_eq!(response.forecast.len(), 2);
    }

    #[test]
    fn test_parse_articles_without_block() {
        let response: ArticlesResponse = serde_json::from_str(r#"{"keywords": ["bourse"]}"#).unwrap();
        assert!(response.articles.is_none());
        assert_eq!(response.keywords, vec!["bourse".to_string()]);
    }

    // Port 9 (discard) : connexion refusée, l'erreur doit remonter sans panic
    #[tokio::test]
    async fn test_unreachable_api_returns_error() {
        let config = Config {
            api_base_url: "http://127.0.0.1:9".to_string(),
            http_timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();

        assert!(client.latest_prices(2).await.is_err());
        assert!(client.stock_history("LVMH", 30).await.is_err());
    }
}
