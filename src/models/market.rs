// ============================================================================
// Données de marché : prix, sentiment, prévisions, articles
// ============================================================================
// Structures produites par le chargeur de données (API ou fixtures) et
// consommées par l'assembleur de séries et le rendu
//
// CONCEPTS RUST :
// 1. Option<T> partout où l'API peut omettre un champ : un champ manquant
//    devient None, jamais une erreur
// 2. #[serde(default)] / #[serde(rename)] pour coller au JSON de l'API
// 3. NaiveDate : date calendaire sans fuseau horaire
// ============================================================================

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Un prix d'ouverture journalier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open_price: f64,
}

/// Score de sentiment moyen d'une journée, dans [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub date: NaiveDate,
    pub sentiment: f64,
    /// Nombre d'articles agrégés (0 si l'API ne le fournit pas)
    #[serde(default, rename = "nb_articles")]
    pub article_count: u32,
}

/// Prix prédit à un horizon donné (en jours calendaires)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "horizon")]
    pub horizon_days: u32,
    pub predicted_price: f64,
}

/// Dernière cotation d'une valeur, calculée par l'API sur la période demandée
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestQuote {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub last_price: Option<f64>,
    /// Variation en pourcentage entre le début et la fin de la période
    #[serde(default)]
    pub price_change: Option<f64>,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// Dernières cotations indexées par nom de valeur
pub type LatestPrices = HashMap<String, LatestQuote>;

/// Corrélation sentiment / rendement et prévisions associées
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationData {
    pub mean_correlation: Option<f64>,
    pub period: Option<String>,
    pub last_date: Option<String>,
    pub forecast: Vec<ForecastPoint>,
    pub last_sentiment_delta: Option<f64>,
}

/// Les trois emplacements d'articles affichés dans la vue détail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticleSlot {
    /// Article le plus positif
    Positive,
    /// Article le plus négatif
    Negative,
    /// Article pris au hasard
    Random,
}

impl ArticleSlot {
    pub const ALL: [ArticleSlot; 3] = [ArticleSlot::Positive, ArticleSlot::Negative, ArticleSlot::Random];

    pub fn label(&self) -> &'static str {
        match self {
            ArticleSlot::Positive => "Le plus positif",
            ArticleSlot::Negative => "Le plus négatif",
            ArticleSlot::Random => "Au hasard",
        }
    }

    /// Texte affiché quand l'emplacement est vide
    pub fn empty_title(&self) -> &'static str {
        match self {
            ArticleSlot::Positive => "Aucun article positif disponible",
            ArticleSlot::Negative => "Aucun article négatif disponible",
            ArticleSlot::Random => "Aucun article aléatoire disponible",
        }
    }

    /// Emplacement à partir de sa position (0, 1, 2)
    pub fn from_index(index: usize) -> Option<ArticleSlot> {
        Self::ALL.get(index).copied()
    }
}

/// Résumé d'un article de presse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sentiment: Option<f64>,
}

impl ArticleSummary {
    /// Description non vide, sinon None
    pub fn visible_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Articles et mots-clés d'une valeur
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticlesData {
    pub positive: Option<ArticleSummary>,
    pub negative: Option<ArticleSummary>,
    pub random: Option<ArticleSummary>,
    pub keywords: Vec<String>,
    pub monthly_sentiment: Option<f64>,
    pub article_count: Option<u32>,
}

impl ArticlesData {
    pub fn get(&self, slot: ArticleSlot) -> Option<&ArticleSummary> {
        match slot {
            ArticleSlot::Positive => self.positive.as_ref(),
            ArticleSlot::Negative => self.negative.as_ref(),
            ArticleSlot::Random => self.random.as_ref(),
        }
    }

    /// Vrai si aucun des trois emplacements n'est renseigné
    pub fn has_no_articles(&self) -> bool {
        ArticleSlot::ALL.iter().all(|slot| self.get(*slot).is_none())
    }
}

/// Ligne du fichier de données fictives (fake_data.json)
///
/// Sert de secours pour le prix d'une carte et pour la corrélation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FakeStock {
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub projected_price: Option<f64>,
    #[serde(default)]
    pub projection_change: Option<f64>,
    #[serde(default)]
    pub correlation: Option<f64>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sector: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_point_without_count() {
        let point: SentimentPoint =
            serde_json::from_str(r#"{"date": "2024-03-04", "sentiment": 0.4}"#).unwrap();
        assert_eq!(point.article_count, 0);
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn test_forecast_point_renames_horizon() {
        let point: ForecastPoint =
            serde_json::from_str(r#"{"horizon": 3, "predicted_price": 101.5}"#).unwrap();
        assert_eq!(point.horizon_days, 3);
    }

    #[test]
    fn test_visible_description_ignores_blank() {
        let article = ArticleSummary {
            description: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(article.visible_description().is_none());
    }

    #[test]
    fn test_has_no_articles() {
        let mut data = ArticlesData::default();
        assert!(data.has_no_articles());
        data.random = Some(ArticleSummary::default());
        assert!(!data.has_no_articles());
    }
}
