// ============================================================================
// Fixtures : fichiers JSON statiques de secours
// ============================================================================
// Trois fichiers, lus une seule fois au démarrage depuis CAC40_FIXTURES_DIR :
// - fake_data.json                : données fictives par nom de valeur
// - articles_epures_groupes.json  : sentiment moyen par ticker et par jour
// - synthese_cac40_mensuelle.json : synthèse mensuelle d'articles par ticker
//
// Un fichier absent ou invalide n'est pas une erreur fatale : il est
// remplacé par des données générées (fake data) ou par une table vide.
// ============================================================================

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::{ArticleSummary, ArticlesData, FakeStock, Instrument, CAC40};
use crate::synthetic;

pub const FAKE_DATA_FILE: &str = "fake_data.json";
pub const GROUPED_SENTIMENT_FILE: &str = "articles_epures_groupes.json";
pub const MONTHLY_SYNTHESIS_FILE: &str = "synthese_cac40_mensuelle.json";

/// Nombre de jours remontés pour trouver un sentiment à une date donnée
const SENTIMENT_LOOKBACK_DAYS: i64 = 7;

/// Ligne de articles_epures_groupes.json
#[derive(Debug, Deserialize)]
struct GroupedSentimentRow {
    ticker: String,
    published_date: String,
    #[serde(default)]
    sentiment_score_mean: Option<f64>,
    #[serde(default)]
    nb_articles: Option<u32>,
}

/// Ligne de synthese_cac40_mensuelle.json
#[derive(Debug, Clone, Deserialize)]
struct MonthlySynthesis {
    ticker: String,
    #[serde(default)]
    article_plus_positif: Option<ArticleSummary>,
    #[serde(default)]
    article_plus_negatif: Option<ArticleSummary>,
    #[serde(default)]
    article_random: Option<ArticleSummary>,
    #[serde(default)]
    sentiment_moyen: Option<f64>,
    #[serde(default)]
    nb_articles: Option<u32>,
    #[serde(default)]
    mots_cles_frequents: Vec<String>,
}

/// Sentiment journalier issu des fixtures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySentiment {
    pub sentiment: f64,
    pub article_count: u32,
}

/// Données statiques chargées au démarrage
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    fake_data: HashMap<String, FakeStock>,
    sentiment_by_ticker: HashMap<String, BTreeMap<NaiveDate, DailySentiment>>,
    monthly_by_ticker: HashMap<String, MonthlySynthesis>,
}

impl Fixtures {
    /// Charge les trois fichiers depuis `dir`
    pub fn load(dir: &Path) -> Self {
        let fake_data = match read_json::<HashMap<String, FakeStock>>(&dir.join(FAKE_DATA_FILE)) {
            Ok(data) => {
                info!(stocks = data.len(), "Fake data fixture loaded");
                data
            }
            Err(e) => {
                warn!(error = ?e, "Fake data fixture unavailable, generating defaults");
                generate_fake_data(CAC40)
            }
        };

        let sentiment_by_ticker =
            match read_json::<Vec<GroupedSentimentRow>>(&dir.join(GROUPED_SENTIMENT_FILE)) {
                Ok(rows) => group_sentiment(rows),
                Err(e) => {
                    warn!(error = ?e, "Grouped sentiment fixture unavailable");
                    HashMap::new()
                }
            };

        let monthly_by_ticker =
            match read_json::<Vec<MonthlySynthesis>>(&dir.join(MONTHLY_SYNTHESIS_FILE)) {
                Ok(rows) => rows.into_iter().map(|row| (row.ticker.clone(), row)).collect(),
                Err(e) => {
                    warn!(error = ?e, "Monthly synthesis fixture unavailable");
                    HashMap::new()
                }
            };

        Self {
            fake_data,
            sentiment_by_ticker,
            monthly_by_ticker,
        }
    }

    /// Données fictives d'une valeur
    pub fn fake_stock(&self, name: &str) -> Option<&FakeStock> {
        self.fake_data.get(name)
    }

    /// Sentiment d'un ticker à une date, en remontant jusqu'à 7 jours
    pub fn sentiment_on(&self, ticker: &str, date: NaiveDate) -> Option<DailySentiment> {
        let by_date = self.sentiment_by_ticker.get(ticker)?;
        (0..=SENTIMENT_LOOKBACK_DAYS)
            .map(|back| date - Duration::days(back))
            .find_map(|day| by_date.get(&day).copied())
    }

    /// Sentiments alignés sur `dates`
    ///
    /// None si le ticker est inconnu ou si aucune date n'a de sentiment ;
    /// sinon 0 pour les dates sans donnée.
    pub fn sentiments_for(&self, ticker: &str, dates: &[NaiveDate]) -> Option<Vec<f64>> {
        let found: Vec<Option<DailySentiment>> =
            dates.iter().map(|d| self.sentiment_on(ticker, *d)).collect();

        if found.iter().all(Option::is_none) {
            return None;
        }
        Some(found.into_iter().map(|s| s.map(|s| s.sentiment).unwrap_or(0.0)).collect())
    }

    /// Articles de la synthèse mensuelle d'un ticker
    pub fn monthly_articles(&self, ticker: &str) -> Option<ArticlesData> {
        let row = self.monthly_by_ticker.get(ticker)?;
        Some(ArticlesData {
            positive: row.article_plus_positif.clone(),
            negative: row.article_plus_negatif.clone(),
            random: row.article_random.clone(),
            keywords: row.mots_cles_frequents.clone(),
            monthly_sentiment: row.sentiment_moyen,
            article_count: row.nb_articles,
        })
    }
}

/// Données fictives seedées pour tout le catalogue
fn generate_fake_data(catalog: &[Instrument]) -> HashMap<String, FakeStock> {
    catalog
        .iter()
        .map(|instrument| {
            let seed = synthetic::seed_for(instrument.name);
            (instrument.name.to_string(), synthetic::fake_stock(instrument, seed))
        })
        .collect()
}

/// Regroupe les lignes par ticker puis par date
fn group_sentiment(rows: Vec<GroupedSentimentRow>) -> HashMap<String, BTreeMap<NaiveDate, DailySentiment>> {
    let mut grouped: HashMap<String, BTreeMap<NaiveDate, DailySentiment>> = HashMap::new();
    let mut skipped = 0usize;

    for row in rows {
        // Les dates peuvent contenir une heure : seuls les 10 premiers caractères comptent
        let date = row
            .published_date
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        match (date, row.sentiment_score_mean) {
            (Some(date), Some(sentiment)) => {
                grouped.entry(row.ticker).or_default().insert(
                    date,
                    DailySentiment {
                        sentiment: sentiment.clamp(-1.0, 1.0),
                        article_count: row.nb_articles.unwrap_or(0),
                    },
                );
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped grouped sentiment rows with missing data");
    }
    grouped
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Lecture impossible de {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("JSON invalide dans {}", path.display()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cac40-fixtures-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_directory_generates_fake_data() {
        let fixtures = Fixtures::load(Path::new("/nonexistent/cac40/fixtures"));

        assert!(fixtures.fake_stock("LVMH").is_some());
        assert!(fixtures.fake_stock("Unknown").is_none());
        assert!(fixtures.monthly_articles("MC.PA").is_none());
        assert!(fixtures.sentiment_on("MC.PA", date(2024, 3, 4)).is_none());
    }

    #[test]
    fn test_sentiment_lookback() {
        let rows = vec![
            GroupedSentimentRow {
                ticker: "MC.PA".to_string(),
                published_date: "2024-03-01T09:30:00".to_string(),
                sentiment_score_mean: Some(0.5),
                nb_articles: Some(4),
            },
            GroupedSentimentRow {
                ticker: "MC.PA".to_string(),
                published_date: "bad".to_string(),
                sentiment_score_mean: Some(0.9),
                nb_articles: None,
            },
        ];
        let fixtures = Fixtures {
            sentiment_by_ticker: group_sentiment(rows),
            ..Default::default()
        };

        // Trouvé le jour même et jusqu'à 7 jours après
        assert_eq!(fixtures.sentiment_on("MC.PA", date(2024, 3, 1)).unwrap().article_count, 4);
        assert_eq!(fixtures.sentiment_on("MC.PA", date(2024, 3, 8)).unwrap().sentiment, 0.5);
        assert!(fixtures.sentiment_on("MC.PA", date(2024, 3, 9)).is_none());

        let aligned = fixtures
            .sentiments_for("MC.PA", &[date(2024, 2, 28), date(2024, 3, 2)])
            .unwrap();
        assert_eq!(aligned, vec![0.0, 0.5]);
        assert!(fixtures.sentiments_for("MC.PA", &[date(2023, 1, 1)]).is_none());
    }

    #[test]
    fn test_load_from_files() {
        let dir = temp_dir("load");
        fs::write(
            dir.join(FAKE_DATA_FILE),
            r#"{"LVMH": {"current_price": 700.0, "projection_change": 2.0, "correlation": 0.4}}"#,
        )
        .unwrap();
        fs::write(
            dir.join(MONTHLY_SYNTHESIS_FILE),
            r#"[{"ticker": "MC.PA",
                 "article_plus_positif": {"title": "Record", "description": "Ventes en hausse"},
                 "mots_cles_frequents": ["luxe", "ventes"],
                 "sentiment_moyen": 0.3}]"#,
        )
        .unwrap();

        let fixtures = Fixtures::load(&dir);

        assert_eq!(fixtures.fake_stock("LVMH").unwrap().correlation, Some(0.4));
        // fake_data.json présent : pas de génération pour les autres valeurs
        assert!(fixtures.fake_stock("Kering").is_none());

        let articles = fixtures.monthly_articles("MC.PA").unwrap();
        assert_eq!(articles.positive.unwrap().title.as_deref(), Some("Record"));
        assert!(articles.negative.is_none());
        assert_eq!(articles.keywords.len(), 2);

        fs::remove_dir_all(&dir).ok();
    }
}
