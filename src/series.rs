// ============================================================================
// Assembleur de séries
// ============================================================================
// Combine historique de prix, prévisions et sentiment en une seule série
// prête à afficher, sur un axe de valeurs commun
//
// ALGORITHME :
// 1. Plage : min / max sur historique + prévisions
// 2. Marge : 5% de (max - min) de chaque côté
// 3. Sentiment [-1, 1] projeté sur [min, max] (plage sans marge) :
//    scale = (max - min) / 2, offset = min + scale, valeur = offset + s * scale
// 4. Axe X : dates historiques ("3 mars") puis horizons ("+3j")
// 5. Alignement : l'historique est complété par des None sur la partie
//    prévision, et inversement
// 6. Pas de prévision fournie : prévision synthétique (tendance constante)
// 7. Pas de sentiment fourni : marche aléatoire synthétique
//
// Plage plate (max == min) : demi-plage plancher de max(|prix| * 1%, 0.01)
// pour la marge et pour l'échelle du sentiment.
// ============================================================================

use chrono::{Datelike, NaiveDate};

use crate::models::{ForecastPoint, PricePoint};
use crate::synthetic;

/// Marge du graphique détaillé (5%)
pub const CHART_MARGIN_RATIO: f64 = 0.05;

/// Marge des sparklines (10%)
pub const SPARKLINE_MARGIN_RATIO: f64 = 0.10;

/// Hauteur maximale d'un point de sparkline
pub const SPARKLINE_MAX_HEIGHT: u64 = 100;

/// Abréviations françaises des mois
const MONTHS_FR: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.", "déc.",
];

/// Bornes de l'axe des valeurs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartRange {
    /// Plus petit prix (historique + prévisions)
    pub min_price: f64,
    /// Plus grand prix (historique + prévisions)
    pub max_price: f64,
    /// Borne basse de l'axe, marge incluse
    pub chart_min: f64,
    /// Borne haute de l'axe, marge incluse
    pub chart_max: f64,
    /// Demi-amplitude utilisée pour projeter le sentiment
    pub sentiment_scale: f64,
    /// Centre de la plage sans marge
    pub sentiment_offset: f64,
}

impl ChartRange {
    /// Calcule la plage d'un ensemble de prix (valeurs non finies ignorées)
    ///
    /// None si aucun prix n'est exploitable.
    pub fn from_prices<I>(prices: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min_price, max_price) = prices
            .into_iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, p| match acc {
                None => Some((p, p)),
                Some((min, max)) => Some((min.min(p), max.max(p))),
            })?;

        let (margin, scale) = if max_price > min_price {
            let range = max_price - min_price;
            (range * CHART_MARGIN_RATIO, range / 2.0)
        } else {
            let floor = flat_half_range(min_price);
            (floor, floor)
        };

        Some(Self {
            min_price,
            max_price,
            chart_min: min_price - margin,
            chart_max: max_price + margin,
            sentiment_scale: scale,
            sentiment_offset: (min_price + max_price) / 2.0,
        })
    }

    /// Projette un sentiment [-1, 1] sur l'échelle des prix
    pub fn sentiment_to_price(&self, sentiment: f64) -> f64 {
        self.sentiment_offset + sentiment.clamp(-1.0, 1.0) * self.sentiment_scale
    }
}

/// Demi-plage plancher d'une série plate
fn flat_half_range(price: f64) -> f64 {
    (price.abs() * 0.01).max(0.01)
}

/// Série prête à afficher
///
/// Reconstruite à chaque rendu du graphique.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySeries {
    /// Axe X : dates historiques puis horizons de prévision
    pub labels: Vec<String>,
    /// Prix historiques, None sur la partie prévision
    pub historical_prices: Vec<Option<f64>>,
    /// Prix prévus, None sur la partie historique
    pub forecast_prices: Vec<Option<f64>>,
    /// Sentiment projeté sur l'échelle des prix (un point par date historique)
    pub sentiment_as_price: Vec<f64>,
    /// Sentiment brut aligné sur l'historique
    pub sentiments: Vec<f64>,
    pub range: ChartRange,
    /// Vrai si les prévisions viennent du générateur de secours
    pub forecast_synthetic: bool,
    /// Vrai si le sentiment vient du générateur de secours
    pub sentiment_synthetic: bool,
}

impl DisplaySeries {
    /// Nombre de points historiques
    pub fn history_len(&self) -> usize {
        self.sentiments.len()
    }

    /// Vrai si le dernier prix historique est >= au premier
    pub fn is_uptrend(&self) -> bool {
        let mut prices = self.historical_prices.iter().flatten();
        match (prices.next(), prices.last()) {
            (Some(first), Some(last)) => last >= first,
            _ => true,
        }
    }

    /// Points (index, prix) de l'historique
    pub fn historical_points(&self) -> Vec<(f64, f64)> {
        indexed_points(&self.historical_prices)
    }

    /// Points (index, prix) des prévisions
    pub fn forecast_points(&self) -> Vec<(f64, f64)> {
        indexed_points(&self.forecast_prices)
    }

    /// Points (index, sentiment projeté)
    pub fn sentiment_points(&self) -> Vec<(f64, f64)> {
        self.sentiment_as_price
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect()
    }

    /// Sentiment moyen de la période (None si vide)
    pub fn mean_sentiment(&self) -> Option<f64> {
        if self.sentiments.is_empty() {
            return None;
        }
        Some(self.sentiments.iter().sum::<f64>() / self.sentiments.len() as f64)
    }
}

fn indexed_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect()
}

/// Assemble la série du graphique détaillé
///
/// - `forecast` vide : prévision synthétique seedée par `seed`
/// - `sentiments` None : marche aléatoire seedée par `seed` ; sinon la
///   séquence est alignée sur l'historique (complétée par 0 ou tronquée)
///
/// Retourne None si aucun prix n'est disponible (état "pas de données").
pub fn assemble(
    history: &[PricePoint],
    forecast: &[ForecastPoint],
    sentiments: Option<&[f64]>,
    seed: u64,
) -> Option<DisplaySeries> {
    let prices: Vec<f64> = history.iter().map(|p| p.open_price).collect();

    // Prévisions : API, sinon tendance synthétique
    let forecast_synthetic = forecast.is_empty();
    let (forecast_values, forecast_labels): (Vec<f64>, Vec<String>) = if forecast_synthetic {
        let values = synthetic::forecast_prices(&prices, seed);
        let labels = match history.last() {
            Some(last) => synthetic::forecast_dates(last.date, values.len())
                .into_iter()
                .map(short_date_label)
                .collect(),
            None => Vec::new(),
        };
        (values, labels)
    } else {
        forecast
            .iter()
            .map(|f| (f.predicted_price, horizon_label(f.horizon_days)))
            .unzip()
    };

    let range = ChartRange::from_prices(prices.iter().chain(forecast_values.iter()).copied())?;

    // Sentiment aligné index par index sur l'historique
    let sentiment_synthetic = sentiments.is_none();
    let sentiments: Vec<f64> = match sentiments {
        Some(values) => (0..history.len())
            .map(|i| values.get(i).copied().unwrap_or(0.0).clamp(-1.0, 1.0))
            .collect(),
        None => synthetic::sentiment_walk(history.len(), seed),
    };
    let sentiment_as_price = sentiments.iter().map(|s| range.sentiment_to_price(*s)).collect();

    let labels = history
        .iter()
        .map(|p| short_date_label(p.date))
        .chain(forecast_labels)
        .collect();

    let historical_prices = prices
        .iter()
        .map(|p| Some(*p))
        .chain(std::iter::repeat(None).take(forecast_values.len()))
        .collect();
    let forecast_prices = std::iter::repeat(None)
        .take(prices.len())
        .chain(forecast_values.iter().map(|p| Some(*p)))
        .collect();

    Some(DisplaySeries {
        labels,
        historical_prices,
        forecast_prices,
        sentiment_as_price,
        sentiments,
        range,
        forecast_synthetic,
        sentiment_synthetic,
    })
}

/// Label court d'une date : "3 mars"
pub fn short_date_label(date: NaiveDate) -> String {
    format!("{} {}", date.day(), MONTHS_FR[date.month0() as usize])
}

/// Label d'un horizon de prévision : "+3j"
pub fn horizon_label(horizon_days: u32) -> String {
    format!("+{}j", horizon_days)
}

/// Hauteurs normalisées [0, 100] d'une sparkline
///
/// Même règle que le graphique détaillé avec une marge de 10% ; une série
/// plate utilise une plage de 1.
pub fn sparkline_heights(prices: &[f64]) -> Vec<u64> {
    let finite = prices.iter().copied().filter(|p| p.is_finite());
    let Some((min, max)) = finite.fold(None, |acc: Option<(f64, f64)>, p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    }) else {
        return Vec::new();
    };

    let range = if max > min { max - min } else { 1.0 };
    let margin = range * SPARKLINE_MARGIN_RATIO;
    let low = min - margin;
    let span = (max + margin) - low;

    prices
        .iter()
        .filter(|p| p.is_finite())
        .map(|p| ((p - low) / span * SPARKLINE_MAX_HEIGHT as f64).round() as u64)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn history(prices: &[f64]) -> Vec<PricePoint> {
        // Lundi 4 mars 2024, un point par jour
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                open_price: *p,
            })
            .collect()
    }

    #[test]
    fn test_range_adds_positive_margin() {
        let range = ChartRange::from_prices([100.0, 102.0, 98.0]).unwrap();

        assert_eq!(range.min_price, 98.0);
        assert_eq!(range.max_price, 102.0);
        assert!(range.chart_min < 98.0);
        assert!(range.chart_max > 102.0);
        assert!((range.chart_min - 97.8).abs() < 1e-9);
        assert!((range.chart_max - 102.2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_range_is_none() {
        assert!(ChartRange::from_prices(Vec::<f64>::new()).is_none());
        assert!(ChartRange::from_prices([f64::NAN]).is_none());
    }

    #[test]
    fn test_sentiment_maps_inside_price_envelope() {
        let range = ChartRange::from_prices([42.0, 57.5, 61.25, 44.0]).unwrap();

        for step in 0..=40 {
            let s = -1.0 + step as f64 * 0.05;
            let mapped = range.sentiment_to_price(s);
            assert!(mapped >= range.min_price - 1e-9 && mapped <= range.max_price + 1e-9);
        }
        assert!((range.sentiment_to_price(-1.0) - 42.0).abs() < 1e-9);
        assert!((range.sentiment_to_price(1.0) - 61.25).abs() < 1e-9);
    }

    #[test]
    fn test_flat_range_uses_floor() {
        let range = ChartRange::from_prices([250.0, 250.0]).unwrap();

        assert!(range.chart_min < 250.0 && range.chart_max > 250.0);
        assert!(range.sentiment_scale > 0.0);
        assert_eq!(range.sentiment_to_price(0.0), 250.0);
        assert_eq!(range.chart_max - 250.0, 250.0 - range.chart_min);
    }

    #[test]
    fn test_assemble_with_api_forecast() {
        let hist = history(&[10.0, 11.0, 12.0]);
        let forecast = vec![
            ForecastPoint { horizon_days: 1, predicted_price: 12.5 },
            ForecastPoint { horizon_days: 3, predicted_price: 13.0 },
        ];
        let sentiments = [0.5, -0.5];

        let series = assemble(&hist, &forecast, Some(&sentiments[..]), 1).unwrap();

        assert_eq!(series.labels, vec!["4 mars", "5 mars", "6 mars", "+1j", "+3j"]);
        assert_eq!(
            series.historical_prices,
            vec![Some(10.0), Some(11.0), Some(12.0), None, None]
        );
        assert_eq!(
            series.forecast_prices,
            vec![None, None, None, Some(12.5), Some(13.0)]
        );
        // Sentiment complété par 0
        assert_eq!(series.sentiments, vec![0.5, -0.5, 0.0]);
        assert_eq!(series.range.max_price, 13.0);
        assert!(!series.forecast_synthetic);
        assert!(!series.sentiment_synthetic);
        assert!(series.is_uptrend());
    }

    #[test]
    fn test_assemble_series_are_disjoint() {
        let hist = history(&[100.0, 102.0, 101.0, 99.0]);
        let series = assemble(&hist, &[], None, 11).unwrap();

        let len = series.labels.len();
        assert_eq!(len, 4 + synthetic::FORECAST_DAYS);
        assert_eq!(series.historical_prices.len(), len);
        assert_eq!(series.forecast_prices.len(), len);
        for i in 0..len {
            let both = series.historical_prices[i].is_some() && series.forecast_prices[i].is_some();
            let none = series.historical_prices[i].is_none() && series.forecast_prices[i].is_none();
            assert!(!both && !none, "index {} must hold exactly one value", i);
        }
        assert!(series.forecast_synthetic);
        assert!(series.sentiment_synthetic);
        assert_eq!(series.sentiment_as_price.len(), 4);
        for value in &series.sentiment_as_price {
            assert!(*value >= series.range.min_price - 1e-9);
            assert!(*value <= series.range.max_price + 1e-9);
        }
    }

    #[test]
    fn test_synthetic_forecast_labels_skip_weekend() {
        // Dernier point : jeudi 7 mars 2024
        let hist = history(&[10.0, 10.0, 10.0, 10.0]);
        let series = assemble(&hist, &[], Some(&[][..]), 3).unwrap();

        assert_eq!(&series.labels[4..6], &["8 mars".to_string(), "11 mars".to_string()]);
    }

    #[test]
    fn test_assemble_without_prices() {
        assert!(assemble(&[], &[], None, 0).is_none());
    }

    #[test]
    fn test_labels() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        assert_eq!(short_date_label(date), "15 août");
        assert_eq!(horizon_label(7), "+7j");
    }

    #[test]
    fn test_sparkline_heights_with_margin() {
        let heights = sparkline_heights(&[10.0, 20.0, 15.0]);
        // Plage 10, marge 1 : [9, 21]
        assert_eq!(heights, vec![8, 92, 50]);

        let flat = sparkline_heights(&[5.0, 5.0]);
        assert_eq!(flat, vec![50, 50]);

        assert!(sparkline_heights(&[]).is_empty());
    }
}
