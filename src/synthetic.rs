// ============================================================================
// Générateurs de données de secours
// ============================================================================
// Quand l'API ne répond pas, le tableau de bord affiche des données
// synthétiques : prévisions, sentiment, sparklines, données fictives
//
// Toutes les fonctions sont pures : même graine → même séquence.
// La graine d'une valeur est dérivée de son nom (seed_for) pour que
// l'affichage reste stable d'un rendu à l'autre.
// ============================================================================

use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{FakeStock, Instrument};

/// Nombre de points de prévision générés
pub const FORECAST_DAYS: usize = 7;

/// Nombre de points d'une sparkline de secours
pub const SPARKLINE_POINTS: usize = 20;

/// Amplitude du bruit appliqué à chaque point de prévision (±1%)
const FORECAST_NOISE: f64 = 0.01;

/// Graine déterministe dérivée d'un texte (FNV-1a 64 bits)
pub fn seed_for(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// Prévisions de secours sur FORECAST_DAYS jours
///
/// Tendance constante tirée des deux derniers prix :
/// trend = (last - second_last) / second_last, puis
/// price_i = last * (1 + trend)^i * (1 + noise_i), noise_i ∈ [-1%, 1%].
/// Le bruit n'est pas cumulé d'un pas à l'autre.
///
/// Moins de deux prix : tendance nulle. Aucun prix : aucune prévision.
pub fn forecast_prices(history: &[f64], seed: u64) -> Vec<f64> {
    let Some(&last) = history.last() else {
        return Vec::new();
    };

    let trend = match history.len().checked_sub(2).map(|i| history[i]) {
        Some(second_last) if second_last != 0.0 => (last - second_last) / second_last,
        _ => 0.0,
    };

    let mut rng = StdRng::seed_from_u64(seed);
    (1..=FORECAST_DAYS as i32)
        .map(|i| {
            let noise = rng.gen_range(-FORECAST_NOISE..=FORECAST_NOISE);
            last * (1.0 + trend).powi(i) * (1.0 + noise)
        })
        .collect()
}

/// Dates des prévisions de secours : jours ouvrés après `last_date`
///
/// Le curseur avance d'un jour à la fois en sautant samedi et dimanche.
pub fn forecast_dates(last_date: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut cursor = last_date;

    while dates.len() < count {
        cursor += Duration::days(1);
        if !matches!(cursor.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(cursor);
        }
    }

    dates
}

/// Marche aléatoire de sentiment, dans [-1, 1]
///
/// Départ proche de 0, volatilité aléatoire à chaque pas, plus une
/// composante sinusoïdale de période `len` (motif cyclique décoratif).
pub fn sentiment_walk(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut current: f64 = rng.gen_range(-0.2..0.2);
    let mut sentiments = Vec::with_capacity(len);

    for i in 0..len {
        current += rng.gen_range(-0.15..0.15);
        current = current.clamp(-1.0, 1.0);
        current += (i as f64 / len as f64 * PI * 2.0).sin() * 0.2;
        current = current.clamp(-1.0, 1.0);
        sentiments.push(current);
    }

    sentiments
}

/// Prix de sparkline de secours
///
/// Prix de base dérivé de la longueur du nom, volatilité ±2% et tendance
/// cyclique ±2%, plancher à 80% du prix de base.
pub fn sparkline_prices(name: &str, points: usize, seed: u64) -> Vec<f64> {
    if points == 0 {
        return Vec::new();
    }

    let base = 50.0 + name.chars().count() as f64 * 5.0;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut prices = Vec::with_capacity(points);
    prices.push(base);

    for i in 1..points {
        let volatility = rng.gen_range(-2.0..2.0);
        let trend = (i as f64 / points as f64 * PI * 2.0).sin() * 2.0;
        let next = prices[i - 1] * (1.0 + (volatility + trend) / 100.0);
        prices.push(next.max(base * 0.8));
    }

    prices
}

/// Données fictives d'une valeur, quand fake_data.json est absent
pub fn fake_stock(instrument: &Instrument, seed: u64) -> FakeStock {
    let mut rng = StdRng::seed_from_u64(seed);

    let confidence = f64::from(rng.gen_range(60..100u32));
    let current_price = rng.gen_range(50.0..550.0);
    let projection_change = rng.gen_range(-10.0..10.0);

    FakeStock {
        confidence: Some(confidence),
        current_price: Some(current_price),
        projected_price: Some(current_price * (1.0 + projection_change / 100.0)),
        projection_change: Some(projection_change),
        correlation: None,
        keywords: ["analyse", "technique", "fondamentale", "marché"]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        sector: Some(instrument.sector.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instrument::find;

    #[test]
    fn test_seed_is_stable() {
        assert_eq!(seed_for("LVMH"), seed_for("LVMH"));
        assert_ne!(seed_for("LVMH"), seed_for("Kering"));
        // FNV-1a de la chaîne vide = offset basis
        assert_eq!(seed_for(""), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn test_forecast_follows_trend_within_bounds() {
        let history = [100.0, 102.0];

        for seed in [0, 1, 42, seed_for("Airbus")] {
            let forecast = forecast_prices(&history, seed);
            assert_eq!(forecast.len(), FORECAST_DAYS);

            for (i, price) in forecast.iter().enumerate() {
                let pure = 102.0 * 1.02_f64.powi(i as i32 + 1);
                let deviation = (price - pure).abs() / pure;
                assert!(deviation <= 0.05, "point {} deviates by {}", i + 1, deviation);
            }
        }
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let history = [10.0, 11.0, 10.5];
        assert_eq!(forecast_prices(&history, 7), forecast_prices(&history, 7));
    }

    #[test]
    fn test_forecast_edge_cases() {
        assert!(forecast_prices(&[], 1).is_empty());

        // Un seul prix : tendance nulle, bruit ±1%
        let flat = forecast_prices(&[50.0], 3);
        assert!(flat.iter().all(|p| (p - 50.0).abs() <= 0.5 + 1e-9));
    }

    #[test]
    fn test_forecast_dates_skip_weekends() {
        // Vendredi 8 mars 2024
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let dates = forecast_dates(friday, 7);

        let days: Vec<u32> = dates.iter().map(|d| d.day()).collect();
        assert_eq!(days, vec![11, 12, 13, 14, 15, 18, 19]);
        assert!(dates
            .iter()
            .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn test_sentiment_walk_is_bounded_and_seeded() {
        let walk = sentiment_walk(30, 99);
        assert_eq!(walk.len(), 30);
        assert!(walk.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(walk, sentiment_walk(30, 99));
        assert!(sentiment_walk(0, 99).is_empty());
    }

    #[test]
    fn test_sparkline_prices_respect_floor() {
        let prices = sparkline_prices("Engie", SPARKLINE_POINTS, 5);
        let base = 50.0 + 5.0 * 5.0;

        assert_eq!(prices.len(), SPARKLINE_POINTS);
        assert_eq!(prices[0], base);
        assert!(prices.iter().all(|p| *p >= base * 0.8));
    }

    #[test]
    fn test_fake_stock_ranges() {
        let instrument = find("Danone").unwrap();
        let fake = fake_stock(instrument, seed_for(instrument.name));

        let price = fake.current_price.unwrap();
        let change = fake.projection_change.unwrap();
        assert!((50.0..550.0).contains(&price));
        assert!((-10.0..10.0).contains(&change));
        assert_eq!(fake.sector.as_deref(), Some("Consommation"));
    }
}
