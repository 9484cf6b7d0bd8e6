// ============================================================================
// Structure : StockCard
// ============================================================================
// Une carte du tableau de bord : une valeur du catalogue, son dernier prix,
// sa variation et les prix de sa sparkline
//
// CONCEPTS RUST :
// 1. Composition : StockCard référence un Instrument 'static
// 2. Option : prix et sparkline peuvent être absents (chargement, erreur)
// ============================================================================

use crate::models::{FakeStock, Instrument, LatestQuote};

/// Carte d'une valeur dans la grille
#[derive(Debug, Clone)]
pub struct StockCard {
    pub instrument: &'static Instrument,

    /// Dernier prix connu (API, sinon fixture)
    pub last_price: Option<f64>,

    /// Variation en pourcentage sur la période
    pub change_percent: Option<f64>,

    /// Prix de la sparkline (None tant que le chargement n'est pas terminé)
    pub sparkline: Option<Vec<f64>>,

    /// Vrai si la sparkline provient du générateur de secours
    pub sparkline_synthetic: bool,
}

impl StockCard {
    /// Crée une carte sans données
    pub fn new(instrument: &'static Instrument) -> Self {
        Self {
            instrument,
            last_price: None,
            change_percent: None,
            sparkline: None,
            sparkline_synthetic: false,
        }
    }

    /// Crée une carte à partir de la cotation de l'API, avec repli sur la fixture
    ///
    /// La cotation n'est utilisée que si elle contient un dernier prix.
    pub fn from_sources(
        instrument: &'static Instrument,
        quote: Option<&LatestQuote>,
        fake: Option<&FakeStock>,
    ) -> Self {
        let mut card = Self::new(instrument);

        match quote.filter(|q| q.last_price.is_some()) {
            Some(quote) => {
                card.last_price = quote.last_price;
                card.change_percent = Some(quote.price_change.unwrap_or(0.0));
            }
            None => {
                if let Some(fake) = fake.filter(|f| f.current_price.is_some()) {
                    card.last_price = fake.current_price;
                    card.change_percent = fake.projection_change;
                }
            }
        }

        card
    }

    /// Met à jour la sparkline
    pub fn set_sparkline(&mut self, prices: Vec<f64>, synthetic: bool) {
        self.sparkline = Some(prices);
        self.sparkline_synthetic = synthetic;
    }

    /// Variation utilisée pour la couleur de la sparkline
    ///
    /// Variation de la carte si connue, sinon variation entre le premier et
    /// le dernier point de la sparkline.
    pub fn trend_percent(&self) -> Option<f64> {
        if self.change_percent.is_some() {
            return self.change_percent;
        }
        let prices = self.sparkline.as_ref()?;
        let first = *prices.first()?;
        let last = *prices.last()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }

    /// Prix formaté, "--" si inconnu
    pub fn price_label(&self) -> String {
        match self.last_price {
            Some(price) => format!("{:.2} €", price),
            None => "--".to_string(),
        }
    }

    /// Variation formatée avec flèche
    pub fn change_label(&self) -> String {
        match self.change_percent {
            Some(change) => {
                let arrow = if change > 0.0 { "▲" } else { "▼" };
                format!("{} {:+.2}%", arrow, change)
            }
            None => String::new(),
        }
    }

    /// Retourne true si la valeur est en hausse
    pub fn is_positive(&self) -> bool {
        self.change_percent.map(|c| c > 0.0).unwrap_or(false)
    }

    /// Retourne true si la valeur est en baisse
    pub fn is_negative(&self) -> bool {
        self.change_percent.map(|c| c < 0.0).unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================
