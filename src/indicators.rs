// ============================================================================
// Indicateurs : jauge de corrélation, indicateur de sentiment, teinte des
// sparklines
// ============================================================================
// Conversions linéaires [-1, 1] → [0, 100] et découpages en catégories.
// Aucun code de rendu ici : le module ui associe couleurs et widgets.
// ============================================================================

/// Corrélation affichée quand l'API ne fournit rien et que la fixture non plus
pub const DEFAULT_CORRELATION: f64 = 0.75;

/// Position d'une valeur [-1, 1] sur une jauge [0, 100] (%)
///
/// -1 → 0%, 0 → 50%, 1 → 100%. Les valeurs hors bornes sont écrêtées.
pub fn gauge_position(value: f64) -> f64 {
    (value.clamp(-1.0, 1.0) + 1.0) / 2.0 * 100.0
}

// ============================================================================
// Corrélation
// ============================================================================

/// Niveau de corrélation sentiment / rendement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationLevel {
    ModeratePositive,
    SlightlyPositive,
    Neutral,
    SlightlyNegative,
    Negative,
}

impl CorrelationLevel {
    pub fn from_value(correlation: f64) -> Self {
        if correlation > 0.3 {
            CorrelationLevel::ModeratePositive
        } else if correlation > 0.1 {
            CorrelationLevel::SlightlyPositive
        } else if correlation > -0.1 {
            CorrelationLevel::Neutral
        } else if correlation > -0.3 {
            CorrelationLevel::SlightlyNegative
        } else {
            CorrelationLevel::Negative
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CorrelationLevel::ModeratePositive => {
                "Corrélation positive modérée avec les indicateurs du marché. Données fiables."
            }
            CorrelationLevel::SlightlyPositive => {
                "Corrélation légèrement positive. Données généralement utilisables."
            }
            CorrelationLevel::Neutral => {
                "Corrélation neutre. Données moyennement fiables pour l'analyse."
            }
            CorrelationLevel::SlightlyNegative => {
                "Corrélation légèrement négative. Prudence recommandée."
            }
            CorrelationLevel::Negative => "Corrélation négative. Signaux probablement inversés.",
        }
    }
}

/// Origine de la valeur affichée par la jauge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationSource {
    /// Valeur fournie par l'API
    Api,
    /// L'API a répondu sans corrélation : valeur de secours
    Unavailable,
    /// L'appel à l'API a échoué : valeur de secours
    LoadError,
}

/// État complet de la jauge de corrélation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationGauge {
    pub value: f64,
    pub source: CorrelationSource,
}

impl CorrelationGauge {
    pub fn new(value: f64, source: CorrelationSource) -> Self {
        Self { value, source }
    }

    /// Position de l'indicateur sur la jauge (%)
    pub fn position(&self) -> f64 {
        gauge_position(self.value)
    }

    pub fn level(&self) -> CorrelationLevel {
        CorrelationLevel::from_value(self.value)
    }

    /// Texte affiché sous la jauge
    pub fn description(&self) -> &'static str {
        match self.source {
            CorrelationSource::Api => self.level().description(),
            CorrelationSource::Unavailable => "Données de corrélation non disponibles.",
            CorrelationSource::LoadError => "Erreur de chargement des données de corrélation.",
        }
    }
}

// ============================================================================
// Sentiment moyen
// ============================================================================

/// Tonalité du sentiment moyen de la période
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentMood {
    Positive,
    Neutral,
    Negative,
}

impl SentimentMood {
    pub fn from_mean(mean: f64) -> Self {
        if mean > 0.2 {
            SentimentMood::Positive
        } else if mean < -0.2 {
            SentimentMood::Negative
        } else {
            SentimentMood::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SentimentMood::Positive => "Positif",
            SentimentMood::Neutral => "Neutre",
            SentimentMood::Negative => "Négatif",
        }
    }
}

// ============================================================================
// Sparklines
// ============================================================================

/// Teinte d'une sparkline selon la variation en %
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparklineTone {
    /// > 2%
    StrongUp,
    /// > 0%
    Up,
    /// 0% ou inconnu
    Flat,
    /// < 0%
    Down,
    /// < -2%
    StrongDown,
}

impl SparklineTone {
    pub fn from_change(change_percent: Option<f64>) -> Self {
        match change_percent {
            Some(c) if c > 2.0 => SparklineTone::StrongUp,
            Some(c) if c > 0.0 => SparklineTone::Up,
            Some(c) if c < -2.0 => SparklineTone::StrongDown,
            Some(c) if c < 0.0 => SparklineTone::Down,
            _ => SparklineTone::Flat,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
