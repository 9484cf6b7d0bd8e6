// ============================================================================
// Moteur de filtrage
// ============================================================================
// Réduit le catalogue aux valeurs visibles : recherche texte, secteur,
// performance sur la période
//
// Ordre d'application : la recherche réduit d'abord les candidats, puis
// secteur ET performance s'appliquent au résultat. L'ordre du catalogue
// est conservé.
// ============================================================================

use crate::models::{instrument, LatestPrices};

/// Catégorie de performance sélectionnable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBucket {
    /// Variation > 0
    Positive,
    /// Variation < 0
    Negative,
    /// |variation| < 1%
    Stable,
}

impl PerformanceBucket {
    /// Vrai si la variation (en %) appartient à la catégorie
    pub fn accepts(&self, change_percent: f64) -> bool {
        match self {
            PerformanceBucket::Positive => change_percent > 0.0,
            PerformanceBucket::Negative => change_percent < 0.0,
            PerformanceBucket::Stable => change_percent.abs() < 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceBucket::Positive => "En hausse",
            PerformanceBucket::Negative => "En baisse",
            PerformanceBucket::Stable => "Stable",
        }
    }

    /// Cycle du sélecteur : aucun → hausse → baisse → stable → aucun
    pub fn cycle(current: Option<PerformanceBucket>) -> Option<PerformanceBucket> {
        match current {
            None => Some(PerformanceBucket::Positive),
            Some(PerformanceBucket::Positive) => Some(PerformanceBucket::Negative),
            Some(PerformanceBucket::Negative) => Some(PerformanceBucket::Stable),
            Some(PerformanceBucket::Stable) => None,
        }
    }
}

/// Critères de filtrage courants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Terme de recherche (vide = tout)
    pub search: String,

    /// Secteur exact (None = tous)
    pub sector: Option<String>,

    /// Catégorie de performance (None = toutes)
    pub performance: Option<PerformanceBucket>,
}

impl FilterCriteria {
    /// Vrai si aucun critère n'est actif
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.sector.is_none() && self.performance.is_none()
    }

    /// Remet tous les critères à zéro
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Applique les critères à une liste de noms
///
/// Une valeur sans cotation (ou sans variation) passe toujours le filtre
/// de performance. Les noms absents du catalogue sont écartés.
pub fn filter<'a>(
    all_names: &[&'a str],
    criteria: &FilterCriteria,
    latest: Option<&LatestPrices>,
) -> Vec<&'a str> {
    // Sous-chaîne brute : les espaces font partie du terme
    let term = criteria.search.to_lowercase();

    all_names
        .iter()
        .copied()
        .filter_map(|name| instrument::find(name).map(|i| (name, i)))
        .filter(|(_, instrument)| term.is_empty() || instrument.matches(&term))
        .filter(|(_, instrument)| {
            criteria
                .sector
                .as_deref()
                .map_or(true, |sector| instrument.sector == sector)
        })
        .filter(|(name, _)| {
            let Some(bucket) = criteria.performance else {
                return true;
            };
            match latest.and_then(|l| l.get(*name)).and_then(|q| q.price_change) {
                Some(change) => bucket.accepts(change),
                None => true,
            }
        })
        .map(|(name, _)| name)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
