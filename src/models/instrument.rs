// ============================================================================
// Structure : Instrument
// ============================================================================
// Représente une valeur du CAC40 : nom, symbole boursier et secteur
//
// CONCEPTS RUST :
// 1. &'static str : le catalogue est écrit en dur dans le binaire,
//    aucune allocation n'est nécessaire
// 2. const / static : table immuable, partagée sans synchronisation
// 3. BTreeSet : ensemble trié, sans doublons
// ============================================================================

use std::collections::BTreeSet;

/// Une valeur du catalogue CAC40
///
/// Immuable : définie à la compilation, jamais modifiée.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    /// Nom de la société (clé unique, ex: "Air Liquide")
    pub name: &'static str,

    /// Symbole Yahoo (ex: "AI.PA")
    pub symbol: &'static str,

    /// Secteur d'activité (ex: "Industrie")
    pub sector: &'static str,
}

impl Instrument {
    const fn new(name: &'static str, symbol: &'static str, sector: &'static str) -> Self {
        Self { name, symbol, sector }
    }

    /// Vrai si le terme (déjà en minuscules) apparaît dans le nom ou le symbole
    pub fn matches(&self, lowercase_term: &str) -> bool {
        self.name.to_lowercase().contains(lowercase_term)
            || self.symbol.to_lowercase().contains(lowercase_term)
    }
}

/// Catalogue des valeurs du CAC40, dans l'ordre d'affichage
pub static CAC40: &[Instrument] = &[
    Instrument::new("Air Liquide", "AI.PA", "Industrie"),
    Instrument::new("Airbus", "AIR.PA", "Industrie"),
    Instrument::new("ArcelorMittal", "MT.AS", "Industrie"),
    Instrument::new("AXA", "CS.PA", "Assurance"),
    Instrument::new("BNP Paribas", "BNP.PA", "Banque"),
    Instrument::new("Bouygues", "EN.PA", "Construction"),
    Instrument::new("Capgemini", "CAP.PA", "Technologie"),
    Instrument::new("Carrefour", "CA.PA", "Distribution"),
    Instrument::new("Crédit Agricole", "ACA.PA", "Banque"),
    Instrument::new("Danone", "BN.PA", "Consommation"),
    Instrument::new("Dassault Systèmes", "DSY.PA", "Technologie"),
    Instrument::new("Engie", "ENGI.PA", "Énergie"),
    Instrument::new("EssilorLuxottica", "EL.PA", "Santé"),
    Instrument::new("Eurofins Scientific", "ERF.PA", "Santé"),
    Instrument::new("Hermès", "RMS.PA", "Luxe"),
    Instrument::new("Kering", "KER.PA", "Luxe"),
    Instrument::new("Legrand", "LR.PA", "Industrie"),
    Instrument::new("L'Oréal", "OR.PA", "Consommation"),
    Instrument::new("LVMH", "MC.PA", "Luxe"),
    Instrument::new("Michelin", "ML.PA", "Industrie"),
    Instrument::new("Orange", "ORA.PA", "Technologie"),
    Instrument::new("Pernod Ricard", "RI.PA", "Consommation"),
    Instrument::new("Renault", "RNO.PA", "Automobile"),
    Instrument::new("Safran", "SAF.PA", "Industrie"),
    Instrument::new("Saint-Gobain", "SGO.PA", "Industrie"),
    Instrument::new("Sanofi", "SAN.PA", "Santé"),
    Instrument::new("Schneider Electric", "SU.PA", "Industrie"),
    Instrument::new("Société Générale", "GLE.PA", "Banque"),
    Instrument::new("STMicroelectronics", "STM.PA", "Technologie"),
    Instrument::new("Teleperformance", "TEP.PA", "Services"),
    Instrument::new("Thales", "HO.PA", "Défense"),
    Instrument::new("TotalEnergies", "TTE.PA", "Énergie"),
    Instrument::new("Unibail-Rodamco-Westfield", "URW.AS", "Immobilier"),
    Instrument::new("Veolia", "VIE.PA", "Services"),
    Instrument::new("Vinci", "DG.PA", "Construction"),
    Instrument::new("Vivendi", "VIV.PA", "Médias"),
];

/// Ensemble des secteurs présents dans un catalogue (sans doublons)
///
/// Sert à alimenter le sélecteur de secteur.
pub fn sectors_of(catalog: &[Instrument]) -> BTreeSet<&'static str> {
    catalog.iter().map(|instrument| instrument.sector).collect()
}

/// Recherche une valeur par son nom exact
pub fn find(name: &str) -> Option<&'static Instrument> {
    CAC40.iter().find(|instrument| instrument.name == name)
}

/// Noms du catalogue dans l'ordre naturel
pub fn names() -> Vec<&'static str> {
    CAC40.iter().map(|instrument| instrument.name).collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================
