// ============================================================================
// Configuration
// ============================================================================
// Lit la configuration depuis l'environnement (et un éventuel fichier .env)
//
// Variables reconnues :
// - CAC40_API_URL           : URL de base de l'API (défaut http://127.0.0.1:9000)
// - CAC40_FIXTURES_DIR      : répertoire des fichiers JSON de secours (défaut ./data)
// - CAC40_PERIOD_DAYS       : période initiale en jours (2, 7, 14, 30 ou 90)
// - CAC40_HTTP_TIMEOUT_SECS : timeout des requêtes HTTP (défaut 10)
// - CAC40_LOG_DIR           : répertoire des logs (optionnel)
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

/// URL de l'API par défaut (serveur local)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:9000";

/// Périodes proposées par le sélecteur, en jours
pub const PERIOD_OPTIONS: [u32; 5] = [2, 7, 14, 30, 90];

/// Période sélectionnée au démarrage
pub const DEFAULT_PERIOD_DAYS: u32 = 30;

/// Configuration de l'application
#[derive(Debug, Clone)]
pub struct Config {
    /// URL de base de l'API, sans slash final
    pub api_base_url: String,

    /// Répertoire contenant fake_data.json, articles_epures_groupes.json
    /// et synthese_cac40_mensuelle.json
    pub fixtures_dir: PathBuf,

    /// Période initiale (jours d'historique)
    pub period_days: u32,

    /// Timeout appliqué à chaque requête HTTP
    pub http_timeout: Duration,

    /// Répertoire des logs imposé par l'utilisateur
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            fixtures_dir: PathBuf::from("./data"),
            period_days: DEFAULT_PERIOD_DAYS,
            http_timeout: Duration::from_secs(10),
            log_dir: None,
        }
    }
}

/// Variable ignorée car sa valeur est invalide
///
/// La configuration est lue avant l'initialisation du logging : les rejets
/// sont retournés à l'appelant qui les journalise ensuite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSetting {
    pub key: &'static str,
    pub value: String,
}

impl Config {
    /// Construit la configuration à partir des variables d'environnement
    ///
    /// Charge d'abord un fichier .env s'il existe. Une valeur invalide est
    /// remplacée par la valeur par défaut et retournée dans la liste des rejets.
    pub fn from_env() -> (Self, Vec<InvalidSetting>) {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la configuration à partir d'une fonction de lecture
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<InvalidSetting>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let mut rejected = Vec::new();

        if let Some(url) = lookup("CAC40_API_URL").filter(|u| !u.trim().is_empty()) {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(dir) = lookup("CAC40_FIXTURES_DIR") {
            config.fixtures_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("CAC40_PERIOD_DAYS") {
            match raw.trim().parse::<u32>() {
                Ok(days) if PERIOD_OPTIONS.contains(&days) => config.period_days = days,
                _ => rejected.push(InvalidSetting { key: "CAC40_PERIOD_DAYS", value: raw }),
            }
        }

        if let Some(raw) = lookup("CAC40_HTTP_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => rejected.push(InvalidSetting { key: "CAC40_HTTP_TIMEOUT_SECS", value: raw }),
            }
        }

        config.log_dir = lookup("CAC40_LOG_DIR").map(PathBuf::from);

        (config, rejected)
    }
}

/// Période suivante dans le cycle du sélecteur
pub fn next_period(current: u32) -> u32 {
    let index = PERIOD_OPTIONS
        .iter()
        .position(|&p| p == current)
        .map(|i| (i + 1) % PERIOD_OPTIONS.len())
        .unwrap_or(0);
    PERIOD_OPTIONS[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let (config, rejected) = Config::from_lookup(|_| None);
        assert!(rejected.is_empty());
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.period_days, 30);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let (config, _) = Config::from_lookup(lookup_from(&[
            ("CAC40_API_URL", "http://api.example:8080/"),
            ("CAC40_PERIOD_DAYS", "7"),
            ("CAC40_HTTP_TIMEOUT_SECS", "3"),
        ]));
        assert_eq!(config.api_base_url, "http://api.example:8080");
        assert_eq!(config.period_days, 7);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let (config, rejected) = Config::from_lookup(lookup_from(&[
            ("CAC40_PERIOD_DAYS", "45"),
            ("CAC40_HTTP_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config.period_days, DEFAULT_PERIOD_DAYS);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(
            rejected,
            vec![
                InvalidSetting { key: "CAC40_PERIOD_DAYS", value: "45".to_string() },
                InvalidSetting { key: "CAC40_HTTP_TIMEOUT_SECS", value: "0".to_string() },
            ]
        );
    }

    #[test]
    fn test_next_period_cycles() {
        assert_eq!(next_period(2), 7);
        assert_eq!(next_period(90), 2);
        assert_eq!(next_period(12345), 2);
    }
}
