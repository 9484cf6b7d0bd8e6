// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application : catalogue, données de marché,
// cartes du tableau de bord
// ============================================================================

pub mod instrument; // Catalogue CAC40
pub mod market;     // Prix, sentiment, prévisions, articles
pub mod stock_card; // Carte affichée dans la grille

// Re-export des structures principales pour simplifier les imports
pub use instrument::{sectors_of, Instrument, CAC40};
pub use market::{
    ArticleSlot, ArticleSummary, ArticlesData, CorrelationData, FakeStock, ForecastPoint,
    LatestPrices, LatestQuote, PricePoint, SentimentPoint,
};
pub use stock_card::StockCard;
