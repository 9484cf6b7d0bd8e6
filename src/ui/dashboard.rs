// ============================================================================
// Dashboard - Rendu de la grille de cartes
// ============================================================================
// Header avec les filtres actifs, une carte par valeur visible (nom, prix,
// variation, secteur, sparkline) et footer avec les raccourcis
//
// CONCEPTS RATATUI :
// 1. Layout imbriqués : une ligne par carte, découpée en texte | sparkline
// 2. Sparkline : hauteurs entières normalisées sur [0, 100]
// 3. Défilement manuel : seules les cartes qui tiennent sont dessinées
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame,
};

use crate::app::App;
use crate::indicators::SparklineTone;
use crate::models::StockCard;
use crate::series::{sparkline_heights, SPARKLINE_MAX_HEIGHT};

/// Hauteur d'une carte (lignes)
const CARD_HEIGHT: u16 = 2;

/// Largeur de la sparkline d'une carte (colonnes)
const SPARKLINE_WIDTH: u16 = 30;

/// Dessine le tableau de bord
///
/// En mode recherche, le footer devient la ligne de saisie.
pub fn render_dashboard(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_cards(frame, app, chunks[1]);

    if app.is_in_search_mode() {
        render_search_footer(frame, app, chunks[2]);
    } else {
        render_footer(frame, app, chunks[2]);
    }
}

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header : titre + filtres
            Constraint::Min(0),    // Cartes
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

/// Couleur d'une sparkline selon sa teinte
pub fn tone_color(tone: SparklineTone) -> Color {
    match tone {
        SparklineTone::StrongUp => Color::Rgb(0, 150, 0),
        SparklineTone::Up => Color::Rgb(120, 220, 120),
        SparklineTone::Flat => Color::Gray,
        SparklineTone::Down => Color::Rgb(240, 120, 120),
        SparklineTone::StrongDown => Color::Rgb(190, 0, 0),
    }
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" CAC40 Sentiment Dashboard ")
        .title_alignment(Alignment::Center);

    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let search = if app.criteria.search.is_empty() {
        "-".to_string()
    } else {
        format!("\"{}\"", app.criteria.search)
    };
    let sector = app.criteria.sector.as_deref().unwrap_or("Tous");
    let performance = app.criteria.performance.map(|p| p.label()).unwrap_or("Toutes");

    let mut spans = if app.criteria.is_empty() {
        vec![Span::styled("Aucun filtre actif", label)]
    } else {
        vec![
            Span::styled("Recherche ", label),
            Span::styled(search, value),
            Span::styled("  Secteur ", label),
            Span::styled(sector, value),
            Span::styled("  Performance ", label),
            Span::styled(performance, value),
        ]
    };
    spans.extend([
        Span::styled("  Période ", label),
        Span::styled(format!("{} jours", app.period_days), value),
        Span::styled(format!("  {}/{} valeurs", app.visible.len(), app.cards.len()), label),
    ]);
    let filters = Line::from(spans);

    let status = match app.loading_message() {
        Some(message) => Line::from(Span::styled(
            format!("⏳ {}", message),
            Style::default().fg(Color::Yellow),
        )),
        None if app.latest.is_none() => Line::from(Span::styled(
            "Cotations indisponibles : données de secours affichées",
            Style::default().fg(Color::DarkGray),
        )),
        None => Line::from(""),
    };

    let paragraph = Paragraph::new(vec![filters, status])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Cartes
// ============================================================================

/// Première carte affichée pour que la sélection reste visible
fn scroll_offset(selected: usize, total: usize, fitting: usize) -> usize {
    if fitting == 0 || total <= fitting {
        return 0;
    }
    selected.saturating_sub(fitting - 1).min(total - fitting)
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Valeurs ");

    let cards = app.visible_cards();
    if cards.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Aucune valeur ne correspond aux filtres",
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled("[r] Réinitialiser", Style::default().fg(Color::DarkGray))),
        ];
        let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let fitting = (inner.height / CARD_HEIGHT) as usize;
    let offset = scroll_offset(app.selected_index, cards.len(), fitting);
    let shown: Vec<&StockCard> = cards.iter().skip(offset).take(fitting).copied().collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            shown
                .iter()
                .map(|_| Constraint::Length(CARD_HEIGHT))
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for (i, card) in shown.iter().enumerate() {
        render_card(frame, card, offset + i == app.selected_index, rows[i]);
    }
}

fn render_card(frame: &mut Frame, card: &StockCard, selected: bool, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(SPARKLINE_WIDTH)])
        .split(area);

    let change_color = if card.is_positive() {
        Color::Green
    } else if card.is_negative() {
        Color::Red
    } else {
        Color::Gray
    };

    let mut base = Style::default();
    if selected {
        base = base.add_modifier(Modifier::REVERSED);
    }

    let instrument = card.instrument;
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {:<26}", instrument.name),
                base.fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{:<8}", instrument.symbol), base.fg(Color::Cyan)),
            Span::styled(format!("{:>12}", card.price_label()), base.fg(Color::White)),
            Span::styled(format!("  {:<10}", card.change_label()), base.fg(change_color)),
        ]),
        Line::from(Span::styled(
            format!(" {}", instrument.sector),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), columns[0]);

    match &card.sparkline {
        Some(prices) => {
            let heights = sparkline_heights(prices);
            let tone = SparklineTone::from_change(card.trend_percent());
            let sparkline = Sparkline::default()
                .data(&heights)
                .max(SPARKLINE_MAX_HEIGHT)
                .style(Style::default().fg(tone_color(tone)));
            frame.render_widget(sparkline, columns[1]);
        }
        None => {
            let loading = Paragraph::new(Span::styled("…", Style::default().fg(Color::DarkGray)))
                .alignment(Alignment::Center);
            frame.render_widget(loading, columns[1]);
        }
    }
}

// ============================================================================
// Footer
// ============================================================================

fn key_span(key: &str) -> Span<'_> {
    Span::styled(key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            key_span("[q]"),
            Span::raw(" Quitter  "),
            key_span("[↑↓ / j k]"),
            Span::raw(" Naviguer  "),
            key_span("[Enter]"),
            Span::raw(" Détail  "),
            key_span("[/]"),
            Span::raw(" Rechercher  "),
            key_span("[s]"),
            Span::raw(" Secteur  "),
            key_span("[f]"),
            Span::raw(" Performance  "),
            key_span("[p]"),
            Span::raw(" Période  "),
            key_span("[r]"),
            Span::raw(" Réinitialiser"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Footer en mode recherche : ligne de saisie
fn render_search_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" [Enter] Valider  [ESC] Effacer ");

    let input_line = Line::from(vec![
        Span::styled(
            "Rechercher : ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.criteria.search.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let paragraph = Paragraph::new(vec![input_line])
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_keeps_selection_visible() {
        assert_eq!(scroll_offset(0, 36, 10), 0);
        assert_eq!(scroll_offset(9, 36, 10), 0);
        assert_eq!(scroll_offset(10, 36, 10), 1);
        assert_eq!(scroll_offset(35, 36, 10), 26);
        assert_eq!(scroll_offset(3, 5, 10), 0);
        assert_eq!(scroll_offset(3, 5, 0), 0);
    }
}
