// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod dashboard; // Grille de cartes, filtres, recherche
pub mod detail;    // Graphique, jauges et articles d'une valeur
pub mod events;    // Gestion des événements clavier

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};

/// Dessine l'interface complète
///
/// L'alerte, quand elle existe, est dessinée par-dessus l'écran courant.
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Dashboard | Screen::Search => dashboard::render_dashboard(frame, app),
        Screen::Detail => detail::render_detail(frame, app),
    }

    if let Some(message) = &app.alert {
        render_alert(frame, message);
    }
}

/// Zone centrée de `percent_x`% de large et `height` lignes de haut
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Popup d'alerte bloquante
fn render_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(60, 7, frame.size());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .title(" ⚠ Erreur ")
        .title_alignment(Alignment::Center);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled("[ESC] Fermer", Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 7, area);

        assert_eq!(popup.height, 7);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 16);

        let tiny = centered_rect(60, 7, Rect::new(0, 0, 10, 3));
        assert_eq!(tiny.height, 3);
    }
}
