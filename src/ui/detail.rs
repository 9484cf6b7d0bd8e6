// ============================================================================
// Vue détail - Graphique, jauges et articles d'une valeur
// ============================================================================
// Trois séries sur le même graphique :
// - historique (vert si en hausse sur la période, rouge sinon)
// - prévisions (jaune), dans le prolongement de l'historique
// - sentiment projeté sur l'échelle des prix (magenta)
//
// Sous le graphique : jauge de corrélation, indicateur de sentiment moyen,
// trois articles et les mots-clés fréquents.
//
// CONCEPTS RATATUI :
// 1. Chart avec plusieurs Dataset partageant les mêmes axes
// 2. Gauge : position en ratio [0, 1]
// 3. Les points sont collectés avant de construire les Dataset, qui ne
//    font qu'emprunter les slices
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::indicators::{gauge_position, CorrelationGauge, CorrelationLevel, SentimentMood};
use crate::loader::{ArticleEntry, ArticlePanel, StockDetail};
use crate::models::{ArticleSlot, Instrument};
use crate::series::DisplaySeries;

const AMBER: Color = Color::Rgb(255, 191, 0);

/// Dessine la vue détail
pub fn render_detail(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(frame.size());

    render_header(frame, app, chunks[0]);

    match &app.detail {
        Some(detail) => render_body(frame, app, detail, chunks[1]),
        None => render_message(frame, chunks[1], "Chargement...", Color::Yellow),
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.detail_instrument {
        Some(Instrument { name, symbol, sector }) => format!(" {} ({}) - {} ", name, symbol, sector),
        None => " Détail ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::raw(format!("Période : {} jours   ", app.period_days)),
        Span::styled("[1/2/3]", key),
        Span::raw(" Article  "),
        Span::styled("[o]", key),
        Span::raw(" Ouvrir  "),
        Span::styled("[ESC]", key),
        Span::raw(" Retour"),
    ]);

    let paragraph = Paragraph::new(line).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_body(frame: &mut Frame, app: &App, detail: &StockDetail, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),   // Graphique
            Constraint::Length(6), // Jauges
            Constraint::Length(11), // Articles + mots-clés
        ])
        .split(area);

    match &detail.series {
        Some(series) => render_chart(frame, detail.instrument, series, rows[0]),
        None => render_message(frame, rows[0], "Aucune donnée disponible", Color::Gray),
    }

    let gauges = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    render_correlation(frame, &detail.correlation, detail.correlation_context.as_deref(), gauges[0]);
    render_sentiment(
        frame,
        detail.series.as_ref(),
        detail.articles.monthly_sentiment,
        gauges[1],
    );

    render_articles(frame, &detail.articles, app.selected_article, rows[2]);
}

// ============================================================================
// Graphique
// ============================================================================

/// Labels de l'axe X : début, dernier point historique, fin des prévisions
fn x_labels(series: &DisplaySeries) -> Vec<Span<'static>> {
    let labels = &series.labels;
    let mut picked: Vec<&String> = Vec::new();
    for index in [0, series.history_len().saturating_sub(1), labels.len().saturating_sub(1)] {
        if let Some(label) = labels.get(index) {
            if picked.last() != Some(&label) {
                picked.push(label);
            }
        }
    }
    picked.into_iter().map(|l| Span::raw(l.clone())).collect()
}

fn render_chart(frame: &mut Frame, instrument: &Instrument, series: &DisplaySeries, area: Rect) {
    let historical = series.historical_points();
    let forecast = series.forecast_points();
    let sentiment = series.sentiment_points();

    let trend_color = if series.is_uptrend() { Color::Green } else { Color::Red };
    let suffix = |synthetic: bool| if synthetic { " (simulé)" } else { "" };

    let datasets = vec![
        Dataset::default()
            .name("Prix d'ouverture")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(trend_color))
            .data(&historical),
        Dataset::default()
            .name(format!("Prévision{}", suffix(series.forecast_synthetic)))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&forecast),
        Dataset::default()
            .name(format!("Sentiment{}", suffix(series.sentiment_synthetic)))
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&sentiment),
    ];

    let range = series.range;
    let x_max = series.labels.len().saturating_sub(1).max(1) as f64;

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, x_max])
        .labels(x_labels(series));

    let y_axis = Axis::default()
        .title("Prix (€)")
        .style(Style::default().fg(Color::Gray))
        .bounds([range.chart_min, range.chart_max])
        .labels(vec![
            Span::raw(format!("{:.2}", range.chart_min)),
            Span::raw(format!("{:.2}", (range.chart_min + range.chart_max) / 2.0)),
            Span::raw(format!("{:.2}", range.chart_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(
                    " {} : {:.2} € → {:.2} € ",
                    instrument.name, range.min_price, range.max_price
                )),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

// ============================================================================
// Jauges
// ============================================================================

fn correlation_color(level: CorrelationLevel) -> Color {
    match level {
        CorrelationLevel::ModeratePositive => Color::Green,
        CorrelationLevel::SlightlyPositive => Color::LightGreen,
        CorrelationLevel::Neutral => AMBER,
        CorrelationLevel::SlightlyNegative => Color::LightRed,
        CorrelationLevel::Negative => Color::Red,
    }
}

fn mood_color(mood: SentimentMood) -> Color {
    match mood {
        SentimentMood::Positive => Color::Green,
        SentimentMood::Neutral => AMBER,
        SentimentMood::Negative => Color::Red,
    }
}

/// Jauge sur une ligne puis description
fn render_indicator(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    position: f64,
    label: String,
    color: Color,
    description: Vec<Line<'_>>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio((position / 100.0).clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, parts[0]);

    let text = Paragraph::new(description)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(text, parts[1]);
}

fn render_correlation(
    frame: &mut Frame,
    gauge: &CorrelationGauge,
    context: Option<&str>,
    area: Rect,
) {
    let mut description = vec![Line::from(gauge.description())];
    if let Some(context) = context {
        description.push(Line::from(Span::styled(context, Style::default().fg(Color::DarkGray))));
    }

    render_indicator(
        frame,
        area,
        "Corrélation sentiment / prix",
        gauge.position(),
        format!("{:+.2}", gauge.value),
        correlation_color(gauge.level()),
        description,
    );
}

/// Ligne de la synthèse mensuelle sous l'indicateur de sentiment
fn monthly_line(monthly_sentiment: Option<f64>) -> Option<String> {
    monthly_sentiment.map(|m| {
        format!(
            "Synthèse du mois : {:+.2} ({})",
            m,
            SentimentMood::from_mean(m).label()
        )
    })
}

fn render_sentiment(
    frame: &mut Frame,
    series: Option<&DisplaySeries>,
    monthly_sentiment: Option<f64>,
    area: Rect,
) {
    let monthly = monthly_line(monthly_sentiment).map(|text| {
        Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
    });

    let mean = series.and_then(DisplaySeries::mean_sentiment);
    let (position, label, color, summary) = match mean {
        Some(mean) => {
            let mood = SentimentMood::from_mean(mean);
            (gauge_position(mean), format!("{:+.2}", mean), mood_color(mood), mood.label())
        }
        None => (50.0, "--".to_string(), Color::Gray, "Aucune donnée disponible"),
    };

    let mut description = vec![Line::from(summary)];
    description.extend(monthly);

    render_indicator(frame, area, "Sentiment moyen", position, label, color, description);
}

// ============================================================================
// Articles
// ============================================================================

fn slot_color(slot: ArticleSlot) -> Color {
    match slot {
        ArticleSlot::Positive => Color::Green,
        ArticleSlot::Negative => Color::Red,
        ArticleSlot::Random => Color::Blue,
    }
}

fn article_lines(entry: &ArticleEntry) -> Vec<Line<'_>> {
    let mut lines = vec![Line::from(Span::styled(
        entry.title.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    if let Some(description) = &entry.description {
        lines.push(Line::from(Span::styled(
            description.as_str(),
            Style::default().fg(Color::Gray),
        )));
    }

    let mut meta = Vec::new();
    if let Some(sentiment) = entry.sentiment {
        meta.push(Span::raw(format!("Sentiment {:+.2}  ", sentiment)));
    }
    if entry.url.is_some() {
        meta.push(Span::styled("[o] Ouvrir", Style::default().fg(Color::Yellow)));
    }
    if !meta.is_empty() {
        lines.push(Line::from(meta));
    }
    lines
}

fn render_articles(frame: &mut Frame, panel: &ArticlePanel, selected: ArticleSlot, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[0]);

    for (i, entry) in panel.entries.iter().enumerate().take(columns.len()) {
        let is_selected = entry.slot == selected;
        let mut border = Style::default().fg(slot_color(entry.slot));
        if is_selected {
            border = border.add_modifier(Modifier::BOLD);
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if is_selected {
                ratatui::widgets::BorderType::Double
            } else {
                ratatui::widgets::BorderType::Plain
            })
            .border_style(border)
            .title(format!(" {} {} ", i + 1, entry.slot.label()));

        let paragraph = Paragraph::new(article_lines(entry))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, columns[i]);
    }

    let keywords = if panel.keywords.is_empty() {
        Line::from(Span::styled("Aucun mot-clé", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(
            panel
                .keywords
                .iter()
                .flat_map(|k| {
                    [
                        Span::styled(format!(" {} ", k), Style::default().fg(Color::Black).bg(Color::Cyan)),
                        Span::raw(" "),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    };

    let mut title = " Mots-clés ".to_string();
    if let Some(count) = panel.article_count {
        title = format!(" Mots-clés ({} articles) ", count);
    }
    let paragraph = Paragraph::new(keywords).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    frame.render_widget(paragraph, rows[1]);
}

// ============================================================================
// Helper : message centré
// ============================================================================

fn render_message(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(color))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
