use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::Line,
    widgets::canvas::{Canvas, Circle, Line as CanvasLine},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::comparison::{
    self, ChartLayout, INNER_RADIUS, OUTER_RADIUS, PLOT_BOTTOM, PLOT_LEFT, PLOT_RIGHT, PLOT_TOP,
    TABLE_HEADERS, VIEW_HEIGHT, VIEW_WIDTH,
};
use crate::model::SummaryModel;

/// Helper function to draw a line on a canvas
pub fn draw_line(
    ctx: &mut ratatui::widgets::canvas::Context,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    color: Color,
) {
    ctx.draw(&CanvasLine {
        x1,
        y1,
        x2,
        y2,
        color,
    });
}

/// Canvas y grows upward; the chart geometry grows downward.
fn flip(y: f64) -> f64 {
    VIEW_HEIGHT - y
}

pub fn draw_quality_cost(area: Rect, f: &mut Frame, rows: &[SummaryModel]) {
    let block = Block::default().borders(Borders::ALL).title("Quality vs Cost");
    let points = match comparison::layout_points(rows) {
        ChartLayout::Placeholder(msg) => {
            f.render_widget(Paragraph::new(msg).block(block), area);
            return;
        }
        ChartLayout::Points(points) => points,
    };
    let max_cost = comparison::cost_scale(rows).domain_max();

    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, VIEW_WIDTH])
        .y_bounds([0.0, VIEW_HEIGHT])
        .paint(move |ctx| {
            // Axes
            draw_line(
                ctx,
                PLOT_LEFT,
                flip(PLOT_BOTTOM),
                PLOT_RIGHT,
                flip(PLOT_BOTTOM),
                Color::DarkGray,
            );
            draw_line(
                ctx,
                PLOT_LEFT,
                flip(PLOT_BOTTOM),
                PLOT_LEFT,
                flip(PLOT_TOP),
                Color::DarkGray,
            );
            ctx.print(
                PLOT_RIGHT - 80.0,
                flip(PLOT_BOTTOM + 25.0),
                Line::styled("Cost (USD)", Style::default().fg(Color::Gray)),
            );
            ctx.print(
                PLOT_RIGHT - 80.0,
                flip(PLOT_BOTTOM + 45.0),
                Line::styled(format!("max ${max_cost:.6}"), Style::default().fg(Color::Gray)),
            );
            ctx.print(
                8.0,
                flip(PLOT_TOP),
                Line::styled("Quality", Style::default().fg(Color::Gray)),
            );

            ctx.layer();
            for p in &points {
                ctx.draw(&Circle {
                    x: p.x,
                    y: flip(p.y),
                    radius: OUTER_RADIUS,
                    color: Color::Cyan,
                });
                ctx.draw(&Circle {
                    x: p.x,
                    y: flip(p.y),
                    radius: INNER_RADIUS,
                    color: Color::White,
                });
                ctx.print(
                    p.label_x,
                    flip(p.label_y),
                    Line::styled(p.label.clone(), Style::default().fg(Color::Yellow)),
                );
            }
        });
    f.render_widget(canvas, area);
}

pub fn draw_comparison_table(area: Rect, f: &mut Frame, rows: &[SummaryModel]) {
    let block = Block::default().borders(Borders::ALL).title("Model Comparison");
    if rows.is_empty() {
        f.render_widget(Paragraph::new(comparison::EMPTY_SUMMARY).block(block), area);
        return;
    }

    let header = Row::new(TABLE_HEADERS.iter().map(|h| Cell::from(*h)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let body = comparison::table_rows(rows).into_iter().map(|r| {
        Row::new(vec![
            Cell::from(r.model),
            Cell::from(r.quality),
            Cell::from(r.pass_rate),
            Cell::from(r.latency),
            Cell::from(r.cost),
            Cell::from(r.errors),
        ])
    });
    let widths = [
        Constraint::Min(18),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(6),
    ];
    let table = Table::new(body, widths).header(header).block(block);
    f.render_widget(table, area);
}
