use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(keys: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(keys, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("q / Ctrl-C", 2, "Quit"),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        key_line("R", 11, "Refresh experiments"),
        key_line("x", 11, "Dismiss error"),
        Line::from(""),
        Line::from("Experiments tab:"),
        key_line("↑/↓ j/k", 5, "Select experiment"),
        key_line("S", 11, "Edit run seed"),
        key_line("T", 11, "Edit failure threshold"),
        key_line("l", 11, "Launch run"),
        Line::from(""),
        Line::from("Compose tab:"),
        key_line("↑/↓ j/k", 5, "Move between fields"),
        key_line("enter", 7, "Edit field / cycle choice"),
        key_line("esc", 9, "Cancel edit"),
        key_line("c", 11, "Create experiment"),
        Line::from(""),
        Line::from("Run tab:"),
        key_line("↑/↓ j/k", 5, "Scroll attempts"),
        key_line("e", 11, "Export run as JSON"),
        key_line("y", 11, "Copy correlation id"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
