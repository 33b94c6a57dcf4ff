use crate::notifications::Notice;
use crate::ui::styles::{done_style, error_style, hint_style};
use ratatui::{layout::Rect, text::{Line, Span}, widgets::Paragraph, Frame};

/// Render the keybindings hint bar
pub fn render_keybindings(f: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::raw(" ↑/↓ select   "),
        Span::raw("Enter start/stop   "),
        Span::raw("r reload   "),
        Span::raw("q quit"),
    ]);

    let paragraph = Paragraph::new(hints).style(hint_style());
    f.render_widget(paragraph, area);
}

/// Render the latest notice in the status bar
pub fn render_status(f: &mut Frame, notice: Option<&Notice>, area: Rect) {
    let Some(notice) = notice else {
        return;
    };

    let style = if notice.is_error() { error_style() } else { done_style() };
    let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {}", notice.line()), style)));
    f.render_widget(paragraph, area);
}
