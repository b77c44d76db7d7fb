//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! The layout is a two-row split: a scrollable post list on top and a
//! one-line status bar at the bottom.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_post_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

/// Render the scrollable post list.
fn draw_post_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .posts
        .iter()
        .map(|post| {
            let mut spans = vec![
                Span::styled(
                    format!("{:>6}", post.score),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(&post.title, Style::default().fg(Color::White)),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", post.source),
                    Style::default().fg(Color::Cyan),
                ),
            ];
            if post.media.len() > 1 {
                spans.push(Span::styled(
                    format!(" +{}", post.media.len()),
                    Style::default().fg(Color::Magenta),
                ));
            }
            if post.nsfw {
                spans.push(Span::styled(" nsfw", Style::default().fg(Color::Red)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(" Media stream ")
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let media = app
        .selected_post()
        .and_then(|post| post.media.first())
        .map(String::as_str)
        .unwrap_or("");
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} posts", app.posts.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  Home/End: jump  n: next page  "),
        Span::styled(media, Style::default().fg(Color::Blue)),
    ]));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{make_post, sample_posts};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(100, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    #[test]
    fn draw_does_not_panic_with_no_posts() {
        let mut app = App::new();
        render(&mut app);
    }

    #[test]
    fn draw_shows_titles_sources_and_count() {
        let mut app = App::new();
        app.append_page(sample_posts(3), false);
        app.status = "OK".to_string();

        let text = render(&mut app);
        assert!(text.contains("3 posts"), "status bar should show post count");
        assert!(text.contains("p1"));
        assert!(text.contains("[test]"));
    }

    #[test]
    fn albums_show_media_count() {
        let mut app = App::new();
        app.append_page(vec![make_post("album", 7, 4)], true);

        let text = render(&mut app);
        assert!(text.contains("+4"));
    }
}
