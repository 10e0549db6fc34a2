use crate::app::App;
use crate::color::{parse_color, parse_modifier};
use crate::keys::describe;
use crate::raster::RasterView;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

// ============================================================================
// UI RENDERING
// ============================================================================

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    if let Some(canvas) = app.canvas() {
        f.render_widget(RasterView::new(canvas), size);
    }

    if app.config.help_text.enabled && size.height > 0 {
        render_help_text(f, app, size);
    }
}

/// "theme" follows the given theme color, anything else goes through the
/// regular color parser.
fn resolve_color(value: &str, theme_color: Color) -> Color {
    if value.eq_ignore_ascii_case("theme") {
        theme_color
    } else {
        parse_color(value)
    }
}

fn render_help_text(f: &mut Frame, app: &App, size: Rect) {
    let config = &app.config;
    let help_config = &config.help_text;
    let theme = app.theme();
    let colors = theme.colors();

    let help_key_fg = resolve_color(&config.colors.help_key_fg, colors.primary.to_color());
    let help_fg = resolve_color(&config.colors.help_fg, colors.muted_text.to_color());
    let help_key_modifier = parse_modifier(&config.colors.help_key_modifier);
    let key_style = Style::default()
        .fg(help_key_fg)
        .add_modifier(help_key_modifier);

    let scheme = theme.color_scheme.map_or("default", |s| s.as_str());
    let status = format!(
        "{} \u{00B7} {} \u{00B7} {}{}",
        theme.background_style.display_name(),
        crate::theme::mode_str(theme.dark_mode),
        scheme,
        if app.is_paused() { " \u{00B7} paused" } else { "" }
    );

    let keys = &config.keys;
    let mut help_spans = vec![
        Span::styled(status, Style::default().fg(colors.heading.to_color())),
        Span::raw(&help_config.separator),
    ];
    let entries = [
        (&keys.toggle_style, " Style"),
        (&keys.toggle_mode, " Mode"),
        (&keys.next_scheme, " Scheme"),
        (&keys.pause, " Pause"),
        (&keys.quit, " Quit"),
    ];
    for (i, (bound, label)) in entries.iter().enumerate() {
        if i > 0 {
            help_spans.push(Span::raw(&help_config.separator));
        }
        help_spans.push(Span::styled(describe(bound), key_style));
        help_spans.push(Span::styled(*label, Style::default().fg(help_fg)));
    }

    let help_area = Rect {
        x: 0,
        y: size.height.saturating_sub(1),
        width: size.width,
        height: 1,
    };

    let help_text = Paragraph::new(Line::from(help_spans))
        .alignment(Alignment::Center)
        .style(Style::default().fg(help_fg));

    f.render_widget(help_text, help_area);
}
