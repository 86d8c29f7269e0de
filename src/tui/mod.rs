//! TUI module for terminal user interfaces

mod clipboard;
mod lookup_app;
mod proxy_viewer;

pub use clipboard::SystemClipboard;
pub use lookup_app::LookupApp;
pub use proxy_viewer::ProxyViewerApp;

use crate::Result;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io::{self, Stdout};

pub(crate) type Term = Terminal<CrosstermBackend<Stdout>>;

pub(crate) fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

pub(crate) fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// A rectangle of `percent_x` by `percent_y` centered in `area`
///
/// Percentages above 100 are treated as 100.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let scale = |len: u16, percent: u16| (u32::from(len) * u32::from(percent.min(100)) / 100) as u16;
    let width = scale(area.width, percent_x);
    let height = scale(area.height, percent_y);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Move a selection index by `delta`, clamped to `len`
pub(crate) fn step_index(current: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = current.unwrap_or(0) as isize;
    Some((current + delta).clamp(0, len as isize - 1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_index() {
        assert_eq!(step_index(None, 1, 0), None);
        assert_eq!(step_index(None, 1, 3), Some(1));
        assert_eq!(step_index(Some(2), 1, 3), Some(2));
        assert_eq!(step_index(Some(1), -5, 3), Some(0));
        assert_eq!(step_index(Some(0), 20, 30), Some(20));
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let rect = centered_rect(60, 50, area);
        assert_eq!(rect, Rect::new(20, 12, 60, 25));
    }

    #[test]
    fn test_centered_rect_wide_terminal() {
        // 2000 * 70 does not fit in a u16
        let area = Rect::new(0, 0, 2000, 10);
        let rect = centered_rect(70, 50, area);
        assert_eq!(rect, Rect::new(300, 2, 1400, 5));

        let full = centered_rect(150, 100, area);
        assert_eq!(full, area);
    }
}
