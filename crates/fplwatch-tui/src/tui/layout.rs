// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Main Panel (tab content)                          |
// |                                                   |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// On the Dashboard tab the main panel is split again:
//
// +-------------------------+------------------------+
// | Overview (7 rows)        | Safety (7 rows)        |
// +-------------------------+------------------------+
// | Pick Breakdown (65%)     | Next GW Preview (35%)  |
// +-------------------------+------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: connection, team id, gameweek, tabs.
    pub status_bar: Rect,
    /// Tab-switched content area.
    pub main_panel: Rect,
    /// Bottom row: keyboard hints or the team id prompt.
    pub help_bar: Rect,
}

/// Dashboard tab sub-areas.
#[derive(Debug, Clone)]
pub struct DashboardLayout {
    pub overview: Rect,
    pub safety: Rect,
    pub breakdown: Rect,
    pub preview: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(5),    // main panel
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        main_panel: vertical[1],
        help_bar: vertical[2],
    }
}

pub fn dashboard_layout(area: Rect) -> DashboardLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    DashboardLayout {
        overview: top[0],
        safety: top[1],
        breakdown: bottom[0],
        preview: bottom[1],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
