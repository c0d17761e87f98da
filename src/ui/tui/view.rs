use super::*;

#[derive(Debug, Clone)]
struct ListRow {
    label: String,
    detail: String,
    badge: Option<(String, PackedRgba)>,
    create: bool,
}

impl ListRow {
    fn new(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: detail.into(),
            badge: None,
            create: false,
        }
    }

    fn creation(label: String) -> Self {
        Self {
            create: true,
            ..Self::new(label, "")
        }
    }

    fn with_badge(mut self, badge: Option<(String, PackedRgba)>) -> Self {
        self.badge = badge;
        self
    }
}

/// First and one-past-last row to draw so that `selected` stays visible.
pub(super) fn visible_window(selected: usize, len: usize, height: usize) -> (usize, usize) {
    if height == 0 || len == 0 {
        return (0, 0);
    }
    let start = selected.saturating_add(1).saturating_sub(height).min(len.saturating_sub(1));
    (start, start.saturating_add(height).min(len))
}

fn bar_line(
    width: usize,
    base_style: Style,
    left: Vec<FtSpan<'static>>,
    right: Vec<FtSpan<'static>>,
) -> FtLine {
    let left_width: usize = left
        .iter()
        .map(|span| text_display_width(span.content.as_ref()))
        .sum();
    let right_width: usize = right
        .iter()
        .map(|span| text_display_width(span.content.as_ref()))
        .sum();
    let mut spans = left;
    if left_width.saturating_add(right_width) < width {
        spans.push(FtSpan::styled(
            " ".repeat(width - left_width - right_width),
            base_style,
        ));
        spans.extend(right);
    }
    FtLine::from_spans(spans)
}

impl PaletteApp {
    pub(super) fn view_layout_for_size(width: u16, height: u16) -> ViewLayout {
        let area = Rect::from_size(width, height);
        let rows = Flex::vertical()
            .constraints([
                Constraint::Fixed(HEADER_HEIGHT),
                Constraint::Fixed(INPUT_HEIGHT),
                Constraint::Fill,
                Constraint::Fixed(STATUS_HEIGHT),
            ])
            .split(area);

        ViewLayout {
            header: rows[0],
            input: rows[1],
            list: rows[2],
            status: rows[3],
        }
    }

    pub(super) fn render_model(&self, frame: &mut Frame) {
        frame.set_cursor(None);
        frame.set_cursor_visible(false);
        let area = Rect::from_size(frame.buffer.width(), frame.buffer.height());
        let theme = ui_theme(self.model.theme);
        Block::new()
            .style(Style::new().bg(theme.base))
            .render(area, frame);

        let layout = Self::view_layout_for_size(area.width, area.height);
        self.render_header(frame, layout.header, theme);
        self.render_input(frame, layout.input, theme);
        self.render_body(frame, layout.list, theme);
        self.render_status_line(frame, layout.status, theme);
    }

    fn breadcrumb(&self) -> String {
        let mut parts = Vec::new();
        if let Some(project) = &self.model.selected_project {
            parts.push(file_label(project));
        }
        if let Some(worktree) = &self.model.selected_worktree_path
            && matches!(
                self.model.mode,
                Mode::Tool | Mode::ToolStarting | Mode::Sessions
            )
        {
            parts.push(file_label(worktree));
        }
        parts.join(" / ")
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, theme: UiTheme) {
        if area.is_empty() {
            return;
        }

        let base_style = Style::new().bg(theme.crust).fg(theme.text);
        let breadcrumb = self.breadcrumb();
        let mut left: Vec<FtSpan<'static>> = vec![
            FtSpan::styled(" ".to_string(), base_style),
            FtSpan::styled(
                " Rivet ".to_string(),
                Style::new().bg(theme.surface0).fg(theme.blue).bold(),
            ),
            FtSpan::styled(" ".to_string(), base_style),
        ];
        if !breadcrumb.is_empty() {
            left.push(FtSpan::styled(
                format!(" {breadcrumb} "),
                Style::new().bg(theme.mantle).fg(theme.subtext0),
            ));
        }
        let right = vec![FtSpan::styled(
            format!(" {} ", self.model.theme.label()),
            Style::new().bg(theme.crust).fg(theme.overlay0),
        )];

        let line = bar_line(usize::from(area.width), base_style, left, right);
        Paragraph::new(FtText::from_line(line)).render(area, frame);
    }

    fn input_title(&self) -> &'static str {
        match self.model.mode {
            Mode::Loading | Mode::Browsing | Mode::ProjectDeleteConfirm => "Projects",
            Mode::Worktree | Mode::WorktreeDeleteConfirm => "Worktrees",
            Mode::Tool | Mode::ToolStarting => "Tools",
            Mode::Sessions => "Sessions",
            Mode::Error => "Error",
        }
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, theme: UiTheme) {
        if area.is_empty() {
            return;
        }

        let focused = self.model.current_query().is_some();
        let block = Block::new()
            .title(self.input_title())
            .borders(Borders::ALL)
            .border_style(Style::new().fg(if focused {
                theme.blue
            } else {
                theme.surface1
            }));
        let inner = block.inner(area);
        block.render(area, frame);
        if inner.is_empty() {
            return;
        }

        let query = self.model.current_query().unwrap_or_default();
        let mut spans = vec![
            FtSpan::styled("> ".to_string(), Style::new().fg(theme.mauve).bold()),
            FtSpan::styled(query.to_string(), Style::new().fg(theme.text)),
        ];
        if focused {
            spans.push(FtSpan::styled(
                "_".to_string(),
                Style::new().fg(theme.overlay0),
            ));
        }
        Paragraph::new(FtText::from_line(FtLine::from_spans(spans))).render(inner, frame);
    }

    fn render_body(&self, frame: &mut Frame, area: Rect, theme: UiTheme) {
        if area.is_empty() {
            return;
        }

        match self.model.mode {
            Mode::Loading => self.render_notice(
                frame,
                area,
                vec![self.notice_line("Scanning projects…", theme.subtext0, false)],
            ),
            Mode::Error => {
                let message = self.model.error.clone().unwrap_or_default();
                self.render_notice(
                    frame,
                    area,
                    vec![
                        self.notice_line("Error", theme.red, true),
                        self.notice_line(&message, theme.peach, false),
                        FtLine::raw(""),
                        self.notice_line("esc quit", theme.overlay0, false),
                    ],
                );
            }
            Mode::ProjectDeleteConfirm | Mode::WorktreeDeleteConfirm => {
                let (noun, target) = if self.model.mode == Mode::ProjectDeleteConfirm {
                    ("project", self.model.delete_project_target.as_ref())
                } else {
                    ("worktree", self.model.delete_worktree_target.as_ref())
                };
                let target = target
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                self.render_notice(
                    frame,
                    area,
                    vec![
                        self.notice_line(&format!("Delete {noun}?"), theme.red, true),
                        self.notice_line(&target, theme.text, false),
                        FtLine::raw(""),
                        self.notice_line(
                            "Its tool sessions are killed first.",
                            theme.subtext0,
                            false,
                        ),
                        self.notice_line("enter confirm   esc cancel", theme.overlay0, false),
                    ],
                );
            }
            Mode::ToolStarting => self.render_tool_starting(frame, area, theme),
            Mode::Browsing | Mode::Worktree | Mode::Tool | Mode::Sessions => {
                self.render_list(frame, area, theme);
            }
        }
    }

    fn notice_line(&self, text: &str, color: PackedRgba, bold: bool) -> FtLine {
        let style = if bold {
            Style::new().fg(color).bold()
        } else {
            Style::new().fg(color)
        };
        FtLine::from_spans(vec![FtSpan::styled(format!(" {text}"), style)])
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect, lines: Vec<FtLine>) {
        Paragraph::new(FtText::from_lines(lines)).render(area, frame);
    }

    fn render_tool_starting(&self, frame: &mut Frame, area: Rect, theme: UiTheme) {
        let tool = self
            .model
            .pending_spec
            .as_ref()
            .map(|spec| spec.tool.clone())
            .unwrap_or_default();
        let label = format!(" Starting {tool}…");
        let width = u16::try_from(text_display_width(&label))
            .unwrap_or(area.width)
            .min(area.width);
        StyledText::new(label.as_str())
            .bold()
            .base_color(theme.mauve)
            .effect(TextEffect::AnimatedGradient {
                gradient: ColorGradient::new(vec![
                    (0.0, theme.mauve),
                    (0.5, theme.teal),
                    (1.0, theme.mauve),
                ]),
                speed: 1.8,
            })
            .time(self.animation_time())
            .render(Rect::new(area.x, area.y, width, 1), frame);

        if area.height > 2 {
            let hint = Rect::new(area.x, area.y.saturating_add(2), area.width, 1);
            Paragraph::new(FtText::from_line(
                self.notice_line("esc cancel", theme.overlay0, false),
            ))
            .render(hint, frame);
        }
    }

    fn animation_time(&self) -> f64 {
        self.animation_frame as f64 * (ANIMATION_INTERVAL_MS as f64 / 1000.0)
    }

    fn list_rows(&self, theme: UiTheme) -> (Vec<ListRow>, usize) {
        let model = &self.model;
        match model.mode {
            Mode::Browsing => {
                let mut rows: Vec<ListRow> = model
                    .filtered
                    .iter()
                    .map(|entry| ListRow::new(entry.name.clone(), entry.path.display().to_string()))
                    .collect();
                if let Some(path) = model.create_project_path() {
                    rows.push(ListRow::creation(format!(
                        "Create project {}",
                        path.display()
                    )));
                }
                (rows, model.selected_idx)
            }
            Mode::Worktree => {
                let mut rows: Vec<ListRow> = model
                    .filtered_worktrees
                    .iter()
                    .map(|worktree| ListRow::new(worktree.name.clone(), worktree.branch.clone()))
                    .collect();
                if let Some(name) = model.create_worktree_name() {
                    rows.push(ListRow::creation(format!("Create worktree {name}")));
                }
                (rows, model.worktree_idx)
            }
            Mode::Tool => {
                let rows = model
                    .filtered_tools
                    .iter()
                    .map(|tool| ListRow::new(tool.clone(), "").with_badge(self.tool_badge(tool, theme)))
                    .collect();
                (rows, model.tool_idx)
            }
            Mode::Sessions => {
                let rows = model
                    .filtered_sessions
                    .iter()
                    .map(|session| {
                        ListRow::new(session.name.clone(), session.dir_path.display().to_string())
                            .with_badge(Some((session.tool.clone(), theme.lavender)))
                    })
                    .collect();
                (rows, model.session_idx)
            }
            _ => (Vec::new(), 0),
        }
    }

    fn tool_badge(&self, tool: &str, theme: UiTheme) -> Option<(String, PackedRgba)> {
        if self.model.tool_errors.contains_key(tool) {
            return Some(("failed".to_string(), theme.red));
        }
        match self.model.tool_warm_start.get(tool) {
            Some(WarmStart::Existing) => Some(("running".to_string(), theme.teal)),
            Some(WarmStart::StartedAt(_)) => Some(("warm".to_string(), theme.yellow)),
            None if crate::domain::tool_needs_warmup(tool) => {
                Some(("warming".to_string(), theme.overlay0))
            }
            None => None,
        }
    }

    fn list_notice(&self) -> Option<(String, bool)> {
        let model = &self.model;
        match model.mode {
            Mode::Worktree => model.project_warning.clone().map(|warning| (warning, false)),
            Mode::Tool => model.tool_error.clone().map(|error| (error, true)),
            Mode::Sessions => model.session_error.clone().map(|error| (error, true)),
            _ => None,
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect, theme: UiTheme) {
        let mut lines = Vec::new();
        if let Some((notice, is_error)) = self.list_notice() {
            let color = if is_error { theme.red } else { theme.peach };
            lines.push(self.notice_line(&notice, color, true));
        }

        let (rows, selected) = self.list_rows(theme);
        if rows.is_empty() {
            lines.push(self.notice_line(self.empty_label(), theme.overlay0, false));
            Paragraph::new(FtText::from_lines(lines)).render(area, frame);
            return;
        }

        let height = usize::from(area.height).saturating_sub(lines.len());
        let (start, end) = visible_window(selected, rows.len(), height);
        for (index, row) in rows.iter().enumerate().take(end).skip(start) {
            lines.push(self.row_line(row, index == selected, usize::from(area.width), theme));
        }
        Paragraph::new(FtText::from_lines(lines)).render(area, frame);
    }

    fn empty_label(&self) -> &'static str {
        match self.model.mode {
            Mode::Browsing => "No projects match. Type a path to create one.",
            Mode::Worktree => "No worktrees. Type a branch name to create one.",
            Mode::Tool => "No tools match.",
            Mode::Sessions => "No sessions running.",
            _ => "",
        }
    }

    fn row_line(&self, row: &ListRow, selected: bool, width: usize, theme: UiTheme) -> FtLine {
        let row_bg = if selected { theme.surface0 } else { theme.base };
        let marker_style = Style::new().bg(row_bg).fg(theme.blue).bold();
        let label_style = match (row.create, selected) {
            (true, _) => Style::new().bg(row_bg).fg(theme.teal).bold(),
            (false, true) => Style::new().bg(row_bg).fg(theme.text).bold(),
            (false, false) => Style::new().bg(row_bg).fg(theme.text),
        };

        let mut left: Vec<FtSpan<'static>> = vec![
            FtSpan::styled(
                if selected { " ▸ " } else { "   " }.to_string(),
                marker_style,
            ),
            FtSpan::styled(
                if row.create {
                    format!("+ {}", row.label)
                } else {
                    row.label.clone()
                },
                label_style,
            ),
        ];
        if !row.detail.is_empty() {
            left.push(FtSpan::styled(
                format!("  {}", row.detail),
                Style::new().bg(row_bg).fg(theme.overlay0),
            ));
        }
        let right = row
            .badge
            .as_ref()
            .map(|(label, color)| {
                vec![FtSpan::styled(
                    format!(" {label} "),
                    Style::new().bg(row_bg).fg(*color),
                )]
            })
            .unwrap_or_default();

        bar_line(width, Style::new().bg(row_bg), left, right)
    }

    fn key_hints(&self) -> &'static str {
        match self.model.mode {
            Mode::Loading => "esc quit",
            Mode::Browsing => "enter open  ctrl+d delete  ctrl+s sessions  ctrl+t theme  esc quit",
            Mode::Worktree => "enter select  ctrl+d delete  ctrl+s sessions  esc back",
            Mode::Tool => "enter start  ctrl+s sessions  ctrl+t theme  esc back",
            Mode::ToolStarting => "esc cancel  ctrl+c quit",
            Mode::Sessions => "enter attach  ctrl+t theme  esc back",
            Mode::ProjectDeleteConfirm | Mode::WorktreeDeleteConfirm => "enter confirm  esc cancel",
            Mode::Error => "esc quit",
        }
    }

    pub(super) fn status_text(&self) -> String {
        let model = &self.model;
        match model.mode {
            Mode::Tool | Mode::ToolStarting => {
                let mut status = format!(
                    "warmup {}/{}",
                    model.tool_warmup_completed, model.tool_warmup_total
                );
                if model.tool_warmup_failed > 0 {
                    status.push_str(&format!(", {} failed", model.tool_warmup_failed));
                }
                status
            }
            Mode::Browsing => format!("{} projects", model.filtered.len()),
            Mode::Worktree => format!("{} worktrees", model.filtered_worktrees.len()),
            Mode::Sessions => format!("{} sessions", model.filtered_sessions.len()),
            _ => String::new(),
        }
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect, theme: UiTheme) {
        if area.is_empty() {
            return;
        }

        let base_style = Style::new().bg(theme.crust).fg(theme.subtext0);
        let left = vec![FtSpan::styled(format!(" {}", self.key_hints()), base_style)];
        let status = self.status_text();
        let right = if status.is_empty() {
            Vec::new()
        } else {
            vec![FtSpan::styled(
                format!(" {status} "),
                Style::new().bg(theme.mantle).fg(theme.yellow),
            )]
        };
        let line = bar_line(usize::from(area.width), base_style, left, right);
        Paragraph::new(FtText::from_line(line)).render(area, frame);
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
