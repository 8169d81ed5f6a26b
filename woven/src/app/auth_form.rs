use crate::focus_ring;
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use woven_core::{
    signin::{self, Effect, SignIn},
    Field, MissingTokenPolicy,
};

focus_ring!(Focus, Email, Password, Submit);

impl Focus {
    /// The form field under this focus, if it is one.
    fn field(self) -> Option<Field> {
        match self {
            Self::Email => Some(Field::Email),
            Self::Password => Some(Field::Password),
            Self::Submit => None,
        }
    }
}

/// The sign-in form: text inputs wired up to a `SignIn` flow.
#[derive(Debug)]
pub struct AuthForm {
    /// Validation and submission state
    flow: SignIn,

    /// Which control has focus
    focus: Focus,

    /// Who are you?
    email: Input,

    /// What's your password? (Will be masked)
    password: Input,
}

impl AuthForm {
    /// A fresh, empty form
    pub fn new(policy: MissingTokenPolicy) -> Self {
        Self {
            flow: SignIn::new(policy),
            focus: Focus::Email,
            email: Input::default(),
            password: Input::default(),
        }
    }

    /// The flow behind this form
    #[cfg(test)]
    pub fn flow(&self) -> &SignIn {
        &self.flow
    }

    /// Feed an action to the flow, returning effects to carry out.
    pub fn handle(&mut self, action: signin::Action) -> Vec<Effect> {
        self.flow.handle(action)
    }

    /// Handle a key press, returning any effects the flow wants carried out.
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Tab => self.move_focus(self.focus.next()),
            KeyCode::BackTab => self.move_focus(self.focus.prev()),
            KeyCode::Enter => self.submit(),
            KeyCode::Char(' ') if self.focus == Focus::Submit => self.submit(),
            _ => {
                let Some(field) = self.focus.field() else {
                    return vec![];
                };

                let input = self.input_mut(field);
                let changed = input
                    .handle_event(&Event::Key(key))
                    .is_some_and(|state| state.value);

                if changed {
                    let value = input.value().to_string();
                    self.flow.handle(signin::Action::Changed(field, value))
                } else {
                    vec![]
                }
            }
        }
    }

    fn move_focus(&mut self, to: Focus) -> Vec<Effect> {
        let effects = self.blur_focused();
        self.focus = to;

        effects
    }

    fn blur_focused(&mut self) -> Vec<Effect> {
        match self.focus.field() {
            Some(field) => self.flow.handle(signin::Action::Blurred(field)),
            None => vec![],
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        let mut effects = self.blur_focused();
        effects.extend(self.flow.handle(signin::Action::Submit));

        effects
    }

    fn input_mut(&mut self, field: Field) -> &mut Input {
        match field {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
        }
    }

    /// Render the form centered in `body_area`.
    #[expect(clippy::cast_possible_truncation)]
    pub fn render(&self, body_area: Rect, frame: &mut Frame<'_>) {
        let popup_vert = Layout::vertical([Constraint::Length(11)]).flex(Flex::Center);
        let popup_horiz = Layout::horizontal([Constraint::Percentage(50)]).flex(Flex::Center);

        let [popup_area] = popup_vert.areas(body_area);
        let [popup_area] = popup_horiz.areas(popup_area);
        frame.render_widget(Clear, popup_area);

        let width = popup_area.width.saturating_sub(3); // -2 for the border, -1 for the cursor

        let rows = Layout::vertical(Constraint::from_lengths([3, 1, 3, 1, 3]));
        let [email_area, email_error_area, password_area, password_error_area, submit_area] =
            rows.areas(popup_area);

        for (field, area, error_area) in [
            (Field::Email, email_area, email_error_area),
            (Field::Password, password_area, password_error_area),
        ] {
            let input = match field {
                Field::Email => &self.email,
                Field::Password => &self.password,
            };
            let error = self.flow.form().visible_error(field);
            let scroll = input.visual_scroll(width as usize);

            let shown = match field {
                Field::Email => input.value().to_string(),
                Field::Password => "*".repeat(input.value().chars().count()),
            };

            let border_style = if error.is_some() {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Blue)
            };

            frame.render_widget(
                Paragraph::new(shown).scroll((0, scroll as u16)).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(field.label())
                        .border_style(border_style),
                ),
                area,
            );

            if let Some(error) = error {
                frame.render_widget(
                    Paragraph::new(Line::from(error)).style(Style::default().fg(Color::Red)),
                    error_area,
                );
            }

            if self.focus.field() == Some(field) {
                frame.set_cursor_position((
                    area.x
                        + (input.visual_cursor().max(scroll) - scroll) as u16 // current end of text
                        + 1, // just past the end of the text
                    area.y + 1, // +1 row for the border/title
                ));
            }
        }

        let mut submit_style = Style::default().fg(Color::Blue);
        if self.flow.is_busy() {
            submit_style = submit_style.fg(Color::DarkGray);
        } else if self.focus == Focus::Submit {
            submit_style = submit_style.add_modifier(Modifier::REVERSED);
        }

        frame.render_widget(
            Paragraph::new(self.flow.submit_label())
                .centered()
                .style(submit_style)
                .block(Block::default().borders(Borders::ALL)),
            submit_area,
        );
    }
}
