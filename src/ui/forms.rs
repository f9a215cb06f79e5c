use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::detail::{BookForm, FormField, UnsavedChoice};

/// Upper bound on the candidates offered for one input.
const MAX_SUGGESTIONS: usize = 5;

/// Focus and autocomplete tracking for the detail form. The field values
/// themselves live in `BookDetail`; this only knows which one has the cursor
/// and which stored values match what has been typed so far.
#[derive(Default, Clone)]
pub(crate) struct FieldEditor {
    pub(crate) active: FormField,
    pub(crate) error: Option<String>,
    pub(crate) suggestions: Vec<String>,
    pub(crate) highlighted: usize,
    pub(crate) autocomplete_disabled: bool,
}

impl FieldEditor {
    /// Move focus forward, dropping any suggestion for the old field.
    pub(crate) fn focus_next(&mut self) {
        self.active = self.active.next();
        self.reset_autocomplete();
    }

    pub(crate) fn focus_previous(&mut self) {
        self.active = self.active.previous();
        self.reset_autocomplete();
    }

    fn reset_autocomplete(&mut self) {
        self.clear_suggestions();
        self.autocomplete_disabled = false;
    }

    fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.highlighted = 0;
    }

    /// Insert a character into the active field. The year only takes digits
    /// and a leading minus sign.
    pub(crate) fn push_char(&mut self, form: &mut BookForm, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let value = form.value_mut(self.active);
        if self.active == FormField::Year
            && !(ch.is_ascii_digit() || (ch == '-' && value.is_empty()))
        {
            return false;
        }
        value.push(ch);
        self.autocomplete_disabled = false;
        true
    }

    pub(crate) fn backspace(&mut self, form: &mut BookForm) {
        form.value_mut(self.active).pop();
        self.autocomplete_disabled = false;
    }

    /// Recompute the suggestions for the active field from `candidates`.
    pub(crate) fn update_suggestion(&mut self, form: &BookForm, candidates: &[String]) {
        if self.active.lookup().is_none() || self.autocomplete_disabled {
            self.clear_suggestions();
            return;
        }
        let previous = self.highlighted_suggestion().map(str::to_string);
        self.suggestions = matching_values(candidates, form.value(self.active))
            .into_iter()
            .map(str::to_string)
            .collect();
        self.highlighted = previous
            .and_then(|value| self.suggestions.iter().position(|s| *s == value))
            .unwrap_or(0);
    }

    pub(crate) fn highlighted_suggestion(&self) -> Option<&str> {
        self.suggestions.get(self.highlighted).map(String::as_str)
    }

    /// Step through the offered candidates, wrapping at either end.
    pub(crate) fn cycle_suggestion(&mut self, forward: bool) -> bool {
        let len = self.suggestions.len();
        if len < 2 {
            return false;
        }
        self.highlighted = if forward {
            (self.highlighted + 1) % len
        } else {
            (self.highlighted + len - 1) % len
        };
        true
    }

    /// Replace the active value with the highlighted candidate. Returns
    /// `false` when there was nothing to accept.
    pub(crate) fn accept_suggestion(&mut self, form: &mut BookForm) -> bool {
        let Some(candidate) = self.highlighted_suggestion().map(str::to_string) else {
            return false;
        };
        *form.value_mut(self.active) = candidate;
        self.clear_suggestions();
        self.autocomplete_disabled = true;
        true
    }

    /// Dismiss the suggestions until the user types again.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.suggestions.is_empty() {
            return false;
        }
        self.clear_suggestions();
        self.autocomplete_disabled = true;
        true
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        !self.suggestions.is_empty()
    }

    /// Characters of the highlighted candidate past what is already typed,
    /// when the candidate starts with the typed text.
    pub(crate) fn suggestion_suffix(&self, form: &BookForm) -> Option<String> {
        let candidate = self.highlighted_suggestion()?;
        let typed = form.value(self.active);
        if !candidate.to_lowercase().starts_with(&typed.to_lowercase()) {
            return None;
        }
        let suffix: String = candidate.chars().skip(typed.chars().count()).collect();
        (!suffix.is_empty()).then_some(suffix)
    }

    /// Render one `Label: value` row. Inactive or read-only rows show a
    /// placeholder when empty. The focused row gets the ghost suffix, or the
    /// highlighted candidate after an arrow when it matches mid-word.
    pub(crate) fn build_line(
        &self,
        form: &BookForm,
        field: FormField,
        editable: bool,
    ) -> Line<'static> {
        let value = form.value(field);
        let is_active = editable && self.active == field;

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![Span::raw(format!("{:>10}: ", field.label()))];
        if value.is_empty() && !is_active {
            spans.push(Span::styled("-", style));
        } else {
            spans.push(Span::styled(value.to_string(), style));
        }
        if is_active {
            let hint = Style::default().fg(Color::DarkGray);
            if let Some(suffix) = self.suggestion_suffix(form) {
                spans.push(Span::styled(suffix, hint));
            } else if let Some(candidate) = self.highlighted_suggestion() {
                spans.push(Span::styled(format!("  → {candidate}"), hint));
            }
            if self.suggestions.len() > 1 {
                spans.push(Span::styled(
                    format!("  [{}/{}]", self.highlighted + 1, self.suggestions.len()),
                    hint,
                ));
            }
        }

        Line::from(spans)
    }
}

/// Stored values containing `typed` anywhere, compared case-insensitively.
/// Values that start with it come first; an exact match needs no completion
/// and is left out.
pub(crate) fn matching_values<'a>(candidates: &'a [String], typed: &str) -> Vec<&'a str> {
    let typed_lower = typed.trim().to_lowercase();
    if typed_lower.is_empty() {
        return Vec::new();
    }
    let (mut prefixed, mut inner): (Vec<&str>, Vec<&str>) = (Vec::new(), Vec::new());
    for candidate in candidates {
        let lower = candidate.to_lowercase();
        if lower == typed_lower {
            continue;
        }
        if lower.starts_with(&typed_lower) {
            prefixed.push(candidate.as_str());
        } else if lower.contains(&typed_lower) {
            inner.push(candidate.as_str());
        }
    }
    prefixed.append(&mut inner);
    prefixed.truncate(MAX_SUGGESTIONS);
    prefixed
}

/// Single-line text prompt used for the borrower name and file paths.
#[derive(Clone)]
pub(crate) struct TextPrompt {
    pub(crate) purpose: PromptPurpose,
    pub(crate) value: String,
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum PromptPurpose {
    Borrower,
    ExportPath,
    ImportPath,
}

impl TextPrompt {
    pub(crate) fn new(purpose: PromptPurpose, initial: impl Into<String>) -> Self {
        Self {
            purpose,
            value: initial.into(),
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.purpose {
            PromptPurpose::Borrower => "Lend Book",
            PromptPurpose::ExportPath => "Export Catalog",
            PromptPurpose::ImportPath => "Import Spreadsheet",
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self.purpose {
            PromptPurpose::Borrower => "Borrower: ",
            PromptPurpose::ExportPath | PromptPurpose::ImportPath => "File: ",
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.value.push(ch);
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }
}

/// Three-way choice shown when leaving an edit with unsaved changes.
pub(crate) struct ConfirmUnsaved {
    pub(crate) selection: UnsavedChoice,
}

impl ConfirmUnsaved {
    /// Initial selection is "Save".
    pub(crate) fn new() -> Self {
        Self {
            selection: UnsavedChoice::Save,
        }
    }

    /// Move the selection forward (Save → Discard → Stay).
    pub(crate) fn next(&mut self) {
        self.selection = match self.selection {
            UnsavedChoice::Save => UnsavedChoice::Discard,
            UnsavedChoice::Discard => UnsavedChoice::Stay,
            UnsavedChoice::Stay => UnsavedChoice::Save,
        };
    }

    pub(crate) fn previous(&mut self) {
        self.selection = match self.selection {
            UnsavedChoice::Save => UnsavedChoice::Stay,
            UnsavedChoice::Discard => UnsavedChoice::Save,
            UnsavedChoice::Stay => UnsavedChoice::Discard,
        };
    }

    pub(crate) fn labels(&self) -> [&'static str; 3] {
        ["Save & Leave", "Discard & Leave", "Keep Editing"]
    }

    pub(crate) fn selected_index(&self) -> usize {
        match self.selection {
            UnsavedChoice::Save => 0,
            UnsavedChoice::Discard => 1,
            UnsavedChoice::Stay => 2,
        }
    }
}
