use crate::data::{NewPoll, PollOption, PollQuestion};
use crate::ui_poll_view::Notice;
use chrono::{Local, NaiveDateTime};
use log::info;
use std::fmt;
use uuid::Uuid;

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 10;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct DraftQuestion {
    pub id: Uuid,
    pub content: String,
    pub options: Vec<String>,
}

impl DraftQuestion {
    fn empty() -> Self {
        DraftQuestion {
            id: Uuid::new_v4(),
            content: String::new(),
            options: vec![String::new(); MIN_OPTIONS],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftPhase {
    Editing,
    Publishing,
    Published,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyQuestion { question: usize },
    OptionCount { question: usize, count: usize },
    EmptyOption { question: usize, option: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyQuestion { question } => {
                write!(f, "Question {} has no text", question + 1)
            }
            ValidationIssue::OptionCount { question, count } => write!(
                f,
                "Question {} needs between {} and {} options (has {})",
                question + 1,
                MIN_OPTIONS,
                MAX_OPTIONS,
                count
            ),
            ValidationIssue::EmptyOption { question, option } => {
                write!(f, "Question {}, option {} is empty", question + 1, option + 1)
            }
        }
    }
}

/// Why a finish request did not produce a payload.
#[derive(Debug, PartialEq)]
pub enum PublishRefusal {
    Invalid(Vec<ValidationIssue>),
    InProgress,
    AlreadyPublished,
}

/// Enable state of the boundary-sensitive builder buttons.
#[derive(Clone, Debug, PartialEq)]
pub struct DraftControls {
    pub add_question_disabled: bool,
    pub remove_question_disabled: bool,
    pub add_option_disabled: Vec<bool>,
    pub remove_option_disabled: Vec<bool>,
    pub finish_disabled: bool,
}

/// A poll being composed. Lives in the session store until it is evicted.
#[derive(Clone, Debug)]
pub struct PollDraft {
    pub id: Uuid,
    pub questions: Vec<DraftQuestion>,
    pub errors: Vec<ValidationIssue>,
    pub notice: Option<Notice>,
    pub phase: DraftPhase,
    pub touched_at: NaiveDateTime,
}

impl Default for PollDraft {
    fn default() -> Self {
        PollDraft {
            id: Uuid::new_v4(),
            questions: vec![DraftQuestion::empty()],
            errors: vec![],
            notice: None,
            phase: DraftPhase::Editing,
            touched_at: Local::now().naive_local(),
        }
    }
}

pub fn is_question_content_valid(content: &str) -> bool {
    !content.trim().is_empty()
}

pub fn are_options_valid(options: &[String]) -> bool {
    (MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len())
        && options.iter().all(|option| !option.trim().is_empty())
}

impl PollDraft {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_editable(&self) -> bool {
        self.phase == DraftPhase::Editing
    }

    pub fn add_question(&mut self) -> bool {
        if !self.is_editable() || self.questions.len() >= MAX_QUESTIONS {
            return false;
        }
        self.questions.push(DraftQuestion::empty());
        true
    }

    pub fn remove_question(&mut self, id: Uuid) -> bool {
        if !self.is_editable() || self.questions.len() <= MIN_QUESTIONS {
            return false;
        }
        let before = self.questions.len();
        self.questions.retain(|question| question.id != id);
        before != self.questions.len()
    }

    pub fn add_option(&mut self, question_index: usize) -> bool {
        if !self.is_editable() {
            return false;
        }
        match self.questions.get_mut(question_index) {
            Some(question) if question.options.len() < MAX_OPTIONS => {
                question.options.push(String::new());
                true
            }
            _ => false,
        }
    }

    pub fn remove_option(&mut self, option_index: usize, question_index: usize) -> bool {
        if !self.is_editable() {
            return false;
        }
        match self.questions.get_mut(question_index) {
            Some(question)
                if question.options.len() > MIN_OPTIONS
                    && option_index < question.options.len() =>
            {
                question.options.remove(option_index);
                true
            }
            _ => false,
        }
    }

    /// Replaces the question text; a real change clears the displayed errors.
    pub fn update_question_content(&mut self, value: &str, question_index: usize) -> bool {
        if !self.is_editable() {
            return false;
        }
        let changed = match self.questions.get_mut(question_index) {
            Some(question) if question.content != value => {
                question.content = value.to_owned();
                true
            }
            _ => false,
        };
        if changed {
            self.errors.clear();
        }
        changed
    }

    /// Replaces one option's text; a real change clears the displayed errors.
    pub fn update_option_content(
        &mut self,
        option_index: usize,
        value: &str,
        question_index: usize,
    ) -> bool {
        if !self.is_editable() {
            return false;
        }
        let changed = match self
            .questions
            .get_mut(question_index)
            .and_then(|question| question.options.get_mut(option_index))
        {
            Some(option) if *option != value => {
                *option = value.to_owned();
                true
            }
            _ => false,
        };
        if changed {
            self.errors.clear();
        }
        changed
    }

    pub fn controls(&self) -> DraftControls {
        DraftControls {
            add_question_disabled: self.questions.len() >= MAX_QUESTIONS,
            remove_question_disabled: self.questions.len() <= MIN_QUESTIONS,
            add_option_disabled: self
                .questions
                .iter()
                .map(|question| question.options.len() >= MAX_OPTIONS)
                .collect(),
            remove_option_disabled: self
                .questions
                .iter()
                .map(|question| question.options.len() <= MIN_OPTIONS)
                .collect(),
            finish_disabled: !self.is_editable(),
        }
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = vec![];
        for (i, question) in self.questions.iter().enumerate() {
            if !is_question_content_valid(&question.content) {
                issues.push(ValidationIssue::EmptyQuestion { question: i });
            }
            if are_options_valid(&question.options) {
                continue;
            }
            let count = question.options.len();
            if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
                issues.push(ValidationIssue::OptionCount { question: i, count });
            }
            issues.extend(
                question
                    .options
                    .iter()
                    .enumerate()
                    .filter(|(_, option)| option.trim().is_empty())
                    .map(|(option, _)| ValidationIssue::EmptyOption { question: i, option }),
            );
        }
        issues
    }

    /// Validates and freezes the draft, producing the create payload.
    pub fn begin_publish(&mut self) -> Result<NewPoll, PublishRefusal> {
        match self.phase {
            DraftPhase::Publishing => return Err(PublishRefusal::InProgress),
            DraftPhase::Published => return Err(PublishRefusal::AlreadyPublished),
            DraftPhase::Editing => {}
        }
        let issues = self.validate();
        if !issues.is_empty() {
            self.errors = issues.clone();
            self.notice = Some(Notice::error(
                "Please correct the highlighted errors before finishing the poll.",
            ));
            return Err(PublishRefusal::Invalid(issues));
        }
        self.phase = DraftPhase::Publishing;
        Ok(NewPoll {
            pollid: self.id.to_string(),
            questions: self
                .questions
                .iter()
                .map(|question| PollQuestion {
                    content: question.content.clone(),
                    options: question
                        .options
                        .iter()
                        .map(|option| PollOption::unvoted(option))
                        .collect(),
                })
                .collect(),
        })
    }

    pub fn complete_publish(&mut self, outcome: Result<(), String>) {
        if self.phase != DraftPhase::Publishing {
            return;
        }
        match outcome {
            Ok(()) => {
                info!("Poll {} published", self.id);
                self.phase = DraftPhase::Published;
                self.notice = Some(Notice::success("Poll finished and saved!"));
            }
            Err(message) => {
                self.phase = DraftPhase::Editing;
                self.notice = Some(Notice::error(&message));
            }
        }
    }

    pub fn is_published(&self) -> bool {
        self.phase == DraftPhase::Published
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}
