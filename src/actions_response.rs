use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("unexpected field {0:?}")]
    UnknownField(String),
    #[error("field {0:?} must be an option index")]
    BadSelection(String),
}

/// Builder buttons. Posted as the `action` field of the builder form.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderAction {
    Save,
    AddQuestion,
    RemoveQuestion(Uuid),
    AddOption(usize),
    RemoveOption(usize, usize),
    Finish,
}

/// Voter buttons. Posted as the `action` field of the ballot form.
#[derive(Debug, Clone, PartialEq)]
pub enum BallotAction {
    Select,
    Submit,
    ViewResults,
    BackToVoting,
    Reload,
}

/// The builder page as posted: every input's text plus the button pressed.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderForm {
    pub action: BuilderAction,
    pub questions: Vec<(usize, String)>,
    pub options: Vec<(usize, usize, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BallotForm {
    pub action: BallotAction,
    pub selections: Vec<(usize, usize)>,
}

impl FromStr for BuilderAction {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || FormError::UnknownAction(s.to_owned());
        let mut parts = s.split(':');
        let action = match (parts.next(), parts.next(), parts.next()) {
            (Some("save"), None, None) => BuilderAction::Save,
            (Some("add_question"), None, None) => BuilderAction::AddQuestion,
            (Some("finish"), None, None) => BuilderAction::Finish,
            (Some("remove_question"), Some(id), None) => {
                BuilderAction::RemoveQuestion(Uuid::parse_str(id).map_err(|_| unknown())?)
            }
            (Some("add_option"), Some(question), None) => {
                BuilderAction::AddOption(question.parse().map_err(|_| unknown())?)
            }
            (Some("remove_option"), Some(question), Some(option)) => BuilderAction::RemoveOption(
                question.parse().map_err(|_| unknown())?,
                option.parse().map_err(|_| unknown())?,
            ),
            _ => return Err(unknown()),
        };
        if parts.next().is_some() {
            return Err(unknown());
        }
        Ok(action)
    }
}

impl FromStr for BallotAction {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(BallotAction::Select),
            "submit" => Ok(BallotAction::Submit),
            "view_results" => Ok(BallotAction::ViewResults),
            "back_to_voting" => Ok(BallotAction::BackToVoting),
            "reload" => Ok(BallotAction::Reload),
            _ => Err(FormError::UnknownAction(s.to_owned())),
        }
    }
}

fn parse_index(s: &str) -> Option<usize> {
    s.parse().ok()
}

impl TryFrom<HashMap<String, String>> for BuilderForm {
    type Error = FormError;

    /// Inputs are named `question_{q}` and `option_{q}_{o}`.
    fn try_from(payload: HashMap<String, String>) -> Result<Self, Self::Error> {
        let mut action = BuilderAction::Save;
        let mut questions = vec![];
        let mut options = vec![];
        for (key, value) in payload {
            if key == "action" {
                action = value.parse()?;
            } else if let Some(rest) = key.strip_prefix("question_") {
                let question = parse_index(rest).ok_or(FormError::UnknownField(key.clone()))?;
                questions.push((question, value));
            } else if let Some(rest) = key.strip_prefix("option_") {
                let indices = rest
                    .split_once('_')
                    .and_then(|(q, o)| Some((parse_index(q)?, parse_index(o)?)));
                let (question, option) = indices.ok_or(FormError::UnknownField(key.clone()))?;
                options.push((question, option, value));
            } else {
                return Err(FormError::UnknownField(key));
            }
        }
        questions.sort();
        options.sort();
        Ok(BuilderForm {
            action,
            questions,
            options,
        })
    }
}

impl TryFrom<HashMap<String, String>> for BallotForm {
    type Error = FormError;

    /// Radio groups are named `question_{q}` with the option index as value.
    fn try_from(payload: HashMap<String, String>) -> Result<Self, Self::Error> {
        let mut action = BallotAction::Select;
        let mut selections = vec![];
        for (key, value) in payload {
            if key == "action" {
                action = value.parse()?;
            } else if let Some(rest) = key.strip_prefix("question_") {
                let question = parse_index(rest).ok_or(FormError::UnknownField(key.clone()))?;
                let option = parse_index(&value).ok_or(FormError::BadSelection(key))?;
                selections.push((question, option));
            } else {
                return Err(FormError::UnknownField(key));
            }
        }
        selections.sort();
        Ok(BallotForm { action, selections })
    }
}
