use crate::data::PollQuestion;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A one-shot message shown on the next render of a page.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: &str) -> Notice {
        Notice {
            kind: NoticeKind::Success,
            message: message.to_owned(),
        }
    }

    pub fn error(message: &str) -> Notice {
        Notice {
            kind: NoticeKind::Error,
            message: message.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct QuestionResults {
    pub content: String,
    pub total_votes: u64,
    pub options: Vec<OptionResult>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OptionResult {
    pub content: String,
    pub votes: u64,
    pub percentage: String,
    /// Tied for the highest vote count in its question.
    pub leading: bool,
}

impl From<&PollQuestion> for QuestionResults {
    fn from(question: &PollQuestion) -> Self {
        let total_votes = question.total_votes();
        let max_votes = question
            .options
            .iter()
            .map(|option| option.votes)
            .max()
            .unwrap_or(0);
        QuestionResults {
            content: question.content.clone(),
            total_votes,
            options: question
                .options
                .iter()
                .map(|option| OptionResult {
                    content: option.content.clone(),
                    votes: option.votes,
                    percentage: format_percentage(option.votes, total_votes),
                    leading: option.votes == max_votes,
                })
                .collect(),
        }
    }
}

pub fn format_percentage(votes: u64, total: u64) -> String {
    if total == 0 {
        return "0.00%".to_owned();
    }
    format!("{:.2}%", votes as f64 / total as f64 * 100.0)
}
