use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PollOption {
    pub content: String,
    #[serde(default)]
    pub votes: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PollQuestion {
    pub content: String,
    #[serde(default)]
    pub options: Vec<PollOption>,
}

/// Body of `POST /createPoll`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewPoll {
    pub pollid: String,
    pub questions: Vec<PollQuestion>,
}

/// A poll as returned by `GET /getPolls/{id}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PollRecord {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub questions: Vec<PollQuestion>,
}

impl PollOption {
    pub fn unvoted(content: &str) -> PollOption {
        PollOption {
            content: content.to_owned(),
            votes: 0,
        }
    }
}

impl PollQuestion {
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|option| option.votes).sum()
    }
}
