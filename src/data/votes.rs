use serde::Serialize;

/// Body of `POST /submitPoll`: one option index per question, in question order.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct VoteSubmission {
    pub pollid: String,
    #[serde(rename = "selectedOptions")]
    pub selected_options: Vec<usize>,
}
