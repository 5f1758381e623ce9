use crate::data::{PollRecord, VoteSubmission};
use crate::ui_poll_view::{Notice, NoticeKind, QuestionResults};
use chrono::{Local, NaiveDateTime};
use log::warn;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum BallotView {
    Loading,
    Unavailable(String),
    Voting,
    Results,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    Open,
    Pending,
    Submitted,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitRefusal {
    NotLoaded,
    Incomplete,
    InProgress,
    AlreadySubmitted,
}

/// One respondent's visit to a poll.
#[derive(Clone, Debug)]
pub struct Ballot {
    pub id: Uuid,
    pub poll_id: String,
    pub poll: Option<PollRecord>,
    pub view: BallotView,
    pub selections: Vec<Option<usize>>,
    pub submission: Submission,
    pub notice: Option<Notice>,
    pub touched_at: NaiveDateTime,
}

impl Ballot {
    pub fn new(poll_id: &str) -> Self {
        Ballot {
            id: Uuid::new_v4(),
            poll_id: poll_id.to_owned(),
            poll: None,
            view: BallotView::Loading,
            selections: vec![],
            submission: Submission::Open,
            notice: None,
            touched_at: Local::now().naive_local(),
        }
    }

    /// Applies a fetch outcome. A fetched poll replaces the previous one wholesale.
    pub fn loaded(&mut self, outcome: Result<PollRecord, String>) {
        match outcome {
            Ok(poll) => {
                if poll.questions.len() != self.selections.len() {
                    self.selections = vec![None; poll.questions.len()];
                }
                self.poll = Some(poll);
                if matches!(self.view, BallotView::Loading | BallotView::Unavailable(_)) {
                    self.view = BallotView::Voting;
                }
            }
            Err(message) if self.poll.is_some() => {
                warn!("Keeping stale poll {}: {}", self.poll_id, message);
                let just_submitted = self
                    .notice
                    .as_ref()
                    .map_or(false, |notice| notice.kind == NoticeKind::Success);
                self.notice = Some(Notice::error(if just_submitted {
                    "Your vote was submitted, but the results could not be refreshed."
                } else {
                    "Could not refresh the poll; results may be out of date."
                }));
            }
            Err(message) => self.view = BallotView::Unavailable(message),
        }
    }

    pub fn retry(&mut self) -> bool {
        if let BallotView::Unavailable(_) = self.view {
            self.view = BallotView::Loading;
            return true;
        }
        false
    }

    pub fn select_option(&mut self, question_index: usize, option_index: usize) -> bool {
        if self.submission != Submission::Open {
            return false;
        }
        let option_count = match self
            .poll
            .as_ref()
            .and_then(|poll| poll.questions.get(question_index))
        {
            Some(question) => question.options.len(),
            None => return false,
        };
        if option_index >= option_count {
            return false;
        }
        self.selections[question_index] = Some(option_index);
        true
    }

    /// Every question position has a selection.
    pub fn is_complete(&self) -> bool {
        self.poll.is_some() && self.selections.iter().all(Option::is_some)
    }

    pub fn begin_submit(&mut self) -> Result<VoteSubmission, SubmitRefusal> {
        match self.submission {
            Submission::Pending => return Err(SubmitRefusal::InProgress),
            Submission::Submitted => return Err(SubmitRefusal::AlreadySubmitted),
            Submission::Open => {}
        }
        if self.poll.is_none() {
            return Err(SubmitRefusal::NotLoaded);
        }
        let selected_options: Option<Vec<usize>> = self.selections.iter().copied().collect();
        match selected_options {
            Some(selected_options) if self.is_complete() => {
                self.submission = Submission::Pending;
                Ok(VoteSubmission {
                    pollid: self.poll_id.clone(),
                    selected_options,
                })
            }
            _ => {
                self.notice = Some(Notice::error("Please select an option for each question."));
                Err(SubmitRefusal::Incomplete)
            }
        }
    }

    pub fn complete_submit(&mut self, outcome: Result<(), String>) {
        if self.submission != Submission::Pending {
            return;
        }
        match outcome {
            Ok(()) => {
                self.submission = Submission::Submitted;
                self.notice = Some(Notice::success("Poll submitted successfully!"));
            }
            Err(message) => {
                self.submission = Submission::Open;
                self.notice = Some(Notice::error(&message));
            }
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submission == Submission::Submitted
    }

    pub fn view_results(&mut self) {
        if self.poll.is_some() {
            self.view = BallotView::Results;
        }
    }

    pub fn back_to_voting(&mut self) {
        if self.poll.is_some() {
            self.view = BallotView::Voting;
        }
    }

    pub fn results(&self) -> Vec<QuestionResults> {
        self.poll
            .iter()
            .flat_map(|poll| poll.questions.iter().map(QuestionResults::from))
            .collect()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::{PollOption, PollQuestion};

    fn poll(votes: &[&[u64]]) -> PollRecord {
        PollRecord {
            id: "p1".to_owned(),
            questions: votes
                .iter()
                .enumerate()
                .map(|(q, options)| PollQuestion {
                    content: format!("Question {}", q),
                    options: options
                        .iter()
                        .map(|votes| PollOption {
                            content: "x".to_owned(),
                            votes: *votes,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn loaded_ballot() -> Ballot {
        let mut ballot = Ballot::new("p1");
        ballot.loaded(Ok(poll(&[&[0, 0], &[0, 0, 0]])));
        ballot
    }

    #[test]
    fn loading_then_voting() {
        let mut ballot = Ballot::new("p1");
        assert_eq!(ballot.view, BallotView::Loading);
        ballot.loaded(Ok(poll(&[&[1, 2]])));
        assert_eq!(ballot.view, BallotView::Voting);
        assert_eq!(ballot.selections, vec![None]);
    }

    #[test]
    fn failed_fetch_is_visible_and_retryable() {
        let mut ballot = Ballot::new("p1");
        ballot.loaded(Err("poll api answered 404 Not Found".to_owned()));
        assert!(matches!(ballot.view, BallotView::Unavailable(_)));
        assert!(ballot.retry());
        assert_eq!(ballot.view, BallotView::Loading);
        ballot.loaded(Ok(poll(&[&[0, 0]])));
        assert_eq!(ballot.view, BallotView::Voting);
    }

    #[test]
    fn selecting_overwrites_previous_choice() {
        let mut ballot = loaded_ballot();
        assert!(ballot.select_option(1, 0));
        assert!(ballot.select_option(1, 2));
        assert!(!ballot.select_option(1, 3));
        assert!(!ballot.select_option(2, 0));
        assert_eq!(ballot.selections, vec![None, Some(2)]);
    }

    #[test]
    fn gap_in_selections_is_incomplete() {
        let mut ballot = loaded_ballot();
        ballot.select_option(1, 1);
        assert!(!ballot.is_complete());
        assert_eq!(ballot.begin_submit(), Err(SubmitRefusal::Incomplete));
        assert_eq!(ballot.submission, Submission::Open);
        assert_eq!(ballot.take_notice().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn complete_ballot_submits_once() {
        let mut ballot = loaded_ballot();
        ballot.select_option(0, 1);
        ballot.select_option(1, 2);
        let votes = ballot.begin_submit().unwrap();
        assert_eq!(votes.pollid, "p1");
        assert_eq!(votes.selected_options, vec![1, 2]);
        assert_eq!(ballot.begin_submit(), Err(SubmitRefusal::InProgress));

        ballot.complete_submit(Ok(()));
        assert!(ballot.is_submitted());
        assert_eq!(ballot.begin_submit(), Err(SubmitRefusal::AlreadySubmitted));
        assert!(!ballot.select_option(0, 0));
    }

    #[test]
    fn failed_submit_can_be_retried() {
        let mut ballot = loaded_ballot();
        ballot.select_option(0, 0);
        ballot.select_option(1, 0);
        ballot.begin_submit().unwrap();
        ballot.complete_submit(Err("Could not submit your vote".to_owned()));
        assert!(!ballot.is_submitted());
        assert!(ballot.begin_submit().is_ok());
    }

    #[test]
    fn refetch_replaces_poll_and_keeps_selections() {
        let mut ballot = loaded_ballot();
        ballot.select_option(0, 1);
        ballot.view_results();
        ballot.loaded(Ok(poll(&[&[3, 7], &[1, 0, 0]])));
        assert_eq!(ballot.view, BallotView::Results);
        assert_eq!(ballot.selections, vec![Some(1), None]);
        let results = ballot.results();
        assert_eq!(results[0].options[0].percentage, "30.00%");
        assert!(results[0].options[1].leading);
    }

    #[test]
    fn failed_refetch_keeps_stale_poll() {
        let mut ballot = loaded_ballot();
        ballot.loaded(Err("timeout".to_owned()));
        assert_eq!(ballot.view, BallotView::Voting);
        assert!(ballot.poll.is_some());
        assert_eq!(ballot.take_notice().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn failed_refetch_after_submit_still_confirms_vote() {
        let mut ballot = loaded_ballot();
        ballot.select_option(0, 0);
        ballot.select_option(1, 0);
        ballot.begin_submit().unwrap();
        ballot.complete_submit(Ok(()));
        ballot.loaded(Err("timeout".to_owned()));
        assert!(ballot.is_submitted());
        let notice = ballot.take_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("vote was submitted"));
    }

    #[test]
    fn view_toggles() {
        let mut ballot = Ballot::new("p1");
        ballot.view_results();
        assert_eq!(ballot.view, BallotView::Loading);
        ballot.loaded(Ok(poll(&[&[0, 0]])));
        ballot.view_results();
        assert_eq!(ballot.view, BallotView::Results);
        ballot.back_to_voting();
        assert_eq!(ballot.view, BallotView::Voting);
    }
}
