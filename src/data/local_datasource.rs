use crate::actions_response::{BallotAction, BallotForm, BuilderAction, BuilderForm};
use crate::ballot_state::Ballot;
use crate::data::{NewPoll, PollRecord, VoteSubmission};
use crate::poll_state::{PollDraft, PublishRefusal};
use actix::{Actor, AsyncContext, Context, Handler, Message};
use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("no poll draft {0}")]
    UnknownDraft(Uuid),
    #[error("no ballot {0}")]
    UnknownBallot(Uuid),
}

/// In-memory home of every open draft and ballot.
pub struct Sessions {
    drafts: HashMap<Uuid, PollDraft>,
    ballots: HashMap<Uuid, Ballot>,
    ttl: chrono::Duration,
}

impl Sessions {
    pub fn new(ttl: chrono::Duration) -> Self {
        Sessions {
            drafts: HashMap::new(),
            ballots: HashMap::new(),
            ttl,
        }
    }

    fn draft(&mut self, id: Uuid) -> Result<&mut PollDraft, SessionError> {
        let draft = self
            .drafts
            .get_mut(&id)
            .ok_or(SessionError::UnknownDraft(id))?;
        draft.touched_at = Local::now().naive_local();
        Ok(draft)
    }

    fn ballot(&mut self, id: Uuid) -> Result<&mut Ballot, SessionError> {
        let ballot = self
            .ballots
            .get_mut(&id)
            .ok_or(SessionError::UnknownBallot(id))?;
        ballot.touched_at = Local::now().naive_local();
        Ok(ballot)
    }

    fn evict_idle(&mut self, now: NaiveDateTime) {
        let deadline = now - self.ttl;
        let (drafts, ballots) = (self.drafts.len(), self.ballots.len());
        self.drafts.retain(|_, draft| draft.touched_at > deadline);
        self.ballots.retain(|_, ballot| ballot.touched_at > deadline);
        let evicted = drafts - self.drafts.len() + ballots - self.ballots.len();
        if evicted > 0 {
            info!("Evicted {} idle sessions", evicted);
        }
    }
}

impl Actor for Sessions {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.run_interval(EVICTION_INTERVAL, |sessions, _| {
            sessions.evict_idle(Local::now().naive_local())
        });
    }
}

pub struct OpenDraft;

pub struct ShowDraft(pub Uuid);

pub struct ApplyBuilderForm(pub Uuid, pub BuilderForm);

pub struct CompletePublish(pub Uuid, pub Result<(), String>);

pub struct OpenBallot(pub String);

pub struct LoadBallot(pub Uuid, pub Result<PollRecord, String>);

pub struct ShowBallot(pub Uuid);

pub struct ApplyBallotForm(pub Uuid, pub BallotForm);

pub struct CompleteSubmit(pub Uuid, pub Result<(), String>);

/// Network work a ballot form asks the application to carry out.
#[derive(Debug, PartialEq)]
pub enum BallotFollowUp {
    Nothing,
    Submit(VoteSubmission),
    Fetch(String),
}

impl Message for OpenDraft {
    type Result = Result<Uuid, SessionError>;
}

impl Message for ShowDraft {
    type Result = Result<PollDraft, SessionError>;
}

impl Message for ApplyBuilderForm {
    type Result = Result<Option<NewPoll>, SessionError>;
}

impl Message for CompletePublish {
    type Result = Result<(), SessionError>;
}

impl Message for OpenBallot {
    type Result = Result<Uuid, SessionError>;
}

impl Message for LoadBallot {
    type Result = Result<(), SessionError>;
}

impl Message for ShowBallot {
    type Result = Result<Ballot, SessionError>;
}

impl Message for ApplyBallotForm {
    type Result = Result<BallotFollowUp, SessionError>;
}

impl Message for CompleteSubmit {
    type Result = Result<(), SessionError>;
}

impl Handler<OpenDraft> for Sessions {
    type Result = Result<Uuid, SessionError>;

    fn handle(&mut self, _: OpenDraft, _: &mut Self::Context) -> Self::Result {
        let draft = PollDraft::new();
        let id = draft.id;
        debug!("Opened draft {}", id);
        self.drafts.insert(id, draft);
        Ok(id)
    }
}

impl Handler<ShowDraft> for Sessions {
    type Result = Result<PollDraft, SessionError>;

    fn handle(&mut self, msg: ShowDraft, _: &mut Self::Context) -> Self::Result {
        let draft = self.draft(msg.0)?;
        let snapshot = draft.clone();
        draft.take_notice();
        Ok(snapshot)
    }
}

impl Handler<ApplyBuilderForm> for Sessions {
    type Result = Result<Option<NewPoll>, SessionError>;

    fn handle(&mut self, msg: ApplyBuilderForm, _: &mut Self::Context) -> Self::Result {
        let ApplyBuilderForm(id, form) = msg;
        let draft = self.draft(id)?;
        for (question_index, content) in &form.questions {
            draft.update_question_content(content, *question_index);
        }
        for (question_index, option_index, content) in &form.options {
            draft.update_option_content(*option_index, content, *question_index);
        }
        match form.action {
            BuilderAction::Save => {}
            BuilderAction::AddQuestion => {
                draft.add_question();
            }
            BuilderAction::RemoveQuestion(question_id) => {
                draft.remove_question(question_id);
            }
            BuilderAction::AddOption(question_index) => {
                draft.add_option(question_index);
            }
            BuilderAction::RemoveOption(question_index, option_index) => {
                draft.remove_option(option_index, question_index);
            }
            BuilderAction::Finish => {
                return match draft.begin_publish() {
                    Ok(poll) => Ok(Some(poll)),
                    Err(PublishRefusal::Invalid(issues)) => {
                        debug!("Draft {} has {} validation issues", id, issues.len());
                        Ok(None)
                    }
                    Err(refusal) => {
                        debug!("Ignoring finish for draft {}: {:?}", id, refusal);
                        Ok(None)
                    }
                };
            }
        }
        Ok(None)
    }
}

impl Handler<CompletePublish> for Sessions {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: CompletePublish, _: &mut Self::Context) -> Self::Result {
        self.draft(msg.0)?.complete_publish(msg.1);
        Ok(())
    }
}

impl Handler<OpenBallot> for Sessions {
    type Result = Result<Uuid, SessionError>;

    fn handle(&mut self, msg: OpenBallot, _: &mut Self::Context) -> Self::Result {
        let ballot = Ballot::new(&msg.0);
        let id = ballot.id;
        debug!("Opened ballot {} for poll {}", id, msg.0);
        self.ballots.insert(id, ballot);
        Ok(id)
    }
}

impl Handler<LoadBallot> for Sessions {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: LoadBallot, _: &mut Self::Context) -> Self::Result {
        self.ballot(msg.0)?.loaded(msg.1);
        Ok(())
    }
}

impl Handler<ShowBallot> for Sessions {
    type Result = Result<Ballot, SessionError>;

    fn handle(&mut self, msg: ShowBallot, _: &mut Self::Context) -> Self::Result {
        let ballot = self.ballot(msg.0)?;
        let snapshot = ballot.clone();
        ballot.take_notice();
        Ok(snapshot)
    }
}

impl Handler<ApplyBallotForm> for Sessions {
    type Result = Result<BallotFollowUp, SessionError>;

    fn handle(&mut self, msg: ApplyBallotForm, _: &mut Self::Context) -> Self::Result {
        let ApplyBallotForm(id, form) = msg;
        let ballot = self.ballot(id)?;
        for (question_index, option_index) in &form.selections {
            ballot.select_option(*question_index, *option_index);
        }
        let follow_up = match form.action {
            BallotAction::Select => BallotFollowUp::Nothing,
            BallotAction::Submit => match ballot.begin_submit() {
                Ok(votes) => BallotFollowUp::Submit(votes),
                Err(refusal) => {
                    debug!("Ballot {} not submitted: {:?}", id, refusal);
                    BallotFollowUp::Nothing
                }
            },
            BallotAction::ViewResults => {
                ballot.view_results();
                BallotFollowUp::Nothing
            }
            BallotAction::BackToVoting => {
                ballot.back_to_voting();
                BallotFollowUp::Nothing
            }
            BallotAction::Reload => {
                if ballot.retry() || ballot.poll.is_some() {
                    BallotFollowUp::Fetch(ballot.poll_id.clone())
                } else {
                    BallotFollowUp::Nothing
                }
            }
        };
        Ok(follow_up)
    }
}

impl Handler<CompleteSubmit> for Sessions {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: CompleteSubmit, _: &mut Self::Context) -> Self::Result {
        self.ballot(msg.0)?.complete_submit(msg.1);
        Ok(())
    }
}
