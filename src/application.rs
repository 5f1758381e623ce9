use crate::actions_response::{BallotForm, BuilderForm};
use crate::config::Config;
use crate::data::{
    ApplyBallotForm, ApplyBuilderForm, BallotFollowUp, CompletePublish, CompleteSubmit, LoadBallot,
    NewPoll, OpenBallot, OpenDraft, PollApi, RemotePollApi, Sessions, ShowBallot, ShowDraft,
    VoteSubmission,
};
use crate::error::AppError;
use crate::web_ui::{create_ballot_view, create_builder_view, load_templates};
use actix::{Actor, Addr};
use log::{error, info, warn};
use std::sync::Arc;
use tera::Tera;
use uuid::Uuid;

/// Shared handle given to every request handler.
#[derive(Clone)]
pub struct PollApplication {
    sessions: Addr<Sessions>,
    api: Arc<dyn PollApi>,
    templates: Arc<Tera>,
    pub config: Arc<Config>,
}

impl PollApplication {
    /// Must be called from inside a running actix system.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let api = RemotePollApi::new(&config.api_url, config.request_timeout)?;
        Self::with_api(config, Arc::new(api))
    }

    pub fn with_api(config: Config, api: Arc<dyn PollApi>) -> Result<Self, AppError> {
        Ok(PollApplication {
            sessions: Sessions::new(config.session_ttl).start(),
            api,
            templates: Arc::new(load_templates()?),
            config: Arc::new(config),
        })
    }

    pub async fn open_draft(&self) -> Result<Uuid, AppError> {
        Ok(self.sessions.send(OpenDraft).await??)
    }

    pub async fn builder_page(&self, draft_id: Uuid) -> Result<String, AppError> {
        let draft = self.sessions.send(ShowDraft(draft_id)).await??;
        Ok(create_builder_view(&self.templates, &self.config, &draft)?)
    }

    pub async fn process_builder_form(
        &self,
        draft_id: Uuid,
        form: BuilderForm,
    ) -> Result<(), AppError> {
        let payload = self
            .sessions
            .send(ApplyBuilderForm(draft_id, form))
            .await??;
        let poll = match payload {
            Some(poll) => poll,
            None => return Ok(()),
        };
        // Detached: the draft leaves Publishing even if the request is dropped.
        let application = self.clone();
        actix_rt::spawn(async move { application.publish(draft_id, poll).await }).await?
    }

    async fn publish(&self, draft_id: Uuid, poll: NewPoll) -> Result<(), AppError> {
        let outcome = self.api.create_poll(&poll).await.map_err(|e| {
            error!("Cannot create poll {}: {}", poll.pollid, e);
            "Could not save the poll. Please try again.".to_owned()
        });
        if outcome.is_ok() {
            info!("Created poll {} with {} questions", poll.pollid, poll.questions.len());
        }
        self.sessions
            .send(CompletePublish(draft_id, outcome))
            .await??;
        Ok(())
    }

    /// Starts a ballot and performs the initial fetch before the first render.
    pub async fn open_ballot(&self, poll_id: &str) -> Result<Uuid, AppError> {
        let ballot_id = self
            .sessions
            .send(OpenBallot(poll_id.to_owned()))
            .await??;
        self.refresh_ballot(ballot_id, poll_id).await?;
        Ok(ballot_id)
    }

    pub async fn ballot_page(&self, ballot_id: Uuid) -> Result<String, AppError> {
        let ballot = self.sessions.send(ShowBallot(ballot_id)).await??;
        Ok(create_ballot_view(&self.templates, &ballot)?)
    }

    pub async fn process_ballot_form(
        &self,
        ballot_id: Uuid,
        form: BallotForm,
    ) -> Result<(), AppError> {
        let follow_up = self
            .sessions
            .send(ApplyBallotForm(ballot_id, form))
            .await??;
        match follow_up {
            BallotFollowUp::Nothing => Ok(()),
            BallotFollowUp::Fetch(poll_id) => self.refresh_ballot(ballot_id, &poll_id).await,
            BallotFollowUp::Submit(votes) => {
                let application = self.clone();
                actix_rt::spawn(async move { application.submit(ballot_id, votes).await }).await?
            }
        }
    }

    async fn submit(&self, ballot_id: Uuid, votes: VoteSubmission) -> Result<(), AppError> {
        let outcome = self.api.submit_poll(&votes).await.map_err(|e| {
            error!("Cannot submit votes for poll {}: {}", votes.pollid, e);
            "Could not submit your vote. Please try again.".to_owned()
        });
        let submitted = outcome.is_ok();
        self.sessions
            .send(CompleteSubmit(ballot_id, outcome))
            .await??;
        if submitted {
            self.refresh_ballot(ballot_id, &votes.pollid).await?;
        }
        Ok(())
    }

    async fn refresh_ballot(&self, ballot_id: Uuid, poll_id: &str) -> Result<(), AppError> {
        let outcome = self.api.get_poll(poll_id).await.map_err(|e| {
            warn!("Cannot fetch poll {}: {}", poll_id, e);
            e.to_string()
        });
        self.sessions.send(LoadBallot(ballot_id, outcome)).await??;
        Ok(())
    }
}
