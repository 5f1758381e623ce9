use crate::data::{NewPoll, PollRecord, VoteSubmission};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("poll api url {0} cannot carry a path")]
    BaseUrl(String),
    #[error("request to poll api failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("poll api answered {0}")]
    Status(StatusCode),
}

/// The external poll backend.
#[async_trait]
pub trait PollApi: Send + Sync {
    async fn create_poll(&self, poll: &NewPoll) -> Result<(), ApiError>;

    async fn get_poll(&self, poll_id: &str) -> Result<PollRecord, ApiError>;

    async fn submit_poll(&self, votes: &VoteSubmission) -> Result<(), ApiError>;
}

pub struct RemotePollApi {
    client: Client,
    base_url: Url,
}

impl RemotePollApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|_| ApiError::BaseUrl(base_url.to_owned()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(RemotePollApi { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status(status))
    }
}

#[async_trait]
impl PollApi for RemotePollApi {
    async fn create_poll(&self, poll: &NewPoll) -> Result<(), ApiError> {
        let url = self.endpoint(&["createPoll"])?;
        debug!("POST {} for poll {}", url, poll.pollid);
        let response = self.client.post(url).json(poll).send().await?;
        check_status(response.status())
    }

    async fn get_poll(&self, poll_id: &str) -> Result<PollRecord, ApiError> {
        let url = self.endpoint(&["getPolls", poll_id])?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        check_status(response.status())?;
        let mut record: PollRecord = response.json().await?;
        if record.id.is_empty() {
            record.id = poll_id.to_owned();
        }
        Ok(record)
    }

    async fn submit_poll(&self, votes: &VoteSubmission) -> Result<(), ApiError> {
        let url = self.endpoint(&["submitPoll"])?;
        debug!("POST {} for poll {}", url, votes.pollid);
        let response = self.client.post(url).json(votes).send().await?;
        check_status(response.status())
    }
}

#[cfg(test)]
pub mod testing {
    use super::{ApiError, PollApi};
    use crate::data::{NewPoll, PollRecord, VoteSubmission};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Records every call and answers from canned state.
    #[derive(Default)]
    pub struct RecordingPollApi {
        pub created: Mutex<Vec<NewPoll>>,
        pub submitted: Mutex<Vec<VoteSubmission>>,
        pub fetches: Mutex<Vec<String>>,
        pub poll: Mutex<Option<PollRecord>>,
        pub fail_create: bool,
        pub fail_submit: bool,
    }

    impl RecordingPollApi {
        pub fn serving(poll: PollRecord) -> Self {
            RecordingPollApi {
                poll: Mutex::new(Some(poll)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PollApi for RecordingPollApi {
        async fn create_poll(&self, poll: &NewPoll) -> Result<(), ApiError> {
            self.created.lock().unwrap().push(poll.clone());
            if self.fail_create {
                return Err(ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR));
            }
            Ok(())
        }

        async fn get_poll(&self, poll_id: &str) -> Result<PollRecord, ApiError> {
            self.fetches.lock().unwrap().push(poll_id.to_owned());
            self.poll
                .lock()
                .unwrap()
                .clone()
                .ok_or(ApiError::Status(StatusCode::NOT_FOUND))
        }

        async fn submit_poll(&self, votes: &VoteSubmission) -> Result<(), ApiError> {
            self.submitted.lock().unwrap().push(votes.clone());
            if self.fail_submit {
                return Err(ApiError::Status(StatusCode::BAD_GATEWAY));
            }
            Ok(())
        }
    }
}
