use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::generation::GenerationRequest;
use crate::utilities::api_utils::ServerError;

/// A remote operation exposed under one or more guessed names.
#[async_trait]
pub trait RemoteProcedure {
    /// Calls `endpoint` once with the request fields as named arguments and returns the
    /// artifact reference. An empty string means the call produced nothing usable.
    async fn call(&self, endpoint: &str, request: &GenerationRequest) -> Result<String, CallError>;
}

#[derive(Debug)]
pub enum CallError {
    Reqwest(reqwest::Error),
    Server(StatusCode),
    Remote(String),
    MalformedResponse(&'static str),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reqwest(err) => match err.source() {
                Some(source) => write!(f, "{err}: {source}"),
                None => write!(f, "{err}"),
            },
            Self::Server(status_code) => {
                write!(f, "the inference server is currently offline ({status_code})")
            }
            Self::Remote(message) => write!(f, "remote error: {message}"),
            Self::MalformedResponse(reason) => write!(f, "malformed response: {reason}"),
        }
    }
}

impl From<reqwest::Error> for CallError {
    fn from(value: reqwest::Error) -> Self {
        Self::Reqwest(value.without_url())
    }
}

impl From<ServerError> for CallError {
    fn from(value: ServerError) -> Self {
        Self::Server(value.0)
    }
}

impl From<serde_json::Error> for CallError {
    fn from(_: serde_json::Error) -> Self {
        Self::MalformedResponse("invalid JSON")
    }
}

#[derive(Debug)]
pub enum AttemptFailure {
    Error(CallError),
    Empty,
}

#[derive(Debug)]
pub struct Attempt {
    pub endpoint: String,
    pub failure: AttemptFailure,
}

#[derive(Debug)]
pub enum DispatchError {
    NoCandidates,
    /// every candidate was tried once; attempts are kept in call order
    Exhausted(Vec<Attempt>),
}

impl DispatchError {
    /// the most recent call that failed with an error, skipping empty results
    pub fn last_error(&self) -> Option<&CallError> {
        match self {
            Self::NoCandidates => None,
            Self::Exhausted(attempts) => attempts.iter().rev().find_map(|attempt| {
                match &attempt.failure {
                    AttemptFailure::Error(err) => Some(err),
                    AttemptFailure::Empty => None,
                }
            }),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidates => write!(f, "no API names are configured"),
            Self::Exhausted(_) => {
                write!(f, "none of the standard API names worked")?;
                if let Some(err) = self.last_error() {
                    write!(f, ": {err}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Dispatched {
    pub endpoint: String,
    pub artifact: String,
    pub attempts: usize,
}

/// Tries each candidate endpoint in order and returns the first non-empty result.
///
/// Candidates after the first success are never called, and each candidate is called at
/// most once. No timeout is applied here; a call that never returns blocks the dispatch.
pub async fn dispatch<P, S>(
    procedure: &P,
    request: &GenerationRequest,
    candidates: &[S],
) -> Result<Dispatched, DispatchError>
where
    P: RemoteProcedure + Sync + ?Sized,
    S: AsRef<str>,
{
    if candidates.is_empty() {
        return Err(DispatchError::NoCandidates);
    }

    let mut attempts = Vec::with_capacity(candidates.len());

    for (index, endpoint) in candidates.iter().enumerate() {
        let endpoint = endpoint.as_ref();
        log::info!("trying connection method {endpoint} ({}/{})", index + 1, candidates.len());

        let failure = match procedure.call(endpoint, request).await {
            Ok(artifact) if !artifact.is_empty() => {
                log::info!("{endpoint} returned {artifact}");
                return Ok(Dispatched {
                    endpoint: endpoint.into(),
                    artifact,
                    attempts: index + 1,
                });
            }
            Ok(_) => {
                log::warn!("{endpoint} returned an empty result");
                AttemptFailure::Empty
            }
            Err(err) => {
                log::warn!("{endpoint} failed: {err}");
                AttemptFailure::Error(err)
            }
        };

        attempts.push(Attempt { endpoint: endpoint.into(), failure });
    }

    for attempt in &attempts {
        log::debug!("exhausted attempt {}: {:?}", attempt.endpoint, attempt.failure);
    }

    Err(DispatchError::Exhausted(attempts))
}
