#[derive(Debug, thiserror::Error)]
pub enum VigilError {
  #[error("invalid input: {0}")]
  InvalidInput(String),
  #[error("resource not found")]
  NotFound,
  #[error("index is still loading")]
  StillLoading,
  #[error("upstream list source timed out")]
  UpstreamTimeout,
  #[error("a refresh is already in progress")]
  RefreshInProgress,
  #[error("batch exceeds the maximum of {0} items")]
  BatchTooLarge(usize),
  #[error(transparent)]
  Internal(#[from] anyhow::Error),
}
