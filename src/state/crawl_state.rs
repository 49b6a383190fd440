/// Crawl lifecycle definitions
///
/// A crawl session moves through `Idle -> Running -> {Completed, Stopped}`.
/// Finished sessions never return to `Idle`; a new session is created instead.
use serde::Serialize;
use std::fmt;

/// Represents the lifecycle phase of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlPhase {
    /// Session created, traversal not started
    Idle,

    /// Traversal is fetching pages
    Running,

    /// Traversal ran to its natural end (frontier empty or a cap reached)
    Completed,

    /// Traversal ended early because stop was requested
    Stopped,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped)
    }

    /// Returns true if the session is currently crawling
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if the lifecycle permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::Stopped => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status label reported to callers
///
/// Stopped sessions are reported as `completed`: their results are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    Idle,
    Crawling,
    Completed,
}

impl From<CrawlPhase> for StatusLabel {
    fn from(phase: CrawlPhase) -> Self {
        match phase {
            CrawlPhase::Idle => Self::Idle,
            CrawlPhase::Running => Self::Crawling,
            CrawlPhase::Completed | CrawlPhase::Stopped => Self::Completed,
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Crawling => "crawling",
            Self::Completed => "completed",
        };
        f.write_str(label)
    }
}
