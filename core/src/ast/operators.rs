use serde::{Deserialize, Serialize};

/// Row-level lock strength for SELECT ... FOR <mode>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockMode {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
    /// A mode written by a newer tree producer; never renderable.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockMode::Update => write!(f, "UPDATE"),
            LockMode::NoKeyUpdate => write!(f, "NO KEY UPDATE"),
            LockMode::Share => write!(f, "SHARE"),
            LockMode::KeyShare => write!(f, "KEY SHARE"),
            LockMode::Unknown => write!(f, "<unknown lock mode>"),
        }
    }
}

/// Behaviour when a row to be locked is already locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaitMode {
    #[default]
    Default,
    NoWait,
    SkipLocked,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for WaitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitMode::Default => write!(f, "WAIT"),
            WaitMode::NoWait => write!(f, "NOWAIT"),
            WaitMode::SkipLocked => write!(f, "SKIP LOCKED"),
            WaitMode::Unknown => write!(f, "<unknown wait mode>"),
        }
    }
}

/// Set operation joining two SELECTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl std::fmt::Display for SetOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetOp::Union => write!(f, "UNION"),
            SetOp::UnionAll => write!(f, "UNION ALL"),
            SetOp::Intersect => write!(f, "INTERSECT"),
            SetOp::Except => write!(f, "EXCEPT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
            JoinKind::Cross => write!(f, "CROSS JOIN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}
