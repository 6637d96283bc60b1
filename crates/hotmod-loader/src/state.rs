use std::fmt;

/// Lifecycle of the code loader, one instance per process run.
///
/// ```text
/// Idle -> Downloading -> Downloaded -> Loaded -> Activated
///              |                          |
///              +--------> Failed <--------+
/// ```
///
/// No transition skips a state; `Failed` is terminal and is entered from
/// `Downloading` (fetch failure) or `Loaded` (activation failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Downloading,
    Downloaded,
    Loaded,
    Activated,
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::Idle => "idle",
            LoadState::Downloading => "downloading",
            LoadState::Downloaded => "downloaded",
            LoadState::Loaded => "loaded",
            LoadState::Activated => "activated",
            LoadState::Failed => "failed",
        };
        f.write_str(name)
    }
}
