use crate::{CentralRepository, Clipboard, EditorConfig, Repository};

/// State shared by every diagram of one editing session.
///
/// Passed by `&mut` into controller gestures; there is no global instance.
#[derive(Debug, Default)]
pub struct EditorContext<R: Repository = CentralRepository> {
    pub repository: R,
    pub clipboard: Clipboard,
    pub config: EditorConfig,
}

impl EditorContext<CentralRepository> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Repository> EditorContext<R> {
    pub fn with_repository(repository: R, config: EditorConfig) -> Self {
        Self {
            repository,
            clipboard: Clipboard::new(),
            config,
        }
    }
}
