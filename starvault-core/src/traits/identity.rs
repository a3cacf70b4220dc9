/// Who the document belongs to, if anyone is signed in.
pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Option<String>;

    fn is_signed_in(&self) -> bool {
        self.current_user_id().is_some()
    }
}

/// Nobody signed in; the engine runs local-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Identity for Anonymous {
    fn current_user_id(&self) -> Option<String> {
        None
    }
}
