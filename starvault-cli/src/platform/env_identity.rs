use starvault_core::traits::Identity;

/// Identity supplied on the command line or through `STARVAULT_USER`.
/// Sign-in itself happens elsewhere; a present user id counts as signed in.
#[derive(Debug, Clone)]
pub struct EnvIdentity {
    user_id: Option<String>,
}

impl EnvIdentity {
    pub fn new(user_id: Option<String>) -> Self {
        let user_id = user_id
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Self { user_id }
    }
}

impl Identity for EnvIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}
