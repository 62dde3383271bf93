use std::borrow::Cow;

/// A specialized [`KeyringError`] enum of this crate.
#[osprofiles_derive::osp_error]
pub enum KeyringError {
    /// No credential exists for the requested service/account pair.
    #[error("Credential not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The credential service cannot be reached (locked, missing daemon, disabled backend).
    #[error("Credential store unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Credential store failure{}: {source}", format_context(.context))]
    Backend { source: keyring::Error, context: Option<Cow<'static, str>> },

    #[error("Internal keyring error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl KeyringError {
    /// Returns `true` when the failure means "nothing stored", as opposed to a backend fault.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
