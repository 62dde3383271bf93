use osprofiles_store::StoreError;
use std::borrow::Cow;

#[osprofiles_derive::osp_error]
pub enum ProfileError {
    #[error("Invalid profile name{}: {message}", format_context(.context))]
    InvalidName { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Profile already exists{}: {message}", format_context(.context))]
    NameConflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Profile not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("No default profile set{}: {message}", format_context(.context))]
    MissingDefault { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Cannot delete the default profile{}: {message}", format_context(.context))]
    DeletingDefault { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Store error{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
