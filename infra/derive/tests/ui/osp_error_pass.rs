use osprofiles_derive::osp_error;
use std::borrow::Cow;

#[osp_error]
pub enum DemoError {
    #[error("I/O error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_missing() -> Result<Vec<u8>, DemoError> {
    std::fs::read("/definitely/not/here").context("Reading demo artifact")
}

fn main() {
    let err = read_missing().unwrap_err();
    assert!(err.to_string().contains("Reading demo artifact"));

    let internal: DemoError = "boom".into();
    assert!(matches!(internal, DemoError::Internal { .. }));

    let missing: Result<(), DemoError> =
        Err(DemoError::NotFound { message: "profile".into(), context: None });
    let missing = missing.context("lookup").unwrap_err();
    assert_eq!(missing.to_string(), "Not found (lookup): profile");
}
