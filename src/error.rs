use thiserror::Error;


/// Failures raised while processing a template.
///
/// Syntax problems in the template itself are never errors, they are logged
/// and the offending text passes through. Only model lookups configured as
/// strict and content read failures end up here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Required variable `{0}` is missing")]
    MissingVariable(String),

    #[error("No condition in model named {0}")]
    MissingCondition(String),

    #[error("No include in model named {0}")]
    MissingInclude(String),

    #[error("No list in model named {0}")]
    MissingList(String),

    #[error("No object in model named {0}")]
    MissingObject(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("failed to read template content: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
