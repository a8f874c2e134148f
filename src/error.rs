use thiserror::Error;

use crate::wizard::WizardError;

#[derive(Error, Debug)]
pub enum BlackboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type Result<T> = std::result::Result<T, BlackboxError>;
