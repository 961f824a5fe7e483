use ark_std::{error, fmt};

/// The error type of the permutation argument engine.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PlonkError {
    /// The evaluation domain cannot be built for the requested size.
    SetupError,
    /// Function params error.
    FuncParamsError,
    /// A challenge or opening is missing from the transcript.
    ChallengeError,
    /// Division by zero.
    DivisionByZero,
}

impl fmt::Display for PlonkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PlonkError::*;
        f.write_str(match self {
            SetupError => "Setup error.",
            FuncParamsError => "Function params error.",
            ChallengeError => "Challenge error.",
            DivisionByZero => "Division by zero.",
        })
    }
}

impl error::Error for PlonkError {}
