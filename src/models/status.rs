use std::fmt;

/// Integer result of an external call. Only zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(0);
    pub const FAILURE: StatusCode = StatusCode(1);

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    pub fn outcome(self) -> Outcome {
        if self.is_success() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ImageGeneration,
    VariationsGeneration,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::ImageGeneration => "Image generation",
            Operation::VariationsGeneration => "Variations generation",
        }
    }

    /// The single line printed for an operation's outcome.
    pub fn report_line(self, outcome: Outcome) -> String {
        let verdict = match outcome {
            Outcome::Success => "succeeded",
            Outcome::Failure => "failed",
        };
        format!("{} {}.", self.label(), verdict)
    }
}
