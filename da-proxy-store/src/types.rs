// std
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BackendType {
    EigenDa,
    Memory,
    S3,
    Redis,
    Unknown,
}

impl BackendType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EigenDa => "EigenDA",
            Self::Memory => "Memory",
            Self::S3 => "S3",
            Self::Redis => "Redis",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for BackendType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BackendType {
    fn from(value: &str) -> Self {
        match value {
            "EigenDA" => Self::EigenDa,
            "Memory" => Self::Memory,
            "S3" => Self::S3,
            "Redis" => Self::Redis,
            _ => Self::Unknown,
        }
    }
}

impl FromStr for BackendType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Advisory usage snapshot reported by a backend.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub entries: usize,
    pub reads: usize,
}
