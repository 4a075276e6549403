use serde::Serialize;
use std::fmt;

/// Ranking strategy used by `discover`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Popular,
    GenreBased,
    New,
    #[default]
    Mixed,
}

impl Algorithm {
    /// Maps the `algorithm` query value. Unknown or missing values select `Mixed`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("popular") => Algorithm::Popular,
            Some("genre-based") => Algorithm::GenreBased,
            Some("new") => Algorithm::New,
            _ => Algorithm::Mixed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Popular => "popular",
            Algorithm::GenreBased => "genre-based",
            Algorithm::New => "new",
            Algorithm::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
