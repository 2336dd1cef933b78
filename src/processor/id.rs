use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of processor identifiers
///
/// Scoring processors are declared at compile time rather than resolved from
/// strings at execution time; the DAG registry and the processor registry are
/// both keyed by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorId {
    Transcription,
    Pronunciation,
    Fluency,
    Grammar,
    Vocabulary,
    Sentiment,
    Coherence,
    CodeCompilation,
    CodeEfficiency,
    CodeQuality,
    KeywordCoverage,
    EvaluationReport,
    AbortHandler,
}

impl ProcessorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Pronunciation => "pronunciation",
            Self::Fluency => "fluency",
            Self::Grammar => "grammar",
            Self::Vocabulary => "vocabulary",
            Self::Sentiment => "sentiment",
            Self::Coherence => "coherence",
            Self::CodeCompilation => "code_compilation",
            Self::CodeEfficiency => "code_efficiency",
            Self::CodeQuality => "code_quality",
            Self::KeywordCoverage => "keyword_coverage",
            Self::EvaluationReport => "evaluation_report",
            Self::AbortHandler => "abort_handler",
        }
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcription" => Ok(Self::Transcription),
            "pronunciation" => Ok(Self::Pronunciation),
            "fluency" => Ok(Self::Fluency),
            "grammar" => Ok(Self::Grammar),
            "vocabulary" => Ok(Self::Vocabulary),
            "sentiment" => Ok(Self::Sentiment),
            "coherence" => Ok(Self::Coherence),
            "code_compilation" => Ok(Self::CodeCompilation),
            "code_efficiency" => Ok(Self::CodeEfficiency),
            "code_quality" => Ok(Self::CodeQuality),
            "keyword_coverage" => Ok(Self::KeywordCoverage),
            "evaluation_report" => Ok(Self::EvaluationReport),
            "abort_handler" => Ok(Self::AbortHandler),
            _ => Err(format!("Invalid processor id: {s}")),
        }
    }
}
