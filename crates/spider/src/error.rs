use foundation::ids::{LayerId, SourceId};

use crate::host::SourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpiderError {
    /// The cluster layer is fed by a source that cannot list cluster leaves.
    UnsupportedSource { layer: LayerId, kind: SourceKind },
    UnknownSource { layer: LayerId, source: SourceId },
}

impl std::fmt::Display for SpiderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpiderError::UnsupportedSource { layer, kind } => {
                write!(f, "data source on cluster layer {layer} is not supported: {kind:?}")
            }
            SpiderError::UnknownSource { layer, source } => {
                write!(f, "cluster layer {layer} references unknown {source}")
            }
        }
    }
}

impl std::error::Error for SpiderError {}
