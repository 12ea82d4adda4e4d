use tessera_core::CodecDescriptor;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{MediaEnvironment, MediaTarget, SinkError};

/// Why a candidate codec was not used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecRejection {
    /// The capability query said no; creation was not attempted.
    NotReported,
    /// The capability query said yes but sink creation failed.
    CreationFailed(SinkError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecAttempt {
    pub codec: CodecDescriptor,
    pub rejection: CodecRejection,
}

/// A sink created with the winning codec.
pub struct Negotiated<S> {
    pub codec: CodecDescriptor,
    pub sink: S,
    /// Candidates tried and rejected before the winner, in order.
    pub rejected: Vec<CodecAttempt>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("No supported codec among {} candidates", .attempts.len())]
pub struct NoSupportedCodec {
    pub attempts: Vec<CodecAttempt>,
}

/// Picks the first candidate the target can actually create a sink for.
#[derive(Clone, Debug)]
pub struct CodecNegotiator {
    candidates: Vec<CodecDescriptor>,
}

impl CodecNegotiator {
    /// `candidates` in priority order, most specific first.
    pub fn new(candidates: Vec<CodecDescriptor>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[CodecDescriptor] {
        &self.candidates
    }

    /// Walk the candidates in order and create a sink with the first one
    /// that works.
    ///
    /// # Errors
    ///
    /// [`NoSupportedCodec`] when every candidate is rejected, with one
    /// attempt per candidate.
    pub fn select<E: MediaEnvironment>(
        &self,
        env: &E,
        target: &E::Target,
    ) -> Result<Negotiated<<E::Target as MediaTarget>::Sink>, NoSupportedCodec> {
        let mut rejected = Vec::new();

        for codec in &self.candidates {
            if !env.is_type_supported(codec) {
                debug!(%codec, "codec not reported as supported");
                rejected.push(CodecAttempt {
                    codec: codec.clone(),
                    rejection: CodecRejection::NotReported,
                });
                continue;
            }

            match target.add_sink(codec) {
                Ok(sink) => {
                    debug!(%codec, rejected = rejected.len(), "codec selected");
                    return Ok(Negotiated {
                        codec: codec.clone(),
                        sink,
                        rejected,
                    });
                }
                Err(error) => {
                    warn!(%codec, %error, "sink creation failed, trying next codec");
                    rejected.push(CodecAttempt {
                        codec: codec.clone(),
                        rejection: CodecRejection::CreationFailed(error),
                    });
                }
            }
        }

        Err(NoSupportedCodec { attempts: rejected })
    }
}

impl Default for CodecNegotiator {
    fn default() -> Self {
        Self::new(CodecDescriptor::default_candidates())
    }
}
